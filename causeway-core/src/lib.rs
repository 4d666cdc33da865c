//! Causeway Core - Decision Graph Types
//!
//! Data model for causal decision graphs plus the pure building blocks every
//! checker shares: the graph index, structural category inference, and the
//! issue/mutation rule table. No validation policy lives here.

pub mod config;
pub mod enums;
pub mod error;
pub mod graph;
pub mod identity;
pub mod index;
pub mod inference;
pub mod issue;
pub mod payload;

pub use config::*;
pub use enums::*;
pub use error::*;
pub use graph::*;
pub use identity::*;
pub use index::*;
pub use inference::*;
pub use issue::*;
pub use payload::*;
