//! Typed factor payloads
//!
//! [`FactorData`] is the permissive shape a drafting collaborator hands us.
//! Projecting it against a category yields the payload a simulator can rely
//! on, or the list of shape defects that prevent it.

use crate::{ExtractionType, FactorCategory, FactorData, FactorType, Lenient};
use serde::{Deserialize, Serialize};

pub const KEY_VALUE: &str = "value";
pub const KEY_EXTRACTION_TYPE: &str = "extractionType";
pub const KEY_FACTOR_TYPE: &str = "factor_type";
pub const KEY_UNCERTAINTY_DRIVERS: &str = "uncertainty_drivers";

/// Data of a factor set by options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllableFactor {
    pub value: f64,
    pub extraction_type: Lenient<ExtractionType>,
    pub factor_type: Lenient<FactorType>,
    pub uncertainty_drivers: Vec<String>,
}

/// Data of a factor with a known baseline that options cannot set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservableFactor {
    pub value: f64,
    pub extraction_type: Lenient<ExtractionType>,
}

/// Category-checked factor payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FactorPayload {
    Controllable(ControllableFactor),
    Observable(ObservableFactor),
    /// External factors carry no data
    External,
}

impl FactorPayload {
    pub fn category(&self) -> FactorCategory {
        match self {
            FactorPayload::Controllable(_) => FactorCategory::Controllable,
            FactorPayload::Observable(_) => FactorCategory::Observable,
            FactorPayload::External => FactorCategory::External,
        }
    }
}

/// Why factor data does not fit its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DataDefect {
    /// Required keys absent, in declaration order
    MissingKeys(Vec<&'static str>),
    /// Keys the category forbids
    ExtraKeys(Vec<&'static str>),
    /// A data object on a category that must carry none
    UnexpectedData,
}

/// Project raw factor data onto the payload for `category`.
pub fn project_factor(
    data: Option<&FactorData>,
    category: FactorCategory,
) -> Result<FactorPayload, Vec<DataDefect>> {
    match category {
        FactorCategory::External => match data {
            None => Ok(FactorPayload::External),
            Some(_) => Err(vec![DataDefect::UnexpectedData]),
        },
        FactorCategory::Observable => {
            let empty = FactorData::default();
            let data = data.unwrap_or(&empty);
            let mut defects = Vec::new();

            let missing = missing_keys(data, &[KEY_VALUE, KEY_EXTRACTION_TYPE]);
            if !missing.is_empty() {
                defects.push(DataDefect::MissingKeys(missing));
            }

            let mut extra = Vec::new();
            if data.factor_type.is_some() {
                extra.push(KEY_FACTOR_TYPE);
            }
            if data.uncertainty_drivers.is_some() {
                extra.push(KEY_UNCERTAINTY_DRIVERS);
            }
            if !extra.is_empty() {
                defects.push(DataDefect::ExtraKeys(extra));
            }

            match (defects.is_empty(), data.value, &data.extraction_type) {
                (true, Some(value), Some(extraction_type)) => {
                    Ok(FactorPayload::Observable(ObservableFactor {
                        value,
                        extraction_type: extraction_type.clone(),
                    }))
                }
                _ => Err(defects),
            }
        }
        FactorCategory::Controllable => {
            let empty = FactorData::default();
            let data = data.unwrap_or(&empty);
            match (
                data.value,
                &data.extraction_type,
                &data.factor_type,
                &data.uncertainty_drivers,
            ) {
                (Some(value), Some(extraction_type), Some(factor_type), Some(drivers)) => {
                    Ok(FactorPayload::Controllable(ControllableFactor {
                        value,
                        extraction_type: extraction_type.clone(),
                        factor_type: factor_type.clone(),
                        uncertainty_drivers: drivers.clone(),
                    }))
                }
                _ => Err(vec![DataDefect::MissingKeys(missing_keys(
                    data,
                    &[
                        KEY_VALUE,
                        KEY_EXTRACTION_TYPE,
                        KEY_FACTOR_TYPE,
                        KEY_UNCERTAINTY_DRIVERS,
                    ],
                ))]),
            }
        }
    }
}

fn missing_keys(data: &FactorData, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|key| match *key {
            KEY_VALUE => data.value.is_none(),
            KEY_EXTRACTION_TYPE => data.extraction_type.is_none(),
            KEY_FACTOR_TYPE => data.factor_type.is_none(),
            KEY_UNCERTAINTY_DRIVERS => data.uncertainty_drivers.is_none(),
            _ => false,
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controllable_projection_lists_missing_keys() {
        let data = FactorData {
            value: Some(10.0),
            ..FactorData::default()
        };
        let defects = project_factor(Some(&data), FactorCategory::Controllable).unwrap_err();
        assert_eq!(
            defects,
            vec![DataDefect::MissingKeys(vec![
                KEY_EXTRACTION_TYPE,
                KEY_FACTOR_TYPE,
                KEY_UNCERTAINTY_DRIVERS
            ])]
        );
    }

    #[test]
    fn test_controllable_projection_without_data() {
        let defects = project_factor(None, FactorCategory::Controllable).unwrap_err();
        assert_eq!(
            defects,
            vec![DataDefect::MissingKeys(vec![
                KEY_VALUE,
                KEY_EXTRACTION_TYPE,
                KEY_FACTOR_TYPE,
                KEY_UNCERTAINTY_DRIVERS
            ])]
        );
    }

    #[test]
    fn test_observable_projection_reports_missing_and_extra() {
        let data = FactorData {
            value: Some(0.3),
            factor_type: Some(Lenient::Known(FactorType::Cost)),
            ..FactorData::default()
        };
        let defects = project_factor(Some(&data), FactorCategory::Observable).unwrap_err();
        assert_eq!(
            defects,
            vec![
                DataDefect::MissingKeys(vec![KEY_EXTRACTION_TYPE]),
                DataDefect::ExtraKeys(vec![KEY_FACTOR_TYPE]),
            ]
        );
    }

    #[test]
    fn test_observable_projection_ok() {
        let data = FactorData::observed(0.42, ExtractionType::Explicit);
        let payload = project_factor(Some(&data), FactorCategory::Observable).unwrap();
        assert_eq!(payload.category(), FactorCategory::Observable);
    }

    #[test]
    fn test_external_projection_rejects_data() {
        assert_eq!(
            project_factor(None, FactorCategory::External),
            Ok(FactorPayload::External)
        );
        let data = FactorData::default();
        assert_eq!(
            project_factor(Some(&data), FactorCategory::External),
            Err(vec![DataDefect::UnexpectedData])
        );
    }
}
