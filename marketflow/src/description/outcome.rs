//! Interpretation of the winning outcome.

use super::amount::integer_from_value;
use super::{OutcomeType, WorkflowDescription};
use serde_json::Value;

/// Largest number of decimal places a scalar outcome may use.
///
/// An `i128` has at most 39 digits, so more places never change the output.
pub const MAX_DECIMALS: u32 = 38;

impl WorkflowDescription {
    /// Returns the winning outcome as the integer reported to the ledger.
    ///
    /// Categorical outcomes are an index into `outcomes`; scalar outcomes are
    /// integers. Returns `None` when no outcome was
    /// supplied.
    #[must_use]
    pub fn outcome_value(&self) -> Option<Result<i128, String>> {
        let outcome = self.winning_outcome()?;
        Some(match self.outcome_type {
            Some(OutcomeType::Categorical) => self.categorical_index(outcome),
            Some(OutcomeType::Scalar) => self.scalar_value(outcome),
            None => Err("outcomeType is not set".to_string()),
        })
    }

    /// Formats a reported outcome for humans.
    ///
    /// Categorical outcomes print their label, scalar outcomes are scaled by
    /// `decimals` and suffixed with `unit`.
    #[must_use]
    pub fn format_outcome(&self, value: i128) -> String {
        match self.outcome_type {
            Some(OutcomeType::Categorical) => usize::try_from(value)
                .ok()
                .and_then(|i| self.outcomes.as_ref()?.get(i).cloned())
                .unwrap_or_else(|| value.to_string()),
            Some(OutcomeType::Scalar) => {
                let scaled = scale(value, self.decimals.unwrap_or(0));
                match self.unit.as_deref().map(str::trim) {
                    Some(unit) if !unit.is_empty() => format!("{scaled} {unit}"),
                    _ => scaled,
                }
            }
            None => value.to_string(),
        }
    }

    fn categorical_index(&self, outcome: &Value) -> Result<i128, String> {
        let labels = self.outcomes.as_deref().unwrap_or_default();
        let index = integer_from_value(outcome)
            .map_err(|_| format!("{outcome} is not an outcome index"))?;
        let count = i128::try_from(labels.len()).map_err(|e| e.to_string())?;
        if (0..count).contains(&index) {
            Ok(index)
        } else {
            Err(format!("outcome index {index} is outside 0..{count}"))
        }
    }

    fn scalar_value(&self, outcome: &Value) -> Result<i128, String> {
        integer_from_value(outcome)
    }
}

fn scale(value: i128, decimals: u32) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let decimals = decimals.min(MAX_DECIMALS);
    let digits = value.unsigned_abs().to_string();
    let width = decimals as usize + 1;
    let padded = format!("{digits:0>width$}");
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals as usize);
    let sign = if value < 0 { "-" } else { "" };
    format!("{sign}{int_part}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn categorical(outcome: Value) -> WorkflowDescription {
        serde_json::from_value(json!({
            "outcomeType": "CATEGORICAL",
            "outcomes": ["Red", "Green", "Blue"],
            "winningOutcome": outcome
        }))
        .unwrap()
    }

    fn scalar(outcome: Value) -> WorkflowDescription {
        serde_json::from_value(json!({
            "outcomeType": "SCALAR",
            "decimals": 2,
            "unit": "°C",
            "winningOutcome": outcome
        }))
        .unwrap()
    }

    #[test]
    fn test_categorical_by_index() {
        assert_eq!(categorical(json!(1)).outcome_value(), Some(Ok(1)));
        assert_eq!(categorical(json!("2")).outcome_value(), Some(Ok(2)));
        assert!(categorical(json!(3)).outcome_value().unwrap().is_err());
        assert!(categorical(json!(-1)).outcome_value().unwrap().is_err());
    }

    #[test]
    fn test_categorical_label_is_not_an_index() {
        let err = categorical(json!("Blue")).outcome_value().unwrap().unwrap_err();
        assert!(err.contains("not an outcome index"));
    }

    #[test]
    fn test_scalar_integer() {
        assert_eq!(scalar(json!(-1250)).outcome_value(), Some(Ok(-1250)));
        assert!(scalar(json!(12.5)).outcome_value().unwrap().is_err());
    }

    #[test]
    fn test_absent_outcome() {
        let description = WorkflowDescription::new(OutcomeType::Scalar);
        assert_eq!(description.outcome_value(), None);
    }

    #[test]
    fn test_format_outcome() {
        assert_eq!(categorical(json!(0)).format_outcome(1), "Green");
        assert_eq!(scalar(json!(0)).format_outcome(1234), "12.34 °C");
        assert_eq!(scalar(json!(0)).format_outcome(-5), "-0.05 °C");
        assert_eq!(scale(7, 0), "7");
    }

    #[test]
    fn test_scale_caps_decimals() {
        let text = scale(i128::MAX, u32::MAX);
        assert_eq!(text.len(), usize::try_from(MAX_DECIMALS).unwrap() + 2);
        assert!(text.starts_with("1."));
    }
}
