//! Pre-flight validation of workflow descriptions.
//!
//! Validation runs once, against the description as loaded, before any
//! stage touches the ledger. A description that passes can be provisioned
//! from its resume point without a stage tripping over missing input.
//!
//! [`parse_description`] turns the raw document into a typed description
//! and reports a field of the wrong JSON type as a [`ValidationError`] too.

use crate::core::StageIndex;
use crate::description::amount::{amount_from_value, integer_from_value};
use crate::description::{Address, OutcomeType, ProgressField, WorkflowDescription, MAX_DECIMALS};
use crate::errors::{ErrorInfo, ValidationError};
use crate::pipeline::resolve_stage;
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

const TEXT_FIELDS: [&str; 8] = [
    "title",
    "description",
    "resolutionDate",
    "unit",
    "currency",
    "oracleAddress",
    "eventAddress",
    "marketAddress",
];

/// Converts a raw description document into a [`WorkflowDescription`].
pub fn parse_description(document: Value) -> Result<WorkflowDescription, ValidationError> {
    let Value::Object(fields) = &document else {
        return Err(wrong_type("document", "a JSON object", "the document is not an object"));
    };
    for key in TEXT_FIELDS {
        check_type::<String>(fields, key, "a string")?;
    }
    check_type::<OutcomeType>(fields, "outcomeType", "CATEGORICAL or SCALAR")?;
    check_type::<Vec<String>>(fields, "outcomes", "a list of strings")?;
    check_type::<u32>(fields, "decimals", "a non-negative integer")?;

    WorkflowDescription::deserialize(&document)
        .map_err(|e| wrong_type("document", "a market description", &e.to_string()))
}

fn check_type<T: DeserializeOwned>(
    fields: &Map<String, Value>,
    key: &str,
    expected: &str,
) -> Result<(), ValidationError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(()),
        Some(value) => T::deserialize(value)
            .map(|_| ())
            .map_err(|e| wrong_type(key, expected, &e.to_string())),
    }
}

fn wrong_type(field: &str, expected: &str, detail: &str) -> ValidationError {
    ValidationError::new(field, format!("expected {expected}: {detail}")).with_error_info(
        ErrorInfo::new("DESC-009-TYPE", format!("{field} has the wrong type"))
            .with_context_entry("expected", expected),
    )
}

/// Validates a description, returning the first problem found.
pub fn validate_description(description: &WorkflowDescription) -> Result<(), ValidationError> {
    require_text("title", description.title.as_deref())?;
    require_text("description", description.description.as_deref())?;
    validate_resolution_date(description.resolution_date.as_deref())?;

    let outcome_type = description.outcome_type.ok_or_else(|| {
        missing("outcomeType").with_error_info(
            ErrorInfo::new("DESC-001-REQUIRED", "Outcome type is missing")
                .with_fix_hint("Set outcomeType to CATEGORICAL or SCALAR."),
        )
    })?;
    match outcome_type {
        OutcomeType::Categorical => validate_outcomes(description.outcomes.as_deref())?,
        OutcomeType::Scalar => validate_scalar(description)?,
    }

    let index = resolve_stage(description);
    validate_amount("fee", description.fee.as_ref(), index < StageIndex::MARKET)?;
    validate_amount("funding", description.funding.as_ref(), index < StageIndex::OUTCOME)?;

    validate_progress_chain(description)?;
    validate_winning_outcome(description)?;
    Ok(())
}

fn missing(field: &str) -> ValidationError {
    ValidationError::new(field, "value is required")
}

fn require_text(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(()),
        _ => Err(missing(field).with_error_info(
            ErrorInfo::new("DESC-001-REQUIRED", format!("{field} is missing or blank"))
                .with_context_entry("field", field),
        )),
    }
}

fn validate_resolution_date(value: Option<&str>) -> Result<(), ValidationError> {
    require_text("resolutionDate", value)?;
    let text = value.unwrap_or_default().trim();
    DateTime::parse_from_rfc3339(text).map(|_| ()).map_err(|e| {
        ValidationError::new("resolutionDate", format!("'{text}' is not an RFC 3339 date: {e}"))
            .with_error_info(
                ErrorInfo::new("DESC-008-DATE", "Resolution date is malformed")
                    .with_fix_hint("Use a timestamp such as 2030-01-01T00:00:00Z."),
            )
    })
}

fn validate_outcomes(outcomes: Option<&[String]>) -> Result<(), ValidationError> {
    let labels = outcomes.unwrap_or_default();
    let usable = labels.iter().filter(|l| !l.trim().is_empty()).count();
    if usable < 2 || usable != labels.len() {
        return Err(ValidationError::new(
            "outcomes",
            "a categorical event needs at least two non-blank outcomes",
        )
        .with_error_info(ErrorInfo::new("DESC-002-OUTCOMES", "Outcome list is unusable")));
    }
    if labels.len() > usize::from(u8::MAX) {
        return Err(ValidationError::new(
            "outcomes",
            format!("at most {} outcomes are supported", u8::MAX),
        ));
    }
    Ok(())
}

fn validate_scalar(description: &WorkflowDescription) -> Result<(), ValidationError> {
    let lower = bound("lowerBound", description.lower_bound.as_ref())?;
    let upper = bound("upperBound", description.upper_bound.as_ref())?;
    if lower >= upper {
        return Err(ValidationError::new(
            "upperBound",
            format!("upper bound {upper} must be greater than lower bound {lower}"),
        )
        .with_error_info(ErrorInfo::new("DESC-003-BOUNDS", "Scalar bounds are inverted")));
    }
    match description.decimals {
        None => Err(missing("decimals")),
        Some(decimals) if decimals > MAX_DECIMALS => Err(ValidationError::new(
            "decimals",
            format!("{decimals} decimal places exceed the maximum of {MAX_DECIMALS}"),
        )
        .with_error_info(ErrorInfo::new("DESC-003-BOUNDS", "Too many decimal places"))),
        Some(_) => Ok(()),
    }
}

fn bound(field: &str, value: Option<&Value>) -> Result<i128, ValidationError> {
    let value = value.ok_or_else(|| missing(field))?;
    integer_from_value(value).map_err(|message| {
        ValidationError::new(field, message)
            .with_error_info(ErrorInfo::new("DESC-003-BOUNDS", format!("{field} is not an integer")))
    })
}

/// Amounts are checked when present and required while a stage that
/// consumes them may still run.
fn validate_amount(field: &str, value: Option<&Value>, required: bool) -> Result<(), ValidationError> {
    let Some(value) = value else {
        return if required { Err(missing(field)) } else { Ok(()) };
    };
    amount_from_value(value).map(|_| ()).map_err(|message| {
        ValidationError::new(field, message).with_error_info(
            ErrorInfo::new("DESC-004-AMOUNT", format!("{field} is not a whole amount"))
                .with_fix_hint("Write amounts in base units, e.g. \"1e18\"."),
        )
    })
}

fn validate_progress_chain(description: &WorkflowDescription) -> Result<(), ValidationError> {
    let addresses = [
        (ProgressField::OracleAddress, description.oracle_address.as_deref()),
        (ProgressField::EventAddress, description.event_address.as_deref()),
        (ProgressField::MarketAddress, description.market_address.as_deref()),
    ];
    for (field, value) in addresses {
        if let Some(text) = value.filter(|t| !t.trim().is_empty()) {
            if !Address::is_valid(text.trim()) {
                return Err(ValidationError::new(field.key(), format!("'{text}' is not an address"))
                    .with_error_info(
                        ErrorInfo::new("DESC-005-ADDRESS", "Malformed address")
                            .with_fix_hint("Addresses are 0x followed by 40 hex digits."),
                    ));
            }
        }
    }

    // Markers after the first gap must be absent too, except the winning
    // outcome, which the user may set before provisioning finishes.
    let chain = &ProgressField::CHAIN[..3];
    if let Some(gap) = chain.iter().position(|field| !description.has(*field)) {
        if let Some(later) = chain[gap + 1..].iter().find(|field| description.has(**field)) {
            return Err(ValidationError::new(
                later.key(),
                format!("{later} is set but {} is not", chain[gap]),
            )
            .with_error_info(
                ErrorInfo::new("DESC-006-CHAIN", "Progress markers are out of order")
                    .with_fix_hint("Remove the later address or restore the missing one."),
            ));
        }
    }
    Ok(())
}

fn validate_winning_outcome(description: &WorkflowDescription) -> Result<(), ValidationError> {
    match description.outcome_value() {
        Some(Err(message)) => Err(ValidationError::new("winningOutcome", message)
            .with_error_info(ErrorInfo::new("DESC-007-OUTCOME", "Winning outcome is unusable"))),
        _ => Ok(()),
    }
}
