//! Error types for simple-oracle.

use thiserror::Error;

/// Result type for simple-oracle operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for simple-oracle.
#[derive(Debug, Error)]
pub enum Error {
    /// A bind slot's type is not in the supported set
    #[error("unknown bind type: {0}")]
    UnknownBindType(String),

    /// A retrieved column or element reports a type outside the decode table
    #[error("unknown SQL type: {0}")]
    UnknownSqlType(String),

    /// Retrieval requested for a position outside the bound slot list
    #[error("bind index {0} is out of range, indexes start at one")]
    BindIndexOutOfRange(usize),

    /// A cursor operation was attempted with no open cursor
    #[error("no result set is open")]
    NoResultSet,

    /// Driver execution failure matching "no data found"
    #[error("no data found: {0}")]
    NoDataFound(String),

    /// Driver execution failure matching "too many rows"
    #[error("too many rows: {0}")]
    TooManyRows(String),

    /// Driver execution failure in the user-level application error code range
    #[error("application error: {0}")]
    ApplicationError(String),

    /// A composite was bound with the wrong number of attribute values
    #[error("composite {type_name} expects {expected} values, got {provided}")]
    ArityMismatch {
        /// Composite type name
        type_name: String,
        /// Attribute count of the database type
        expected: usize,
        /// Number of values supplied by the caller
        provided: usize,
    },

    /// A named collection or composite type does not exist in the data dictionary
    #[error("type {0} not found")]
    TypeNotFound(String),

    /// A host value could not be encoded for the target driver type
    #[error("encode error: {0}")]
    Encode(String),

    /// A driver value could not be decoded into a host value
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid usage (e.g., executing a closed statement)
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// Unsupported feature
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Any other driver failure, re-raised unmodified
    #[error("driver error: {0}")]
    Driver(String),
}

impl Error {
    /// Get the driver message if this is an unclassified driver failure.
    pub fn driver_message(&self) -> Option<&str> {
        match self {
            Error::Driver(msg) => Some(msg),
            _ => None,
        }
    }
}

/// One classification rule: a predicate over the driver message and the
/// classified error it maps to.
type Rule = (fn(&str) -> bool, fn(String) -> Error);

/// Ordered top-to-bottom; the first matching rule wins, everything else
/// falls through to the unmodified driver error.
const CLASSIFY_RULES: &[Rule] = &[
    (matches_no_data_found, Error::NoDataFound),
    (matches_too_many_rows, Error::TooManyRows),
    (matches_application_error, Error::ApplicationError),
];

fn matches_no_data_found(msg: &str) -> bool {
    msg.contains("no data found")
}

fn matches_too_many_rows(msg: &str) -> bool {
    msg.contains("too many rows")
}

/// Matches the user-level error code pattern `ORA-2` followed by a digit.
fn matches_application_error(msg: &str) -> bool {
    msg.match_indices("ORA-2")
        .any(|(i, pat)| msg[i + pat.len()..].starts_with(|c: char| c.is_ascii_digit()))
}

/// Classify a driver execution failure into the taxonomy above.
///
/// Classification is string-based because the driver surfaces only a message
/// at this seam. Non-driver errors pass through untouched.
pub(crate) fn classify_execution(err: Error) -> Error {
    if let Error::Driver(msg) = &err {
        for (matches, wrap) in CLASSIFY_RULES {
            if matches(msg) {
                tracing::debug!("classified driver failure: {}", msg);
                return wrap(msg.clone());
            }
        }
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_found_is_classified() {
        let err = classify_execution(Error::Driver("ORA-01403: no data found".into()));
        assert!(matches!(err, Error::NoDataFound(_)));
    }

    #[test]
    fn test_too_many_rows_is_classified() {
        let err = classify_execution(Error::Driver(
            "ORA-01422: exact fetch returns more than requested number of rows: too many rows"
                .into(),
        ));
        assert!(matches!(err, Error::TooManyRows(_)));
    }

    #[test]
    fn test_application_error_code_range_is_classified() {
        let err = classify_execution(Error::Driver("ORA-20001: my application error".into()));
        assert!(matches!(err, Error::ApplicationError(_)));
    }

    #[test]
    fn test_unrelated_driver_error_passes_through() {
        let err = classify_execution(Error::Driver(
            "ORA-00942: table or view does not exist".into(),
        ));
        assert!(matches!(err, Error::Driver(_)));
    }

    #[test]
    fn test_ora_2_without_digit_is_not_an_application_error() {
        let err = classify_execution(Error::Driver("ORA-2 garbled".into()));
        assert!(matches!(err, Error::Driver(_)));
    }

    #[test]
    fn test_non_driver_errors_are_untouched() {
        let err = classify_execution(Error::NoResultSet);
        assert!(matches!(err, Error::NoResultSet));
    }
}
