use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Report is empty")]
    Empty,

    #[error("No station identifier found in report '{0}'")]
    MissingIdentifier(String),

    #[error("Report of {identifier} has no {field}")]
    MissingTimestamp {
        identifier: String,
        field: &'static str,
    },

    #[error("Time group '{0}' does not resolve to a calendar date")]
    InvalidTimestamp(String),
}
