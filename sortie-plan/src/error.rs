use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RuleParseError {
    #[error("rule condition must not use 'or'; write multiple rules instead: {0:?}")]
    OrNotAllowed(String),
    #[error("malformed condition group, expected \"(TOKEN OP NUMBER)\": {0:?}")]
    MalformedGroup(String),
    #[error("unknown ship-type token: {0:?}")]
    UnknownToken(String),
    #[error("unknown comparison operator: {0:?}")]
    UnknownOperator(String),
    #[error("invalid numeric literal: {0:?}")]
    InvalidNumber(String),
    #[error("unknown rule action: {0:?}")]
    UnknownAction(String),
    #[error("empty rule condition")]
    Empty,
}
