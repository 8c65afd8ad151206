use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub path: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing template variables: {}", .0.join(", "))]
    MissingVariable(Vec<String>),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Output does not match schema: {}", join_violations(.0))]
    SchemaViolation(Vec<FieldViolation>),

    #[error("Could not parse model output: {0}")]
    OutputParse(String),

    #[error("Similarity index is empty")]
    EmptyIndex,

    #[error("Agent stopped after {0} iterations without a final answer")]
    AgentExhausted(usize),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Collaborator,
    Logic,
}

impl DomainError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn output_parse(msg: impl Into<String>) -> Self {
        Self::OutputParse(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::ExternalService(_)
            | Self::Timeout(_)
            | Self::OutputParse(_)
            | Self::SchemaViolation(_) => ErrorKind::Collaborator,
            Self::MissingVariable(_)
            | Self::InvalidTemplate(_)
            | Self::EmptyIndex
            | Self::AgentExhausted(_)
            | Self::Validation(_)
            | Self::Internal(_) => ErrorKind::Logic,
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
