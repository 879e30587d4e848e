/// Errors raised while interpreting form input
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FormError {
    #[error("unknown form field `{0}`")]
    UnknownField(String),
    #[error("invalid value for `{field}`: expected {expected}")]
    InvalidValue {
        field: &'static str,
        expected: &'static str,
    },
}

/// A required field left empty on first save
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("property is not valid: {}", describe(.0))]
    Validation(Vec<ValidationIssue>),
    #[error("property id is missing")]
    MissingId,
    #[error("property {0} not found")]
    NotFound(String),
    #[error("could not encode property: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

fn describe(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{} {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(thiserror::Error, Debug)]
pub enum EnrichmentError {
    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(&'static str),
    #[error("api returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing env {0}")]
    MissingEnv(&'static str),
}
