use thiserror::Error;

use crate::dispatcher::GuideType;

#[derive(Error, Debug)]
pub enum GuideError {
    #[error("missing required input `{argument}` for {guide_type} guide")]
    MissingInput {
        guide_type: GuideType,
        argument: &'static str,
    },
    #[error("{entity} record has no id")]
    MissingRecordId { entity: &'static str },
    #[error("Unknown guide type: {0}")]
    UnknownGuideType(String),
    #[error("Unknown redaction key '{key}' in section {section}")]
    UnknownRedactionKey { section: &'static str, key: String },
    #[error("Unknown field reference: {0}")]
    UnknownFieldRef(String),
    #[error("{kind} not found: {id}")]
    RecordNotFound { kind: &'static str, id: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Template rendering failed: {0}")]
    Template(#[from] minijinja::Error),
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GuideError>;

impl GuideError {
    /// True for errors caused by the caller handing over incomplete inputs.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. } | Self::MissingRecordId { .. } | Self::UnknownGuideType(_)
        )
    }
}
