use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template '{template}' references '{param}' but no value was given")]
    MissingTemplateParam { template: String, param: String },

    #[error("template is not valid UTF-8: {0}")]
    InvalidTemplate(String),

    #[error("invalid container path '{0}': must be absolute with no '..' components")]
    InvalidPath(String),

    #[error("invalid process plan: {0}")]
    InvalidPlan(String),

    #[error("supervisor error: {0}")]
    Supervisor(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OperatorError>;
