use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid unique id: {0:?}")]
    InvalidUniqueId(String),
    #[error("invalid resource type: {0:?}")]
    InvalidResourceType(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
