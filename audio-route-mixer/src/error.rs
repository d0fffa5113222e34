use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MixerError {
    #[error("failed to read mixer paths: {0}")]
    Io(String),

    #[error("failed to parse mixer paths: {0}")]
    Parse(String),

    #[error("path {path} sets undeclared control {control}")]
    UnknownControl { path: String, control: String },

    #[error("unknown control: {0}")]
    NoSuchControl(String),

    #[error("unknown mixer path: {0}")]
    UnknownPath(String),
}
