/// Core error type.
///
/// Adapter crates map their specific errors into this type so the HTTP layer
/// and the binary can report failures consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("template {name}: {message}")]
    Template { name: String, message: String },

    #[error("template {name} execution failed: {message}")]
    Render { name: String, message: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
