/// Errors that can occur during rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// No dialect exists for this backend type
    #[error("Unsupported backend '{0}'")]
    UnsupportedBackend(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}
