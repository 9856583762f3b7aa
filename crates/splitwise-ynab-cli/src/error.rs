use splitwise_ynab_http::AuthError;

/// Why a run stopped before completing.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Configuration error")]
    Config(#[source] anyhow::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Splitwise error")]
    Source(#[source] anyhow::Error),
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Config(_) => 2,
            RunError::Auth(_) => 3,
            RunError::Source(_) => 4,
        }
    }
}
