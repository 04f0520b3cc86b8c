use thiserror::Error;

use crate::client::ClientError;
use crate::config::SettingsError;

/// Top-level error for consumers that wire the crate together.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Client(#[from] ClientError),
}
