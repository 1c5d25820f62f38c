//! Subcommand implementations. Each module owns its `clap` action enum and a
//! `run` function driving one store.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod figures;
pub mod pay;
pub mod route;

pub use admin::AdminAction;
pub use auth::AuthAction;
pub use cart::CartAction;
pub use figures::FiguresAction;
pub use pay::PayAction;
pub use route::RouteAction;

use tetranoma_client::ClientError;
use tetranoma_client::error::{AuthError, PaymentError};
use tetranoma_client::gateway::GatewayError;
use thiserror::Error;

/// Errors that end a command with exit code 1.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The command needs a signed-in session.
    #[error("Not signed in. Run `tn-cli auth sign-in` first.")]
    NotSignedIn,

    /// No password was given and `TETRANOMA_PASSWORD` is not set.
    #[error("Missing password: pass --password or set TETRANOMA_PASSWORD")]
    MissingPassword,

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl From<GatewayError> for CommandError {
    fn from(err: GatewayError) -> Self {
        Self::Client(err.into())
    }
}

impl From<AuthError> for CommandError {
    fn from(err: AuthError) -> Self {
        Self::Client(err.into())
    }
}

impl From<PaymentError> for CommandError {
    fn from(err: PaymentError) -> Self {
        Self::Client(err.into())
    }
}

/// Restore the cached session, failing if there is none.
pub async fn require_session(state: &tetranoma_client::AppState) -> Result<(), CommandError> {
    if state.auth().check_auth().await {
        Ok(())
    } else {
        Err(CommandError::NotSignedIn)
    }
}
