//! `tn-cli auth ...`

use clap::Subcommand;

use tetranoma_client::AppState;
use tetranoma_client::models::{Credentials, NewAccount, ProfileUpdate};
use tetranoma_core::UserRole;

use super::{CommandError, require_session};
use crate::output;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in and persist the session
    SignIn {
        #[arg(short, long)]
        email: String,

        #[arg(long, env = "TETRANOMA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out; the local session is cleared even if the server is unreachable
    SignOut,
    /// Create an account (does not sign in)
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(long, env = "TETRANOMA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Show the cached session without contacting the server
    Whoami {
        /// Confirm the session with the server first
        #[arg(long)]
        verify: bool,
    },
    /// Show or edit the profile
    Profile {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Delete the account
        #[arg(long, conflicts_with_all = ["username", "email"])]
        delete: bool,
    },
}

pub async fn run(state: &AppState, action: AuthAction) -> Result<(), CommandError> {
    let auth = state.auth();

    match action {
        AuthAction::SignIn { email, password } => {
            let password = password.ok_or(CommandError::MissingPassword)?;
            let user = auth.sign_in(&Credentials::new(email, password)).await?;
            output::line(format_args!("Signed in as {}", user.display_name()));
        }
        AuthAction::SignOut => {
            auth.sign_out().await?;
            output::line("Signed out");
        }
        AuthAction::Register {
            username,
            email,
            password,
        } => {
            let password = password.ok_or(CommandError::MissingPassword)?;
            let created = auth
                .create_account(&NewAccount::new(username, email, password))
                .await?;
            output::line(created.message.as_deref().unwrap_or("Account created"));
        }
        AuthAction::Whoami { verify } => {
            let authenticated = if verify {
                auth.revalidate().await?
            } else {
                auth.check_auth().await
            };
            match auth.current_user().await {
                Some(user) if authenticated => {
                    let role = user.role();
                    output::line(format_args!(
                        "{} <{}> ({role})",
                        user.display_name(),
                        user.email
                    ));
                    if role == UserRole::Admin {
                        output::line("Back-office access");
                    }
                }
                _ => output::line("Not signed in"),
            }
        }
        AuthAction::Profile {
            username,
            email,
            delete,
        } => {
            require_session(state).await?;
            if delete {
                auth.delete_profile().await?;
                output::line("Account deleted");
            } else if username.is_some() || email.is_some() {
                let user = auth
                    .update_profile(&ProfileUpdate {
                        username,
                        email,
                        password: None,
                    })
                    .await?;
                output::json(&user)?;
            } else {
                output::json(&auth.get_profile().await?)?;
            }
        }
    }

    Ok(())
}
