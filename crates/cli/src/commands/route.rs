//! `tn-cli route check` - evaluate the route guard against the cached session.

use clap::Subcommand;

use tetranoma_client::AppState;
use tetranoma_client::guard::{GuardDecision, RouteMeta};

use super::CommandError;
use crate::output;

#[derive(Subcommand)]
pub enum RouteAction {
    /// Print where a navigation with these annotations would end up
    Check {
        #[arg(long)]
        auth: bool,

        #[arg(long)]
        guest: bool,

        #[arg(long)]
        admin: bool,
    },
}

pub async fn run(state: &AppState, action: RouteAction) -> Result<(), CommandError> {
    match action {
        RouteAction::Check { auth, guest, admin } => {
            let meta = RouteMeta {
                requires_auth: auth,
                requires_guest: guest,
                requires_admin: admin,
            };
            match state.guard().check(&meta).await {
                GuardDecision::Proceed => output::line("proceed"),
                GuardDecision::Redirect(target) => output::line(format_args!("redirect {target}")),
            }
        }
    }

    Ok(())
}
