//! `tn-cli admin ...`

use clap::Subcommand;

use tetranoma_client::AppState;
use tetranoma_client::models::{OrderQuery, UserQuery};
use tetranoma_core::{OrderId, OrderStatus, UserId, UserRole};

use super::{CommandError, require_session};
use crate::output;

#[derive(Subcommand)]
pub enum AdminAction {
    /// Dashboard numbers
    Stats,
    /// List users with their activity
    Users {
        #[arg(long)]
        search: Option<String>,

        /// `user` or `admin`
        #[arg(long)]
        role: Option<UserRole>,
    },
    /// List orders
    Orders {
        /// e.g. `pending`, `shipped`
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    /// Change a user's role
    SetRole { user_id: UserId, role: UserRole },
    /// Change an order's status
    SetOrderStatus {
        order_id: OrderId,
        status: OrderStatus,
    },
}

pub async fn run(state: &AppState, action: AdminAction) -> Result<(), CommandError> {
    require_session(state).await?;
    let admin = state.admin();

    match action {
        AdminAction::Stats => {
            let stats = admin.get_dashboard_stats().await?;
            output::line(format_args!("Users:   {}", stats.total_users));
            output::line(format_args!("Figures: {}", stats.total_figures));
            output::line(format_args!("Orders:  {}", stats.total_orders));
            output::line(format_args!("Revenue: {}", stats.total_revenue()));
        }
        AdminAction::Users { search, role } => {
            let users = admin
                .get_all_users_with_activity(&UserQuery {
                    search,
                    role,
                    ..UserQuery::default()
                })
                .await?;
            output::json(&users)?;
        }
        AdminAction::Orders { status } => {
            let orders = admin
                .get_all_orders(&OrderQuery {
                    status,
                    ..OrderQuery::default()
                })
                .await?;
            output::json(&orders)?;
        }
        AdminAction::SetRole { user_id, role } => {
            let user = admin.update_user_role(&user_id, role).await?;
            output::line(format_args!("{} is now {}", user.display_name(), user.role()));
        }
        AdminAction::SetOrderStatus { order_id, status } => {
            let order = admin.update_order_status(&order_id, status).await?;
            output::line(format_args!("Order {} is now {}", order.id, order.status));
        }
    }

    Ok(())
}
