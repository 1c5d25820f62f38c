//! `tn-cli pay ...`

use clap::Subcommand;
use secrecy::ExposeSecret;

use tetranoma_client::AppState;
use tetranoma_core::{OrderId, PaymentId, Price};

use super::{CommandError, require_session};
use crate::output;

#[derive(Subcommand)]
pub enum PayAction {
    /// Create a payment intent for an order
    Create {
        order_id: OrderId,

        amount: Price,

        /// Also print the client secret for the hosted payment form
        #[arg(long)]
        show_secret: bool,
    },
    /// Create an intent and confirm it in one go
    Confirm {
        order_id: OrderId,

        amount: Price,
    },
}

pub async fn run(state: &AppState, action: PayAction) -> Result<(), CommandError> {
    require_session(state).await?;
    let payment = state.payment();

    match action {
        PayAction::Create {
            order_id,
            amount,
            show_secret,
        } => {
            let intent = payment.create_payment_intent(&order_id, amount).await?;
            output::line(format_args!(
                "Payment {} pending until {}",
                intent.payment_id, intent.expires_at
            ));
            if show_secret {
                if let Some(handle) = payment.payment_handle().await {
                    output::line(format_args!("Publishable key: {}", handle.publishable_key));
                }
                output::line(format_args!(
                    "Client secret: {}",
                    intent.client_secret.expose_secret()
                ));
            }
        }
        PayAction::Confirm { order_id, amount } => {
            // Intents live for one process, so create and confirm together.
            let intent = payment.create_payment_intent(&order_id, amount).await?;
            confirm(state, &intent.payment_id).await?;
        }
    }

    Ok(())
}

async fn confirm(state: &AppState, payment_id: &PaymentId) -> Result<(), CommandError> {
    let payment = state.payment();
    let result = payment.confirm_payment(payment_id).await;
    payment.reset_payment_state().await;

    let confirmation = result?;
    output::line(
        confirmation
            .message
            .as_deref()
            .unwrap_or("Payment completed"),
    );
    Ok(())
}
