//! `tn-cli cart ...`

use clap::Subcommand;

use tetranoma_client::AppState;
use tetranoma_client::models::{CartSnapshot, CheckoutDetails, ShippingAddress};
use tetranoma_core::{FigureId, PaymentId};

use super::{CommandError, require_session};
use crate::output;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the open cart
    Show,
    /// Add a figure
    Add {
        figure_id: FigureId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a figure's line
    Remove { figure_id: FigureId },
    /// Place the order
    Checkout {
        /// Payment id from `tn-cli pay create`
        #[arg(long)]
        payment_id: Option<PaymentId>,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        street: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        postal_code: Option<String>,

        #[arg(long)]
        country: Option<String>,
    },
}

pub async fn run(state: &AppState, action: CartAction) -> Result<(), CommandError> {
    require_session(state).await?;
    let cart = state.cart();

    match action {
        CartAction::Show => {
            cart.get_cart().await?;
            print_cart(&cart.snapshot().await);
        }
        CartAction::Add {
            figure_id,
            quantity,
        } => print_cart(&cart.add_to_cart(&figure_id, quantity).await?),
        CartAction::Remove { figure_id } => print_cart(&cart.remove_from_cart(&figure_id).await?),
        CartAction::Checkout {
            payment_id,
            full_name,
            street,
            city,
            postal_code,
            country,
        } => {
            let shipping_address = full_name.map(|full_name| ShippingAddress {
                full_name,
                street: street.unwrap_or_default(),
                city: city.unwrap_or_default(),
                postal_code: postal_code.unwrap_or_default(),
                country: country.unwrap_or_default(),
            });
            let receipt = cart
                .checkout(&CheckoutDetails {
                    payment_id,
                    shipping_address,
                })
                .await?;
            match receipt.order {
                Some(order) => output::line(format_args!(
                    "Order {} placed ({}, {})",
                    order.id, order.total_price, order.status
                )),
                None => output::line(receipt.message.as_deref().unwrap_or("Order placed")),
            }
        }
    }

    Ok(())
}

fn print_cart(cart: &CartSnapshot) {
    if cart.is_empty() {
        output::line("Cart is empty");
        return;
    }
    for line in &cart.items {
        output::line(format_args!(
            "{} x{} @ {}",
            line.figure_id, line.quantity, line.unit_price
        ));
    }
    output::line(format_args!(
        "{} items, total {}",
        cart.item_count(),
        cart.total_price
    ));
}
