//! Tetranoma CLI - drive the marketplace stores from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from TETRANOMA_PASSWORD or prompt flag)
//! tn-cli auth sign-in -e misato@nerv.jp --password hunter2
//!
//! # Browse the catalog
//! tn-cli figures list --category anime --sort-by price --sort-order asc
//!
//! # Cart and checkout
//! tn-cli cart add 665f0c1a --quantity 2
//! tn-cli cart checkout --payment-id pi_123
//!
//! # Check what the route guard would do
//! tn-cli route check --admin
//! ```
//!
//! # Commands
//!
//! - `auth` - Sign in/out, register, show or edit the profile
//! - `figures` - Browse, favorite and manage figures
//! - `cart` - Show and change the cart, check out
//! - `pay` - Create and confirm payment intents
//! - `admin` - Back-office users, orders and statistics
//! - `route` - Evaluate the route guard against the cached session
//!
//! The session is persisted in `TETRANOMA_SESSION_FILE` between runs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tetranoma_client::{AppState, ClientConfig};

mod commands;
mod output;

use commands::{
    AdminAction, AuthAction, CartAction, CommandError, FiguresAction, PayAction, RouteAction,
};

#[derive(Parser)]
#[command(name = "tn-cli")]
#[command(author, version, about = "Tetranoma marketplace CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account and session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Catalog browsing and figure management
    Figures {
        #[command(subcommand)]
        action: FiguresAction,
    },
    /// Shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Payment intents
    Pay {
        #[command(subcommand)]
        action: PayAction,
    },
    /// Back-office (admin role required by the server)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Route guard
    Route {
        #[command(subcommand)]
        action: RouteAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = ClientConfig::from_env().expect("Failed to load configuration");

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tetranoma_client=info,tetranoma_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CommandError> {
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Auth { action } => commands::auth::run(&state, action).await,
        Commands::Figures { action } => commands::figures::run(&state, action).await,
        Commands::Cart { action } => commands::cart::run(&state, action).await,
        Commands::Pay { action } => commands::pay::run(&state, action).await,
        Commands::Admin { action } => commands::admin::run(&state, action).await,
        Commands::Route { action } => commands::route::run(&state, action).await,
    }
}
