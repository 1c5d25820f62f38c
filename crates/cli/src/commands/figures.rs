//! `tn-cli figures ...`

use clap::{Args, Subcommand};

use tetranoma_client::AppState;
use tetranoma_client::models::{FigureFilters, FigureInput};
use tetranoma_core::{FigureId, Price, SortOrder};

use super::{CommandError, require_session};
use crate::output;

#[derive(Subcommand)]
pub enum FiguresAction {
    /// List one page of the catalog
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show one figure
    Show { id: FigureId },
    /// Toggle your favorite on a figure
    Favorite { id: FigureId },
    /// List your favorites
    Favorites,
    /// List the figures you sell
    Mine,
    /// List a new figure for sale
    Create {
        #[command(flatten)]
        input: FigureArgs,
    },
    /// Edit one of your figures
    Update {
        id: FigureId,

        #[command(flatten)]
        input: FigureArgs,
    },
    /// Delete one of your figures
    Delete { id: FigureId },
}

#[derive(Args)]
pub struct FilterArgs {
    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    min_price: Option<Price>,

    #[arg(long)]
    max_price: Option<Price>,

    #[arg(long)]
    min_rating: Option<f64>,

    #[arg(long)]
    sort_by: Option<String>,

    /// `asc` or `desc`
    #[arg(long)]
    sort_order: Option<SortOrder>,
}

impl From<FilterArgs> for FigureFilters {
    fn from(args: FilterArgs) -> Self {
        Self {
            category: args.category,
            title: args.title,
            min_price: args.min_price,
            max_price: args.max_price,
            min_rating: args.min_rating,
            sort_by: args.sort_by,
            sort_order: args.sort_order,
        }
    }
}

#[derive(Args)]
pub struct FigureArgs {
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    price: Option<Price>,

    #[arg(long)]
    image_url: Option<String>,

    #[arg(long)]
    stock: Option<u32>,
}

impl From<FigureArgs> for FigureInput {
    fn from(args: FigureArgs) -> Self {
        Self {
            title: args.title,
            description: args.description,
            category: args.category,
            price: args.price,
            image_url: args.image_url,
            stock: args.stock,
        }
    }
}

pub async fn run(state: &AppState, action: FiguresAction) -> Result<(), CommandError> {
    let catalog = state.catalog();

    match action {
        FiguresAction::List { page, filters } => {
            let page = catalog.get_figures(page, Some(filters.into())).await?;
            for figure in &page.figures {
                output::line(format_args!("{}  {}  {}", figure.id, figure.price, figure.title));
            }
            let pagination = catalog.pagination().await;
            output::line(format_args!(
                "Page {}/{} ({} figures)",
                pagination.current_page, pagination.total_pages, pagination.total_items
            ));
        }
        FiguresAction::Show { id } => {
            output::json(&catalog.get_figure_by_id(&id).await?)?;
        }
        FiguresAction::Favorite { id } => {
            require_session(state).await?;
            let toggle = catalog.toggle_favorite(&id).await?;
            output::line(if toggle.is_favorite {
                "Added to favorites"
            } else {
                "Removed from favorites"
            });
        }
        FiguresAction::Favorites => {
            require_session(state).await?;
            output::json(&catalog.get_favorites().await?)?;
        }
        FiguresAction::Mine => {
            require_session(state).await?;
            output::json(&catalog.get_my_figures().await?)?;
        }
        FiguresAction::Create { input } => {
            require_session(state).await?;
            output::json(&catalog.create_figure(&input.into()).await?)?;
        }
        FiguresAction::Update { id, input } => {
            require_session(state).await?;
            output::json(&catalog.update_figure(&id, &input.into()).await?)?;
        }
        FiguresAction::Delete { id } => {
            require_session(state).await?;
            catalog.delete_figure(&id).await?;
            output::line(format_args!("Deleted {id}"));
        }
    }

    Ok(())
}
