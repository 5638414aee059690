use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use browse_forward::app::AppContext;
use browse_forward::cli::commands::{self, FetchArgs};
use browse_forward::cli::{ApiAction, Cli, Commands, PrefsAction};
use browse_forward::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config, cli.db)?;

    match cli.command {
        Commands::Fetch {
            category,
            subcategory,
            source,
            tags,
            sort,
            limit,
        } => {
            let args = FetchArgs {
                category,
                subcategory,
                source,
                tags,
                sort,
                limit,
            };
            commands::fetch(&ctx, args).await?;
        }
        Commands::Feed {
            category,
            subcategory,
            limit,
        } => {
            commands::feed(&ctx, category.as_deref(), subcategory.as_deref(), limit).await?;
        }
        Commands::Categories { tags } => {
            commands::categories(&ctx, tags).await?;
        }
        Commands::Subcategories { category } => {
            commands::subcategories(&ctx, &category).await?;
        }
        Commands::Next { count, open } => {
            commands::next(&ctx, count, open).await?;
        }
        Commands::Preload { url, count } => {
            commands::preload(&ctx, url, count).await?;
        }
        Commands::Prefs { action } => match action {
            PrefsAction::Show => commands::show_preferences(&ctx)?,
            PrefsAction::Add {
                category,
                subcategory,
            } => commands::add_preference(&ctx, &category, subcategory.as_deref())?,
            PrefsAction::Remove { category } => commands::remove_preference(&ctx, &category)?,
            PrefsAction::Clear => commands::clear_preferences(&ctx)?,
        },
        Commands::Api { action } => match action {
            ApiAction::Categories => commands::api_categories(&ctx).await?,
            ApiAction::Subcategories { category } => {
                commands::api_subcategories(&ctx, &category).await?
            }
            ApiAction::Feed {
                category,
                subcategory,
                limit,
            } => {
                commands::api_feed(&ctx, category.as_deref(), subcategory.as_deref(), limit)
                    .await?
            }
            ApiAction::Source { source, limit } => {
                commands::api_source(&ctx, &source, limit).await?
            }
            ApiAction::Search { query, limit } => commands::api_search(&ctx, &query, limit).await?,
        },
    }

    Ok(())
}
