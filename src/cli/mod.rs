pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::SortHint;

#[derive(Parser)]
#[command(name = "browse-forward")]
#[command(about = "An endless stream of curated web pages", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/browse-forward/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Preferences database
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch full items from the document store
    Fetch {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        subcategory: Option<String>,
        #[arg(long)]
        source: Option<String>,
        /// Comma-separated tags; every tag must match
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// popularity, recent or title
        #[arg(long, default_value = "popularity")]
        sort: SortHint,
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    /// Fetch lightweight feed items
    Feed {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        subcategory: Option<String>,
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    /// List categories with active content
    Categories {
        /// Read categories from bf-category tags instead
        #[arg(long)]
        tags: bool,
    },
    /// List subcategories of a category
    Subcategories { category: String },
    /// Draw the next pages from the discovery feed
    Next {
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        /// Open each page in the system browser
        #[arg(long)]
        open: bool,
    },
    /// Preload pages in a headless browser and report the outcome
    Preload {
        /// Preload this URL instead of drawing from the feed
        #[arg(long)]
        url: Option<String>,
        /// Number of consecutive cycles
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Show or change category preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Query the REST content API
    Api {
        #[command(subcommand)]
        action: ApiAction,
    },
}

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print the saved preferences
    Show,
    /// Select a category, optionally narrowed to a subcategory
    Add {
        category: String,
        #[arg(long)]
        subcategory: Option<String>,
    },
    /// Remove a category from the selection
    Remove { category: String },
    /// Go back to all content
    Clear,
}

#[derive(Subcommand)]
pub enum ApiAction {
    Categories,
    Subcategories {
        category: String,
    },
    Feed {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        subcategory: Option<String>,
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    Source {
        source: String,
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    Search {
        query: String,
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
}
