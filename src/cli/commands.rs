use std::sync::Arc;

use tracing::warn;

use crate::app::{AppContext, BrowseError, Result};
use crate::content::api::ApiItems;
use crate::domain::{display_url, ContentItem, ContentQuery, FeedItem, SortHint};
use crate::feed::UrlSource;
use crate::preload::PreloadState;
use crate::renderer::{ChromeRendererFactory, RendererFactory};

pub struct FetchArgs {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub sort: SortHint,
    pub limit: u32,
}

pub async fn fetch(ctx: &AppContext, args: FetchArgs) -> Result<()> {
    let mut query = ContentQuery::with_limit(args.limit).sort(args.sort);
    if let Some(category) = args.category {
        query = query.category(category);
    }
    if let Some(subcategory) = args.subcategory {
        query = query.subcategory(subcategory);
    }
    if let Some(source) = args.source {
        query = query.source(source);
    }
    if !args.tags.is_empty() {
        query = query.tags(args.tags.iter().map(|t| t.to_lowercase()));
    }

    match ctx.service.fetch_with_query(&query).await {
        Ok(items) => print_content_items(&items),
        Err(BrowseError::NoItemsFound) => println!("No items found"),
        Err(e) => return Err(e),
    }
    Ok(())
}

pub async fn feed(
    ctx: &AppContext,
    category: Option<&str>,
    subcategory: Option<&str>,
    limit: u32,
) -> Result<()> {
    match ctx
        .service
        .fetch_feed_items(category, subcategory, true, limit)
        .await
    {
        Ok(items) => print_feed_items(&items),
        Err(BrowseError::NoItemsFound) => println!("No items found"),
        Err(e) => return Err(e),
    }
    Ok(())
}

pub async fn categories(ctx: &AppContext, from_tags: bool) -> Result<()> {
    let categories = if from_tags {
        ctx.service.bf_category_tags().await?
    } else {
        ctx.service.available_categories().await?
    };

    if categories.is_empty() {
        println!("No categories");
    }
    for category in categories {
        println!("{}", category);
    }
    Ok(())
}

pub async fn subcategories(ctx: &AppContext, category: &str) -> Result<()> {
    let subcategories = ctx.service.subcategories(category).await?;
    if subcategories.is_empty() {
        println!("No subcategories for {}", category);
    }
    for subcategory in subcategories {
        println!("{}", subcategory);
    }
    Ok(())
}

pub async fn next(ctx: &AppContext, count: usize, open_in_browser: bool) -> Result<()> {
    for _ in 0..count {
        let url = ctx.feed.next_url().await?;
        println!("{}", url);

        if open_in_browser {
            if let Err(e) = open::that(&url) {
                warn!("Failed to open {}: {}", display_url(&url), e);
            }
        }
    }
    Ok(())
}

pub async fn preload(ctx: &AppContext, url: Option<String>, count: usize) -> Result<()> {
    let factory: Arc<dyn RendererFactory> =
        Arc::new(ChromeRendererFactory::launch(ctx.config.renderer.clone()).await?);
    let pipeline = ctx.preload_pipeline(factory);

    if let Some(url) = url {
        pipeline.enqueue(url);
    }

    for _ in 0..count {
        match pipeline.preload_next().await {
            PreloadState::Ready { url } => {
                println!("Ready: {}", url);
                pipeline.consume(&url);
            }
            PreloadState::Failed { url, reason } => {
                println!("Failed: {} ({})", url, reason);
                pipeline.discard();
            }
            other => println!("{}", other),
        }
    }

    println!("{}", pipeline.stats());
    pipeline.shutdown();
    Ok(())
}

pub fn show_preferences(ctx: &AppContext) -> Result<()> {
    let prefs = ctx.feed.preferences();
    if prefs.is_default_mode() {
        println!("All categories (default mode)");
        return Ok(());
    }

    for category in &prefs.selected_categories {
        match prefs.selected_subcategories.get(category) {
            Some(subs) if !subs.is_empty() => {
                let subs: Vec<&str> = subs.iter().map(String::as_str).collect();
                println!("{}: {}", category, subs.join(", "));
            }
            _ => println!("{}", category),
        }
    }
    println!("Last updated: {}", prefs.last_updated.format("%Y-%m-%d %H:%M"));
    Ok(())
}

pub fn add_preference(ctx: &AppContext, category: &str, subcategory: Option<&str>) -> Result<()> {
    let mut prefs = ctx.feed.preferences();
    match subcategory {
        Some(subcategory) => prefs.select_subcategory(category, subcategory),
        None => prefs.select_category(category),
    }
    ctx.feed.save_preferences(&prefs)?;
    println!("Selected {}", category);
    Ok(())
}

pub fn remove_preference(ctx: &AppContext, category: &str) -> Result<()> {
    let mut prefs = ctx.feed.preferences();
    if !prefs.remove_category(category) {
        println!("{} was not selected", category);
        return Ok(());
    }
    ctx.feed.save_preferences(&prefs)?;
    println!("Removed {}", category);
    Ok(())
}

pub fn clear_preferences(ctx: &AppContext) -> Result<()> {
    let mut prefs = ctx.feed.preferences();
    prefs.clear();
    ctx.feed.save_preferences(&prefs)?;
    println!("Preferences cleared");
    Ok(())
}

pub async fn api_categories(ctx: &AppContext) -> Result<()> {
    for category in ctx.api.categories().await? {
        println!("{}", category);
    }
    Ok(())
}

pub async fn api_subcategories(ctx: &AppContext, category: &str) -> Result<()> {
    for subcategory in ctx.api.subcategories(category).await? {
        println!("{}", subcategory);
    }
    Ok(())
}

pub async fn api_feed(
    ctx: &AppContext,
    category: Option<&str>,
    subcategory: Option<&str>,
    limit: u32,
) -> Result<()> {
    let ApiItems { items, count, .. } = ctx
        .api
        .feed_items(category, subcategory, true, limit)
        .await?;
    print_feed_items(&items);
    if let Some(count) = count {
        println!("{} of {} items", items.len(), count);
    }
    Ok(())
}

pub async fn api_source(ctx: &AppContext, source: &str, limit: u32) -> Result<()> {
    print_feed_items(&ctx.api.by_source(source, limit).await?);
    Ok(())
}

pub async fn api_search(ctx: &AppContext, query: &str, limit: u32) -> Result<()> {
    let items = ctx.api.search(query, limit).await?;
    if items.is_empty() {
        println!("No results");
    }
    print_feed_items(&items);
    Ok(())
}

fn print_content_items(items: &[ContentItem]) {
    for item in items {
        let category = item.bf_category.as_deref().unwrap_or(&item.category);
        println!(
            "[{}] {} ({} upvotes)",
            category,
            item.display_title(),
            item.upvotes
        );
        println!("    {}", item.url);
    }
}

fn print_feed_items(items: &[FeedItem]) {
    for item in items {
        let category = item.bf_category.as_deref().unwrap_or(&item.category);
        println!("[{}] {}", category, item.display_title());
        println!("    {}", item.url);
    }
}
