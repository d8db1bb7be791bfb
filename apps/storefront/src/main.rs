use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    filters::wants_suggestions, CatalogController, CatalogEvent, FetchOutcome, Filters,
    HttpStorefrontApi, Navigator, PaymentReturnResolver, PriceRange, Route, StorefrontApi,
};
use shared::domain::{CategoryId, Condition, SortBy};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(about = "Storefront catalog and payment-return client")]
struct Cli {
    /// Overrides the configured API base URL.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists one page of products for the given filters.
    Browse {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        min_price: Option<u64>,
        #[arg(long)]
        max_price: Option<u64>,
        #[arg(long, value_enum)]
        condition: Option<ConditionArg>,
        #[arg(long = "category")]
        categories: Vec<i64>,
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Categories,
    /// Prints autocomplete suggestions for a search prefix.
    Suggest { prefix: String },
    /// Resolves a payment gateway return URL or query string.
    PaymentReturn { redirect: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConditionArg {
    NewFlower,
    OldFlower,
    LowStock,
}

impl From<ConditionArg> for Condition {
    fn from(value: ConditionArg) -> Self {
        match value {
            ConditionArg::NewFlower => Condition::NewFlower,
            ConditionArg::OldFlower => Condition::OldFlower,
            ConditionArg::LowStock => Condition::LowStock,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    BestSelling,
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl From<SortArg> for SortBy {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::BestSelling => SortBy::BestSelling,
            SortArg::Newest => SortBy::Newest,
            SortArg::PriceAsc => SortBy::PriceAsc,
            SortArg::PriceDesc => SortBy::PriceDesc,
            SortArg::NameAsc => SortBy::NameAsc,
            SortArg::NameDesc => SortBy::NameDesc,
        }
    }
}

struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, route: Route) {
        println!("navigate -> {}", route.path());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config)?;
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    info!(api = %settings.api_base_url, "storefront: starting");

    let api: Arc<dyn StorefrontApi> = Arc::new(
        HttpStorefrontApi::with_timeout(&settings.api_base_url, settings.request_timeout())
            .context("failed to build storefront api client")?,
    );

    match cli.command {
        Command::Browse {
            search,
            min_price,
            max_price,
            condition,
            categories,
            sort,
            page,
        } => {
            let catalog = CatalogController::new(api, settings.catalog_config());
            catalog.load_categories().await;

            let range = PriceRange::dragged_from(
                PriceRange::default(),
                PriceRange::new(min_price, max_price),
            );
            let mut filters = Filters::with_limit(settings.page_limit);
            filters.search_text = search.unwrap_or_default();
            filters.min_price = range.min;
            filters.max_price = range.max;
            filters.condition = condition.map(Condition::from).unwrap_or_default();
            filters.category_ids = categories.into_iter().map(CategoryId).collect();
            filters.sort_by = sort.map(SortBy::from).unwrap_or_default();

            let outcome = match catalog.apply_filters(filters).await {
                FetchOutcome::Unchanged => catalog.refresh().await,
                other => other,
            };
            if outcome == FetchOutcome::Applied && page > 1 {
                catalog.set_page(page).await;
            }
            print_catalog(&catalog).await;
        }
        Command::Categories => {
            let groups = api.list_categories().await?;
            println!("flower types:");
            for category in &groups.flower_type {
                println!("  {:>4}  {}", category.id, category.name);
            }
            println!("occasions:");
            for category in &groups.occasion {
                println!("  {:>4}  {}", category.id, category.name);
            }
        }
        Command::Suggest { prefix } => {
            if !wants_suggestions(&prefix) {
                println!("prefix too short for suggestions");
                return Ok(());
            }
            let catalog = CatalogController::new(api, settings.catalog_config());
            let mut events = catalog.subscribe_events();
            catalog.set_search_text(prefix).await;

            let wait = catalog.config().search_debounce + settings.request_timeout();
            let suggestions = tokio::time::timeout(wait, async {
                while let Ok(event) = events.recv().await {
                    if let CatalogEvent::SuggestionsUpdated(state) = event {
                        if !state.loading {
                            return state.results;
                        }
                    }
                }
                Vec::new()
            })
            .await
            .unwrap_or_default();

            if suggestions.is_empty() {
                println!("no suggestions");
            }
            for suggestion in suggestions {
                println!("{suggestion}");
            }
        }
        Command::PaymentReturn { redirect } => {
            let resolver = PaymentReturnResolver::new(api, Arc::new(PrintNavigator));
            let state = resolver.resolve(&redirect).await;
            println!("payment state: {state:?}");
        }
    }

    Ok(())
}

async fn print_catalog(catalog: &CatalogController) {
    let snapshot = catalog.snapshot().await;
    if let Some(error) = &snapshot.error {
        println!("error: {error}");
    }

    let badges = catalog.active_filters().await;
    if !badges.is_empty() {
        let labels: Vec<&str> = badges.iter().map(|badge| badge.label.as_str()).collect();
        println!("filters: {}", labels.join(", "));
    }

    let Some(page) = snapshot.page else {
        println!("no results loaded");
        return;
    };
    for product in &page.items {
        let price = product.sale_price.unwrap_or(product.price);
        println!("{:>6}  {:<40} {:>12}", product.id, product.name, price);
    }

    let view = catalog.pagination_view().await;
    println!(
        "page {}/{} ({} items)",
        view.current_page, view.total_pages, view.total_items
    );
}
