use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use shared::{
    domain::{CategoryId, Condition, SortBy},
    protocol::{CategoryGroups, Pagination, Product, ProductListResponse},
};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::{
    debounce::Debouncer,
    filters::{wants_suggestions, ActiveFilter, FilterChange, Filters, PriceRange},
    StorefrontApi,
};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
pub const PRICE_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_SUGGESTION_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub search_debounce: Duration,
    pub price_debounce: Duration,
    pub page_limit: u32,
    pub suggestion_limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            search_debounce: SEARCH_DEBOUNCE,
            price_debounce: PRICE_DEBOUNCE,
            page_limit: crate::filters::DEFAULT_PAGE_LIMIT,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub items: Vec<Product>,
    pub pagination: Pagination,
}

impl From<ProductListResponse> for PageResult {
    fn from(value: ProductListResponse) -> Self {
        Self {
            items: value.products,
            pagination: value.pagination,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionState {
    pub prefix: String,
    pub results: Vec<String>,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationView {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFilterBadge {
    pub filter: ActiveFilter,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Stale,
    Failed,
    Unchanged,
    Rejected,
}

#[derive(Debug, Clone)]
pub enum CatalogEvent {
    FiltersCommitted(Filters),
    ResultsUpdated(PageResult),
    FetchFailed(String),
    SuggestionsUpdated(SuggestionState),
    CategoriesLoaded(CategoryGroups),
}

#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub filters: Filters,
    pub search_input: String,
    pub price_input: PriceRange,
    pub page: Option<PageResult>,
    pub error: Option<String>,
    pub loading: bool,
    pub suggestions: SuggestionState,
    pub categories: CategoryGroups,
    pub categories_error: Option<String>,
}

struct CatalogState {
    filters: Filters,
    search_input: String,
    price_input: PriceRange,
    page: Option<PageResult>,
    error: Option<String>,
    loading: bool,
    suggestions: SuggestionState,
    categories: CategoryGroups,
    categories_error: Option<String>,
    latest_request: u64,
}

pub struct CatalogController {
    api: Arc<dyn StorefrontApi>,
    config: CatalogConfig,
    inner: Mutex<CatalogState>,
    search_debounce: Debouncer<String>,
    price_debounce: Debouncer<PriceRange>,
    events: broadcast::Sender<CatalogEvent>,
}

impl CatalogController {
    /// Must be called inside a tokio runtime: the debounce driver is spawned
    /// here and lives until the controller is dropped.
    pub fn new(api: Arc<dyn StorefrontApi>, config: CatalogConfig) -> Arc<Self> {
        let (search_debounce, search_rx) = Debouncer::new(config.search_debounce);
        let (price_debounce, price_rx) = Debouncer::new(config.price_debounce);
        let (events, _) = broadcast::channel(256);
        let filters = Filters::with_limit(config.page_limit);

        let controller = Arc::new(Self {
            api,
            config,
            inner: Mutex::new(CatalogState {
                filters,
                search_input: String::new(),
                price_input: PriceRange::default(),
                page: None,
                error: None,
                loading: false,
                suggestions: SuggestionState::default(),
                categories: CategoryGroups::default(),
                categories_error: None,
                latest_request: 0,
            }),
            search_debounce,
            price_debounce,
            events,
        });

        tokio::spawn(run_debounce_driver(
            Arc::downgrade(&controller),
            search_rx,
            price_rx,
        ));
        controller
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    pub async fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.inner.lock().await.search_input = text.clone();
        self.search_debounce.push(text);
    }

    pub async fn set_price_range(&self, range: PriceRange) -> PriceRange {
        let clamped = {
            let mut state = self.inner.lock().await;
            let clamped = PriceRange::dragged_from(state.price_input, range);
            state.price_input = clamped;
            clamped
        };
        self.price_debounce.push(clamped);
        clamped
    }

    pub async fn set_condition(&self, condition: Condition) -> FetchOutcome {
        self.update(FilterChange::Condition(condition)).await
    }

    pub async fn set_sort_by(&self, sort_by: SortBy) -> FetchOutcome {
        self.update(FilterChange::SortBy(sort_by)).await
    }

    pub async fn toggle_category(&self, category_id: CategoryId) -> FetchOutcome {
        self.update(FilterChange::ToggleCategory(category_id)).await
    }

    pub async fn remove_filter(&self, filter: ActiveFilter) -> FetchOutcome {
        {
            let mut state = self.inner.lock().await;
            match &filter {
                ActiveFilter::Search(_) => {
                    self.search_debounce.cancel();
                    state.search_input.clear();
                    state.suggestions = SuggestionState::default();
                }
                ActiveFilter::PriceRange(_) => {
                    self.price_debounce.cancel();
                    state.price_input = PriceRange::default();
                }
                ActiveFilter::Condition(_) | ActiveFilter::Category(_) => {}
            }
        }
        self.update(FilterChange::Remove(filter)).await
    }

    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        let total_pages = {
            let state = self.inner.lock().await;
            state
                .page
                .as_ref()
                .map(|result| result.pagination.total_pages)
                .unwrap_or(1)
                .max(1)
        };
        if page < 1 || page > total_pages {
            debug!(page, total_pages, "catalog: page out of range");
            return FetchOutcome::Rejected;
        }
        self.update(FilterChange::Page(page)).await
    }

    pub async fn clear_filters(&self) -> FetchOutcome {
        self.search_debounce.cancel();
        self.price_debounce.cancel();
        {
            let mut state = self.inner.lock().await;
            state.search_input.clear();
            state.price_input = PriceRange::default();
            if state.suggestions != SuggestionState::default() {
                state.suggestions = SuggestionState::default();
                let _ = self
                    .events
                    .send(CatalogEvent::SuggestionsUpdated(SuggestionState::default()));
            }
        }
        match self.commit_with(Filters::cleared).await {
            Some((token, filters)) => self.fetch_catalog(token, filters).await,
            None => FetchOutcome::Unchanged,
        }
    }

    pub async fn apply_filters(&self, filters: Filters) -> FetchOutcome {
        let filters = filters.normalized();
        self.search_debounce.cancel();
        self.price_debounce.cancel();
        {
            let mut state = self.inner.lock().await;
            state.search_input = filters.search_text.clone();
            state.price_input = filters.price_range();
        }
        match self.commit_with(move |_| filters).await {
            Some((token, filters)) => self.fetch_catalog(token, filters).await,
            None => FetchOutcome::Unchanged,
        }
    }

    pub async fn refresh(&self) -> FetchOutcome {
        let (token, filters) = {
            let mut state = self.inner.lock().await;
            state.latest_request += 1;
            state.loading = true;
            (state.latest_request, state.filters.clone())
        };
        self.fetch_catalog(token, filters).await
    }

    pub async fn load_categories(&self) -> FetchOutcome {
        match self.api.list_categories().await {
            Ok(groups) => {
                let mut state = self.inner.lock().await;
                state.categories = groups.clone();
                state.categories_error = None;
                let _ = self.events.send(CatalogEvent::CategoriesLoaded(groups));
                FetchOutcome::Applied
            }
            Err(err) => {
                warn!("catalog: category load failed: {err}");
                self.inner.lock().await.categories_error = Some(err.user_message());
                FetchOutcome::Failed
            }
        }
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        let state = self.inner.lock().await;
        CatalogSnapshot {
            filters: state.filters.clone(),
            search_input: state.search_input.clone(),
            price_input: state.price_input,
            page: state.page.clone(),
            error: state.error.clone(),
            loading: state.loading,
            suggestions: state.suggestions.clone(),
            categories: state.categories.clone(),
            categories_error: state.categories_error.clone(),
        }
    }

    pub async fn filters(&self) -> Filters {
        self.inner.lock().await.filters.clone()
    }

    pub async fn suggestions(&self) -> SuggestionState {
        self.inner.lock().await.suggestions.clone()
    }

    pub async fn active_filters(&self) -> Vec<ActiveFilterBadge> {
        let state = self.inner.lock().await;
        state
            .filters
            .active_filters()
            .into_iter()
            .map(|filter| ActiveFilterBadge {
                label: badge_label(&filter, &state.categories),
                filter,
            })
            .collect()
    }

    pub async fn pagination_view(&self) -> PaginationView {
        let state = self.inner.lock().await;
        let (current_page, total_pages, total_items) = match &state.page {
            Some(result) => (
                result.pagination.current_page.max(1),
                result.pagination.total_pages,
                result.pagination.total_items,
            ),
            None => (state.filters.page, 0, 0),
        };
        PaginationView {
            current_page,
            total_pages,
            total_items,
            has_previous: current_page > 1,
            has_next: current_page < total_pages,
        }
    }

    async fn update(&self, change: FilterChange) -> FetchOutcome {
        match self.commit_with(|filters| filters.apply(change)).await {
            Some((token, filters)) => self.fetch_catalog(token, filters).await,
            None => FetchOutcome::Unchanged,
        }
    }

    async fn commit_with(
        &self,
        next: impl FnOnce(&Filters) -> Filters,
    ) -> Option<(u64, Filters)> {
        let (token, filters) = {
            let mut state = self.inner.lock().await;
            let filters = next(&state.filters);
            if filters == state.filters {
                return None;
            }
            state.filters = filters.clone();
            state.latest_request += 1;
            state.loading = true;
            (state.latest_request, filters)
        };
        debug!(token, page = filters.page, "catalog: filters committed");
        let _ = self
            .events
            .send(CatalogEvent::FiltersCommitted(filters.clone()));
        Some((token, filters))
    }

    async fn fetch_catalog(&self, token: u64, filters: Filters) -> FetchOutcome {
        let result = self.api.list_products(&filters.to_query()).await;

        let mut state = self.inner.lock().await;
        if token != state.latest_request || state.filters != filters {
            debug!(
                token,
                latest = state.latest_request,
                "catalog: dropping stale listing response"
            );
            return FetchOutcome::Stale;
        }
        state.loading = false;

        match result {
            Ok(body) => {
                let page = PageResult::from(body);
                info!(
                    page = page.pagination.current_page,
                    total_pages = page.pagination.total_pages,
                    items = page.items.len(),
                    "catalog: results updated"
                );
                state.page = Some(page.clone());
                state.error = None;
                let _ = self.events.send(CatalogEvent::ResultsUpdated(page));
                FetchOutcome::Applied
            }
            Err(err) => {
                warn!("catalog: listing fetch failed: {err}");
                let message = err.user_message();
                state.error = Some(message.clone());
                let _ = self.events.send(CatalogEvent::FetchFailed(message));
                FetchOutcome::Failed
            }
        }
    }

    async fn commit_search_text(&self, text: String) -> Option<(u64, Filters)> {
        self.commit_with(|filters| filters.apply(FilterChange::SearchText(text)))
            .await
    }

    async fn finish_search_commit(
        &self,
        pending: Option<(u64, Filters)>,
        text: String,
    ) -> FetchOutcome {
        let listing = async {
            match pending {
                Some((token, filters)) => self.fetch_catalog(token, filters).await,
                None => FetchOutcome::Unchanged,
            }
        };
        let (outcome, ()) = futures::join!(listing, self.refresh_suggestions(text));
        outcome
    }

    async fn refresh_suggestions(&self, text: String) {
        let prefix = text.trim().to_string();
        if !wants_suggestions(&prefix) {
            let mut state = self.inner.lock().await;
            if state.suggestions != SuggestionState::default() {
                state.suggestions = SuggestionState::default();
                let _ = self
                    .events
                    .send(CatalogEvent::SuggestionsUpdated(SuggestionState::default()));
            }
            return;
        }

        {
            let mut state = self.inner.lock().await;
            state.suggestions.prefix = prefix.clone();
            state.suggestions.loading = true;
        }

        let result = self
            .api
            .suggestions(&prefix, self.config.suggestion_limit)
            .await;

        let mut state = self.inner.lock().await;
        if state.suggestions.prefix != prefix {
            return;
        }
        state.suggestions.loading = false;
        state.suggestions.results = match result {
            Ok(results) => results,
            Err(err) => {
                debug!("catalog: suggestion lookup failed for '{prefix}': {err}");
                Vec::new()
            }
        };
        let _ = self
            .events
            .send(CatalogEvent::SuggestionsUpdated(state.suggestions.clone()));
    }
}

async fn run_debounce_driver(
    controller: Weak<CatalogController>,
    mut search_rx: mpsc::UnboundedReceiver<String>,
    mut price_rx: mpsc::UnboundedReceiver<PriceRange>,
) {
    loop {
        tokio::select! {
            Some(text) = search_rx.recv() => {
                let Some(controller) = controller.upgrade() else { break };
                let pending = controller.commit_search_text(text.clone()).await;
                tokio::spawn(async move {
                    controller.finish_search_commit(pending, text).await;
                });
            }
            Some(range) = price_rx.recv() => {
                let Some(controller) = controller.upgrade() else { break };
                let pending = controller
                    .commit_with(|filters| filters.apply(FilterChange::PriceRange(range)))
                    .await;
                if let Some((token, filters)) = pending {
                    tokio::spawn(async move {
                        controller.fetch_catalog(token, filters).await;
                    });
                }
            }
            else => break,
        }
    }
    debug!("catalog: debounce driver stopped");
}

fn condition_label(condition: Condition) -> &'static str {
    match condition {
        Condition::None => "Any condition",
        Condition::NewFlower => "New flowers",
        Condition::OldFlower => "Older flowers",
        Condition::LowStock => "Low stock",
    }
}

fn badge_label(filter: &ActiveFilter, categories: &CategoryGroups) -> String {
    match filter {
        ActiveFilter::Search(text) => format!("\"{text}\""),
        ActiveFilter::PriceRange(range) => match (range.min, range.max) {
            (Some(min), Some(max)) => format!("{min} - {max}"),
            (Some(min), None) => format!("from {min}"),
            (None, Some(max)) => format!("up to {max}"),
            (None, None) => "any price".to_string(),
        },
        ActiveFilter::Condition(condition) => condition_label(*condition).to_string(),
        ActiveFilter::Category(id) => categories
            .find(*id)
            .map(|category| category.name.clone())
            .unwrap_or_else(|| format!("category #{id}")),
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
