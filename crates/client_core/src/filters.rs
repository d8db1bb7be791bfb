use std::collections::BTreeSet;

use shared::{
    domain::{CategoryId, Condition, SortBy},
    protocol::ProductListQuery,
};

pub const DEFAULT_PAGE_LIMIT: u32 = 12;

pub const SUGGESTION_MIN_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl PriceRange {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self { min, max }
    }

    /// Resolves a slider edit so that `min <= max` holds afterwards. The
    /// handle that moved relative to `previous` pushes the other one.
    pub fn dragged_from(previous: PriceRange, next: PriceRange) -> PriceRange {
        match (next.min, next.max) {
            (Some(min), Some(max)) if min > max => {
                if next.min != previous.min {
                    PriceRange::new(Some(min), Some(min))
                } else {
                    PriceRange::new(Some(max), Some(max))
                }
            }
            _ => next,
        }
    }

    fn normalized(self) -> PriceRange {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => PriceRange::new(Some(min), Some(min)),
            _ => self,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub search_text: String,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub condition: Condition,
    pub category_ids: BTreeSet<CategoryId>,
    pub sort_by: SortBy,
    pub page: u32,
    pub limit: u32,
}

impl Default for Filters {
    fn default() -> Self {
        Self::with_limit(DEFAULT_PAGE_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveFilter {
    Search(String),
    PriceRange(PriceRange),
    Condition(Condition),
    Category(CategoryId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    SearchText(String),
    PriceRange(PriceRange),
    Condition(Condition),
    SortBy(SortBy),
    ToggleCategory(CategoryId),
    Page(u32),
    Remove(ActiveFilter),
}

impl Filters {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            search_text: String::new(),
            min_price: None,
            max_price: None,
            condition: Condition::None,
            category_ids: BTreeSet::new(),
            sort_by: SortBy::default(),
            page: 1,
            limit: limit.max(1),
        }
    }

    pub fn price_range(&self) -> PriceRange {
        PriceRange::new(self.min_price, self.max_price)
    }

    pub fn normalized(mut self) -> Filters {
        let range = self.price_range().normalized();
        self.min_price = range.min;
        self.max_price = range.max;
        self.page = self.page.max(1);
        self.limit = self.limit.max(1);
        self
    }

    pub fn cleared(&self) -> Filters {
        Filters::with_limit(self.limit)
    }

    /// Returns the filters after `change`. Any change other than
    /// [`FilterChange::Page`] that alters the filters puts the result on
    /// page 1.
    pub fn apply(&self, change: FilterChange) -> Filters {
        let mut next = self.clone();
        let resets_page = !matches!(change, FilterChange::Page(_));

        match change {
            FilterChange::SearchText(text) => next.search_text = text,
            FilterChange::PriceRange(range) => {
                let range = range.normalized();
                next.min_price = range.min;
                next.max_price = range.max;
            }
            FilterChange::Condition(condition) => next.condition = condition,
            FilterChange::SortBy(sort_by) => next.sort_by = sort_by,
            FilterChange::ToggleCategory(id) => {
                if !next.category_ids.remove(&id) {
                    next.category_ids.insert(id);
                }
            }
            FilterChange::Page(page) => next.page = page.max(1),
            FilterChange::Remove(filter) => match filter {
                ActiveFilter::Search(_) => next.search_text.clear(),
                ActiveFilter::PriceRange(_) => {
                    next.min_price = None;
                    next.max_price = None;
                }
                ActiveFilter::Condition(_) => next.condition = Condition::None,
                ActiveFilter::Category(id) => {
                    next.category_ids.remove(&id);
                }
            },
        }

        if resets_page && next != *self {
            next.page = 1;
        }
        next
    }

    pub fn category_ids_param(&self) -> Option<String> {
        if self.category_ids.is_empty() {
            return None;
        }
        Some(
            self.category_ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    pub fn to_query(&self) -> ProductListQuery {
        let search = self.search_text.trim();
        ProductListQuery {
            q: (!search.is_empty()).then(|| search.to_string()),
            min_price: self.min_price,
            max_price: self.max_price,
            condition: self.condition.as_query_value().map(str::to_string),
            category_ids: self.category_ids_param(),
            sort_by: self.sort_by.as_query_value().to_string(),
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn active_filters(&self) -> Vec<ActiveFilter> {
        let mut active = Vec::new();
        let search = self.search_text.trim();
        if !search.is_empty() {
            active.push(ActiveFilter::Search(search.to_string()));
        }
        let range = self.price_range();
        if !range.is_unbounded() {
            active.push(ActiveFilter::PriceRange(range));
        }
        if self.condition != Condition::None {
            active.push(ActiveFilter::Condition(self.condition));
        }
        active.extend(self.category_ids.iter().copied().map(ActiveFilter::Category));
        active
    }
}

pub fn wants_suggestions(text: &str) -> bool {
    text.trim().chars().count() >= SUGGESTION_MIN_CHARS
}
