use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ProductId);
id_newtype!(CategoryId);
id_newtype!(OrderId);

/// Stock/freshness condition filter understood by `GET /products`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    None,
    NewFlower,
    OldFlower,
    LowStock,
}

impl Condition {
    /// Query value for the listing endpoint; `None` means "no filter".
    pub fn as_query_value(self) -> Option<&'static str> {
        match self {
            Condition::None => None,
            Condition::NewFlower => Some("new_flower"),
            Condition::OldFlower => Some("old_flower"),
            Condition::LowStock => Some("low_stock"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    BestSelling,
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortBy {
    pub fn as_query_value(self) -> &'static str {
        match self {
            SortBy::BestSelling => "best_selling",
            SortBy::Newest => "newest",
            SortBy::PriceAsc => "price_asc",
            SortBy::PriceDesc => "price_desc",
            SortBy::NameAsc => "name_asc",
            SortBy::NameDesc => "name_desc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_condition_has_no_query_value() {
        assert_eq!(Condition::None.as_query_value(), None);
        assert_eq!(Condition::LowStock.as_query_value(), Some("low_stock"));
    }

    #[test]
    fn sort_query_values_match_serde_names() {
        for sort in [
            SortBy::BestSelling,
            SortBy::Newest,
            SortBy::PriceAsc,
            SortBy::PriceDesc,
            SortBy::NameAsc,
            SortBy::NameDesc,
        ] {
            let json = serde_json::to_string(&sort).expect("serialize");
            assert_eq!(json, format!("\"{}\"", sort.as_query_value()));
        }
    }
}
