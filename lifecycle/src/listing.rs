//! Listing projection: pagination, search, sort and filters composed into a
//! single list query, plus the loaded page it produced.
//!
//! Any change other than a page jump resets `page` to 1. Each load carries a
//! generation number; a response whose generation is not the latest one
//! issued is dropped.

use crate::types::{OrderStatus, Pagination, PaymentStatus, PayoutStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows per page when none is chosen
pub const DEFAULT_LIMIT: u32 = 10;

/// Field the backend sorts on when none is chosen
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Sort direction (`order=asc|desc` on the wire)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Oldest / smallest first
    Asc,
    /// Newest / largest first
    #[default]
    Desc,
}

impl SortDirection {
    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{other}' (expected asc or desc)")),
        }
    }
}

/// Entity-specific filters of a list query
pub trait ListFilters: Clone + Default + PartialEq + Send + Sync + 'static {
    /// Query-string pairs for the filters that are set
    fn query_pairs(&self) -> Vec<(&'static str, String)>;
}

/// Filters of the orders list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderFilters {
    /// Only orders with this status
    pub status: Option<OrderStatus>,
}

impl ListFilters for OrderFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.status
            .map(|status| ("status", status.as_str().to_string()))
            .into_iter()
            .collect()
    }
}

/// Filters of the payments list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaymentFilters {
    /// Only payments with this transaction status
    pub status: Option<PaymentStatus>,
    /// Only payments with this payout status
    pub payout_status: Option<PayoutStatus>,
}

impl ListFilters for PaymentFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(payout) = self.payout_status {
            pairs.push(("payoutStatus", payout.as_str().to_string()));
        }
        pairs
    }
}

/// A list query against one of the admin list endpoints
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery<F> {
    /// Page number (1-based)
    pub page: u32,
    /// Rows per page
    pub limit: u32,
    /// Free-text search, omitted from the query string when empty
    pub search: String,
    /// Entity-specific filters
    pub filters: F,
    /// Field to sort on
    pub sort_by: String,
    /// Sort direction
    pub order: SortDirection,
}

/// Query for `GET /api/admin/orders`
pub type OrderQuery = ListQuery<OrderFilters>;

/// Query for `GET /api/admin/payments`
pub type PaymentQuery = ListQuery<PaymentFilters>;

impl<F: Default> Default for ListQuery<F> {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            search: String::new(),
            filters: F::default(),
            sort_by: DEFAULT_SORT_FIELD.to_string(),
            order: SortDirection::default(),
        }
    }
}

/// One operator edit of a list query
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryChange<F> {
    /// Jump to a page
    Page(u32),
    /// Change rows per page
    Limit(u32),
    /// Change the search text
    Search(String),
    /// Replace the filters
    Filters(F),
    /// Change the sort field and direction
    Sort {
        /// Field to sort on
        by: String,
        /// Direction
        order: SortDirection,
    },
}

impl<F: ListFilters> ListQuery<F> {
    /// Applies `change`, resetting to the first page unless the change is a
    /// page jump.
    #[must_use]
    pub fn apply(self, change: QueryChange<F>) -> Self {
        match change {
            QueryChange::Page(page) => Self {
                page: page.max(1),
                ..self
            },
            QueryChange::Limit(limit) => Self {
                limit: limit.max(1),
                page: 1,
                ..self
            },
            QueryChange::Search(search) => Self {
                search,
                page: 1,
                ..self
            },
            QueryChange::Filters(filters) => Self {
                filters,
                page: 1,
                ..self
            },
            QueryChange::Sort { by, order } => Self {
                sort_by: by,
                order,
                page: 1,
                ..self
            },
        }
    }

    /// Query-string pairs in the order the backend documents them
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];

        let search = self.search.trim();
        if !search.is_empty() {
            pairs.push(("search", search.to_string()));
        }

        pairs.extend(self.filters.query_pairs());

        if !self.sort_by.is_empty() {
            pairs.push(("sortBy", self.sort_by.clone()));
        }
        pairs.push(("order", self.order.as_str().to_string()));
        pairs
    }
}

/// The current page of a list screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing<T, F> {
    /// Query that produced (or is producing) `rows`
    pub query: ListQuery<F>,
    /// Rows of the last accepted page
    pub rows: Vec<T>,
    /// Cursor of the last accepted page
    pub pagination: Pagination,
    /// A load is in flight
    pub loading: bool,
    generation: u64,
}

impl<T, F: Default> Default for Listing<T, F> {
    fn default() -> Self {
        Self {
            query: ListQuery::default(),
            rows: Vec::new(),
            pagination: Pagination::default(),
            loading: false,
            generation: 0,
        }
    }
}

impl<T, F: ListFilters> Listing<T, F> {
    /// Generation of the most recently issued load
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Marks a new load as issued and returns its generation.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.generation
    }

    /// Accepts a loaded page if it answers the latest load.
    ///
    /// Returns `false` (and changes nothing) for a stale response.
    pub fn accept(&mut self, generation: u64, rows: Vec<T>, pagination: Pagination) -> bool {
        if generation != self.generation {
            return false;
        }
        self.rows = rows;
        self.pagination = pagination;
        self.loading = false;
        true
    }

    /// Records a failed load; stale failures are ignored like stale pages.
    pub fn fail(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading = false;
        true
    }

    /// Replaces the row matching `is_target` with `next`.
    ///
    /// Returns `false` when the row is no longer on the page.
    pub fn replace_row(&mut self, is_target: impl Fn(&T) -> bool, next: T) -> bool {
        match self.rows.iter_mut().find(|row| is_target(row)) {
            Some(row) => {
                *row = next;
                true
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn change() -> impl Strategy<Value = QueryChange<PaymentFilters>> {
        prop_oneof![
            (1u32..50).prop_map(QueryChange::Limit),
            "[a-z ]{0,8}".prop_map(QueryChange::Search),
            prop::option::of(prop::sample::select(PaymentStatus::ALL.to_vec())).prop_map(
                |status| QueryChange::Filters(PaymentFilters {
                    status,
                    payout_status: None,
                })
            ),
            any::<bool>().prop_map(|asc| QueryChange::Sort {
                by: "amount".to_string(),
                order: if asc { SortDirection::Asc } else { SortDirection::Desc },
            }),
        ]
    }

    proptest! {
        #[test]
        fn every_non_page_change_resets_to_first_page(page in 1u32..100, change in change()) {
            let query = PaymentQuery::default().apply(QueryChange::Page(page));
            prop_assert_eq!(query.page, page);
            prop_assert_eq!(query.apply(change).page, 1);
        }
    }

    #[test]
    fn default_query_string_omits_empty_search_and_unset_filters() {
        let pairs = OrderQuery::default().to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page", "1".to_string()),
                ("limit", "10".to_string()),
                ("sortBy", "createdAt".to_string()),
                ("order", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn filters_use_bit_exact_status_strings() {
        let query = OrderQuery::default()
            .apply(QueryChange::Search("  logo design ".to_string()))
            .apply(QueryChange::Filters(OrderFilters {
                status: Some(OrderStatus::InProgress),
            }));
        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("search", "logo design".to_string())));
        assert!(pairs.contains(&("status", "in_progress".to_string())));

        let payments = PaymentQuery::default().apply(QueryChange::Filters(PaymentFilters {
            status: Some(PaymentStatus::Succeeded),
            payout_status: Some(PayoutStatus::Pending),
        }));
        let pairs = payments.to_query_pairs();
        assert!(pairs.contains(&("status", "succeeded".to_string())));
        assert!(pairs.contains(&("payoutStatus", "pending".to_string())));
    }

    #[test]
    fn page_zero_clamps_to_one() {
        assert_eq!(OrderQuery::default().apply(QueryChange::Page(0)).page, 1);
    }

    #[test]
    fn stale_page_is_dropped() {
        let mut listing: Listing<u32, OrderFilters> = Listing::default();
        let first = listing.begin_load();
        let second = listing.begin_load();

        let page = Pagination {
            page: 1,
            pages: 1,
            total: 2,
        };
        assert!(listing.accept(second, vec![2, 3], page));
        assert!(!listing.accept(first, vec![1], Pagination::default()));
        assert_eq!(listing.rows, vec![2, 3]);
        assert_eq!(listing.pagination.total, 2);
        assert!(!listing.loading);
    }

    #[test]
    fn replace_row_reports_missing_rows() {
        let mut listing: Listing<u32, OrderFilters> = Listing::default();
        let generation = listing.begin_load();
        listing.accept(generation, vec![1, 2], Pagination::default());

        assert!(listing.replace_row(|row| *row == 2, 20));
        assert!(!listing.replace_row(|row| *row == 7, 70));
        assert_eq!(listing.rows, vec![1, 20]);
    }
}
