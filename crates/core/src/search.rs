//! Catalog search: filtering, sorting and pagination over a loaded product set.
//!
//! The storefront catalog is small enough to load whole, so the paginated
//! listing runs in memory. Anything that implements [`Listing`] can be
//! searched; the api crate implements it for its product view.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::CategoryId;

/// Default page size for catalog listings.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// What the search needs to know about a product.
pub trait Listing {
    fn category_id(&self) -> Option<CategoryId>;
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn price(&self) -> Decimal;
    /// Mean review rating, or `None` without reviews.
    fn average_rating(&self) -> Option<f64>;
    /// Whether any of `sizes` has positive stock.
    fn has_size_in_stock(&self, sizes: &[String]) -> bool;
}

/// Filter criteria. Empty or absent criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_ids: Vec<CategoryId>,
    /// Case-insensitive substring of the name or description.
    pub text: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Only applied when positive. Unreviewed products count as 0.
    pub min_rating: Option<i32>,
    pub sizes: Vec<String>,
}

impl ProductFilter {
    /// Whether `item` passes every criterion.
    #[must_use]
    pub fn matches<L: Listing>(&self, item: &L) -> bool {
        if !self.category_ids.is_empty()
            && !item
                .category_id()
                .is_some_and(|id| self.category_ids.contains(&id))
        {
            return false;
        }

        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            let in_name = item.name().to_lowercase().contains(&needle);
            let in_description = item
                .description()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_name && !in_description {
                return false;
            }
        }

        if self.min_price.is_some_and(|min| item.price() < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| item.price() > max) {
            return false;
        }

        if let Some(min_rating) = self.min_rating.filter(|r| *r > 0)
            && item.average_rating().unwrap_or(0.0) < f64::from(min_rating)
        {
            return false;
        }

        if !self.sizes.is_empty() && !item.has_size_in_stock(&self.sizes) {
            return false;
        }

        true
    }
}

/// Supported sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    PriceLowHigh,
    PriceHighLow,
    NameAsc,
    NameDesc,
    RatingHighLow,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price-low-high" => Ok(Self::PriceLowHigh),
            "price-high-low" => Ok(Self::PriceHighLow),
            "name-a-z" => Ok(Self::NameAsc),
            "name-z-a" => Ok(Self::NameDesc),
            "rating-high-low" => Ok(Self::RatingHighLow),
            _ => Err(format!("unknown sort: {s}")),
        }
    }
}

impl SortOrder {
    /// Parse a query value; unknown or empty values keep store order.
    #[must_use]
    pub fn parse_lenient(value: Option<&str>) -> Option<Self> {
        value.and_then(|v| v.parse().ok())
    }

    /// Stable sort of `items` by this key.
    pub fn sort<L: Listing>(self, items: &mut [L]) {
        match self {
            Self::PriceLowHigh => items.sort_by(|a, b| a.price().cmp(&b.price())),
            Self::PriceHighLow => items.sort_by(|a, b| b.price().cmp(&a.price())),
            Self::NameAsc => items.sort_by(|a, b| a.name().cmp(b.name())),
            Self::NameDesc => items.sort_by(|a, b| b.name().cmp(a.name())),
            Self::RatingHighLow => items.sort_by(|a, b| rating(b).total_cmp(&rating(a))),
        }
    }
}

fn rating<L: Listing>(item: &L) -> f64 {
    item.average_rating().unwrap_or(0.0)
}

/// Split a comma-separated query value, dropping blanks.
#[must_use]
pub fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a comma-separated list of category ids.
///
/// # Errors
///
/// Returns the first entry that is not an integer.
pub fn parse_category_ids(value: Option<&str>) -> Result<Vec<CategoryId>, String> {
    split_csv(value)
        .into_iter()
        .map(|s| {
            s.parse::<i32>()
                .map(CategoryId::new)
                .map_err(|_| format!("invalid category id: {s}"))
        })
        .collect()
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Effective page after clamping.
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Convert the page contents, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

impl PageRequest {
    /// Cut one page out of `items`.
    ///
    /// A page past the end is clamped to the last page that has data. A zero
    /// page size yields an empty page with zero total pages.
    #[must_use]
    pub fn paginate<T>(self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let size = self.size as usize;

        if size == 0 {
            return Page {
                content: Vec::new(),
                page: self.page,
                size: self.size,
                total_elements: total as u64,
                total_pages: 0,
            };
        }

        let total_pages = total.div_ceil(size);
        let mut page = self.page as usize;
        let mut from = page.saturating_mul(size).min(total);
        if total > 0 && from >= total {
            page = total_pages - 1;
            from = page * size;
        }
        let to = from.saturating_add(size).min(total);

        let content: Vec<T> = items.into_iter().skip(from).take(to - from).collect();

        Page {
            content,
            page: u32::try_from(page).unwrap_or(u32::MAX),
            size: self.size,
            total_elements: total as u64,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }
}

/// Filter, sort and paginate in one pass.
#[must_use]
pub fn search<L: Listing>(
    items: Vec<L>,
    filter: &ProductFilter,
    sort: Option<SortOrder>,
    request: PageRequest,
) -> Page<L> {
    let mut matched: Vec<L> = items.into_iter().filter(|i| filter.matches(i)).collect();
    if let Some(sort) = sort {
        sort.sort(&mut matched);
    }
    request.paginate(matched)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: i32,
        category: i32,
        name: &'static str,
        description: Option<&'static str>,
        price: Decimal,
        ratings: Vec<i32>,
        stock: Vec<(&'static str, i32)>,
    }

    impl Listing for Item {
        fn category_id(&self) -> Option<CategoryId> {
            Some(CategoryId::new(self.category))
        }
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> Option<&str> {
            self.description
        }
        fn price(&self) -> Decimal {
            self.price
        }
        fn average_rating(&self) -> Option<f64> {
            if self.ratings.is_empty() {
                return None;
            }
            let sum: i32 = self.ratings.iter().sum();
            Some(f64::from(sum) / self.ratings.len() as f64)
        }
        fn has_size_in_stock(&self, sizes: &[String]) -> bool {
            self.stock
                .iter()
                .any(|(size, qty)| *qty > 0 && sizes.iter().any(|s| s == size))
        }
    }

    fn item(id: i32, name: &'static str, price: i64) -> Item {
        Item {
            id,
            category: 1,
            name,
            description: None,
            price: Decimal::new(price, 0),
            ratings: Vec::new(),
            stock: Vec::new(),
        }
    }

    fn catalog() -> Vec<Item> {
        vec![
            Item {
                category: 2,
                description: Some("Lightweight trail shoe"),
                ratings: vec![5, 3, 4],
                stock: vec![("42", 3), ("43", 0)],
                ..item(1, "Runner", 120)
            },
            Item {
                ratings: vec![2],
                stock: vec![("43", 1)],
                ..item(2, "Hoodie", 60)
            },
            item(3, "Cap", 25),
            Item {
                category: 2,
                ratings: vec![5],
                ..item(4, "Sprinter", 150)
            },
            item(5, "Socks", 10),
        ]
    }

    fn ids(page: &Page<Item>) -> Vec<i32> {
        page.content.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_page_past_end_clamps_to_last_page() {
        let page = PageRequest { page: 99, size: 12 }.paginate(catalog());
        assert_eq!(page.page, 0);
        assert_eq!(page.content.len(), 5);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_elements, 5);
    }

    #[test]
    fn test_pagination_splits_pages() {
        let second = PageRequest { page: 1, size: 2 }.paginate(catalog());
        assert_eq!(ids(&second), vec![3, 4]);
        assert_eq!(second.total_pages, 3);

        let clamped = PageRequest { page: 7, size: 2 }.paginate(catalog());
        assert_eq!(clamped.page, 2);
        assert_eq!(ids(&clamped), vec![5]);
    }

    #[test]
    fn test_empty_result_keeps_requested_page() {
        let page = PageRequest { page: 3, size: 12 }.paginate(Vec::<Item>::new());
        assert_eq!(page.page, 3);
        assert!(page.content.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_zero_size_page() {
        let page = PageRequest { page: 0, size: 0 }.paginate(catalog());
        assert!(page.content.is_empty());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.total_elements, 5);
    }

    #[test]
    fn test_text_filter_matches_name_or_description() {
        let filter = ProductFilter {
            text: Some("TRAIL".to_owned()),
            ..ProductFilter::default()
        };
        let page = search(catalog(), &filter, None, PageRequest::default());
        assert_eq!(ids(&page), vec![1]);

        let filter = ProductFilter {
            text: Some("sprint".to_owned()),
            ..ProductFilter::default()
        };
        let page = search(catalog(), &filter, None, PageRequest::default());
        assert_eq!(ids(&page), vec![4]);
    }

    #[test]
    fn test_category_and_price_filters() {
        let filter = ProductFilter {
            category_ids: vec![CategoryId::new(2)],
            max_price: Some(Decimal::new(120, 0)),
            ..ProductFilter::default()
        };
        let page = search(catalog(), &filter, None, PageRequest::default());
        assert_eq!(ids(&page), vec![1]);

        let filter = ProductFilter {
            min_price: Some(Decimal::new(25, 0)),
            max_price: Some(Decimal::new(60, 0)),
            ..ProductFilter::default()
        };
        let page = search(catalog(), &filter, None, PageRequest::default());
        assert_eq!(ids(&page), vec![2, 3]);
    }

    #[test]
    fn test_rating_filter_treats_unreviewed_as_zero() {
        let filter = ProductFilter {
            min_rating: Some(4),
            ..ProductFilter::default()
        };
        let page = search(catalog(), &filter, None, PageRequest::default());
        assert_eq!(ids(&page), vec![1, 4]);

        let ignored = ProductFilter {
            min_rating: Some(0),
            ..ProductFilter::default()
        };
        assert_eq!(
            search(catalog(), &ignored, None, PageRequest::default()).total_elements,
            5
        );
    }

    #[test]
    fn test_size_filter_requires_positive_stock() {
        let filter = ProductFilter {
            sizes: split_csv(Some("43")),
            ..ProductFilter::default()
        };
        let page = search(catalog(), &filter, None, PageRequest::default());
        assert_eq!(ids(&page), vec![2]);
    }

    #[test]
    fn test_sorts() {
        let all = ProductFilter::default();
        let by = |sort: &str| {
            ids(&search(
                catalog(),
                &all,
                SortOrder::parse_lenient(Some(sort)),
                PageRequest::default(),
            ))
        };

        assert_eq!(by("price-low-high"), vec![5, 3, 2, 1, 4]);
        assert_eq!(by("price-high-low"), vec![4, 1, 2, 3, 5]);
        assert_eq!(by("name-a-z"), vec![3, 2, 1, 5, 4]);
        assert_eq!(by("name-z-a"), vec![4, 5, 1, 2, 3]);
        assert_eq!(by("rating-high-low"), vec![4, 1, 2, 3, 5]);
        assert_eq!(by("newest"), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_average_of_five_three_four() {
        let runner = catalog().into_iter().next().unwrap();
        assert_eq!(runner.average_rating(), Some(4.0));
    }

    #[test]
    fn test_parse_category_ids() {
        assert_eq!(
            parse_category_ids(Some("1, 2,,3")).unwrap(),
            vec![CategoryId::new(1), CategoryId::new(2), CategoryId::new(3)]
        );
        assert!(parse_category_ids(Some("1,x")).is_err());
        assert!(parse_category_ids(None).unwrap().is_empty());
    }
}
