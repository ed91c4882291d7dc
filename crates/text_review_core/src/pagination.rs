//! crates/text_review_core/src/pagination.rs
//!
//! Page-window arithmetic shared by every paginated read in the application.
//!
//! Raw query values are coerced rather than rejected: a missing, malformed or
//! out-of-range page or page size always resolves to a usable `PageRequest`.
//! The same request drives both storage-level skip/limit reads and in-memory
//! slicing of an already materialized sequence.

/// Default and maximum page size for one paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u64,
    pub max_size: u64,
}

impl PageLimits {
    /// Outer listing of texts (`page` / `limit`).
    pub const TEXTS: PageLimits = PageLimits { default_size: 10, max_size: 50 };
    /// Admin user directory.
    pub const USERS: PageLimits = PageLimits { default_size: 10, max_size: 100 };
    /// Inner contribution window attached to each item of a text listing.
    pub const LISTED_CONTRIBUTIONS: PageLimits = PageLimits { default_size: 3, max_size: 100 };
    /// Contribution window of the single-text detail view.
    pub const DETAIL_CONTRIBUTIONS: PageLimits = PageLimits { default_size: 10, max_size: 100 };
}

/// A coerced page request. `page` is 1-based and `page_size` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

/// Metadata describing one page of a collection of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// One page of a storage-level listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl PageRequest {
    /// Builds a request from already-numeric candidates.
    ///
    /// A page below 1 becomes 1. A page size below 1 falls back to the
    /// collection default and anything above the cap is clamped to it.
    pub fn new(page: Option<i64>, page_size: Option<i64>, limits: PageLimits) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p as u64,
            _ => 1,
        };
        let max_size = limits.max_size.max(1);
        let page_size = match page_size {
            Some(s) if s >= 1 => (s as u64).min(max_size),
            _ => limits.default_size.clamp(1, max_size),
        };
        Self { page, page_size }
    }

    /// Builds a request straight from raw query-string values.
    pub fn from_query(page: Option<&str>, page_size: Option<&str>, limits: PageLimits) -> Self {
        Self::new(
            page.and_then(parse_leading_int),
            page_size.and_then(parse_leading_int),
            limits,
        )
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of items preceding this page.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Page metadata against a collection of `total` items.
    pub fn meta(&self, total: u64) -> PageMeta {
        PageMeta {
            total,
            page: self.page,
            page_size: self.page_size,
            total_pages: total.div_ceil(self.page_size).max(1),
        }
    }

    /// The slice of `items` covered by this page; empty once past the end.
    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let len = items.len();
        let start = usize::try_from(self.skip()).unwrap_or(usize::MAX).min(len);
        let size = usize::try_from(self.page_size).unwrap_or(usize::MAX);
        let end = start.saturating_add(size).min(len);
        &items[start..end]
    }
}

/// Reads the integer prefix of `raw`: optional surrounding whitespace, an
/// optional sign, then digits. `"3abc"` is 3 and `"2.9"` is 2; input with no
/// leading digits yields `None`. Overflow saturates.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for byte in digits.bytes() {
        if !byte.is_ascii_digit() {
            break;
        }
        seen_digit = true;
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(byte - b'0'));
    }

    if !seen_digit {
        return None;
    }
    Some(if negative { -value } else { value })
}
