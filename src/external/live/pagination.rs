use std::fmt;

/// Position of the next page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Number of items already consumed.
    Offset(u64),
    /// 1-indexed page number.
    Page(u32),
}

impl Cursor {
    /// Cursor after consuming `returned` items from this one.
    pub fn advance(self, returned: usize) -> Cursor {
        match self {
            Cursor::Offset(offset) => Cursor::Offset(offset + returned as u64),
            Cursor::Page(page) => Cursor::Page(page + 1),
        }
    }

    /// Items that were available before this cursor's page.
    pub fn items_before(self, page_size: usize) -> u64 {
        match self {
            Cursor::Offset(offset) => offset,
            Cursor::Page(page) => u64::from(page.saturating_sub(1)) * page_size as u64,
        }
    }

    /// 1-indexed page number this cursor points at.
    pub fn page_number(self, page_size: usize) -> u64 {
        match self {
            Cursor::Offset(offset) if page_size > 0 => offset / page_size as u64 + 1,
            Cursor::Offset(_) => 1,
            Cursor::Page(page) => u64::from(page.max(1)),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Offset(offset) => write!(f, "offset={offset}"),
            Cursor::Page(page) => write!(f, "page={page}"),
        }
    }
}

/// Everything a platform response tells us about its own pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageReport {
    pub cursor: Cursor,
    pub page_size: usize,
    pub returned: usize,
    pub total: Option<u64>,
    pub page_count: Option<u64>,
    pub server_has_more: Option<bool>,
    pub server_next_offset: Option<u64>,
}

impl PageReport {
    pub fn new(cursor: Cursor, page_size: usize, returned: usize) -> Self {
        Self {
            cursor,
            page_size,
            returned,
            total: None,
            page_count: None,
            server_has_more: None,
            server_next_offset: None,
        }
    }

    pub fn with_total(mut self, total: Option<u64>) -> Self {
        self.total = total;
        self
    }

    pub fn with_page_count(mut self, page_count: Option<u64>) -> Self {
        self.page_count = page_count;
        self
    }

    pub fn with_server_flag(mut self, has_more: Option<bool>, next_offset: Option<u64>) -> Self {
        self.server_has_more = has_more;
        self.server_next_offset = next_offset;
        self
    }
}

/// Decides whether more pages exist and where the next one starts.
pub trait PaginationStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn has_more(&self, report: &PageReport) -> bool;

    fn next_cursor(&self, report: &PageReport) -> Cursor {
        report.cursor.advance(report.returned)
    }
}

/// More pages exist iff the page came back full.
#[derive(Debug, Default, Clone, Copy)]
pub struct FullPageStrategy;

impl PaginationStrategy for FullPageStrategy {
    fn name(&self) -> &'static str {
        "full-page"
    }

    fn has_more(&self, report: &PageReport) -> bool {
        report.page_size > 0 && report.returned >= report.page_size
    }
}

/// Compares the current 1-indexed page with the reported page count.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageCountStrategy;

impl PaginationStrategy for PageCountStrategy {
    fn name(&self) -> &'static str {
        "page-count"
    }

    fn has_more(&self, report: &PageReport) -> bool {
        match report.page_count {
            Some(page_count) => {
                report.returned > 0 && report.cursor.page_number(report.page_size) < page_count
            }
            None => FullPageStrategy.has_more(report),
        }
    }
}

/// Compares items fetched so far with the reported total.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountAwareStrategy;

impl PaginationStrategy for CountAwareStrategy {
    fn name(&self) -> &'static str {
        "count-aware"
    }

    fn has_more(&self, report: &PageReport) -> bool {
        match report.total {
            Some(total) => {
                let fetched = report.cursor.items_before(report.page_size) + report.returned as u64;
                report.returned > 0 && total > fetched
            }
            None => PageCountStrategy.has_more(report),
        }
    }
}

/// Trusts the server's own `has_more` flag and next offset when present.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerFlagStrategy;

impl PaginationStrategy for ServerFlagStrategy {
    fn name(&self) -> &'static str {
        "server-flag"
    }

    fn has_more(&self, report: &PageReport) -> bool {
        report
            .server_has_more
            .unwrap_or_else(|| FullPageStrategy.has_more(report))
    }

    fn next_cursor(&self, report: &PageReport) -> Cursor {
        match (report.cursor, report.server_next_offset) {
            (Cursor::Offset(_), Some(next)) => Cursor::Offset(next),
            (cursor, _) => cursor.advance(report.returned),
        }
    }
}
