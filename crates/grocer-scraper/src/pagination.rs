//! Page iteration for listings of unknown length.
//!
//! Two termination models are supported. A *known bound* listing declares
//! its page count up front, so the targets are simply pages `1..=bound`. A
//! *sentinel* listing is read until a page comes back empty; since a broken
//! endpoint can keep answering without ever producing that empty page,
//! [`SentinelPager`] also counts non-progress and gives up after
//! [`MAX_CONSECUTIVE_STALLS`].

use crate::error::ScraperError;
use crate::fetch::FetchRequest;

/// Upper bound on pages read from one listing.
pub const MAX_PAGES: u32 = 500;

/// Consecutive pages without progress before a sentinel listing is abandoned.
pub const MAX_CONSECUTIVE_STALLS: u32 = 2;

/// Lazy page targets for a listing that declared `bound` pages.
///
/// Yields exactly `bound` requests for pages `1..=bound` in order. The
/// iterator is `Clone`, so a listing can be restarted from page 1.
pub fn known_bound_targets<P>(
    bound: u32,
    page_request: P,
) -> impl Iterator<Item = FetchRequest> + Clone
where
    P: Fn(u32) -> FetchRequest + Clone,
{
    (1..=bound).map(page_request)
}

/// Zero-based record offset of a 1-based page.
#[must_use]
pub fn offset_for_page(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

/// Reads a page count from indicator text such as `"12"`, `" 12 "` or
/// `"1 / 12"`. The last run of digits wins.
#[must_use]
pub fn parse_page_count(text: &str) -> Option<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .rfind(|run| !run.is_empty())
        .and_then(|run| run.parse().ok())
}

/// What a fetched sentinel page turned out to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageObservation {
    /// Records were found; `fingerprint` identifies the page content.
    Records { fingerprint: u64 },
    /// The record container was present and empty: the listing is exhausted.
    Empty,
    /// The page could not be fetched or had no record container.
    Failed,
}

/// The pager's decision after an observation.
#[derive(Debug)]
pub enum Step {
    /// Keep the page's records and continue.
    Accept,
    /// Discard the page's records and continue.
    Skip,
    /// The listing is exhausted.
    Done,
    /// Too many consecutive pages without progress.
    Stalled(ScraperError),
}

/// Drives a sentinel-terminated listing one page at a time.
#[derive(Debug)]
pub struct SentinelPager {
    url: String,
    page: u32,
    stalls: u32,
    max_pages: u32,
    last_fingerprint: Option<u64>,
}

impl SentinelPager {
    pub fn new(url: impl Into<String>, max_pages: u32) -> Self {
        Self {
            url: url.into(),
            page: 1,
            stalls: 0,
            max_pages,
            last_fingerprint: None,
        }
    }

    /// The page to fetch next.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::PaginationLimit`] once more than `max_pages`
    /// pages would be read.
    pub fn next_page(&self) -> Result<u32, ScraperError> {
        if self.page > self.max_pages {
            return Err(ScraperError::PaginationLimit {
                url: self.url.clone(),
                max_pages: self.max_pages,
            });
        }
        Ok(self.page)
    }

    pub fn observe(&mut self, observation: PageObservation) -> Step {
        match observation {
            PageObservation::Empty => Step::Done,
            // Retry the same page.
            PageObservation::Failed => self.stall(),
            PageObservation::Records { fingerprint } => {
                let repeated = self.last_fingerprint == Some(fingerprint);
                self.page += 1;
                if repeated {
                    self.stall()
                } else {
                    self.stalls = 0;
                    self.last_fingerprint = Some(fingerprint);
                    Step::Accept
                }
            }
        }
    }

    fn stall(&mut self) -> Step {
        self.stalls += 1;
        if self.stalls >= MAX_CONSECUTIVE_STALLS {
            return Step::Stalled(ScraperError::PaginationStalled {
                url: self.url.clone(),
                page: self.page,
                stalls: self.stalls,
            });
        }
        Step::Skip
    }
}
