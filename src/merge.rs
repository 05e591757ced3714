//! Catch-up merge of freshly paginated listings with a saved listing.
//!
//! The newest saved record is the watermark. Pages are fetched in order until
//! the watermark shows up, at which point everything saved is known to
//! continue the fresh prefix and no more pages are needed.
//!
//! The forum is trusted to list records strictly newest first. Out-of-order
//! or repeated pages upstream would make the watermark cut drop or duplicate
//! records; that is not checked here.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::formats::{ListingPage, ListingRecord};

/// Source of listing pages, addressed by the locator of the previous page's
/// "more" link.
#[async_trait]
pub trait PageFetcher: Send {
    async fn fetch(&mut self, locator: &str) -> anyhow::Result<ListingPage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVerdict {
    /// Keep paginating.
    Continue,
    /// The watermark was reached; the saved records complete the listing.
    CaughtUp,
    /// The configured maximum was reached first.
    LimitReached,
}

#[derive(Debug)]
pub struct MergeState {
    persisted: Vec<ListingRecord>,
    watermark: Option<u64>,
    fresh: Vec<ListingRecord>,
    max_records: Option<usize>,
    verdict: PageVerdict,
}

impl MergeState {
    pub fn new(persisted: Vec<ListingRecord>, max_records: Option<usize>) -> Self {
        let watermark = persisted.first().map(|record| record.id);
        Self {
            persisted,
            watermark,
            fresh: Vec::new(),
            max_records,
            verdict: PageVerdict::Continue,
        }
    }

    pub fn watermark(&self) -> Option<u64> {
        self.watermark
    }

    pub fn fresh_len(&self) -> usize {
        self.fresh.len()
    }

    fn limit_reached(&self) -> bool {
        self.max_records
            .is_some_and(|max_records| self.fresh.len() >= max_records)
    }

    /// Consumes one page worth of records in display order. Records after
    /// the watermark, or past the maximum, are ignored.
    pub fn absorb(&mut self, records: impl IntoIterator<Item = ListingRecord>) -> PageVerdict {
        if self.verdict != PageVerdict::Continue {
            return self.verdict;
        }

        for record in records {
            if Some(record.id) == self.watermark {
                tracing::debug!(story_id = record.id, "caught up to newest saved story");
                self.verdict = PageVerdict::CaughtUp;
                return self.verdict;
            }
            if self.limit_reached() {
                break;
            }
            self.fresh.push(record);
        }

        if self.limit_reached() {
            self.verdict = PageVerdict::LimitReached;
        }
        self.verdict
    }

    /// The merged listing: the fresh prefix, followed by every saved record
    /// when the watermark was reached.
    pub fn finish(self) -> Vec<ListingRecord> {
        let mut merged = self.fresh;
        if self.verdict == PageVerdict::CaughtUp {
            merged.extend(self.persisted);
        } else if !self.persisted.is_empty() {
            tracing::info!(
                saved = self.persisted.len(),
                "watermark not reached; output holds fresh stories only"
            );
        }
        merged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    CaughtUp,
    LimitReached,
    /// The last page had no "more" link.
    Exhausted,
    /// The "more" link pointed at a page already fetched in this run.
    Loop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub records: Vec<ListingRecord>,
    pub pages_fetched: usize,
    pub stop: StopReason,
}

/// Paginates from `start` and merges the result with `persisted`.
///
/// Any fetch error aborts the whole run; records gathered before the error
/// are dropped.
pub async fn catch_up<F>(
    fetcher: &mut F,
    start: &str,
    persisted: Vec<ListingRecord>,
    max_records: Option<usize>,
) -> anyhow::Result<MergeOutcome>
where
    F: PageFetcher + ?Sized,
{
    let mut state = MergeState::new(persisted, max_records);
    let mut seen = HashSet::new();
    let mut pages_fetched = 0_usize;
    let mut locator = start.to_owned();

    let stop = loop {
        if !seen.insert(locator.clone()) {
            tracing::warn!(page = %locator, "listing links back to a fetched page; stopping");
            break StopReason::Loop;
        }

        tracing::debug!(page = %locator, "fetching");
        let page = fetcher.fetch(&locator).await?;
        pages_fetched += 1;

        match state.absorb(page.records) {
            PageVerdict::CaughtUp => break StopReason::CaughtUp,
            PageVerdict::LimitReached => {
                tracing::debug!(fresh = state.fresh_len(), "maximum story count reached");
                break StopReason::LimitReached;
            }
            PageVerdict::Continue => {}
        }

        match page.next {
            Some(next) => locator = next,
            None => break StopReason::Exhausted,
        }
    };

    Ok(MergeOutcome {
        records: state.finish(),
        pages_fetched,
        stop,
    })
}
