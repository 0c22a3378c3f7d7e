//! Merge-pagination across heterogeneous content sources.
//!
//! Every origin is paged at the same offset with `page_size + 1` records
//! per backing collection. Over-fetching by one is what lets a single
//! source decide `has_more` even when the merged page happens to fit.

use std::sync::Arc;

use devotion_store::{ContentStore, OriginKind, OriginSelector, SourceCollection};
use futures_util::future::join_all;

use crate::error::FeedResult;
use crate::normalize::normalize;
use crate::types::{ContentFilter, FeedPage};

/// Fans one feed-page request out to every backing collection behind the
/// requested origins, then merges the results newest-first.
pub struct FeedAggregator {
    store: Arc<dyn ContentStore>,
}

/// Backing collections behind one origin, narrowed by the content filter.
/// A church origin spans two collections; the others map one-to-one.
fn collections_for(selector: &OriginSelector, filter: ContentFilter) -> Vec<SourceCollection> {
    let all: &[SourceCollection] = match selector.kind {
        OriginKind::Group => &[SourceCollection::GroupMeditations],
        OriginKind::Church => &[
            SourceCollection::ChurchGuestMeditations,
            SourceCollection::ChurchQtPosts,
        ],
        OriginKind::Personal => &[SourceCollection::PersonalMeditations],
    };
    all.iter()
        .copied()
        .filter(|c| filter.admits(c.content_kind()))
        .collect()
}

impl FeedAggregator {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Assemble one merged page.
    ///
    /// Sources are fetched concurrently. A failed source is logged and
    /// reported in `degraded_origins`; it contributes no items and the
    /// page still succeeds. Items are ordered by `created_at` descending
    /// with origin kind and then id breaking ties, so the same data always
    /// produces the same page.
    pub async fn page(
        &self,
        selectors: &[OriginSelector],
        filter: ContentFilter,
        page_size: u32,
        offset: u32,
    ) -> FeedResult<FeedPage> {
        if page_size == 0 || selectors.is_empty() {
            return Ok(FeedPage::empty());
        }
        let fetch_limit = page_size + 1;

        let mut sources: Vec<(OriginSelector, SourceCollection)> = Vec::new();
        for selector in selectors {
            for collection in collections_for(selector, filter) {
                sources.push((selector.clone(), collection));
            }
        }

        let fetches = sources.iter().map(|(selector, collection)| {
            let store = Arc::clone(&self.store);
            let collection = *collection;
            async move {
                store
                    .fetch_page(collection, &selector.origin_id, offset, fetch_limit)
                    .await
            }
        });
        let results = join_all(fetches).await;

        let mut merged = Vec::new();
        let mut degraded_origins: Vec<OriginSelector> = Vec::new();
        let mut source_overflow = false;
        for ((selector, collection), result) in sources.into_iter().zip(results) {
            match result {
                Ok(records) => {
                    // Raw count, before normalization drops anything: a
                    // full over-fetch means this source alone has more.
                    if records.len() as u32 > page_size {
                        source_overflow = true;
                    }
                    merged.extend(records.into_iter().filter_map(normalize));
                }
                Err(err) => {
                    tracing::warn!(
                        origin_kind = selector.kind.as_str(),
                        origin_id = %selector.origin_id,
                        table = collection.table(),
                        error = %err,
                        "source fetch failed, omitting it from this page"
                    );
                    metrics::counter!("feed_source_failures_total").increment(1);
                    if !degraded_origins.contains(&selector) {
                        degraded_origins.push(selector);
                    }
                }
            }
        }

        merged.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.origin_kind.cmp(&b.origin_kind))
                .then_with(|| a.id.cmp(&b.id))
        });
        let has_more = merged.len() as u32 > page_size || source_overflow;
        merged.truncate(page_size as usize);

        tracing::debug!(
            items = merged.len(),
            has_more,
            degraded = degraded_origins.len(),
            offset,
            "feed page assembled"
        );
        Ok(FeedPage {
            items: merged,
            has_more,
            degraded_origins,
        })
    }
}
