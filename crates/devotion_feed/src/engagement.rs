//! Like annotation and toggling for feed items.

use std::collections::BTreeMap;
use std::sync::Arc;

use devotion_store::{ContentStore, LikeState, OriginKind};

use crate::error::FeedResult;
use crate::types::UnifiedContentItem;

/// Viewer-specific engagement state layered onto an assembled page.
pub struct EngagementCounter {
    store: Arc<dyn ContentStore>,
}

impl EngagementCounter {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Mark `is_liked` on each item for the given viewer. Without a viewer
    /// every item stays unmarked. Items are batched per origin kind, one
    /// membership query each.
    pub async fn annotate(
        &self,
        items: &mut [UnifiedContentItem],
        viewer_id: Option<&str>,
    ) -> FeedResult<()> {
        let Some(viewer_id) = viewer_id else {
            return Ok(());
        };
        let mut by_kind: BTreeMap<OriginKind, Vec<String>> = BTreeMap::new();
        for item in items.iter() {
            by_kind
                .entry(item.origin_kind)
                .or_default()
                .push(item.id.clone());
        }
        for (kind, item_ids) in by_kind {
            let liked = self
                .store
                .fetch_like_membership(kind, &item_ids, viewer_id)
                .await?;
            for item in items.iter_mut().filter(|i| i.origin_kind == kind) {
                item.is_liked = liked.contains(&item.id);
            }
        }
        Ok(())
    }

    /// Flip like membership for one item and return the new state. The
    /// flip and the counter update are a single atomic store operation.
    pub async fn toggle_like(
        &self,
        kind: OriginKind,
        item_id: &str,
        user_id: &str,
    ) -> FeedResult<LikeState> {
        let state = self.store.toggle_like(kind, item_id, user_id).await?;
        tracing::info!(
            origin_kind = kind.as_str(),
            item_id,
            user_id,
            is_liked = state.is_liked,
            likes_count = state.likes_count,
            "like toggled"
        );
        metrics::counter!("like_toggles_total").increment(1);
        Ok(state)
    }
}
