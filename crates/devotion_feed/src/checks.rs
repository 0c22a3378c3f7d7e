//! Reading-check toggling and the unified checked-day view.

use std::collections::BTreeSet;
use std::sync::Arc;

use devotion_store::{ContentStore, OriginSelector};
use futures_util::future::join_all;

use crate::error::FeedResult;
use crate::streak::DayCheckSet;
use crate::types::ensure_valid_day;

/// Per-origin reading checks plus the cross-origin union used for streaks.
pub struct ReadingCheckUnifier {
    store: Arc<dyn ContentStore>,
}

impl ReadingCheckUnifier {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Flip the check for one plan day under one origin context. Returns
    /// the new checked state.
    ///
    /// The store guarantees that creating an existing row and deleting a
    /// missing row are both no-op successes, so a duplicated toggle lands
    /// on a definite state instead of an error.
    pub async fn toggle(
        &self,
        user_id: &str,
        origin: &OriginSelector,
        day_number: u16,
    ) -> FeedResult<bool> {
        ensure_valid_day(day_number)?;
        let days = self.store.fetch_checked_days(user_id, origin).await?;
        let now_checked = if days.contains(&day_number) {
            self.store.delete_check(user_id, origin, day_number).await?;
            false
        } else {
            self.store.upsert_check(user_id, origin, day_number).await?;
            true
        };
        tracing::info!(
            user_id,
            origin_kind = origin.kind.as_str(),
            origin_id = %origin.origin_id,
            day_number,
            now_checked,
            "reading check toggled"
        );
        metrics::counter!("reading_check_toggles_total").increment(1);
        Ok(now_checked)
    }

    /// The union of the user's checked days across every given origin
    /// context, fetched concurrently and computed once. A day checked in
    /// any context counts as read.
    pub async fn checked_days(
        &self,
        user_id: &str,
        origins: &[OriginSelector],
    ) -> FeedResult<DayCheckSet> {
        let fetches = origins.iter().map(|origin| {
            let store = Arc::clone(&self.store);
            async move { store.fetch_checked_days(user_id, origin).await }
        });
        let mut union = BTreeSet::new();
        for result in join_all(fetches).await {
            union.extend(result?);
        }
        DayCheckSet::new(user_id, origins.to_vec(), union)
    }
}
