//! Facade tying the feed, engagement and progress paths together.

use std::sync::Arc;

use devotion_store::{ContentStore, LikeState, OriginKind, OriginSelector};

use crate::aggregate::FeedAggregator;
use crate::checks::ReadingCheckUnifier;
use crate::engagement::EngagementCounter;
use crate::error::{FeedError, FeedResult};
use crate::streak::{completion_percentage, streak_stats};
use crate::types::{ContentFilter, FeedPage, ProgressStats, ensure_valid_day};

/// Entry point for callers. Owns one shared store handle and the engine
/// components built on it.
pub struct DevotionService {
    aggregator: FeedAggregator,
    engagement: EngagementCounter,
    checks: ReadingCheckUnifier,
}

impl DevotionService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            aggregator: FeedAggregator::new(Arc::clone(&store)),
            engagement: EngagementCounter::new(Arc::clone(&store)),
            checks: ReadingCheckUnifier::new(store),
        }
    }

    /// One merged feed page across the given origins, annotated with the
    /// viewer's like state when a viewer is given.
    ///
    /// Returns every item the origin queries match; narrowing by item
    /// visibility is the caller's concern, since only the caller knows
    /// the viewer's memberships.
    pub async fn get_feed_page(
        &self,
        selectors: &[OriginSelector],
        filter: ContentFilter,
        page_size: u32,
        offset: u32,
        viewer_id: Option<&str>,
    ) -> FeedResult<FeedPage> {
        let mut page = self
            .aggregator
            .page(selectors, filter, page_size, offset)
            .await?;
        self.engagement.annotate(&mut page.items, viewer_id).await?;
        metrics::counter!("feed_pages_total").increment(1);
        Ok(page)
    }

    /// Reading progress for one user, unified across the given origin
    /// contexts. `reference_day` is the plan day treated as "today";
    /// `total_plan_days` is the plan length the percentage is taken
    /// against.
    pub async fn get_progress(
        &self,
        user_id: &str,
        origins: &[OriginSelector],
        total_plan_days: u32,
        reference_day: u16,
    ) -> FeedResult<ProgressStats> {
        if total_plan_days == 0 {
            return Err(FeedError::Validation(
                "total_plan_days must be at least 1".into(),
            ));
        }
        ensure_valid_day(reference_day)?;
        let check_set = self.checks.checked_days(user_id, origins).await?;
        let stats = streak_stats(check_set.days(), reference_day);
        Ok(ProgressStats {
            current_streak: stats.current,
            longest_streak: stats.longest,
            total_read_days: stats.total,
            percentage: completion_percentage(stats.total, total_plan_days),
        })
    }

    /// Flip like membership for one item; see [`EngagementCounter::toggle_like`].
    pub async fn toggle_like(
        &self,
        kind: OriginKind,
        item_id: &str,
        user_id: &str,
    ) -> FeedResult<LikeState> {
        self.engagement.toggle_like(kind, item_id, user_id).await
    }

    /// Flip the reading check for one plan day under one origin context;
    /// returns the new checked state.
    pub async fn toggle_read_check(
        &self,
        user_id: &str,
        origin: &OriginSelector,
        day_number: u16,
    ) -> FeedResult<bool> {
        self.checks.toggle(user_id, origin, day_number).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryStore, group_meditation, qt_post};

    fn service(store: Arc<MemoryStore>) -> DevotionService {
        DevotionService::new(store as Arc<dyn ContentStore>)
    }

    #[tokio::test]
    async fn feed_page_carries_viewer_likes() {
        let store = Arc::new(MemoryStore::new());
        store.push(group_meditation("m1", "g1", 1));
        store.push(qt_post("q1", "c1", 2));
        store.set_liked(OriginKind::Church, "q1", "u1");

        let svc = service(store);
        let selectors = vec![
            OriginSelector::new(OriginKind::Group, "g1"),
            OriginSelector::new(OriginKind::Church, "c1"),
        ];
        let page = svc
            .get_feed_page(&selectors, ContentFilter::All, 10, 0, Some("u1"))
            .await
            .expect("page");

        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].is_liked, "q1 is newest and liked");
        assert!(!page.items[1].is_liked);
    }

    #[tokio::test]
    async fn progress_unifies_checks_across_origins() {
        let store = Arc::new(MemoryStore::new());
        let group = OriginSelector::new(OriginKind::Group, "g1");
        let church = OriginSelector::new(OriginKind::Church, "c1");
        store.set_checked("u1", &group, &[1, 2]);
        store.set_checked("u1", &church, &[2, 4]);

        let svc = service(store);
        let progress = svc
            .get_progress("u1", &[group, church], 4, 4)
            .await
            .expect("progress");

        assert_eq!(progress.current_streak, 1);
        assert_eq!(progress.longest_streak, 2);
        assert_eq!(progress.total_read_days, 3);
        assert_eq!(progress.percentage, 75);
    }

    #[tokio::test]
    async fn progress_with_no_checks_is_all_zeros() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);
        let origins = vec![OriginSelector::new(OriginKind::Group, "g1")];
        let progress = svc
            .get_progress("u1", &origins, 365, 40)
            .await
            .expect("progress");
        assert_eq!(progress, ProgressStats::default());
    }

    #[tokio::test]
    async fn progress_validates_inputs_before_io() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);
        let origins = vec![OriginSelector::new(OriginKind::Group, "g1")];

        let err = svc.get_progress("u1", &origins, 0, 10).await.unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));

        let err = svc.get_progress("u1", &origins, 365, 0).await.unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
    }

    #[tokio::test]
    async fn read_check_toggle_round_trips_through_progress() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);
        let origin = OriginSelector::new(OriginKind::Group, "g1");

        assert!(svc.toggle_read_check("u1", &origin, 1).await.expect("on"));
        let progress = svc
            .get_progress("u1", std::slice::from_ref(&origin), 365, 1)
            .await
            .expect("progress");
        assert_eq!(progress.current_streak, 1);

        assert!(!svc.toggle_read_check("u1", &origin, 1).await.expect("off"));
        let progress = svc
            .get_progress("u1", std::slice::from_ref(&origin), 365, 1)
            .await
            .expect("progress");
        assert_eq!(progress.current_streak, 0);
    }
}
