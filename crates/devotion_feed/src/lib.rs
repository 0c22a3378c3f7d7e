//! Unified devotional feed engine: merge-pagination across heterogeneous
//! content sources, like engagement, and reading-streak progress.
//!
//! The engine is transport-agnostic. It talks to the backing store only
//! through the [`ContentStore`] trait; [`DevotionService`] is the facade
//! callers embed.

pub mod aggregate;
pub mod checks;
pub mod engagement;
pub mod error;
pub mod normalize;
pub mod service;
pub mod streak;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use aggregate::FeedAggregator;
pub use checks::ReadingCheckUnifier;
pub use engagement::EngagementCounter;
pub use error::{FeedError, FeedResult};
pub use normalize::{ANONYMOUS_AUTHOR, normalize};
pub use service::DevotionService;
pub use streak::{DayCheckSet, StreakStats, completion_percentage, streak_stats};
pub use types::{
    ContentFilter, FeedPage, MAX_PLAN_DAY, ProgressStats, QtFields, UnifiedContentItem,
};

pub use devotion_store::{
    ContentKind, ContentStore, LikeState, OriginKind, OriginSelector, Visibility,
};
