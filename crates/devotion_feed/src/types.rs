//! Unified content model shared by the feed, engagement and progress paths.

use chrono::{DateTime, Utc};
use devotion_store::{ContentKind, OriginKind, OriginSelector, Visibility};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{FeedError, FeedResult};

/// Highest plan day any reading plan can reach.
pub const MAX_PLAN_DAY: u16 = 365;

pub(crate) fn ensure_valid_day(day_number: u16) -> FeedResult<()> {
    if day_number == 0 || day_number > MAX_PLAN_DAY {
        return Err(FeedError::Validation(format!(
            "day_number must be between 1 and {MAX_PLAN_DAY}, got {day_number}"
        )));
    }
    Ok(())
}

/// Structured quiet-time answers. Present on QT items only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QtFields {
    pub my_sentence: Option<String>,
    pub meditation_answer: Option<String>,
    pub gratitude: Option<String>,
    pub my_prayer: Option<String>,
    pub day_review: Option<String>,
}

impl QtFields {
    /// True when no field carries a non-blank answer.
    pub fn is_empty(&self) -> bool {
        [
            &self.my_sentence,
            &self.meditation_answer,
            &self.gratitude,
            &self.my_prayer,
            &self.day_review,
        ]
        .into_iter()
        .all(|f| f.as_deref().is_none_or(|s| s.trim().is_empty()))
    }
}

/// One feed entry after normalization.
///
/// Exactly one of `content` and `qt` is set: free-form items carry
/// `content`, QT items carry `qt`. Anonymous items never expose
/// `author_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UnifiedContentItem {
    pub id: String,
    pub content_kind: ContentKind,
    pub origin_kind: OriginKind,
    pub origin_id: String,
    /// Display name of the owning group, church or project, when known.
    pub origin_name: Option<String>,
    pub author_id: Option<String>,
    pub author_display_name: String,
    pub is_anonymous: bool,
    pub visibility: Visibility,
    pub day_number: Option<u16>,
    pub bible_range: Option<String>,
    pub content: Option<String>,
    pub qt: Option<QtFields>,
    pub likes_count: u32,
    pub replies_count: u32,
    /// Whether the requesting viewer has liked this item. False when the
    /// feed is fetched without a viewer.
    #[serde(default)]
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
}

/// Caller-side narrowing of which content kinds a feed page may contain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentFilter {
    #[default]
    All,
    Meditation,
    Qt,
}

impl ContentFilter {
    pub fn admits(&self, kind: ContentKind) -> bool {
        match self {
            ContentFilter::All => true,
            ContentFilter::Meditation => kind == ContentKind::Meditation,
            ContentFilter::Qt => kind == ContentKind::Qt,
        }
    }
}

/// One page of merged feed items.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct FeedPage {
    pub items: Vec<UnifiedContentItem>,
    /// True when another page exists at the next offset.
    pub has_more: bool,
    /// Origins whose backing fetch failed for this page. Their items are
    /// simply absent; the page itself still succeeds.
    pub degraded_origins: Vec<OriginSelector>,
}

impl FeedPage {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            degraded_origins: Vec::new(),
        }
    }
}

/// Reading progress derived from one user's checked days.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProgressStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_read_days: u32,
    /// Completion against the plan length, rounded to the nearest percent.
    pub percentage: u32,
}
