//! `ContentStore` trait over the devotional backing store, plus the raw row
//! types for the four content collections it serves.

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod rest;
pub mod retry;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("auth rejected: {0}")]
    Auth(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

impl StoreError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => StoreError::NotFound(body),
            401 | 403 => StoreError::Auth(body),
            400 | 422 => StoreError::InvalidInput(body),
            _ => StoreError::Status { status, body },
        }
    }

    /// Whether a retry against the backing store could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            StoreError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Logical container that owns a piece of content or a reading-check record.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    Group,
    Church,
    Personal,
}

impl OriginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginKind::Group => "group",
            OriginKind::Church => "church",
            OriginKind::Personal => "personal",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Meditation,
    Qt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    Group,
    Church,
    Public,
}

/// One origin to page content from: a reading group, a church, or a
/// personal project.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct OriginSelector {
    pub kind: OriginKind,
    pub origin_id: String,
}

impl OriginSelector {
    pub fn new(kind: OriginKind, origin_id: impl Into<String>) -> Self {
        Self {
            kind,
            origin_id: origin_id.into(),
        }
    }
}

/// A physical backing collection. A church origin spans two of these
/// (guest meditations and QT posts); the other origins map one-to-one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceCollection {
    GroupMeditations,
    ChurchGuestMeditations,
    ChurchQtPosts,
    PersonalMeditations,
}

impl SourceCollection {
    pub fn table(&self) -> &'static str {
        match self {
            SourceCollection::GroupMeditations => "group_meditations",
            SourceCollection::ChurchGuestMeditations => "church_guest_meditations",
            SourceCollection::ChurchQtPosts => "church_qt_posts",
            SourceCollection::PersonalMeditations => "personal_meditations",
        }
    }

    /// Column that scopes a page query to one origin.
    pub fn origin_column(&self) -> &'static str {
        match self {
            SourceCollection::GroupMeditations => "group_id",
            SourceCollection::ChurchGuestMeditations | SourceCollection::ChurchQtPosts => {
                "church_id"
            }
            SourceCollection::PersonalMeditations => "project_id",
        }
    }

    pub fn origin_kind(&self) -> OriginKind {
        match self {
            SourceCollection::GroupMeditations => OriginKind::Group,
            SourceCollection::ChurchGuestMeditations | SourceCollection::ChurchQtPosts => {
                OriginKind::Church
            }
            SourceCollection::PersonalMeditations => OriginKind::Personal,
        }
    }

    pub fn content_kind(&self) -> ContentKind {
        match self {
            SourceCollection::ChurchQtPosts => ContentKind::Qt,
            _ => ContentKind::Meditation,
        }
    }
}

/// Free-form meditation posted inside a reading group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupMeditationRow {
    pub id: String,
    pub user_id: Option<String>,
    pub group_id: String,
    pub group_name: Option<String>,
    pub author_name: Option<String>,
    pub day_number: Option<u32>,
    pub content: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub replies_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Short meditation left on a church page, possibly by a guest without an
/// account. `linked_user_id` is set when a guest later claims the entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChurchGuestMeditationRow {
    pub id: String,
    pub church_id: String,
    pub church_name: Option<String>,
    pub guest_name: String,
    pub linked_user_id: Option<String>,
    pub day_number: Option<u32>,
    pub bible_range: Option<String>,
    pub content: String,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub replies_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Structured "quiet time" entry tied to a church's daily devotional.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChurchQtPostRow {
    pub id: String,
    pub user_id: Option<String>,
    pub church_id: String,
    pub church_name: Option<String>,
    pub author_name: String,
    pub qt_date: Option<String>,
    pub day_number: Option<u32>,
    pub my_sentence: Option<String>,
    pub meditation_answer: Option<String>,
    pub gratitude: Option<String>,
    pub my_prayer: Option<String>,
    pub day_review: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub replies_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Meditation kept under a user's personal reading project.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersonalMeditationRow {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub author_name: Option<String>,
    pub title: Option<String>,
    pub content: String,
    pub bible_reference: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub replies_count: u32,
    pub created_at: DateTime<Utc>,
}

/// One record from exactly one backing collection, before normalization.
#[derive(Clone, Debug)]
pub enum RawRecord {
    GroupMeditation(GroupMeditationRow),
    ChurchGuestMeditation(ChurchGuestMeditationRow),
    ChurchQtPost(ChurchQtPostRow),
    PersonalMeditation(PersonalMeditationRow),
}

impl RawRecord {
    pub fn id(&self) -> &str {
        match self {
            RawRecord::GroupMeditation(r) => &r.id,
            RawRecord::ChurchGuestMeditation(r) => &r.id,
            RawRecord::ChurchQtPost(r) => &r.id,
            RawRecord::PersonalMeditation(r) => &r.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            RawRecord::GroupMeditation(r) => r.created_at,
            RawRecord::ChurchGuestMeditation(r) => r.created_at,
            RawRecord::ChurchQtPost(r) => r.created_at,
            RawRecord::PersonalMeditation(r) => r.created_at,
        }
    }

    pub fn collection(&self) -> SourceCollection {
        match self {
            RawRecord::GroupMeditation(_) => SourceCollection::GroupMeditations,
            RawRecord::ChurchGuestMeditation(_) => SourceCollection::ChurchGuestMeditations,
            RawRecord::ChurchQtPost(_) => SourceCollection::ChurchQtPosts,
            RawRecord::PersonalMeditation(_) => SourceCollection::PersonalMeditations,
        }
    }
}

/// Like membership and denormalized counter after a toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LikeState {
    pub is_liked: bool,
    pub likes_count: u32,
}

/// Data-access boundary consumed by the aggregation and progress engine.
///
/// Implementations own transport concerns (timeouts, retries); every method
/// is a single logical round-trip. `toggle_like` must be atomic on the
/// backing store, and `upsert_check`/`delete_check` must treat a duplicate
/// insert or a missing row as a no-op success, so that retried or duplicated
/// client requests cannot corrupt counters or check state.
#[async_trait]
pub trait ContentStore: Send + Sync + 'static {
    /// Fetch one collection's page for one origin, ordered by `created_at`
    /// descending. Returns fewer than `limit` records when the collection
    /// is exhausted; never errors on an empty result.
    async fn fetch_page(
        &self,
        collection: SourceCollection,
        origin_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<RawRecord>, StoreError>;

    /// Which of `item_ids` the user has liked, scoped to one origin kind.
    async fn fetch_like_membership(
        &self,
        kind: OriginKind,
        item_ids: &[String],
        user_id: &str,
    ) -> Result<HashSet<String>, StoreError>;

    /// Atomically flip like membership for `(item_id, user_id)` and return
    /// the new state. The counter is derived from membership and never goes
    /// below zero.
    async fn toggle_like(
        &self,
        kind: OriginKind,
        item_id: &str,
        user_id: &str,
    ) -> Result<LikeState, StoreError>;

    /// All checked plan-days for a user under one origin context.
    async fn fetch_checked_days(
        &self,
        user_id: &str,
        origin: &OriginSelector,
    ) -> Result<BTreeSet<u16>, StoreError>;

    /// Create the per-day check row; a duplicate is a no-op success.
    async fn upsert_check(
        &self,
        user_id: &str,
        origin: &OriginSelector,
        day_number: u16,
    ) -> Result<(), StoreError>;

    /// Delete the per-day check row; a missing row is a no-op success.
    async fn delete_check(
        &self,
        user_id: &str,
        origin: &OriginSelector,
        day_number: u16,
    ) -> Result<(), StoreError>;
}
