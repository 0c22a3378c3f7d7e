//! In-memory [`ContentStore`] for unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use devotion_store::{
    ChurchGuestMeditationRow, ChurchQtPostRow, ContentStore, GroupMeditationRow, LikeState,
    OriginKind, OriginSelector, PersonalMeditationRow, RawRecord, SourceCollection, StoreError,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

/// Fixed-order, deterministic store backed by plain collections.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<RawRecord>>,
    likes: Mutex<HashMap<(OriginKind, String), HashSet<String>>>,
    checks: Mutex<HashSet<(String, OriginKind, String, u16)>>,
    failing: Mutex<HashSet<SourceCollection>>,
    fetch_calls: Mutex<Vec<(SourceCollection, String, u32, u32)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: RawRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn fail_collection(&self, collection: SourceCollection) {
        self.failing.lock().unwrap().insert(collection);
    }

    pub fn set_checked(&self, user_id: &str, origin: &OriginSelector, days: &[u16]) {
        let mut checks = self.checks.lock().unwrap();
        for &d in days {
            checks.insert((
                user_id.to_string(),
                origin.kind,
                origin.origin_id.clone(),
                d,
            ));
        }
    }

    pub fn set_liked(&self, kind: OriginKind, item_id: &str, user_id: &str) {
        self.likes
            .lock()
            .unwrap()
            .entry((kind, item_id.to_string()))
            .or_default()
            .insert(user_id.to_string());
    }

    pub fn fetch_calls(&self) -> Vec<(SourceCollection, String, u32, u32)> {
        self.fetch_calls.lock().unwrap().clone()
    }

    fn origin_id_of(record: &RawRecord) -> &str {
        match record {
            RawRecord::GroupMeditation(r) => &r.group_id,
            RawRecord::ChurchGuestMeditation(r) => &r.church_id,
            RawRecord::ChurchQtPost(r) => &r.church_id,
            RawRecord::PersonalMeditation(r) => &r.project_id,
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_page(
        &self,
        collection: SourceCollection,
        origin_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<RawRecord>, StoreError> {
        self.fetch_calls.lock().unwrap().push((
            collection,
            origin_id.to_string(),
            offset,
            limit,
        ));
        if self.failing.lock().unwrap().contains(&collection) {
            return Err(StoreError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        let mut rows: Vec<RawRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.collection() == collection && Self::origin_id_of(r) == origin_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(a.id()))
        });
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn fetch_like_membership(
        &self,
        kind: OriginKind,
        item_ids: &[String],
        user_id: &str,
    ) -> Result<HashSet<String>, StoreError> {
        let likes = self.likes.lock().unwrap();
        Ok(item_ids
            .iter()
            .filter(|id| {
                likes
                    .get(&(kind, (*id).clone()))
                    .is_some_and(|users| users.contains(user_id))
            })
            .cloned()
            .collect())
    }

    async fn toggle_like(
        &self,
        kind: OriginKind,
        item_id: &str,
        user_id: &str,
    ) -> Result<LikeState, StoreError> {
        let mut likes = self.likes.lock().unwrap();
        let users = likes.entry((kind, item_id.to_string())).or_default();
        let is_liked = if users.contains(user_id) {
            users.remove(user_id);
            false
        } else {
            users.insert(user_id.to_string());
            true
        };
        Ok(LikeState {
            is_liked,
            likes_count: users.len() as u32,
        })
    }

    async fn fetch_checked_days(
        &self,
        user_id: &str,
        origin: &OriginSelector,
    ) -> Result<BTreeSet<u16>, StoreError> {
        Ok(self
            .checks
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, k, o, _)| u == user_id && *k == origin.kind && *o == origin.origin_id)
            .map(|(_, _, _, d)| *d)
            .collect())
    }

    async fn upsert_check(
        &self,
        user_id: &str,
        origin: &OriginSelector,
        day_number: u16,
    ) -> Result<(), StoreError> {
        self.checks.lock().unwrap().insert((
            user_id.to_string(),
            origin.kind,
            origin.origin_id.clone(),
            day_number,
        ));
        Ok(())
    }

    async fn delete_check(
        &self,
        user_id: &str,
        origin: &OriginSelector,
        day_number: u16,
    ) -> Result<(), StoreError> {
        self.checks.lock().unwrap().remove(&(
            user_id.to_string(),
            origin.kind,
            origin.origin_id.clone(),
            day_number,
        ));
        Ok(())
    }
}

fn ts(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap() + chrono::Duration::minutes(minute as i64)
}

pub fn group_meditation(id: &str, group_id: &str, minute: u32) -> RawRecord {
    RawRecord::GroupMeditation(GroupMeditationRow {
        id: id.into(),
        user_id: Some(format!("author-{id}")),
        group_id: group_id.into(),
        group_name: Some("Morning Watch".into()),
        author_name: Some("Hana".into()),
        day_number: Some(12),
        content: format!("meditation {id}"),
        is_public: true,
        likes_count: 0,
        replies_count: 0,
        created_at: ts(minute),
    })
}

pub fn guest_meditation(id: &str, church_id: &str, minute: u32) -> RawRecord {
    RawRecord::ChurchGuestMeditation(ChurchGuestMeditationRow {
        id: id.into(),
        church_id: church_id.into(),
        church_name: Some("Grace".into()),
        guest_name: "Visitor".into(),
        linked_user_id: None,
        day_number: None,
        bible_range: Some("Psalm 23".into()),
        content: format!("guest note {id}"),
        is_anonymous: false,
        likes_count: 0,
        replies_count: 0,
        created_at: ts(minute),
    })
}

pub fn qt_post(id: &str, church_id: &str, minute: u32) -> RawRecord {
    RawRecord::ChurchQtPost(ChurchQtPostRow {
        id: id.into(),
        user_id: Some(format!("author-{id}")),
        church_id: church_id.into(),
        church_name: Some("Grace".into()),
        author_name: "Minsu".into(),
        qt_date: Some("2026-03-01".into()),
        day_number: Some(60),
        my_sentence: Some(format!("sentence {id}")),
        meditation_answer: None,
        gratitude: None,
        my_prayer: None,
        day_review: None,
        is_anonymous: false,
        likes_count: 0,
        replies_count: 0,
        created_at: ts(minute),
    })
}

pub fn personal_meditation(id: &str, project_id: &str, minute: u32) -> RawRecord {
    RawRecord::PersonalMeditation(PersonalMeditationRow {
        id: id.into(),
        user_id: "owner".into(),
        project_id: project_id.into(),
        author_name: Some("Owner".into()),
        title: Some("Lent 2026".into()),
        content: format!("entry {id}"),
        bible_reference: None,
        is_anonymous: false,
        visibility: None,
        likes_count: 0,
        replies_count: 0,
        created_at: ts(minute),
    })
}
