//! Normalization of raw collection rows into [`UnifiedContentItem`]s.
//!
//! Each backing collection has its own shape; this module maps every shape
//! onto the one unified item the rest of the engine works with. Records
//! that fail validation are dropped here, one at a time, so a single bad
//! row never fails a whole page.

use devotion_store::{
    ChurchGuestMeditationRow, ChurchQtPostRow, ContentKind, GroupMeditationRow, OriginKind,
    PersonalMeditationRow, RawRecord, Visibility,
};

use crate::types::{MAX_PLAN_DAY, QtFields, UnifiedContentItem};

/// Display name shown for anonymous authors.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Fallback when a row carries no usable author name.
const UNKNOWN_AUTHOR: &str = "Unknown";

/// Map a raw record to a unified item, or `None` when the record is not
/// renderable (blank body, empty QT answers, out-of-range day number).
pub fn normalize(record: RawRecord) -> Option<UnifiedContentItem> {
    let item = match record {
        RawRecord::GroupMeditation(row) => normalize_group(row)?,
        RawRecord::ChurchGuestMeditation(row) => normalize_guest(row)?,
        RawRecord::ChurchQtPost(row) => normalize_qt(row)?,
        RawRecord::PersonalMeditation(row) => normalize_personal(row)?,
    };
    Some(redact_if_anonymous(item))
}

/// Anonymous items keep the label but must never leak the author id.
fn redact_if_anonymous(mut item: UnifiedContentItem) -> UnifiedContentItem {
    if item.is_anonymous {
        item.author_id = None;
        item.author_display_name = ANONYMOUS_AUTHOR.to_string();
    }
    item
}

fn valid_day(day_number: Option<u32>) -> Result<Option<u16>, ()> {
    match day_number {
        None => Ok(None),
        Some(d) if (1..=u32::from(MAX_PLAN_DAY)).contains(&d) => Ok(Some(d as u16)),
        Some(_) => Err(()),
    }
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}

fn normalize_group(row: GroupMeditationRow) -> Option<UnifiedContentItem> {
    let content = non_blank(row.content)?;
    let day_number = valid_day(row.day_number).ok()?;
    Some(UnifiedContentItem {
        id: row.id,
        content_kind: ContentKind::Meditation,
        origin_kind: OriginKind::Group,
        origin_id: row.group_id,
        origin_name: row.group_name,
        author_id: row.user_id,
        author_display_name: row
            .author_name
            .and_then(non_blank)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        is_anonymous: false,
        visibility: if row.is_public {
            Visibility::Public
        } else {
            Visibility::Group
        },
        day_number,
        bible_range: None,
        content: Some(content),
        qt: None,
        likes_count: row.likes_count,
        replies_count: row.replies_count,
        is_liked: false,
        created_at: row.created_at,
    })
}

fn normalize_guest(row: ChurchGuestMeditationRow) -> Option<UnifiedContentItem> {
    let content = non_blank(row.content)?;
    let day_number = valid_day(row.day_number).ok()?;
    Some(UnifiedContentItem {
        id: row.id,
        content_kind: ContentKind::Meditation,
        origin_kind: OriginKind::Church,
        origin_id: row.church_id,
        origin_name: row.church_name,
        author_id: row.linked_user_id,
        author_display_name: non_blank(row.guest_name)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        is_anonymous: row.is_anonymous,
        visibility: Visibility::Public,
        day_number,
        bible_range: row.bible_range,
        content: Some(content),
        qt: None,
        likes_count: row.likes_count,
        replies_count: row.replies_count,
        is_liked: false,
        created_at: row.created_at,
    })
}

fn normalize_qt(row: ChurchQtPostRow) -> Option<UnifiedContentItem> {
    let qt = QtFields {
        my_sentence: row.my_sentence,
        meditation_answer: row.meditation_answer,
        gratitude: row.gratitude,
        my_prayer: row.my_prayer,
        day_review: row.day_review,
    };
    // A QT entry with no answers at all has nothing to render.
    if qt.is_empty() {
        tracing::debug!(id = row.id, "dropping QT post with no structured answers");
        return None;
    }
    let day_number = valid_day(row.day_number).ok()?;
    Some(UnifiedContentItem {
        id: row.id,
        content_kind: ContentKind::Qt,
        origin_kind: OriginKind::Church,
        origin_id: row.church_id,
        origin_name: row.church_name,
        author_id: row.user_id,
        author_display_name: non_blank(row.author_name)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        is_anonymous: row.is_anonymous,
        visibility: Visibility::Public,
        day_number,
        bible_range: None,
        content: None,
        qt: Some(qt),
        likes_count: row.likes_count,
        replies_count: row.replies_count,
        is_liked: false,
        created_at: row.created_at,
    })
}

fn normalize_personal(row: PersonalMeditationRow) -> Option<UnifiedContentItem> {
    let content = non_blank(row.content)?;
    Some(UnifiedContentItem {
        id: row.id,
        content_kind: ContentKind::Meditation,
        origin_kind: OriginKind::Personal,
        origin_id: row.project_id,
        origin_name: row.title,
        author_id: Some(row.user_id),
        author_display_name: row
            .author_name
            .and_then(non_blank)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        is_anonymous: row.is_anonymous,
        visibility: row.visibility.unwrap_or(Visibility::Public),
        day_number: None,
        bible_range: row.bible_reference,
        content: Some(content),
        qt: None,
        likes_count: row.likes_count,
        replies_count: row.replies_count,
        is_liked: false,
        created_at: row.created_at,
    })
}
