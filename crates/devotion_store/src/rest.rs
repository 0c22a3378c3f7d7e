//! PostgREST-style HTTP implementation of the [`ContentStore`](crate::ContentStore) trait.
//!
//! The backing store exposes each collection as a REST table with filter
//! query parameters (`group_id=eq.<id>`), `order`/`offset`/`limit`
//! pagination, and `/rpc/` endpoints for operations that must be atomic
//! on the database side.

use crate::config::Config;
use crate::retry::RetryPolicy;
use crate::{
    ChurchGuestMeditationRow, ChurchQtPostRow, ContentStore, GroupMeditationRow, LikeState,
    OriginKind, OriginSelector, PersonalMeditationRow, RawRecord, SourceCollection, StoreError,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};

const LIKES_TABLE: &str = "content_likes";
const CHECKS_TABLE: &str = "reading_checks";

/// Store client speaking a PostgREST-style API using reqwest.
#[derive(Clone, Debug)]
pub struct RestContentStore {
    base_url: String,
    api_key: SecretString,
    schema: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ItemIdRow {
    item_id: String,
}

#[derive(Deserialize)]
struct DayNumberRow {
    day_number: u32,
}

impl RestContentStore {
    /// Create a new store client.
    ///
    /// # Arguments
    /// * `base_url` - Root of the REST API (e.g. "https://db.example.org/rest/v1")
    /// * `api_key` - Service key sent as both `apikey` and bearer token
    pub fn new(base_url: &str, api_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("reqwest client build should not fail");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            schema: None,
            client,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let mut store = Self::new(&cfg.base_url, cfg.api_key.clone());
        store.schema = cfg.schema.clone();
        store
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rpc/{}", self.base_url, function)
    }

    /// Build an authenticated GET request.
    fn get_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(self.api_key.expose_secret());
        if let Some(schema) = &self.schema {
            req = req.header("Accept-Profile", schema);
        }
        req
    }

    /// Build an authenticated POST request.
    fn post_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(url)
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(self.api_key.expose_secret());
        if let Some(schema) = &self.schema {
            req = req.header("Content-Profile", schema);
        }
        req
    }

    /// Build an authenticated DELETE request.
    fn delete_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .delete(url)
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(self.api_key.expose_secret());
        if let Some(schema) = &self.schema {
            req = req.header("Content-Profile", schema);
        }
        req
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, StoreError> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(resp.json::<T>().await?)
    }

    /// Execute a GET with retries for transient failures. Reads commute, so
    /// re-issuing them is always safe.
    async fn get_json_with_retry<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, StoreError> {
        let policy = RetryPolicy::default();
        policy
            .retry_async(
                || async { self.execute_json(self.get_request(url).query(query)).await },
                StoreError::is_transient,
            )
            .await
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        collection: SourceCollection,
        origin_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<T>, StoreError> {
        let url = self.table_url(collection.table());
        let query = [
            (collection.origin_column(), format!("eq.{origin_id}")),
            ("order", "created_at.desc,id.desc".to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        tracing::trace!(
            table = collection.table(),
            origin_id,
            offset,
            limit,
            "fetching content page"
        );
        self.get_json_with_retry(&url, &query).await
    }
}

/// Extract error information from a failed response.
async fn error_from_response(resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let body_snippet: String = body.chars().take(256).collect();
    StoreError::from_status(status, body_snippet)
}

#[async_trait]
impl ContentStore for RestContentStore {
    async fn fetch_page(
        &self,
        collection: SourceCollection,
        origin_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<RawRecord>, StoreError> {
        let records = match collection {
            SourceCollection::GroupMeditations => self
                .fetch_rows::<GroupMeditationRow>(collection, origin_id, offset, limit)
                .await?
                .into_iter()
                .map(RawRecord::GroupMeditation)
                .collect(),
            SourceCollection::ChurchGuestMeditations => self
                .fetch_rows::<ChurchGuestMeditationRow>(collection, origin_id, offset, limit)
                .await?
                .into_iter()
                .map(RawRecord::ChurchGuestMeditation)
                .collect(),
            SourceCollection::ChurchQtPosts => self
                .fetch_rows::<ChurchQtPostRow>(collection, origin_id, offset, limit)
                .await?
                .into_iter()
                .map(RawRecord::ChurchQtPost)
                .collect(),
            SourceCollection::PersonalMeditations => self
                .fetch_rows::<PersonalMeditationRow>(collection, origin_id, offset, limit)
                .await?
                .into_iter()
                .map(RawRecord::PersonalMeditation)
                .collect(),
        };
        Ok(records)
    }

    async fn fetch_like_membership(
        &self,
        kind: OriginKind,
        item_ids: &[String],
        user_id: &str,
    ) -> Result<HashSet<String>, StoreError> {
        if item_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let url = self.table_url(LIKES_TABLE);
        let in_list = format!("in.({})", item_ids.join(","));
        let query = [
            ("select", "item_id".to_string()),
            ("origin_kind", format!("eq.{}", kind.as_str())),
            ("user_id", format!("eq.{user_id}")),
            ("item_id", in_list),
        ];
        let rows: Vec<ItemIdRow> = self.get_json_with_retry(&url, &query).await?;
        Ok(rows.into_iter().map(|r| r.item_id).collect())
    }

    async fn toggle_like(
        &self,
        kind: OriginKind,
        item_id: &str,
        user_id: &str,
    ) -> Result<LikeState, StoreError> {
        // The flip happens inside a single database function so that two
        // concurrent toggles for the same key cannot race a read-then-write.
        let url = self.rpc_url("toggle_content_like");
        let body = serde_json::json!({
            "p_origin_kind": kind.as_str(),
            "p_item_id": item_id,
            "p_user_id": user_id,
        });
        let state: LikeState = self.execute_json(self.post_request(&url).json(&body)).await?;
        tracing::debug!(item_id, user_id, is_liked = state.is_liked, "like toggled");
        Ok(state)
    }

    async fn fetch_checked_days(
        &self,
        user_id: &str,
        origin: &OriginSelector,
    ) -> Result<BTreeSet<u16>, StoreError> {
        let url = self.table_url(CHECKS_TABLE);
        let query = [
            ("select", "day_number".to_string()),
            ("user_id", format!("eq.{user_id}")),
            ("source_type", format!("eq.{}", origin.kind.as_str())),
            ("source_id", format!("eq.{}", origin.origin_id)),
        ];
        let rows: Vec<DayNumberRow> = self.get_json_with_retry(&url, &query).await?;
        // Rows with an out-of-range day are corrupt; skip them instead of
        // failing the whole projection.
        Ok(rows
            .into_iter()
            .filter(|r| (1..=365).contains(&r.day_number))
            .map(|r| r.day_number as u16)
            .collect())
    }

    async fn upsert_check(
        &self,
        user_id: &str,
        origin: &OriginSelector,
        day_number: u16,
    ) -> Result<(), StoreError> {
        let url = self.table_url(CHECKS_TABLE);
        let body = serde_json::json!({
            "user_id": user_id,
            "source_type": origin.kind.as_str(),
            "source_id": origin.origin_id,
            "day_number": day_number,
        });
        let resp = self
            .post_request(&url)
            .header("Prefer", "resolution=ignore-duplicates")
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        // 409 means another request already created the row; the end state
        // is what the caller intended either way.
        if status.is_success() || status.as_u16() == 409 {
            return Ok(());
        }
        Err(error_from_response(resp).await)
    }

    async fn delete_check(
        &self,
        user_id: &str,
        origin: &OriginSelector,
        day_number: u16,
    ) -> Result<(), StoreError> {
        let url = self.table_url(CHECKS_TABLE);
        let query = [
            ("user_id", format!("eq.{user_id}")),
            ("source_type", format!("eq.{}", origin.kind.as_str())),
            ("source_id", format!("eq.{}", origin.origin_id)),
            ("day_number", format!("eq.{day_number}")),
        ];
        let resp = self.delete_request(&url).query(&query).send().await?;
        let status = resp.status();
        if status.is_success() || status.as_u16() == 404 {
            return Ok(());
        }
        Err(error_from_response(resp).await)
    }
}
