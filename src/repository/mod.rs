use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, header::CONTENT_RANGE};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::SupabaseConfig,
    models::Note,
    supabase::{self, API_KEY_HEADER, SupabaseError},
};

const NOTE_COLUMNS: &str = "id,user_id,content,created_at,updated_at";

#[derive(Debug, Serialize)]
struct NewNote<'a> {
    content: &'a str,
    user_id: Uuid,
}

#[derive(Debug, Serialize)]
struct NoteChanges<'a> {
    content: &'a str,
    updated_at: DateTime<Utc>,
}

/// Client for the hosted `notes` table. Every call runs with the caller's
/// access token, so the table's row level security applies on top of the
/// `user_id` filters below.
pub struct Repository {
    client: Client,
    endpoint: String,
    anon_key: String,
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Total from a `Content-Range` header such as `0-4/12` or `*/0`.
fn parse_total(content_range: &str) -> Option<u64> {
    content_range.rsplit_once('/')?.1.trim().parse().ok()
}

impl Repository {
    pub fn new(client: Client, supabase: &SupabaseConfig) -> Self {
        Self {
            client,
            endpoint: format!("{}/rest/v1/notes", supabase.url.trim_end_matches('/')),
            anon_key: supabase.anon_key.clone(),
        }
    }

    fn request(&self, method: Method, access_token: &str) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header(API_KEY_HEADER, &self.anon_key)
            .bearer_auth(access_token)
    }

    async fn rows(&self, request: RequestBuilder) -> Result<Vec<Note>, SupabaseError> {
        let response = request.send().await?;
        Ok(supabase::check(response).await?.json().await?)
    }

    pub async fn list_notes(
        &self,
        access_token: &str,
        user_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Note>, SupabaseError> {
        let request = self.request(Method::GET, access_token).query(&[
            ("select", NOTE_COLUMNS.to_string()),
            ("user_id", eq(user_id)),
            ("order", "created_at.desc".to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ]);

        self.rows(request).await
    }

    pub async fn count_notes(&self, access_token: &str, user_id: Uuid) -> Result<u64, SupabaseError> {
        let response = self
            .request(Method::HEAD, access_token)
            .header("Prefer", "count=exact")
            .query(&[("select", "*".to_string()), ("user_id", eq(user_id))])
            .send()
            .await?;
        let response = supabase::check(response).await?;

        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| SupabaseError::Malformed("missing content-range header".to_string()))?;

        parse_total(content_range).ok_or_else(|| {
            SupabaseError::Malformed(format!("no total in content-range '{content_range}'"))
        })
    }

    pub async fn create_note(
        &self,
        access_token: &str,
        user_id: Uuid,
        content: &str,
    ) -> Result<Note, SupabaseError> {
        let request = self
            .request(Method::POST, access_token)
            .header("Prefer", "return=representation")
            .json(&NewNote { content, user_id });

        self.rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::Malformed("insert returned no rows".to_string()))
    }

    pub async fn update_note(
        &self,
        access_token: &str,
        user_id: Uuid,
        id: Uuid,
        content: &str,
    ) -> Result<Option<Note>, SupabaseError> {
        let request = self
            .request(Method::PATCH, access_token)
            .header("Prefer", "return=representation")
            .query(&[("id", eq(id)), ("user_id", eq(user_id))])
            .json(&NoteChanges {
                content,
                updated_at: Utc::now(),
            });

        Ok(self.rows(request).await?.into_iter().next())
    }

    pub async fn delete_note(
        &self,
        access_token: &str,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<bool, SupabaseError> {
        let request = self
            .request(Method::DELETE, access_token)
            .header("Prefer", "return=representation")
            .query(&[("id", eq(id)), ("user_id", eq(user_id))]);

        Ok(!self.rows(request).await?.is_empty())
    }

    pub async fn get_note(
        &self,
        access_token: &str,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Note>, SupabaseError> {
        let request = self.request(Method::GET, access_token).query(&[
            ("select", NOTE_COLUMNS.to_string()),
            ("id", eq(id)),
            ("user_id", eq(user_id)),
        ]);

        Ok(self.rows(request).await?.into_iter().next())
    }
}
