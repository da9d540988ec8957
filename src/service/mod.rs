mod cache;

pub use cache::NoteCache;

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    models::Note,
    pagination::Pagination,
    repository::Repository,
    supabase::SupabaseError,
};

#[derive(Debug, thiserror::Error)]
pub enum NoteServiceError {
    #[error("Note content must not be empty")]
    EmptyContent,

    #[error(transparent)]
    Supabase(#[from] SupabaseError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePage {
    pub notes: Vec<Note>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
}

fn validate_content(content: &str) -> Result<(), NoteServiceError> {
    if content.trim().is_empty() {
        return Err(NoteServiceError::EmptyContent);
    }
    Ok(())
}

pub struct NoteService {
    repo: Repository,
    cache: NoteCache,
    pagination: Pagination,
}

impl NoteService {
    pub const fn new(repo: Repository, cache: NoteCache, pagination: Pagination) -> Self {
        Self {
            repo,
            cache,
            pagination,
        }
    }

    async fn count(&self, caller: &AuthUser) -> Result<u64, SupabaseError> {
        let user_id = caller.user.id;
        if let Some(count) = self.cache.count(user_id).await {
            return Ok(count);
        }

        let seen = self.cache.generation().await;
        let count = self
            .repo
            .count_notes(&caller.access_token, user_id)
            .await?;
        self.cache.store_count(user_id, seen, count).await;
        Ok(count)
    }

    pub async fn list_notes(
        &self,
        caller: &AuthUser,
        requested_page: u32,
    ) -> Result<NotePage, NoteServiceError> {
        let user_id = caller.user.id;
        let total = self.count(caller).await?;
        let total_pages = self.pagination.total_pages(total);
        let page = self.pagination.clamp(requested_page, total_pages);

        let notes = if let Some(notes) = self.cache.page(user_id, page).await {
            notes
        } else {
            let seen = self.cache.generation().await;
            let notes = self
                .repo
                .list_notes(
                    &caller.access_token,
                    user_id,
                    self.pagination.offset(page),
                    u64::from(self.pagination.page_size()),
                )
                .await?;
            self
                .cache
                .store_page(user_id, seen, page, notes.clone())
                .await;
            notes
        };

        Ok(NotePage {
            notes,
            page,
            page_size: self.pagination.page_size(),
            total,
            total_pages,
        })
    }

    pub async fn create_note(
        &self,
        caller: &AuthUser,
        content: &str,
    ) -> Result<Note, NoteServiceError> {
        validate_content(content)?;

        let note = self
            .repo
            .create_note(&caller.access_token, caller.user.id, content)
            .await?;
        // new notes land on page 1 and shift every later page
        self.cache.invalidate_user(caller.user.id).await;

        tracing::info!("Created note {} for user {}", note.id, caller.user.id);
        Ok(note)
    }

    pub async fn update_note(
        &self,
        caller: &AuthUser,
        id: Uuid,
        content: &str,
    ) -> Result<Option<Note>, NoteServiceError> {
        validate_content(content)?;

        let note = self
            .repo
            .update_note(&caller.access_token, caller.user.id, id, content)
            .await?;
        if note.is_some() {
            self.cache.invalidate_pages(caller.user.id).await;
        }

        Ok(note)
    }

    /// Deletes a note and returns the page the caller should look at next,
    /// or `None` when there was no such note.
    pub async fn delete_note(
        &self,
        caller: &AuthUser,
        id: Uuid,
        current_page: u32,
    ) -> Result<Option<u32>, NoteServiceError> {
        let deleted = self
            .repo
            .delete_note(&caller.access_token, caller.user.id, id)
            .await?;
        if !deleted {
            return Ok(None);
        }

        self.cache.invalidate_user(caller.user.id).await;
        tracing::info!("Deleted note {} of user {}", id, caller.user.id);

        let remaining = self.count(caller).await?;
        Ok(Some(
            self.pagination.page_after_delete(current_page, remaining),
        ))
    }

    pub async fn get_note(
        &self,
        caller: &AuthUser,
        id: Uuid,
    ) -> Result<Option<Note>, NoteServiceError> {
        Ok(self
            .repo
            .get_note(&caller.access_token, caller.user.id, id)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SupabaseConfig, models::User, repository::tests::note_json};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn caller() -> AuthUser {
        AuthUser {
            user: User {
                id: Uuid::new_v4(),
                email: Some("jane@example.com".to_string()),
            },
            access_token: "token".to_string(),
        }
    }

    fn service(server: &MockServer, ttl: Duration) -> NoteService {
        let supabase = SupabaseConfig {
            url: server.uri(),
            anon_key: "anon".to_string(),
            oauth_redirect_url: None,
        };
        NoteService::new(
            Repository::new(reqwest::Client::new(), &supabase),
            NoteCache::new(ttl),
            Pagination::default(),
        )
    }

    async fn mount_count(server: &MockServer, total: u64) {
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/notes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-range", format!("*/{total}").as_str()),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let notes = service(&server, Duration::from_secs(60));
        let caller = caller();

        assert!(matches!(
            notes.create_note(&caller, "").await,
            Err(NoteServiceError::EmptyContent)
        ));
        assert!(matches!(
            notes.create_note(&caller, "  \n\t").await,
            Err(NoteServiceError::EmptyContent)
        ));
        assert!(matches!(
            notes.update_note(&caller, Uuid::new_v4(), "").await,
            Err(NoteServiceError::EmptyContent)
        ));
    }

    #[tokio::test]
    async fn out_of_range_page_is_clamped_to_last() {
        let server = MockServer::start().await;
        let caller = caller();
        mount_count(&server, 11).await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/notes"))
            .and(query_param("offset", "10"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                note_json(Uuid::new_v4(), caller.user.id, "last")
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let page = service(&server, Duration::from_secs(60))
            .list_notes(&caller, 42)
            .await
            .unwrap();

        assert_eq!(page.page, 3);
        assert_eq!(page.total, 11);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.notes.len(), 1);
    }

    #[tokio::test]
    async fn cached_page_is_reused_until_a_note_is_created() {
        let server = MockServer::start().await;
        let caller = caller();
        mount_count(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                note_json(Uuid::new_v4(), caller.user.id, "first")
            ])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
                note_json(Uuid::new_v4(), caller.user.id, "second")
            ])))
            .mount(&server)
            .await;

        let notes = service(&server, Duration::from_secs(60));
        notes.list_notes(&caller, 1).await.unwrap();
        notes.list_notes(&caller, 1).await.unwrap();

        notes.create_note(&caller, "second").await.unwrap();
        notes.list_notes(&caller, 1).await.unwrap();
    }

    #[tokio::test]
    async fn editing_a_note_refetches_pages_but_keeps_count() {
        let server = MockServer::start().await;
        let caller = caller();
        let id = Uuid::new_v4();
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/1"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                note_json(id, caller.user.id, "draft")
            ])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                note_json(id, caller.user.id, "final")
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let notes = service(&server, Duration::from_secs(60));
        notes.list_notes(&caller, 1).await.unwrap();
        notes.list_notes(&caller, 1).await.unwrap();

        notes.update_note(&caller, id, "final").await.unwrap();
        let page = notes.list_notes(&caller, 1).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn deleting_a_note_refetches_count_and_pages() {
        let server = MockServer::start().await;
        let caller = caller();
        let id = Uuid::new_v4();
        // one count for the first listing, one after the delete
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/6"))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                note_json(Uuid::new_v4(), caller.user.id, "kept")
            ])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                note_json(id, caller.user.id, "gone")
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let notes = service(&server, Duration::from_secs(60));
        notes.list_notes(&caller, 1).await.unwrap();
        notes.list_notes(&caller, 1).await.unwrap();

        assert_eq!(notes.delete_note(&caller, id, 1).await.unwrap(), Some(1));
        notes.list_notes(&caller, 1).await.unwrap();
    }

    #[tokio::test]
    async fn listing_in_flight_during_create_does_not_cache_old_count() {
        let server = MockServer::start().await;
        let caller = caller();
        // the first count is slow and answers with the total from before the create
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/notes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-range", "*/1")
                    .set_delay(Duration::from_millis(300)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_count(&server, 2).await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                note_json(Uuid::new_v4(), caller.user.id, "first")
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
                note_json(Uuid::new_v4(), caller.user.id, "second")
            ])))
            .mount(&server)
            .await;

        let notes = service(&server, Duration::from_secs(60));
        let (listed, created) = tokio::join!(notes.list_notes(&caller, 1), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            notes.create_note(&caller, "second").await
        });
        assert_eq!(listed.unwrap().total, 1);
        created.unwrap();

        let page = notes.list_notes(&caller, 1).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn deleting_only_note_on_second_page_goes_back() {
        let server = MockServer::start().await;
        let caller = caller();
        let id = Uuid::new_v4();
        mount_count(&server, 5).await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/notes"))
            .and(query_param("id", format!("eq.{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                note_json(id, caller.user.id, "gone")
            ])))
            .mount(&server)
            .await;

        let next = service(&server, Duration::from_secs(60))
            .delete_note(&caller, id, 2)
            .await
            .unwrap();
        assert_eq!(next, Some(1));
    }

    #[tokio::test]
    async fn deleting_unknown_note_reports_none() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let next = service(&server, Duration::from_secs(60))
            .delete_note(&caller(), Uuid::new_v4(), 1)
            .await
            .unwrap();
        assert_eq!(next, None);
    }
}
