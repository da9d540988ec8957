use axum_macros::FromRef;
use reqwest::Client;

use std::sync::Arc;

use crate::{
    auth::AuthService,
    config::Config,
    pagination::Pagination,
    repository::Repository,
    service::{NoteCache, NoteService},
    summarizer::Summarizer,
};

/// Shared by every handler; each field is also extractable on its own.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub notes: Arc<NoteService>,
    pub auth: Arc<AuthService>,
    pub summarizer: Arc<Summarizer>,
}

impl AppState {
    pub fn new(client: &Client, cfg: &Config) -> Self {
        let repo = Repository::new(client.clone(), &cfg.supabase);
        let notes = NoteService::new(
            repo,
            NoteCache::new(cfg.notes.cache_ttl),
            Pagination::new(cfg.notes.page_size),
        );

        Self {
            notes: Arc::new(notes),
            auth: Arc::new(AuthService::new(client.clone(), &cfg.supabase, &cfg.auth)),
            summarizer: Arc::new(Summarizer::new(client.clone(), &cfg.gemini)),
        }
    }
}
