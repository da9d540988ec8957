use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Note;

struct Cached<T> {
    value: T,
    stored_at: Instant,
}

impl<T: Clone> Cached<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }

    fn fresh(&self, ttl: Duration) -> Option<T> {
        self.is_fresh(ttl).then(|| self.value.clone())
    }
}

#[derive(Default)]
struct UserEntry {
    count: Option<Cached<u64>>,
    pages: HashMap<u32, Cached<Vec<Note>>>,
    /// Generation of the last invalidation for this user.
    invalidated: u64,
}

impl UserEntry {
    fn any_fresh(&self, ttl: Duration) -> bool {
        self.count.as_ref().is_some_and(|c| c.is_fresh(ttl))
            || self.pages.values().any(|p| p.is_fresh(ttl))
    }
}

/// Snapshot of the cache generation, taken before going upstream. A result
/// fetched under an older generation than the user's last invalidation is
/// not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Default)]
struct Users {
    entries: HashMap<Uuid, UserEntry>,
    generation: u64,
    /// Highest invalidation generation among purged entries.
    purged: u64,
}

impl Users {
    fn accepts(&self, user_id: Uuid, seen: Generation) -> bool {
        let invalidated = self
            .entries
            .get(&user_id)
            .map_or(self.purged, |e| e.invalidated);
        invalidated <= seen.0
    }

    /// Entries recreated after a purge inherit the purged generation.
    fn entry(&mut self, user_id: Uuid) -> &mut UserEntry {
        let purged = self.purged;
        self.entries.entry(user_id).or_insert_with(|| UserEntry {
            invalidated: purged,
            ..UserEntry::default()
        })
    }

    fn purge(&mut self, ttl: Duration) {
        let purged = &mut self.purged;
        self.entries.retain(|_, entry| {
            let keep = entry.any_fresh(ttl);
            if !keep {
                *purged = (*purged).max(entry.invalidated);
            }
            keep
        });
    }

    fn invalidate(&mut self, user_id: Uuid) -> &mut UserEntry {
        self.generation += 1;
        let generation = self.generation;
        let entry = self.entry(user_id);
        entry.invalidated = generation;
        entry
    }
}

/// Per user query results: the row count and the note pages already fetched.
pub struct NoteCache {
    ttl: Duration,
    users: RwLock<Users>,
}

impl NoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            users: RwLock::new(Users::default()),
        }
    }

    pub async fn generation(&self) -> Generation {
        Generation(self.users.read().await.generation)
    }

    pub async fn count(&self, user_id: Uuid) -> Option<u64> {
        let users = self.users.read().await;
        users.entries.get(&user_id)?.count.as_ref()?.fresh(self.ttl)
    }

    pub async fn store_count(&self, user_id: Uuid, seen: Generation, count: u64) {
        if self.ttl.is_zero() {
            return;
        }
        let mut users = self.users.write().await;
        users.purge(self.ttl);
        if !users.accepts(user_id, seen) {
            tracing::debug!("Dropping count for user {user_id} fetched before an invalidation");
            return;
        }
        users.entry(user_id).count = Some(Cached::new(count));
    }

    pub async fn page(&self, user_id: Uuid, page: u32) -> Option<Vec<Note>> {
        let users = self.users.read().await;
        users.entries.get(&user_id)?.pages.get(&page)?.fresh(self.ttl)
    }

    pub async fn store_page(&self, user_id: Uuid, seen: Generation, page: u32, notes: Vec<Note>) {
        if self.ttl.is_zero() {
            return;
        }
        let mut users = self.users.write().await;
        users.purge(self.ttl);
        if !users.accepts(user_id, seen) {
            tracing::debug!("Dropping page {page} for user {user_id} fetched before an invalidation");
            return;
        }
        users.entry(user_id).pages.insert(page, Cached::new(notes));
    }

    /// Drops the cached pages but keeps the count, for edits in place.
    pub async fn invalidate_pages(&self, user_id: Uuid) {
        self.users.write().await.invalidate(user_id).pages.clear();
    }

    pub async fn invalidate_user(&self, user_id: Uuid) {
        let mut users = self.users.write().await;
        let entry = users.invalidate(user_id);
        entry.count = None;
        entry.pages.clear();
    }
}
