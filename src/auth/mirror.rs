use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;

use crate::models::User;

struct Entry {
    user: User,
    seen_at: Instant,
}

/// Short-lived copy of the auth service's `access token -> user` mapping.
pub struct SessionMirror {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Entry>>,
}

impl SessionMirror {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn publish(&self, access_token: &str, user: User) {
        if self.ttl.is_zero() {
            return;
        }

        let mut sessions = self.sessions.write().await;
        let ttl = self.ttl;
        sessions.retain(|_, entry| entry.seen_at.elapsed() < ttl);
        sessions.insert(
            access_token.to_string(),
            Entry {
                user,
                seen_at: Instant::now(),
            },
        );
    }

    pub async fn lookup(&self, access_token: &str) -> Option<User> {
        let sessions = self.sessions.read().await;
        sessions
            .get(access_token)
            .filter(|entry| entry.seen_at.elapsed() < self.ttl)
            .map(|entry| entry.user.clone())
    }

    pub async fn revoke(&self, access_token: &str) {
        if self.sessions.write().await.remove(access_token).is_some() {
            tracing::debug!("Session evicted from mirror");
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
