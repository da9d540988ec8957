//! Pass-through client for the hosted auth service (GoTrue) plus the
//! in-memory mirror of who is currently signed in.

mod extract;
mod mirror;

pub use extract::AuthUser;
use mirror::SessionMirror;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AuthConfig, SupabaseConfig},
    models::{Session, User},
    supabase::{self, API_KEY_HEADER, SupabaseError},
};

#[derive(Debug, Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// `/signup` returns a full session when the project auto-confirms emails and
/// only the created user while the confirmation mail is pending.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    Session(Session),
    PendingConfirmation(User),
}

pub struct AuthService {
    client: Client,
    base_url: String,
    anon_key: String,
    oauth_redirect_url: Option<String>,
    mirror: SessionMirror,
}

impl AuthService {
    pub fn new(client: Client, supabase: &SupabaseConfig, auth: &AuthConfig) -> Self {
        Self {
            client,
            base_url: format!("{}/auth/v1", supabase.url.trim_end_matches('/')),
            anon_key: supabase.anon_key.clone(),
            oauth_redirect_url: supabase.oauth_redirect_url.clone(),
            mirror: SessionMirror::new(auth.session_ttl),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.base_url))
            .header(API_KEY_HEADER, &self.anon_key)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, SupabaseError> {
        let response = self
            .post("/signup")
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;
        let outcome: SignUpOutcome = supabase::check(response).await?.json().await?;

        if let SignUpOutcome::Session(session) = &outcome {
            self.mirror
                .publish(&session.access_token, session.user.clone())
                .await;
        }
        tracing::info!("Signed up new account");

        Ok(outcome)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SupabaseError> {
        let response = self
            .post("/token")
            .query(&[("grant_type", "password")])
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;

        self.accept_session(response).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, SupabaseError> {
        let response = self
            .post("/token")
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;

        self.accept_session(response).await
    }

    async fn accept_session(&self, response: reqwest::Response) -> Result<Session, SupabaseError> {
        let session: Session = supabase::check(response).await?.json().await?;
        self.mirror
            .publish(&session.access_token, session.user.clone())
            .await;
        tracing::debug!("Session issued for user {}", session.user.id);
        Ok(session)
    }

    /// Provider URL the browser has to visit to sign in with Google.
    pub fn google_authorize_url(&self) -> Result<Url, SupabaseError> {
        let mut params = vec![("provider", "google")];
        if let Some(redirect) = &self.oauth_redirect_url {
            params.push(("redirect_to", redirect.as_str()));
        }

        Url::parse_with_params(&format!("{}/authorize", self.base_url), &params)
            .map_err(|e| SupabaseError::Malformed(format!("invalid authorize url: {e}")))
    }

    pub async fn current_user(&self, access_token: &str) -> Result<User, SupabaseError> {
        if let Some(user) = self.mirror.lookup(access_token).await {
            return Ok(user);
        }

        let response = self
            .client
            .get(format!("{}/user", self.base_url))
            .header(API_KEY_HEADER, &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        let user: User = supabase::check(response).await?.json().await?;

        self.mirror.publish(access_token, user.clone()).await;
        Ok(user)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        self.mirror.revoke(access_token).await;

        let response = self
            .post("/logout")
            .bearer_auth(access_token)
            .send()
            .await?;
        supabase::check(response).await?;

        Ok(())
    }
}
