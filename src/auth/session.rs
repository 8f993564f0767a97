//! Session state and the manager that keeps it fresh.

use super::cache::SessionCache;
use super::identity::IdentityProvider;
use crate::clock::Clock;
use crate::config::Credentials;
use crate::error::ApiError;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A session must have more than this many seconds left to be used.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Authentication token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Value for the `x-token` header ("<type> <token>")
    pub token: String,
    /// Absolute expiry instant
    #[serde(rename = "expire")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Lifetime left at `now` (negative once expired).
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// Usable only while more than the refresh margin remains.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) > Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

/// Owns the session for one remote client.
///
/// The session is created lazily: from memory, then from the cache artifact,
/// then by a fresh credentials exchange. The credentials source of the last
/// `acquire` is remembered so later refreshes can run without it.
pub struct SessionManager {
    identity: Box<dyn IdentityProvider>,
    cache: Box<dyn SessionCache>,
    clock: Arc<dyn Clock>,
    credentials_source: Option<PathBuf>,
    session: Option<Session>,
}

impl SessionManager {
    pub fn new(
        identity: Box<dyn IdentityProvider>,
        cache: Box<dyn SessionCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            cache,
            clock,
            credentials_source: None,
            session: None,
        }
    }

    /// Remember a credentials source without authenticating yet.
    pub fn with_credentials_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.credentials_source = Some(source.into());
        self
    }

    /// Current in-memory session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    fn current(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| ApiError::MissingCredentials.into())
    }

    /// Make a session available, authenticating only when needed or forced.
    pub fn acquire(&mut self, source: Option<&Path>, force: bool) -> Result<&Session> {
        if let Some(source) = source {
            self.credentials_source = Some(source.to_path_buf());
        }

        if !force {
            if self.session.is_some() {
                return self.current();
            }

            match self.cache.load() {
                Ok(Some(cached)) if cached.is_usable(self.now()) => {
                    debug!(expires_at = %cached.expires_at, "loaded session from cache");
                    self.session = Some(cached);
                    return self.current();
                }
                Ok(Some(cached)) => {
                    info!(expires_at = %cached.expires_at, "cached session is about to expire");
                }
                Ok(None) => {}
                Err(e) => warn!("ignoring unreadable session cache: {:#}", e),
            }
        }

        self.authenticate()?;
        self.current()
    }

    /// Refresh the session when its remaining lifetime is within the margin.
    pub fn ensure_fresh(&mut self, source: Option<&Path>) -> Result<&Session> {
        if let Some(source) = source {
            self.credentials_source = Some(source.to_path_buf());
        }

        let now = self.now();
        let force = match &self.session {
            None => Some(false),
            Some(session) if !session.is_usable(now) => {
                info!(
                    remaining_secs = session.remaining(now).num_seconds(),
                    "session token expiring, refreshing"
                );
                Some(true)
            }
            Some(_) => None,
        };

        if let Some(force) = force {
            self.acquire(None, force)?;
        }
        self.current()
    }

    /// Token header value of a fresh session.
    pub fn token(&mut self) -> Result<String> {
        Ok(self.ensure_fresh(None)?.token.clone())
    }

    fn authenticate(&mut self) -> Result<()> {
        let source = self
            .credentials_source
            .clone()
            .ok_or(ApiError::MissingCredentials)?;
        let credentials = Credentials::load(&source)?;

        let response = self.identity.exchange(&credentials)?;
        let session = Session::new(
            response.header_value(),
            self.now() + Duration::seconds(response.expires_in),
        );

        self.cache.store(&session)?;
        info!(expires_at = %session.expires_at, "acquired new session token");
        self.session = Some(session);
        Ok(())
    }
}
