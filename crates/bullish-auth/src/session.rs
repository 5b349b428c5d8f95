//! Session token cache with single-flight login
//!
//! Private endpoints need a bearer token obtained through the HMAC login
//! handshake. [`SessionManager`] owns the one cached [`Session`] of a
//! client and makes sure concurrent callers that find no session collapse
//! into a single in-flight login.
//!
//! State machine: `NoSession -> LoggingIn -> Authenticated`, and
//! `Authenticated -> LoggingIn` on [`SessionManager::relogin`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::credentials::Credentials;
use crate::error::AuthError;

/// Authentication token returned by the login handshake
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    authorizer: Option<String>,
    obtained_at: DateTime<Utc>,
}

impl Session {
    /// Create a session from a token
    pub fn new(token: impl Into<String>, authorizer: Option<String>) -> Self {
        Self {
            token: token.into(),
            authorizer,
            obtained_at: Utc::now(),
        }
    }

    /// Parse the login response body
    ///
    /// Fails with [`AuthError::AuthenticationFailed`] when `token` is absent,
    /// not a string, or empty.
    pub fn from_login_response(raw: &Value) -> Result<Self, AuthError> {
        let token = raw
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AuthError::authentication_failed(
                    "no token in login response; check apiKey and secret",
                    raw.clone(),
                )
            })?;

        let authorizer = raw
            .get("authorizer")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self::new(token, authorizer))
    }

    /// Raw bearer token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Authorizer id reported on login
    pub fn authorizer(&self) -> Option<&str> {
        self.authorizer.as_deref()
    }

    /// When the login completed
    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    /// Whether the session is older than `max_age`
    pub fn is_older_than(&self, max_age: Duration) -> bool {
        (Utc::now() - self.obtained_at)
            .to_std()
            .map(|age| age > max_age)
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("authorizer", &self.authorizer)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Performs the login network call
///
/// Implemented by the REST layer, which signs the login request and runs
/// it through its transport. The returned value is the decoded response
/// body; [`SessionManager`] extracts the token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Error returned by the handshake
    type Error: From<AuthError> + Send;

    /// Run one login handshake
    async fn login(&self, credentials: &Credentials) -> Result<Value, Self::Error>;
}

/// Observable session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token cached
    NoSession,
    /// A login handshake is in flight
    LoggingIn,
    /// A token is cached
    Authenticated,
}

/// Owner of the cached session of one client
pub struct SessionManager<A> {
    credentials: Option<Arc<Credentials>>,
    authenticator: A,
    cached: RwLock<Option<Arc<Session>>>,
    login_gate: Mutex<()>,
    logging_in: AtomicBool,
    logins: AtomicU64,
    max_age: Option<Duration>,
}

impl<A: Authenticator> SessionManager<A> {
    /// Create a manager; `credentials` may be absent for public-only clients
    pub fn new(credentials: Option<Arc<Credentials>>, authenticator: A) -> Self {
        Self {
            credentials,
            authenticator,
            cached: RwLock::new(None),
            login_gate: Mutex::new(()),
            logging_in: AtomicBool::new(false),
            logins: AtomicU64::new(0),
            max_age: None,
        }
    }

    /// Treat cached sessions older than `max_age` as absent
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Credentials this manager logs in with
    pub fn credentials(&self) -> Option<&Arc<Credentials>> {
        self.credentials.as_ref()
    }

    /// The authenticator driving the handshake
    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        if self.logging_in.load(Ordering::SeqCst) {
            SessionState::LoggingIn
        } else if self.current().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::NoSession
        }
    }

    /// Number of successful handshakes so far
    pub fn login_count(&self) -> u64 {
        self.logins.load(Ordering::SeqCst)
    }

    /// The cached session, unless absent or past `max_age`
    pub fn current(&self) -> Option<Arc<Session>> {
        let cached = self.cached.read().clone()?;
        match self.max_age {
            Some(max_age) if cached.is_older_than(max_age) => None,
            _ => Some(cached),
        }
    }

    /// Return the cached session, logging in first if there is none
    ///
    /// The handshake runs at most once per manager unless the session is
    /// invalidated. Callers that arrive while a login is in flight wait for
    /// it and receive the same session.
    #[instrument(skip(self))]
    pub async fn get_or_create_session(&self) -> Result<Arc<Session>, A::Error> {
        let credentials = self
            .credentials
            .as_deref()
            .ok_or(AuthError::MissingCredentials)?;

        if let Some(session) = self.current() {
            return Ok(session);
        }

        let _gate = self.login_gate.lock().await;

        // Another caller may have finished the login while we waited
        if let Some(session) = self.current() {
            debug!("Session established by concurrent caller");
            return Ok(session);
        }

        self.handshake(credentials).await
    }

    /// Drop the cached session and log in again
    #[instrument(skip(self))]
    pub async fn relogin(&self) -> Result<Arc<Session>, A::Error> {
        let credentials = self
            .credentials
            .as_deref()
            .ok_or(AuthError::MissingCredentials)?;

        let _gate = self.login_gate.lock().await;
        self.cached.write().take();
        self.handshake(credentials).await
    }

    /// Drop the cached session; the next private call logs in again
    pub fn invalidate(&self) {
        if self.cached.write().take().is_some() {
            debug!("Session invalidated");
        }
    }

    /// Drop the cached session only if it is still `stale`
    ///
    /// Returns false when a newer session has replaced it in the meantime.
    pub fn invalidate_if(&self, stale: &Arc<Session>) -> bool {
        let mut cached = self.cached.write();
        match cached.as_ref() {
            Some(current) if Arc::ptr_eq(current, stale) => {
                *cached = None;
                debug!("Session invalidated");
                true
            }
            _ => false,
        }
    }

    async fn handshake(&self, credentials: &Credentials) -> Result<Arc<Session>, A::Error> {
        debug!("New login required");
        let _flag = LoggingInFlag::raise(&self.logging_in);

        let raw = self.authenticator.login(credentials).await?;
        let session = Arc::new(Session::from_login_response(&raw)?);

        *self.cached.write() = Some(session.clone());
        self.logins.fetch_add(1, Ordering::SeqCst);
        info!("Login successful");

        Ok(session)
    }
}

impl<A> std::fmt::Debug for SessionManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("has_credentials", &self.credentials.is_some())
            .field("has_session", &self.cached.read().is_some())
            .field("logins", &self.logins.load(Ordering::SeqCst))
            .field("max_age", &self.max_age)
            .finish()
    }
}

/// Keeps `LoggingIn` visible for the duration of a handshake, including
/// when the future is dropped mid-flight
struct LoggingInFlag<'a>(&'a AtomicBool);

impl<'a> LoggingInFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoggingInFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingAuthenticator {
        calls: AtomicUsize,
        delay: Duration,
        response: Option<Value>,
    }

    #[async_trait]
    impl Authenticator for CountingAuthenticator {
        type Error = AuthError;

        async fn login(&self, _credentials: &Credentials) -> Result<Value, AuthError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self
                .response
                .clone()
                .unwrap_or_else(|| json!({ "token": format!("jwt-{call}"), "authorizer": "auth-1" })))
        }
    }

    fn credentials() -> Option<Arc<Credentials>> {
        Some(Arc::new(Credentials::new("api-key", "secret").unwrap()))
    }

    #[tokio::test]
    async fn test_session_cached_after_first_login() {
        let manager = SessionManager::new(credentials(), CountingAuthenticator::default());
        assert_eq!(manager.state(), SessionState::NoSession);

        let first = manager.get_or_create_session().await.unwrap();
        let second = manager.get_or_create_session().await.unwrap();

        assert_eq!(first.token(), "jwt-1");
        assert_eq!(first.authorizer(), Some("auth-1"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.authenticator().calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.login_count(), 1);
        assert_eq!(manager.state(), SessionState::Authenticated);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_login() {
        let authenticator = CountingAuthenticator {
            delay: Duration::from_millis(50),
            ..Default::default()
        };
        let manager = Arc::new(SessionManager::new(credentials(), authenticator));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.get_or_create_session().await })
            })
            .collect();

        let sessions: Vec<Arc<Session>> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(manager.authenticator().calls.load(Ordering::SeqCst), 1);
        assert!(sessions.iter().all(|s| s.token() == "jwt-1"));
        assert!(sessions.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_missing_credentials_fails_before_login() {
        let manager = SessionManager::new(None, CountingAuthenticator::default());
        let result = manager.get_or_create_session().await;

        assert!(matches!(result, Err(AuthError::MissingCredentials)));
        assert_eq!(manager.authenticator().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_response_without_token_fails() {
        let authenticator = CountingAuthenticator {
            response: Some(json!({ "message": "no such user" })),
            ..Default::default()
        };
        let manager = SessionManager::new(credentials(), authenticator);

        match manager.get_or_create_session().await {
            Err(AuthError::AuthenticationFailed { raw, .. }) => {
                assert_eq!(raw["message"], "no such user");
            }
            other => panic!("expected AuthenticationFailed, got {:?}", other),
        }
        assert_eq!(manager.state(), SessionState::NoSession);
        assert_eq!(manager.login_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_token_rejected() {
        let authenticator = CountingAuthenticator {
            response: Some(json!({ "token": "" })),
            ..Default::default()
        };
        let manager = SessionManager::new(credentials(), authenticator);
        assert!(matches!(
            manager.get_or_create_session().await,
            Err(AuthError::AuthenticationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalidate_and_relogin() {
        let manager = SessionManager::new(credentials(), CountingAuthenticator::default());

        let first = manager.get_or_create_session().await.unwrap();
        manager.invalidate();
        assert_eq!(manager.state(), SessionState::NoSession);

        let second = manager.get_or_create_session().await.unwrap();
        assert_eq!(second.token(), "jwt-2");
        assert_ne!(first.token(), second.token());

        let third = manager.relogin().await.unwrap();
        assert_eq!(third.token(), "jwt-3");
        assert_eq!(manager.login_count(), 3);
    }

    #[tokio::test]
    async fn test_invalidate_if_keeps_newer_session() {
        let manager = SessionManager::new(credentials(), CountingAuthenticator::default());

        let first = manager.get_or_create_session().await.unwrap();
        let second = manager.relogin().await.unwrap();

        assert!(!manager.invalidate_if(&first));
        assert_eq!(manager.state(), SessionState::Authenticated);
        assert!(Arc::ptr_eq(&manager.current().unwrap(), &second));

        assert!(manager.invalidate_if(&second));
        assert_eq!(manager.state(), SessionState::NoSession);
    }

    #[tokio::test]
    async fn test_max_age_forces_new_login() {
        let manager = SessionManager::new(credentials(), CountingAuthenticator::default())
            .with_max_age(Some(Duration::from_millis(10)));

        let first = manager.get_or_create_session().await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(manager.current().is_none());

        let second = manager.get_or_create_session().await.unwrap();
        assert_ne!(first.token(), second.token());
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new("very-secret-jwt", None);
        let debug = format!("{:?}", session);
        assert!(!debug.contains("very-secret-jwt"));
        assert_eq!(session.bearer(), "Bearer very-secret-jwt");
    }
}
