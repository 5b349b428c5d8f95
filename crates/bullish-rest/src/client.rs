//! Main REST client implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bullish_auth::{
    AuthError, Authenticator, Clock, Credentials, Session, SessionManager, SessionState,
    SystemClock,
};
use bullish_types::{classify, Classification};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::descriptor::{RequestDescriptor, RequestParts};
use crate::endpoint;
use crate::endpoints::{AccountEndpoints, MarketEndpoints, TradingEndpoints};
use crate::environment::Environment;
use crate::error::{RestError, RestResult};
use crate::pagination::Page;
use crate::signer::RequestSigner;
use crate::transport::{HttpResponse, HttpTransport, ReqwestTransport};
use crate::types::TradingAccount;

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_USER_AGENT: &str = concat!("bullish-rest/", env!("CARGO_PKG_VERSION"));

/// Bullish REST API client
///
/// Cloning is cheap and clones share one session, one nonce source and one
/// transport.
///
/// # Example
///
/// ```no_run
/// use bullish_rest::{BullishRestClient, Credentials, PageRequest};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     // Public endpoints only
///     let client = BullishRestClient::new()?;
///     let time = client.market().fetch_time().await?;
///     println!("server time: {}", time.datetime);
///
///     // Private endpoints log in on first use
///     let client = BullishRestClient::with_credentials(Credentials::from_env()?)?;
///     let orders = client
///         .trading()?
///         .fetch_orders(Some("BTCUSDC"), &PageRequest::new().with_page_size(25))
///         .await?;
///     println!("{} orders", orders.len());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct BullishRestClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    signer: Arc<RequestSigner>,
    transport: Arc<dyn HttpTransport>,
    sessions: SessionManager<LoginHandshake>,
    trading_account_id: RwLock<Option<String>>,
}

impl BullishRestClient {
    /// Create a client for public endpoints
    pub fn new() -> RestResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client that can call private endpoints
    pub fn with_credentials(credentials: Credentials) -> RestResult<Self> {
        Self::with_config(ClientConfig::default().with_credentials(credentials))
    }

    /// Create a client with custom configuration and the `reqwest` transport
    pub fn with_config(config: ClientConfig) -> RestResult<Self> {
        let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let transport = ReqwestTransport::new(config.timeout, user_agent)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client on top of any transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let clock = config
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()));
        let signer = Arc::new(RequestSigner::new(config.environment, clock));
        signer.set_rate_limit_token(config.rate_limit_token);

        let handshake = LoginHandshake {
            signer: signer.clone(),
            transport: transport.clone(),
        };
        let sessions = SessionManager::new(config.credentials.map(Arc::new), handshake)
            .with_max_age(config.session_max_age);

        info!(
            environment = %config.environment,
            authenticated = sessions.credentials().is_some(),
            "Created Bullish REST client"
        );

        Self {
            inner: Arc::new(ClientInner {
                signer,
                transport,
                sessions,
                trading_account_id: RwLock::new(config.trading_account_id),
            }),
        }
    }

    /// Check if the client has credentials for private endpoints
    pub fn has_credentials(&self) -> bool {
        self.inner.sessions.credentials().is_some()
    }

    pub fn environment(&self) -> Environment {
        self.inner.signer.environment()
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        self.inner.signer.clock()
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Current session lifecycle state
    pub fn session_state(&self) -> SessionState {
        self.inner.sessions.state()
    }

    /// Number of completed login handshakes
    pub fn login_count(&self) -> u64 {
        self.inner.sessions.login_count()
    }

    /// Log in now, or return the cached session
    pub async fn login(&self) -> RestResult<Arc<Session>> {
        self.inner.sessions.get_or_create_session().await
    }

    /// Drop the cached session and log in again
    pub async fn relogin(&self) -> RestResult<Arc<Session>> {
        self.inner.sessions.relogin().await
    }

    /// Drop the cached session; the next private call logs in again
    pub fn invalidate_session(&self) {
        self.inner.sessions.invalidate();
    }

    // ========================================================================
    // Trading account
    // ========================================================================

    /// Account id sent as `tradingAccountId`
    pub fn trading_account_id(&self) -> Option<String> {
        self.inner.trading_account_id.read().clone()
    }

    pub fn set_trading_account_id(&self, id: Option<String>) {
        *self.inner.trading_account_id.write() = id;
    }

    /// Use `account` for later calls, including its rate-limit token
    pub fn select_trading_account(&self, account: &TradingAccount) {
        debug!(account = %account.trading_account_id, "Selected trading account");
        self.set_trading_account_id(Some(account.trading_account_id.clone()));
        self.inner
            .signer
            .set_rate_limit_token(account.rate_limit_token.clone());
    }

    // ========================================================================
    // Endpoint groups
    // ========================================================================

    /// Get public market endpoints
    pub fn market(&self) -> MarketEndpoints<'_> {
        MarketEndpoints::new(self)
    }

    /// Get account endpoints (requires credentials)
    pub fn account(&self) -> RestResult<AccountEndpoints<'_>> {
        self.require_credentials()?;
        Ok(AccountEndpoints::new(self))
    }

    /// Get trading endpoints (requires credentials)
    pub fn trading(&self) -> RestResult<TradingEndpoints<'_>> {
        self.require_credentials()?;
        Ok(TradingEndpoints::new(self))
    }

    fn require_credentials(&self) -> RestResult<()> {
        if self.has_credentials() {
            Ok(())
        } else {
            Err(AuthError::MissingCredentials.into())
        }
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Sign, send and interpret one request
    ///
    /// Private tiers log in first if no session is cached. When a private
    /// call comes back as an authentication error the session it was signed
    /// with is dropped, unless a newer one has already replaced it; the
    /// error is still returned to the caller.
    #[instrument(skip_all, fields(path = descriptor.endpoint().path, tier = ?descriptor.tier()))]
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> RestResult<Value> {
        let signer = &self.inner.signer;
        let credentials = self.inner.sessions.credentials().map(Arc::as_ref);

        let (request, session) = match descriptor {
            RequestDescriptor::Public(parts) => (signer.sign_public(parts)?, None),
            RequestDescriptor::PublicSigned(parts) => {
                let credentials = credentials.ok_or(AuthError::MissingCredentials)?;
                (signer.sign_login(credentials, parts)?, None)
            }
            RequestDescriptor::Private(private) => {
                let session = self.inner.sessions.get_or_create_session().await?;
                let credentials = credentials.ok_or(AuthError::MissingCredentials)?;
                let request = signer.sign_private(private, credentials, &session)?;
                (request, Some(session))
            }
        };
        debug!(method = %request.method, url = %request.url, "Sending request");

        let response = self.inner.transport.execute(&request).await?;
        let result = interpret_response(response);

        if let (Err(err), Some(session)) = (&result, &session) {
            if err.is_auth_error() {
                if self.inner.sessions.invalidate_if(session) {
                    warn!(error = %err, "Authentication rejected, dropping cached session");
                } else {
                    debug!(error = %err, "Authentication rejected for a session already replaced");
                }
            }
        }
        result
    }

    /// Execute and deserialize the response
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> RestResult<T> {
        let value = self.execute(descriptor).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Execute a `_metaData=true` listing
    pub async fn execute_page(&self, descriptor: &RequestDescriptor) -> RestResult<Page<Value>> {
        Page::from_response(self.execute(descriptor).await?)
    }
}

impl std::fmt::Debug for BullishRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BullishRestClient")
            .field("environment", &self.environment())
            .field("sessions", &self.inner.sessions)
            .field("trading_account_id", &self.trading_account_id())
            .finish()
    }
}

/// Decode a raw response and map venue errors
///
/// - undecodable body: `Http` on a non-2xx status, `Parse` otherwise
/// - non-2xx status, or any body carrying a non-empty `errorCode`: classified into
///   `Exchange`; an unclassifiable non-2xx body becomes `Http`
/// - anything else is returned as decoded
pub fn interpret_response(response: HttpResponse) -> RestResult<Value> {
    let success = response.is_success();

    let value: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(_) if success && response.body.trim().is_empty() => Value::Null,
        Err(err) if success => return Err(RestError::Parse(err.to_string())),
        Err(_) => {
            return Err(RestError::Http {
                status: response.status,
                body: response.body,
            })
        }
    };

    if !success || has_error_code(&value) {
        match classify(&value) {
            Classification::Classified(err) => {
                debug!(kind = %err.kind, stage = ?err.stage, "Venue error classified");
                return Err(RestError::Exchange(err));
            }
            Classification::Unclassified if !success => {
                return Err(RestError::Http {
                    status: response.status,
                    body: response.body,
                })
            }
            Classification::Unclassified => {}
        }
    }

    Ok(value)
}

/// `errorCode` present with a value; `null` and `""` count as absent
fn has_error_code(value: &Value) -> bool {
    match value.get("errorCode") {
        None | Some(Value::Null) => false,
        Some(Value::String(code)) => !code.is_empty(),
        Some(_) => true,
    }
}

/// Runs the HMAC login through the client's signer and transport
struct LoginHandshake {
    signer: Arc<RequestSigner>,
    transport: Arc<dyn HttpTransport>,
}

#[async_trait]
impl Authenticator for LoginHandshake {
    type Error = RestError;

    async fn login(&self, credentials: &Credentials) -> RestResult<Value> {
        let request = self
            .signer
            .sign_login(credentials, &RequestParts::new(endpoint::HMAC_LOGIN))?;
        debug!(url = %request.url, "Sending login request");
        let response = self.transport.execute(&request).await?;
        interpret_response(response)
    }
}

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API credentials (None for public-only access)
    pub credentials: Option<Credentials>,
    /// Venue deployment
    pub environment: Environment,
    /// Request timeout
    pub timeout: Duration,
    /// Custom user agent
    pub user_agent: Option<String>,
    /// Default `tradingAccountId`
    pub trading_account_id: Option<String>,
    /// Default `BX-RATELIMIT-TOKEN`
    pub rate_limit_token: Option<String>,
    /// Re-login once the cached session is older than this
    pub session_max_age: Option<Duration>,
    /// Timestamp and nonce source (system clock when None)
    pub clock: Option<Arc<dyn Clock>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            environment: Environment::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
            trading_account_id: None,
            rate_limit_token: None,
            session_max_age: None,
            clock: None,
        }
    }
}

impl ClientConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from `BULLISH_*` environment variables
    ///
    /// Credentials are attached when `BULLISH_API_KEY` and
    /// `BULLISH_API_SECRET` are both set.
    pub fn from_env() -> Self {
        let config = Self::default().with_environment(Environment::from_env());
        match Credentials::from_env() {
            Ok(credentials) => config.with_credentials(credentials),
            Err(err) => {
                debug!(error = %err, "No credentials in environment");
                config
            }
        }
    }

    /// Set credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Select production or the test environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_trading_account(mut self, trading_account_id: impl Into<String>) -> Self {
        self.trading_account_id = Some(trading_account_id.into());
        self
    }

    pub fn with_rate_limit_token(mut self, token: impl Into<String>) -> Self {
        self.rate_limit_token = Some(token.into());
        self
    }

    pub fn with_session_max_age(mut self, max_age: Duration) -> Self {
        self.session_max_age = Some(max_age);
        self
    }

    /// Replace the clock, e.g. with a `ManualClock` for reproducible signatures
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}
