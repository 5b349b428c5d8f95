//! Venue environments and base URLs

use std::fmt;
use std::str::FromStr;

use tracing::warn;

const PRODUCTION_ROOT: &str = "https://api.exchange.bullish.com/trading-api";
const TEST_ROOT: &str = "https://api.simnext.bullish-test.com/trading-api";

/// Which venue deployment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    /// Live exchange
    #[default]
    Production,
    /// Simulation environment
    Test,
}

impl Environment {
    /// Root URL shared by every section
    pub fn root(&self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_ROOT,
            Self::Test => TEST_ROOT,
        }
    }

    /// Base URL for an API section, e.g. `.../trading-api/v2`
    pub fn base_url(&self, section: ApiSection) -> String {
        format!("{}/{}", self.root(), section.version())
    }

    /// Read `BULLISH_ENVIRONMENT`, defaulting to production
    pub fn from_env() -> Self {
        Self::from_setting(std::env::var("BULLISH_ENVIRONMENT").ok().as_deref())
    }

    /// Resolve an optional setting; unset or unrecognised means production
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::parse::<Self>) {
            None => Self::default(),
            Some(Ok(environment)) => environment,
            Some(Err(err)) => {
                warn!(error = %err, "Unrecognised BULLISH_ENVIRONMENT, using production");
                Self::default()
            }
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(Self::Production),
            "test" | "sandbox" | "simnext" => Ok(Self::Test),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Test => f.write_str("test"),
        }
    }
}

/// Path prefix group an endpoint lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiSection {
    PublicV1,
    PublicV2,
    PrivateV1,
    PrivateV2,
}

impl ApiSection {
    /// Version segment of the URL
    pub fn version(&self) -> &'static str {
        match self {
            Self::PublicV1 | Self::PrivateV1 => "v1",
            Self::PublicV2 | Self::PrivateV2 => "v2",
        }
    }

    /// Returns true for sections that need a session
    pub const fn is_private(&self) -> bool {
        matches!(self, Self::PrivateV1 | Self::PrivateV2)
    }
}
