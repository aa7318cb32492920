//! # Configuration Settings
//!
//! Defines the configuration structures for the gateway. The shapes mirror
//! the associative config surface of the original fabric: `routes` and
//! `bodyParsers` distinguish *absent* from *explicitly null*, and alias maps
//! preserve declaration order.

use std::fmt;
use std::path::PathBuf;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::errors::{GatewayError, Result};

/// Main gateway configuration.
///
/// `routes` left out of the config mounts a single default route at the
/// gateway root; an explicit JSON `null` mounts no API routes at all (asset
/// serving, when configured, still applies).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Listener bind address
    #[validate(length(min = 1, message = "Bind address cannot be empty"))]
    pub ip: String,

    /// Listener port; 0 picks an ephemeral port
    pub port: u16,

    /// Global path prefix applied before any route matching
    pub path: String,

    /// Mounted API routes, in declaration order
    #[serde(default = "default_routes")]
    pub routes: Option<Vec<RouteConfig>>,

    /// Static asset serving, attempted when no API route handles a request
    pub assets: Option<AssetsConfig>,

    /// TLS material; presence flips the listener to HTTPS
    pub https: Option<HttpsConfig>,

    /// Per-request deadline in milliseconds; expiry yields 504
    pub request_timeout_ms: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 3000,
            path: String::new(),
            routes: default_routes(),
            assets: None,
            https: None,
            request_timeout_ms: None,
        }
    }
}

fn default_routes() -> Option<Vec<RouteConfig>> {
    Some(vec![RouteConfig::default()])
}

impl GatewayConfig {
    /// Create configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(ip) = std::env::var("PORTWAY_IP") {
            config.ip = ip;
        }
        if let Ok(port) = std::env::var("PORTWAY_PORT") {
            config.port = port
                .parse()
                .map_err(|e| GatewayError::config(format!("Invalid PORTWAY_PORT: {}", e)))?;
        }

        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)
            .map_err(|e| GatewayError::config(format!("Invalid configuration: {}", e)))?;

        self.validate_custom()
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        if let Some(assets) = &self.assets {
            if assets.folder.as_os_str().is_empty() {
                return Err(GatewayError::config("Asset folder cannot be empty"));
            }
        }

        if let Some(https) = &self.https {
            if https.cert.trim().is_empty() || https.key.trim().is_empty() {
                return Err(GatewayError::config(
                    "HTTPS requires both certificate and key material",
                ));
            }
        }

        if self.request_timeout_ms == Some(0) {
            return Err(GatewayError::config("Request timeout must be at least 1ms"));
        }

        Ok(())
    }
}

/// Per-mount route configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteConfig {
    /// Mount prefix relative to the gateway's global path
    pub path: String,

    /// Action-name patterns permitted on this mount; absent allows any action
    pub whitelist: Option<Vec<String>>,

    /// Alias rewrites in declaration order; keys are `"path"` or
    /// `"METHOD path"`
    #[serde(deserialize_with = "deserialize_aliases")]
    pub aliases: Vec<AliasConfig>,

    /// Body parser configuration: absent enables the defaults, explicit
    /// `null` disables all parsing
    #[serde(default = "default_body_parsers")]
    pub body_parsers: Option<BodyParsers>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            whitelist: None,
            aliases: Vec::new(),
            body_parsers: default_body_parsers(),
        }
    }
}

fn default_body_parsers() -> Option<BodyParsers> {
    Some(BodyParsers::default())
}

/// One alias definition: the HTTP-facing key and the target action name.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasConfig {
    pub key: String,
    pub action: String,
}

/// Deserialize an alias map into an ordered sequence of pairs. The
/// associative form relies on declaration order for conflict resolution, so
/// a plain `HashMap` would lose information.
fn deserialize_aliases<'de, D>(deserializer: D) -> std::result::Result<Vec<AliasConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    struct AliasVisitor;

    impl<'de> Visitor<'de> for AliasVisitor {
        type Value = Vec<AliasConfig>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of alias keys to action names")
        }

        fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut aliases = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, action)) = access.next_entry::<String, String>()? {
                aliases.push(AliasConfig { key, action });
            }
            Ok(aliases)
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(AliasVisitor)
}

/// Body parser stage configuration for one mount.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BodyParsers {
    pub json: ParserToggle,
    pub urlencoded: ParserToggle,
}

impl Default for BodyParsers {
    fn default() -> Self {
        Self { json: ParserToggle::Flag(true), urlencoded: ParserToggle::Flag(false) }
    }
}

/// A parser is either a bare boolean or an option object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParserToggle {
    Flag(bool),
    Options(ParserOptions),
}

impl ParserToggle {
    pub fn enabled(&self) -> bool {
        match self {
            ParserToggle::Flag(enabled) => *enabled,
            ParserToggle::Options(_) => true,
        }
    }

    /// Maximum accepted body size in bytes, when configured
    pub fn limit(&self) -> Option<usize> {
        match self {
            ParserToggle::Flag(_) => None,
            ParserToggle::Options(opts) => opts.limit,
        }
    }
}

/// Recognized parser options.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserOptions {
    /// Maximum accepted body size in bytes
    pub limit: Option<usize>,
    /// Urlencoded extended-syntax flag, accepted for config compatibility
    pub extended: Option<bool>,
}

/// Static asset serving configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsConfig {
    /// Directory files are served from
    pub folder: PathBuf,
    /// File served for directory requests
    #[serde(default = "default_index")]
    pub index: String,
}

fn default_index() -> String {
    "index.html".to_string()
}

impl AssetsConfig {
    pub fn new<P: Into<PathBuf>>(folder: P) -> Self {
        Self { folder: folder.into(), index: default_index() }
    }
}

/// TLS material for the HTTPS listener, as PEM text.
#[derive(Clone, Deserialize)]
pub struct HttpsConfig {
    pub cert: String,
    pub key: String,
}

impl HttpsConfig {
    /// Load certificate and key PEM files from disk.
    pub fn from_pem_files<P: AsRef<std::path::Path>>(cert_path: P, key_path: P) -> Result<Self> {
        let cert = std::fs::read_to_string(cert_path.as_ref()).map_err(|e| {
            GatewayError::config(format!(
                "Failed to read certificate at {}: {}",
                cert_path.as_ref().display(),
                e
            ))
        })?;
        let key = std::fs::read_to_string(key_path.as_ref()).map_err(|e| {
            GatewayError::config(format!(
                "Failed to read private key at {}: {}",
                key_path.as_ref().display(),
                e
            ))
        })?;
        Ok(Self { cert, key })
    }
}

impl fmt::Debug for HttpsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs
        f.debug_struct("HttpsConfig")
            .field("cert", &format!("{} bytes", self.cert.len()))
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Logging configuration, loaded separately from the gateway config so hosts
/// embedding the gateway keep control of their own subscriber.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("PORTWAY_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Ok(json) = std::env::var("PORTWAY_JSON_LOGGING") {
            config.json_logging = matches!(json.trim(), "1" | "true" | "yes" | "on");
        }
        config
    }
}
