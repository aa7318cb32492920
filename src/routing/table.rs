use axum::http::Method;
use tracing::{debug, info};

use crate::config::{AliasConfig, BodyParsers, GatewayConfig, RouteConfig};
use crate::errors::Result;
use crate::routing::whitelist::Whitelist;

/// One compiled alias: an optional method qualifier, the HTTP-facing path
/// (stored without surrounding slashes), and the target action name.
#[derive(Debug, Clone)]
pub struct Alias {
    pub method: Option<Method>,
    pub path: String,
    pub action: String,
}

impl Alias {
    /// Parse an alias key: either a bare path (any method) or
    /// `"<METHOD> <path>"` restricting to one method. `*` as the method
    /// token is accepted as an explicit any-method marker.
    fn from_config(config: &AliasConfig) -> Self {
        let key = config.key.trim();
        if let Some((first, rest)) = key.split_once(' ') {
            if first == "*" {
                return Self {
                    method: None,
                    path: normalize_alias_path(rest),
                    action: config.action.clone(),
                };
            }
            if let Ok(method) = first.parse::<Method>() {
                if first.chars().all(|c| c.is_ascii_uppercase()) {
                    return Self {
                        method: Some(method),
                        path: normalize_alias_path(rest),
                        action: config.action.clone(),
                    };
                }
            }
        }
        Self { method: None, path: normalize_alias_path(key), action: config.action.clone() }
    }
}

fn normalize_alias_path(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}

/// Normalize a mount or gateway prefix: `""` and `"/"` collapse to empty,
/// everything else gets a leading slash and no trailing slash.
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Strip `prefix` from `path`, segment-aware: `/api` covers `/api` and
/// `/api/x` but not `/apix`. An empty prefix covers everything.
pub(crate) fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// One compiled mount: prefix, optional whitelist, ordered aliases, and the
/// body parser configuration the pipeline consults for requests it adopts.
#[derive(Debug)]
pub struct Mount {
    pub path: String,
    pub whitelist: Option<Whitelist>,
    pub aliases: Vec<Alias>,
    pub body_parsers: Option<BodyParsers>,
}

impl Mount {
    fn from_config(config: &RouteConfig) -> Result<Self> {
        let whitelist = match &config.whitelist {
            Some(patterns) => Some(Whitelist::compile(patterns)?),
            None => None,
        };
        let aliases = config.aliases.iter().map(Alias::from_config).collect();
        Ok(Self {
            path: normalize_prefix(&config.path),
            whitelist,
            aliases,
            body_parsers: config.body_parsers.clone(),
        })
    }

    /// The part of `path` following this mount's prefix, when it matches.
    pub fn match_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        strip_prefix(path, &self.path)
    }

    /// Alias lookup scoped to this mount. Method-qualified aliases are
    /// consulted before any-method aliases; within each pass declaration
    /// order wins.
    pub fn lookup_alias(&self, method: &Method, relative: &str) -> Option<&str> {
        let relative = relative.trim_matches('/');
        self.aliases
            .iter()
            .find(|a| a.method.as_ref() == Some(method) && a.path == relative)
            .or_else(|| self.aliases.iter().find(|a| a.method.is_none() && a.path == relative))
            .map(|a| a.action.as_str())
    }

    /// Resolve the action name for a relative path: an alias hit, or the
    /// implicit `/a/b → a.b` conversion. `None` when no name can be formed.
    pub fn action_for(&self, method: &Method, relative: &str) -> Option<String> {
        if let Some(action) = self.lookup_alias(method, relative) {
            debug!(relative = relative, action = action, "Alias matched");
            return Some(action.to_string());
        }
        implicit_action(relative)
    }
}

/// Turn a relative request path into an implicit action name: `/test/hello`
/// becomes `test.hello`; a name already containing dots passes through.
fn implicit_action(relative: &str) -> Option<String> {
    let trimmed = relative.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.replace('/', "."))
}

/// The compiled route set: the global prefix plus every mount in declaration
/// order. Built once at gateway construction, read-only afterwards.
#[derive(Debug)]
pub struct RouteTable {
    pub(crate) base_path: String,
    pub(crate) mounts: Vec<Mount>,
}

impl RouteTable {
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let mounts = config
            .routes
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(Mount::from_config)
            .collect::<Result<Vec<_>>>()?;

        let base_path = normalize_prefix(&config.path);

        info!(
            mounts = mounts.len(),
            base_path = %base_path,
            "Route table compiled"
        );

        Ok(Self { base_path, mounts })
    }

    pub fn mount(&self, index: usize) -> &Mount {
        &self.mounts[index]
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}
