use axum::http::Method;
use tracing::debug;

use crate::broker::Params;
use crate::errors::{GatewayError, Result};
use crate::routing::table::{strip_prefix, RouteTable};

/// Outcome of route resolution for one request.
#[derive(Debug, PartialEq)]
pub enum Resolution {
    /// The request maps to an action on the mount at `mount_index`
    Action { mount_index: usize, action: String },
    /// No API route handled the request; try assets, then 404
    PassThrough,
}

impl RouteTable {
    /// Resolve a request deterministically:
    ///
    /// 1. Strip the global prefix; a mismatch falls through to assets.
    /// 2. Mounts are tried in declaration order; the first prefix match is
    ///    adopted (no longest-prefix heuristic) and later mounts are never
    ///    consulted for this request.
    /// 3. Aliases are applied before the implicit path-to-action conversion.
    /// 4. The whitelist is enforced on the resolved action, so alias targets
    ///    are subject to it too.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<Resolution> {
        let Some(path) = strip_prefix(path, &self.base_path) else {
            debug!(path = path, base_path = %self.base_path, "Outside global prefix");
            return Ok(Resolution::PassThrough);
        };

        for (index, mount) in self.mounts.iter().enumerate() {
            let Some(relative) = mount.match_prefix(path) else {
                continue;
            };

            let Some(action) = mount.action_for(method, relative) else {
                return Ok(Resolution::PassThrough);
            };

            if let Some(whitelist) = &mount.whitelist {
                if !whitelist.permits(&action) {
                    debug!(action = %action, mount = %mount.path, "Whitelist rejected action");
                    return Err(GatewayError::ServiceNotFound { action });
                }
            }

            debug!(action = %action, mount = %mount.path, "Request resolved");
            return Ok(Resolution::Action { mount_index: index, action });
        }

        Ok(Resolution::PassThrough)
    }
}

/// Shallow-merge the query mapping with the parsed body; body keys override
/// query keys of the same name.
pub fn merge_params(query: Params, body: Option<Params>) -> Params {
    let mut merged = query;
    if let Some(body) = body {
        for (key, value) in body {
            merged.insert(key, value);
        }
    }
    merged
}
