use regex::Regex;

use crate::errors::{GatewayError, Result};

/// One compiled whitelist pattern.
///
/// `*` is a single-segment wildcard: `math.*` permits `math.add` but not
/// `math.add.inner`. A pattern delimited as `/…/` compiles to a regex.
#[derive(Debug)]
pub enum WhitelistPattern {
    Exact(String),
    Glob(Vec<GlobSegment>),
    Regex(Regex),
}

#[derive(Debug, PartialEq)]
pub enum GlobSegment {
    Literal(String),
    Any,
}

impl WhitelistPattern {
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
            let inner = &pattern[1..pattern.len() - 1];
            let regex = Regex::new(inner).map_err(|e| {
                GatewayError::config(format!("Invalid whitelist regex '{}': {}", pattern, e))
            })?;
            return Ok(WhitelistPattern::Regex(regex));
        }

        if pattern.contains('*') {
            let segments = pattern
                .split('.')
                .map(|seg| {
                    if seg == "*" {
                        GlobSegment::Any
                    } else {
                        GlobSegment::Literal(seg.to_string())
                    }
                })
                .collect();
            return Ok(WhitelistPattern::Glob(segments));
        }

        Ok(WhitelistPattern::Exact(pattern.to_string()))
    }

    pub fn matches(&self, action: &str) -> bool {
        match self {
            WhitelistPattern::Exact(name) => name == action,
            WhitelistPattern::Glob(segments) => {
                let parts: Vec<&str> = action.split('.').collect();
                if parts.len() != segments.len() {
                    return false;
                }
                segments.iter().zip(parts).all(|(seg, part)| match seg {
                    GlobSegment::Any => true,
                    GlobSegment::Literal(lit) => lit == part,
                })
            }
            WhitelistPattern::Regex(regex) => regex.is_match(action),
        }
    }
}

/// Compiled permit-list for one mount.
#[derive(Debug)]
pub struct Whitelist {
    patterns: Vec<WhitelistPattern>,
}

impl Whitelist {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| WhitelistPattern::compile(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// True when any pattern covers the action name.
    pub fn permits(&self, action: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(action))
    }
}
