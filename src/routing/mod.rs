//! # Route Resolution
//!
//! The compiled route table and the deterministic request resolver. Route
//! configurations are preprocessed once at gateway construction: whitelist
//! patterns become matchers, alias maps become ordered lookup pairs. The
//! table is read-only afterwards and shared across requests without locking.

mod resolver;
mod table;
mod whitelist;

pub use resolver::{merge_params, Resolution};
pub use table::{Alias, Mount, RouteTable};
pub use whitelist::{Whitelist, WhitelistPattern};
