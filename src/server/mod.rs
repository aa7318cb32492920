//! # HTTP Server Front
//!
//! The HTTP-facing half of the gateway: request pipeline, body parsing,
//! response materialization, static asset fall-through, the HTTP/HTTPS
//! listener, and the [`Gateway`] service facade.

mod assets;
mod body;
mod error;
mod gateway;
mod listener;
mod materialize;
mod pipeline;

pub use assets::AssetServer;
pub use body::parse_body;
pub use gateway::{Gateway, GatewayHandle};
pub use materialize::materialize;
pub use pipeline::{build_router, GatewayState};
