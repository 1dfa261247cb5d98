//! Prolog engine backends
//!
//! - **Scryer Prolog** (`scryer` feature): pure Rust implementation
//!
//! ## Backend Selection
//!
//! ```toml
//! prolog_bridge = { features = ["scryer"] }
//! ```
//!
//! Any other engine can be plugged in by implementing
//! [`Engine`](crate::Engine) and [`Cursor`](crate::Cursor).

#[cfg(feature = "scryer")]
pub mod scryer_backend;

#[cfg(feature = "scryer")]
pub use scryer_backend::{ScryerCursor, ScryerEngine};
