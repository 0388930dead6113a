// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-specific time types for cross-platform compatibility.
//!
//! This module provides re-exports of `Duration`, `Instant` and `SystemTime` that work
//! across native and WebAssembly targets. On native platforms, these come
//! from `std::time`, while on WASM they come from `web_time`.
//!
//! # Public API
//!
//! [`Duration`] and [`Instant`] are re-exported at the crate root for use with
//! [`Lox::set_start_time`](crate::Lox::set_start_time) and the `%TC`/`%TL` meta tokens.

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, Instant, SystemTime};
#[cfg(target_arch = "wasm32")]
pub use web_time::{Duration, Instant, SystemTime};
