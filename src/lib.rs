//! TradingView → 3Commas webhook relay.
//!
//! Each alert posted to `/tv_signal` is validated and turned into exactly one
//! smart trade on the configured 3Commas account. The trading API sits behind
//! [`exchange::TradingAccount`] so the relay can be exercised without a venue.

pub mod config;
pub mod error;
pub mod exchange;
pub mod relay;
pub mod server;
pub mod signal;
pub mod types;

pub use crate::relay::SignalRelay;
