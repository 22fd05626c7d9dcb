pub mod accounts;
pub mod api;
pub mod comparison;
pub mod config;
pub mod entitlements;
pub mod flags;
pub mod host;
pub mod metrics;
pub mod rules;
pub mod version;

// Fixture builders are shared with the integration tests under tests/,
// so they are compiled into the library rather than gated on cfg(test).
pub mod utils;
