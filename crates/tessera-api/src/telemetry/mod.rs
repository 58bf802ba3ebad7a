//! Tracing subscriber setup

mod init;

pub use init::init_telemetry;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "tessera=debug,tower_http=debug";
