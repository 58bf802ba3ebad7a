//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use tessera_core::Config;

/// Validate critical configuration values.
///
/// Runs `Config::validate` and the checks that only matter to the HTTP server.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.db_timeout_seconds == 0 {
        return Err(anyhow::anyhow!("DB_TIMEOUT_SECONDS must be greater than 0"));
    }

    if config.server_port == 0 {
        return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
    }

    if !config.public_base_url.starts_with("http://")
        && !config.public_base_url.starts_with("https://")
    {
        return Err(anyhow::anyhow!(
            "PUBLIC_BASE_URL must start with http:// or https://"
        ));
    }

    if config.max_upload_bytes > usize::MAX as u64 {
        return Err(anyhow::anyhow!(
            "MAX_UPLOAD_BYTES exceeds what this platform can address"
        ));
    }

    if config.ingest_idle_timeout_secs == 0 {
        tracing::warn!("INGEST_IDLE_TIMEOUT_SECS is 0 - stalled uploads will hold their ticket's destination until the client disconnects");
    }

    if config.ticket_purge_interval_secs == 0 {
        tracing::warn!("TICKET_PURGE_INTERVAL_SECS is 0 - expired tickets will never be purged by the server");
    }

    Ok(())
}
