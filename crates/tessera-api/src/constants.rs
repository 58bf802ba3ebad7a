//! API constants

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

/// API version segment
pub const API_VERSION: &str = "v0";

/// Versioned prefix for every API route, e.g. `/api/v0`
pub const API_PREFIX: &str = "/api/v0";

/// Request header carrying the base64 or hex MD5 of the body
pub const CONTENT_MD5_HEADER: &str = "content-md5";

/// Timeout applied to each readiness check
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_base_plus_version() {
        assert_eq!(API_PREFIX, format!("{}/{}", API_BASE, API_VERSION));
    }
}
