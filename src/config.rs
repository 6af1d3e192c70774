use std::env;

use zeroize::Zeroizing;

/// Runtime configuration, loaded once at process start.
#[derive(Clone)]
pub struct SiwxConfig {
    /// HMAC secret for session tokens. Never logged.
    pub token_secret: Zeroizing<String>,

    // TTLs (in seconds)
    pub session_ttl_secs: u64,
    pub nonce_ttl_secs: u64,
    pub cleanup_interval_secs: u64,

    // Session management
    pub max_sessions_per_identity: usize,
    /// When true, only nonces issued by this process are accepted in
    /// challenges. Disable only for clients that pre-build messages offline.
    pub require_issued_nonce: bool,
}

impl std::fmt::Debug for SiwxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiwxConfig")
            .field("token_secret", &"[REDACTED]")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("nonce_ttl_secs", &self.nonce_ttl_secs)
            .field("cleanup_interval_secs", &self.cleanup_interval_secs)
            .field("max_sessions_per_identity", &self.max_sessions_per_identity)
            .field("require_issued_nonce", &self.require_issued_nonce)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl SiwxConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // SIWX_TOKEN_SECRET is required; anything shorter than 32 bytes is
        // too weak for an HMAC key
        let token_secret = env::var("SIWX_TOKEN_SECRET")
            .map_err(|_| ConfigError::MissingVar("SIWX_TOKEN_SECRET".to_string()))?;
        if token_secret.len() < 32 {
            return Err(ConfigError::InvalidValue(
                "SIWX_TOKEN_SECRET".to_string(),
                "must be at least 32 bytes".to_string(),
            ));
        }

        let session_ttl_secs = parse_env_or_default("SIWX_SESSION_TTL_SECS", 86_400)?;
        let nonce_ttl_secs = parse_env_or_default("SIWX_NONCE_TTL_SECS", 300)?;
        let cleanup_interval_secs = parse_env_or_default("SIWX_CLEANUP_INTERVAL_SECS", 600)?;
        let max_sessions_per_identity =
            parse_env_or_default("SIWX_MAX_SESSIONS_PER_IDENTITY", 5)?;
        let require_issued_nonce = parse_env_or_default("SIWX_REQUIRE_ISSUED_NONCE", true)?;

        Ok(SiwxConfig {
            token_secret: Zeroizing::new(token_secret),
            session_ttl_secs,
            nonce_ttl_secs,
            cleanup_interval_secs,
            max_sessions_per_identity,
            require_issued_nonce,
        })
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Use a mutex to ensure tests run serially since they modify global env vars.
    // unwrap_or_else handles poison from prior panics.
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn lock_test() -> std::sync::MutexGuard<'static, ()> {
        TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn clear_test_env() {
        env::remove_var("SIWX_TOKEN_SECRET");
        env::remove_var("SIWX_SESSION_TTL_SECS");
        env::remove_var("SIWX_NONCE_TTL_SECS");
        env::remove_var("SIWX_CLEANUP_INTERVAL_SECS");
        env::remove_var("SIWX_MAX_SESSIONS_PER_IDENTITY");
        env::remove_var("SIWX_REQUIRE_ISSUED_NONCE");
    }

    const TEST_SECRET: &str = "test-secret-test-secret-test-secret!";

    #[test]
    fn test_parse_env_or_default() {
        let _guard = lock_test();

        env::set_var("TEST_U64", "12345");
        let result: Result<u64, ConfigError> = parse_env_or_default("TEST_U64", 100);
        assert_eq!(result.unwrap(), 12345);

        env::remove_var("TEST_U64");
        let result: Result<u64, ConfigError> = parse_env_or_default("TEST_U64", 100);
        assert_eq!(result.unwrap(), 100);
    }

    #[test]
    fn test_missing_secret() {
        let _guard = lock_test();
        clear_test_env();

        // Set to empty rather than unset so a developer .env can't leak a
        // valid secret into the test (dotenvy doesn't override existing vars)
        env::set_var("SIWX_TOKEN_SECRET", "");

        let result = SiwxConfig::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SIWX_TOKEN_SECRET"
        ));

        clear_test_env();
    }

    #[test]
    fn test_short_secret_rejected() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("SIWX_TOKEN_SECRET", "too-short");

        let result = SiwxConfig::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SIWX_TOKEN_SECRET"
        ));

        clear_test_env();
    }

    #[test]
    fn test_config_defaults() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("SIWX_TOKEN_SECRET", TEST_SECRET);

        let config = SiwxConfig::from_env().unwrap();
        assert_eq!(config.session_ttl_secs, 86_400);
        assert_eq!(config.nonce_ttl_secs, 300);
        assert_eq!(config.cleanup_interval_secs, 600);
        assert_eq!(config.max_sessions_per_identity, 5);
        assert!(config.require_issued_nonce);

        clear_test_env();
    }

    #[test]
    fn test_overrides_and_bool_parse() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("SIWX_TOKEN_SECRET", TEST_SECRET);
        env::set_var("SIWX_SESSION_TTL_SECS", "900");
        env::set_var("SIWX_REQUIRE_ISSUED_NONCE", "false");

        let config = SiwxConfig::from_env().unwrap();
        assert_eq!(config.session_ttl_secs, 900);
        assert!(!config.require_issued_nonce);

        clear_test_env();
    }

    #[test]
    fn test_invalid_ttl_rejected() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("SIWX_TOKEN_SECRET", TEST_SECRET);
        env::set_var("SIWX_NONCE_TTL_SECS", "not-a-number");

        let result = SiwxConfig::from_env();
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_, _)));

        clear_test_env();
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = SiwxConfig {
            token_secret: Zeroizing::new(TEST_SECRET.to_string()),
            session_ttl_secs: 1,
            nonce_ttl_secs: 1,
            cleanup_interval_secs: 1,
            max_sessions_per_identity: 1,
            require_issued_nonce: true,
        };
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains(TEST_SECRET));
    }
}
