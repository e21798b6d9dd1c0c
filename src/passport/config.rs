//! Configuration resolution for the passport layer.
//!
//! Values follow a three-tier priority system:
//!
//! 1. **Parameter** - Explicitly provided value (highest priority)
//! 2. **Environment Variable** - Value from environment variable
//! 3. **Default** - Built-in default value (lowest priority)
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PASSPORT_MAX_BODY_BYTES` | 1 MiB | Largest body buffered into a request view |
//! | `PASSPORT_PARSE_BODY` | true | Parse request bodies for strategies |
//! | `PASSPORT_UNAUTHORIZED_MESSAGE` | `Unauthorized` | Message of 401 responses |
//! | `PASSPORT_PORT` | 8000 | Listen port of the demo server |

use std::env;

use super::error::UNAUTHORIZED_MESSAGE;

/// Default upper bound for buffered request bodies (1 MiB)
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default listen port of the demo server
pub(crate) const DEFAULT_PORT: u16 = 8000;

/// Environment variable name for the body size limit
pub(crate) const MAX_BODY_BYTES_ENV_VAR: &str = "PASSPORT_MAX_BODY_BYTES";

/// Environment variable name for body parsing
pub(crate) const PARSE_BODY_ENV_VAR: &str = "PASSPORT_PARSE_BODY";

/// Environment variable name for the unauthorized message
pub(crate) const UNAUTHORIZED_MESSAGE_ENV_VAR: &str = "PASSPORT_UNAUTHORIZED_MESSAGE";

/// Environment variable name for the demo listen port
pub(crate) const PORT_ENV_VAR: &str = "PASSPORT_PORT";

/// Settings of a [`Passport`](super::Passport) instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassportConfig {
    /// Largest request body buffered into a view.
    pub max_body_bytes: usize,
    /// Whether bodies are read and parsed for strategies at all.
    pub parse_body: bool,
    /// Message used for unauthorized responses.
    pub unauthorized_message: String,
}

impl Default for PassportConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            parse_body: true,
            unauthorized_message: UNAUTHORIZED_MESSAGE.to_string(),
        }
    }
}

impl PassportConfig {
    /// Resolve every setting from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            max_body_bytes: resolve_max_body_bytes(None),
            parse_body: resolve_parse_body(None),
            unauthorized_message: resolve_unauthorized_message(None),
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn with_parse_body(mut self, parse_body: bool) -> Self {
        self.parse_body = parse_body;
        self
    }

    pub fn with_unauthorized_message(mut self, message: impl Into<String>) -> Self {
        self.unauthorized_message = message.into();
        self
    }
}

/// Resolve the body size limit with priority: parameter -> env var -> default
pub(crate) fn resolve_max_body_bytes(param: Option<usize>) -> usize {
    if let Some(limit) = param {
        return limit;
    }

    if let Ok(env_limit) = env::var(MAX_BODY_BYTES_ENV_VAR)
        && let Ok(limit) = env_limit.parse::<usize>()
    {
        return limit;
    }

    DEFAULT_MAX_BODY_BYTES
}

/// Resolve body parsing with priority: parameter -> env var -> default (true)
pub(crate) fn resolve_parse_body(param: Option<bool>) -> bool {
    if let Some(parse) = param {
        return parse;
    }

    if let Ok(env_parse) = env::var(PARSE_BODY_ENV_VAR) {
        return env_parse.eq_ignore_ascii_case("true") || env_parse == "1";
    }

    true
}

/// Resolve the unauthorized message with priority: parameter -> env var -> default
pub(crate) fn resolve_unauthorized_message(param: Option<String>) -> String {
    if let Some(message) = param {
        return message;
    }

    // Blank values would produce empty error bodies
    if let Ok(env_message) = env::var(UNAUTHORIZED_MESSAGE_ENV_VAR)
        && !env_message.trim().is_empty()
    {
        return env_message;
    }

    UNAUTHORIZED_MESSAGE.to_string()
}

/// Resolve the demo listen port with priority: parameter -> env var -> default
pub fn resolve_port(param: Option<u16>) -> u16 {
    if let Some(port) = param {
        return port;
    }

    if let Ok(env_port) = env::var(PORT_ENV_VAR)
        && let Ok(port) = env_port.parse::<u16>()
    {
        return port;
    }

    DEFAULT_PORT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    // Use a mutex to serialize env var tests to avoid race conditions
    static ENV_TEST_MUTEX: once_cell::sync::Lazy<StdMutex<()>> =
        once_cell::sync::Lazy::new(|| StdMutex::new(()));

    /// SAFETY: Must be called while holding ENV_TEST_MUTEX to prevent data races.
    unsafe fn set_env(key: &str, value: &str) {
        // SAFETY: Caller ensures ENV_TEST_MUTEX is held
        unsafe { env::set_var(key, value) };
    }

    /// SAFETY: Must be called while holding ENV_TEST_MUTEX to prevent data races.
    unsafe fn remove_env(key: &str) {
        // SAFETY: Caller ensures ENV_TEST_MUTEX is held
        unsafe { env::remove_var(key) };
    }

    mod max_body_bytes {
        use super::*;

        #[test]
        fn test_uses_param_when_provided() {
            assert_eq!(resolve_max_body_bytes(Some(512)), 512);
        }

        #[test]
        fn test_param_takes_priority_over_env() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(MAX_BODY_BYTES_ENV_VAR, "4096");
            }
            let result = resolve_max_body_bytes(Some(64));
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(MAX_BODY_BYTES_ENV_VAR);
            }
            assert_eq!(result, 64);
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(MAX_BODY_BYTES_ENV_VAR, "2048");
            }
            let result = resolve_max_body_bytes(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(MAX_BODY_BYTES_ENV_VAR);
            }
            assert_eq!(result, 2048);
        }

        #[test]
        fn test_ignores_invalid_env_var() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(MAX_BODY_BYTES_ENV_VAR, "lots");
            }
            let result = resolve_max_body_bytes(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(MAX_BODY_BYTES_ENV_VAR);
            }
            assert_eq!(result, DEFAULT_MAX_BODY_BYTES);
        }
    }

    mod parse_body {
        use super::*;

        #[test]
        fn test_param_false() {
            assert!(!resolve_parse_body(Some(false)));
        }

        #[test]
        fn test_env_var_one() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(PARSE_BODY_ENV_VAR, "1");
            }
            let result = resolve_parse_body(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(PARSE_BODY_ENV_VAR);
            }
            assert!(result);
        }

        #[test]
        fn test_env_var_other_value_is_false() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(PARSE_BODY_ENV_VAR, "off");
            }
            let result = resolve_parse_body(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(PARSE_BODY_ENV_VAR);
            }
            assert!(!result);
        }

        #[test]
        fn test_default_is_true() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(PARSE_BODY_ENV_VAR);
            }
            assert!(resolve_parse_body(None));
        }
    }

    mod unauthorized_message {
        use super::*;

        #[test]
        fn test_env_var_used() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(UNAUTHORIZED_MESSAGE_ENV_VAR, "Login required");
            }
            let result = resolve_unauthorized_message(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(UNAUTHORIZED_MESSAGE_ENV_VAR);
            }
            assert_eq!(result, "Login required");
        }

        #[test]
        fn test_blank_env_var_ignored() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(UNAUTHORIZED_MESSAGE_ENV_VAR, "   ");
            }
            let result = resolve_unauthorized_message(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(UNAUTHORIZED_MESSAGE_ENV_VAR);
            }
            assert_eq!(result, UNAUTHORIZED_MESSAGE);
        }
    }

    mod port {
        use super::*;

        #[test]
        fn test_uses_param_when_provided() {
            assert_eq!(resolve_port(Some(9000)), 9000);
        }

        #[test]
        fn test_ignores_out_of_range_env_var() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(PORT_ENV_VAR, "70000");
            }
            let result = resolve_port(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(PORT_ENV_VAR);
            }
            assert_eq!(result, DEFAULT_PORT);
        }
    }

    #[test]
    fn test_default_config() {
        let config = PassportConfig::default();
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert!(config.parse_body);
        assert_eq!(config.unauthorized_message, "Unauthorized");
    }

    #[test]
    fn test_builder_overrides() {
        let config = PassportConfig::default()
            .with_max_body_bytes(16)
            .with_parse_body(false)
            .with_unauthorized_message("Denied");
        assert_eq!(config.max_body_bytes, 16);
        assert!(!config.parse_body);
        assert_eq!(config.unauthorized_message, "Denied");
    }
}
