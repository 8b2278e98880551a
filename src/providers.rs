//! Shared provider traits for dependency injection.
//!
//! External dependencies are abstracted behind traits so components can be
//! tested in isolation with mock implementations.

/// Trait for reading process environment variables.
///
/// The translator reads its API credential through this trait instead of
/// `std::env` directly, so tests can exercise the missing-credential path
/// without touching the real environment.
///
/// # Example
///
/// ```
/// use nlsh::providers::{EnvProvider, SystemEnv};
///
/// let env = SystemEnv;
/// // PATH exists on every supported platform
/// assert!(env.var("PATH").is_some());
/// ```
pub trait EnvProvider: Send + Sync {
    /// Returns the value of the variable, or `None` if unset or not UTF-8.
    fn var(&self, key: &str) -> Option<String>;
}

/// Default environment provider backed by `std::env`.
pub struct SystemEnv;

impl EnvProvider for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}
