//! Application state for the HTTP server.

use std::fmt;
use std::sync::Arc;

use crate::db::repository::CafeRepository;

/// Shared secret required to delete cafes.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Arc::from(key.into()))
    }

    /// The only place a presented key is compared with the configured one.
    pub fn matches(&self, presented: Option<&str>) -> bool {
        presented.is_some_and(|key| key == &*self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn CafeRepository>,
    pub api_key: ApiKey,
}

impl AppState {
    /// Create a new application state with the given repository and secret.
    pub fn new(repository: Arc<dyn CafeRepository>, api_key: ApiKey) -> Self {
        Self {
            repository,
            api_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_requires_exact_match() {
        let key = ApiKey::new("TopSecretAPIKey");
        assert!(key.matches(Some("TopSecretAPIKey")));
        assert!(!key.matches(Some("topsecretapikey")));
        assert!(!key.matches(Some("TopSecretAPIKey ")));
        assert!(!key.matches(Some("")));
        assert!(!key.matches(None));
    }

    #[test]
    fn test_api_key_is_not_printed() {
        assert_eq!(format!("{:?}", ApiKey::new("hunter2")), "ApiKey(***)");
    }
}
