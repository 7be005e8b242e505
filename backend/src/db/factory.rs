//! Startup construction of the cafe store.
//!
//! The binary opens exactly one repository through [`RepositoryFactory`] and
//! hands it to the HTTP state; nothing else constructs a backend. The backend
//! is named either by the `[repository]` section of a config file or by the
//! environment:
//!
//! | `REPOSITORY_TYPE`   | database URL set | backend  |
//! |---------------------|------------------|----------|
//! | `postgres` / `pg`   | any              | Postgres |
//! | `local` / `memory`  | any              | Local    |
//! | anything else       | any              | error    |
//! | unset               | yes              | Postgres |
//! | unset               | no               | Local    |

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use log::info;

use super::repo_config::{database_url_from_env, RepositoryConfig};
use super::repositories::LocalRepository;
use super::repository::{CafeRepository, RepositoryError, RepositoryResult};
#[cfg(feature = "postgres-repo")]
use super::{repositories::PostgresRepository, PostgresConfig};

/// Storage backend behind the cafe store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres through Diesel
    Postgres,
    /// In-memory, lost on restart
    Local,
}

impl fmt::Display for RepositoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RepositoryType::Postgres => "postgres",
            RepositoryType::Local => "local",
        })
    }
}

impl FromStr for RepositoryType {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(RepositoryError::configuration(format!(
                "Unknown repository type '{}' (expected 'local' or 'postgres')",
                s
            ))),
        }
    }
}

impl RepositoryType {
    /// Backend named by `REPOSITORY_TYPE`, or implied by a database URL.
    ///
    /// # Errors
    /// * `RepositoryError::ConfigurationError` - `REPOSITORY_TYPE` is set to an
    ///   unknown value
    pub fn from_env() -> RepositoryResult<Self> {
        match std::env::var("REPOSITORY_TYPE") {
            Ok(value) => value.parse(),
            Err(_) if database_url_from_env().is_some() => Ok(Self::Postgres),
            Err(_) => Ok(Self::Local),
        }
    }
}

/// Opens the configured repository.
///
/// # Example
/// ```
/// use cafe_directory::db::RepositoryFactory;
///
/// let repo = RepositoryFactory::create_local();
/// assert_eq!(std::sync::Arc::strong_count(&repo), 1);
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// A fresh, empty in-memory store.
    pub fn create_local() -> Arc<dyn CafeRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Connect to Postgres and apply pending migrations.
    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: PostgresConfig,
    ) -> RepositoryResult<Arc<dyn CafeRepository>> {
        // Pool construction and migrations block.
        let repo = tokio::task::spawn_blocking(move || PostgresRepository::new(config))
            .await
            .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))??;
        Ok(Arc::new(repo))
    }

    /// Open the backend chosen by the environment (see the module table).
    pub async fn from_env() -> RepositoryResult<Arc<dyn CafeRepository>> {
        let kind = RepositoryType::from_env()?;
        info!("Opening {} repository (from environment)", kind);
        match kind {
            RepositoryType::Local => Ok(Self::create_local()),
            #[cfg(feature = "postgres-repo")]
            RepositoryType::Postgres => {
                let config = PostgresConfig::from_env().map_err(RepositoryError::configuration)?;
                Self::create_postgres(config).await
            }
            #[cfg(not(feature = "postgres-repo"))]
            RepositoryType::Postgres => Err(postgres_disabled()),
        }
    }

    /// Open the backend named in a TOML file's `[repository]` section.
    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn CafeRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config).await
    }

    /// Open the backend described by `config`.
    pub async fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn CafeRepository>> {
        let kind = config.repository_type()?;
        info!("Opening {} repository (from config file)", kind);
        match kind {
            RepositoryType::Local => Ok(Self::create_local()),
            #[cfg(feature = "postgres-repo")]
            RepositoryType::Postgres => Self::create_postgres(config.to_postgres_config()?).await,
            #[cfg(not(feature = "postgres-repo"))]
            RepositoryType::Postgres => Err(postgres_disabled()),
        }
    }
}

#[cfg(not(feature = "postgres-repo"))]
fn postgres_disabled() -> RepositoryError {
    RepositoryError::configuration("Postgres repository feature not enabled")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_type_parsing() {
        assert_eq!("local".parse::<RepositoryType>().unwrap(), RepositoryType::Local);
        assert_eq!("Memory".parse::<RepositoryType>().unwrap(), RepositoryType::Local);
        assert_eq!(" Pg ".parse::<RepositoryType>().unwrap(), RepositoryType::Postgres);

        let err = "postgress".parse::<RepositoryType>().unwrap_err();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
        assert!(err.to_string().contains("postgress"));
    }

    #[test]
    fn test_display_round_trips() {
        for kind in [RepositoryType::Local, RepositoryType::Postgres] {
            assert_eq!(kind.to_string().parse::<RepositoryType>().unwrap(), kind);
        }
    }

    #[tokio::test]
    async fn test_create_local_repository() {
        let repo = RepositoryFactory::create_local();
        assert!(repo.health_check().await.unwrap());
        assert_eq!(repo.count_cafes().await.unwrap(), 0);
    }

    #[cfg(not(feature = "postgres-repo"))]
    #[tokio::test]
    async fn test_postgres_without_feature_is_configuration_error() {
        let config: RepositoryConfig = toml::from_str("[repository]\ntype = \"postgres\"").unwrap();
        let err = RepositoryFactory::from_repository_config(&config)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    }
}
