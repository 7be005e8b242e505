//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Every mutation runs inside a transaction
//! - Name uniqueness enforced by the `cafes_name_key` constraint
//! - Automatic migration execution
//!
//! Failures are reported as they happen; nothing is retried.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)

use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::DatabaseErrorKind;
use diesel::sql_query;
use diesel::sql_types::Double;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::db::repo_config::database_url_from_env;
use crate::db::repository::cafe::{ensure_price_fits, ensure_valid_candidate};
use crate::db::repository::{CafeRepository, ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{Cafe, CafeId, NewCafe};

mod models;
// Column widths in `schema.rs` follow `models::MAX_TEXT_CHARS` and `MAX_URL_CHARS`.
mod schema;

use models::{CafeRow, NewCafeRow};
use schema::cafes;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = database_url_from_env()
            .ok_or_else(|| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Run a blocking Diesel operation on a pooled connection.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();

        task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new(operation).with_details("get_connection"),
                )
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new(operation).with_details("spawn_blocking"),
            )
        })?
    }
}

fn map_diesel_error(operation: &'static str) -> impl Fn(diesel::result::Error) -> RepositoryError {
    move |err| RepositoryError::from(err).with_operation(operation)
}

fn insert_cafe(conn: &mut PgConnection, cafe: &NewCafe) -> RepositoryResult<Cafe> {
    diesel::insert_into(cafes::table)
        .values(NewCafeRow::from(cafe))
        .returning(CafeRow::as_returning())
        .get_result::<CafeRow>(conn)
        .map(Cafe::from)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                RepositoryError::duplicate_name(&cafe.name)
            }
            other => RepositoryError::from(other).with_operation("insert_cafe"),
        })
}

#[async_trait]
impl CafeRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error("health_check"))
        })
        .await
    }

    async fn create_cafe(&self, cafe: &NewCafe) -> RepositoryResult<Cafe> {
        ensure_valid_candidate(cafe, "create_cafe")?;
        let cafe = cafe.clone();
        self.with_conn("create_cafe", move |conn| {
            conn.transaction(|tx| insert_cafe(tx, &cafe))
        })
        .await
    }

    async fn get_cafe(&self, id: CafeId) -> RepositoryResult<Cafe> {
        self.with_conn("get_cafe", move |conn| {
            cafes::table
                .find(id.value())
                .select(CafeRow::as_select())
                .first::<CafeRow>(conn)
                .optional()
                .map_err(map_diesel_error("get_cafe"))?
                .map(Cafe::from)
                .ok_or_else(|| RepositoryError::cafe_not_found("get_cafe", id))
        })
        .await
    }

    async fn list_cafes(&self) -> RepositoryResult<Vec<Cafe>> {
        self.with_conn("list_cafes", |conn| {
            let rows = cafes::table
                .select(CafeRow::as_select())
                .order((cafes::name.asc(), cafes::id.asc()))
                .load::<CafeRow>(conn)
                .map_err(map_diesel_error("list_cafes"))?;
            Ok(rows.into_iter().map(Cafe::from).collect())
        })
        .await
    }

    async fn list_cafes_by_location(&self, location: &str) -> RepositoryResult<Vec<Cafe>> {
        let location = location.to_string();
        self.with_conn("list_cafes_by_location", move |conn| {
            let rows = cafes::table
                .filter(cafes::location.eq(&location))
                .select(CafeRow::as_select())
                .order(cafes::id.asc())
                .load::<CafeRow>(conn)
                .map_err(map_diesel_error("list_cafes_by_location"))?;
            Ok(rows.into_iter().map(Cafe::from).collect())
        })
        .await
    }

    async fn random_cafe(&self) -> RepositoryResult<Option<Cafe>> {
        self.with_conn("random_cafe", |conn| {
            let row = cafes::table
                .select(CafeRow::as_select())
                .order(sql::<Double>("RANDOM()"))
                .first::<CafeRow>(conn)
                .optional()
                .map_err(map_diesel_error("random_cafe"))?;
            Ok(row.map(Cafe::from))
        })
        .await
    }

    async fn update_price(&self, id: CafeId, new_price: &str) -> RepositoryResult<Cafe> {
        ensure_price_fits(new_price, id, "update_price")?;
        let new_price = new_price.to_string();
        self.with_conn("update_price", move |conn| {
            conn.transaction(|tx| {
                diesel::update(cafes::table.find(id.value()))
                    .set(cafes::coffee_price.eq(Some(new_price)))
                    .returning(CafeRow::as_returning())
                    .get_result::<CafeRow>(tx)
                    .optional()
                    .map_err(map_diesel_error("update_price"))?
                    .map(Cafe::from)
                    .ok_or_else(|| RepositoryError::cafe_not_found("update_price", id))
            })
        })
        .await
    }

    async fn delete_cafe(&self, id: CafeId) -> RepositoryResult<()> {
        self.with_conn("delete_cafe", move |conn| {
            conn.transaction(|tx| {
                let deleted = diesel::delete(cafes::table.find(id.value()))
                    .execute(tx)
                    .map_err(map_diesel_error("delete_cafe"))?;
                if deleted == 0 {
                    return Err(RepositoryError::cafe_not_found("delete_cafe", id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn count_cafes(&self) -> RepositoryResult<usize> {
        self.with_conn("count_cafes", |conn| {
            let count: i64 = cafes::table
                .count()
                .get_result(conn)
                .map_err(map_diesel_error("count_cafes"))?;
            Ok(count as usize)
        })
        .await
    }

    async fn seed_if_empty(&self, candidates: &[NewCafe]) -> RepositoryResult<usize> {
        for cafe in candidates {
            ensure_valid_candidate(cafe, "seed_if_empty")?;
        }
        let candidates = candidates.to_vec();

        self.with_conn("seed_if_empty", move |conn| {
            conn.transaction(|tx| {
                // Concurrent seeders wait here instead of both seeing an empty table.
                sql_query("LOCK TABLE cafes IN SHARE ROW EXCLUSIVE MODE")
                    .execute(tx)
                    .map_err(map_diesel_error("seed_if_empty"))?;

                let existing: i64 = cafes::table
                    .count()
                    .get_result(tx)
                    .map_err(map_diesel_error("seed_if_empty"))?;
                if existing > 0 {
                    return Ok(0);
                }

                for cafe in &candidates {
                    insert_cafe(tx, cafe).map_err(|e| e.with_operation("seed_if_empty"))?;
                }
                Ok(candidates.len())
            })
        })
        .await
    }
}
