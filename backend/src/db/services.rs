//! High-level database service layer.
//!
//! Repository-agnostic operations used by the HTTP handlers and the server
//! binary. Each function logs what it is about to do and delegates to the
//! repository; rules that must hold for every backend (required fields,
//! uniqueness) live in the backends themselves.
//!
//! # Usage
//!
//! ```no_run
//! use cafe_directory::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let cafes = services::list_cafes(&repo).await?;
//!     println!("Found {} cafes", cafes.len());
//!     Ok(())
//! }
//! ```

use log::{debug, info, warn};

use super::repository::{CafeRepository, RepositoryResult};
use crate::models::{Cafe, CafeId, NewCafe};

// ==================== Health & Connection ====================

/// Check if the database connection is healthy.
pub async fn health_check<R: CafeRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Cafe Operations ====================

/// Store a new cafe.
///
/// # Returns
/// * `Ok(Cafe)` - the stored record with its assigned id
/// * `Err` - validation failure, duplicate name or storage failure
pub async fn create_cafe<R: CafeRepository + ?Sized>(
    repo: &R,
    cafe: &NewCafe,
) -> RepositoryResult<Cafe> {
    info!(
        "Service layer: creating cafe '{}' at '{}'",
        cafe.name, cafe.location
    );
    let stored = repo.create_cafe(cafe).await?;
    info!("Service layer: stored cafe '{}' as id {}", stored.name, stored.id);
    Ok(stored)
}

/// Retrieve a cafe by id.
pub async fn get_cafe<R: CafeRepository + ?Sized>(repo: &R, id: CafeId) -> RepositoryResult<Cafe> {
    debug!("Service layer: loading cafe {}", id);
    repo.get_cafe(id).await
}

/// List all cafes ordered by name.
pub async fn list_cafes<R: CafeRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Cafe>> {
    debug!("Service layer: listing all cafes");
    repo.list_cafes().await
}

/// List the cafes at `location`, ordered by id.
pub async fn search_by_location<R: CafeRepository + ?Sized>(
    repo: &R,
    location: &str,
) -> RepositoryResult<Vec<Cafe>> {
    debug!("Service layer: searching cafes at '{}'", location);
    repo.list_cafes_by_location(location).await
}

/// Pick a random cafe; `None` when there are none.
pub async fn random_cafe<R: CafeRepository + ?Sized>(repo: &R) -> RepositoryResult<Option<Cafe>> {
    repo.random_cafe().await
}

/// Replace the coffee price of a cafe.
pub async fn update_price<R: CafeRepository + ?Sized>(
    repo: &R,
    id: CafeId,
    new_price: &str,
) -> RepositoryResult<Cafe> {
    info!(
        "Service layer: setting price of cafe {} to '{}'",
        id, new_price
    );
    repo.update_price(id, new_price).await
}

/// Delete a cafe permanently.
pub async fn delete_cafe<R: CafeRepository + ?Sized>(repo: &R, id: CafeId) -> RepositoryResult<()> {
    info!("Service layer: deleting cafe {}", id);
    repo.delete_cafe(id).await
}

// ==================== Seeding ====================

/// Import `cafes` when the store is empty.
///
/// The import is one transaction: either every record is stored or none is.
///
/// # Returns
/// * `Ok(n)` - number of imported cafes, 0 when the store already had data
pub async fn seed_if_empty<R: CafeRepository + ?Sized>(
    repo: &R,
    cafes: &[NewCafe],
) -> RepositoryResult<usize> {
    if cafes.is_empty() {
        debug!("Service layer: no seed records supplied");
        return Ok(0);
    }

    match repo.seed_if_empty(cafes).await {
        Ok(0) => {
            let existing = repo.count_cafes().await?;
            info!(
                "Service layer: store already has {} cafes, skipped seed import",
                existing
            );
            Ok(0)
        }
        Ok(inserted) => {
            info!("Service layer: imported {} seed cafes", inserted);
            Ok(inserted)
        }
        Err(e) => {
            warn!("Service layer: seed import failed, nothing imported: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::RepositoryError;
    use crate::db::seed::sample_cafes;

    #[tokio::test]
    async fn test_services_accept_trait_objects() {
        let repo: std::sync::Arc<dyn CafeRepository> = std::sync::Arc::new(LocalRepository::new());
        let stored = create_cafe(repo.as_ref(), &sample_cafes()[0]).await.unwrap();
        assert_eq!(get_cafe(repo.as_ref(), stored.id).await.unwrap(), stored);
        assert!(health_check(repo.as_ref()).await.unwrap());
    }

    #[tokio::test]
    async fn test_seed_runs_once() {
        let repo = LocalRepository::new();
        assert_eq!(seed_if_empty(&repo, &sample_cafes()).await.unwrap(), 4);
        assert_eq!(seed_if_empty(&repo, &sample_cafes()).await.unwrap(), 0);
        assert_eq!(repo.cafe_count(), 4);
    }

    #[tokio::test]
    async fn test_seed_with_no_records_is_a_no_op() {
        let repo = LocalRepository::new();
        assert_eq!(seed_if_empty(&repo, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_failure_propagates() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        let err = seed_if_empty(&repo, &sample_cafes()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConnectionError { .. }));
    }
}
