//! In-memory local repository implementation.
//!
//! All data lives behind a single `RwLock`. Reads share the lock; every
//! mutation, including its uniqueness check, runs under one write guard, so a
//! reader never observes a half-applied change.

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::seq::IteratorRandom;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::db::repository::cafe::{ensure_price_fits, ensure_valid_candidate};
use crate::db::repository::*;
use crate::models::{Cafe, CafeId, NewCafe};

/// In-memory local repository.
///
/// Ids start at 1 and only ever grow; a deleted id is never handed out again.
///
/// # Example
/// ```
/// use cafe_directory::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.cafe_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    cafes: BTreeMap<CafeId, Cafe>,
    ids_by_name: HashMap<String, CafeId>,
    next_id: i32,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            cafes: BTreeMap::new(),
            ids_by_name: HashMap::new(),
            next_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn ensure_healthy(&self, operation: &str) -> RepositoryResult<()> {
        if self.is_healthy {
            return Ok(());
        }
        Err(RepositoryError::connection_with_context(
            "Database is not healthy",
            ErrorContext::new(operation),
        ))
    }

    fn allocate_id(&mut self) -> RepositoryResult<CafeId> {
        let id = CafeId::new(self.next_id);
        self.next_id = self.next_id.checked_add(1).ok_or_else(|| {
            RepositoryError::internal_with_context(
                "Cafe id space exhausted",
                ErrorContext::new("allocate_id").with_entity("cafe"),
            )
        })?;
        Ok(id)
    }

    fn insert(&mut self, candidate: &NewCafe) -> RepositoryResult<Cafe> {
        if self.ids_by_name.contains_key(&candidate.name) {
            return Err(RepositoryError::duplicate_name(&candidate.name));
        }
        let cafe = candidate.clone().into_cafe(self.allocate_id()?);
        self.ids_by_name.insert(cafe.name.clone(), cafe.id);
        self.cafes.insert(cafe.id, cafe.clone());
        Ok(cafe)
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing storage failures.
    ///
    /// While unhealthy every operation fails with a connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Remove every cafe. The id counter keeps running.
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.cafes.clear();
        data.ids_by_name.clear();
    }

    /// Number of cafes stored, without going through the async API.
    pub fn cafe_count(&self) -> usize {
        self.data.read().cafes.len()
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CafeRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn create_cafe(&self, cafe: &NewCafe) -> RepositoryResult<Cafe> {
        ensure_valid_candidate(cafe, "create_cafe")?;
        let mut data = self.data.write();
        data.ensure_healthy("create_cafe")?;
        data.insert(cafe)
    }

    async fn get_cafe(&self, id: CafeId) -> RepositoryResult<Cafe> {
        let data = self.data.read();
        data.ensure_healthy("get_cafe")?;
        data.cafes
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::cafe_not_found("get_cafe", id))
    }

    async fn list_cafes(&self) -> RepositoryResult<Vec<Cafe>> {
        let data = self.data.read();
        data.ensure_healthy("list_cafes")?;
        let mut cafes: Vec<Cafe> = data.cafes.values().cloned().collect();
        cafes.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(cafes)
    }

    async fn list_cafes_by_location(&self, location: &str) -> RepositoryResult<Vec<Cafe>> {
        let data = self.data.read();
        data.ensure_healthy("list_cafes_by_location")?;
        // BTreeMap iteration is already in id order.
        Ok(data
            .cafes
            .values()
            .filter(|cafe| cafe.location == location)
            .cloned()
            .collect())
    }

    async fn random_cafe(&self) -> RepositoryResult<Option<Cafe>> {
        let data = self.data.read();
        data.ensure_healthy("random_cafe")?;
        Ok(data.cafes.values().choose(&mut rand::thread_rng()).cloned())
    }

    async fn update_price(&self, id: CafeId, new_price: &str) -> RepositoryResult<Cafe> {
        ensure_price_fits(new_price, id, "update_price")?;
        let mut data = self.data.write();
        data.ensure_healthy("update_price")?;
        let cafe = data
            .cafes
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::cafe_not_found("update_price", id))?;
        cafe.coffee_price = Some(new_price.to_string());
        Ok(cafe.clone())
    }

    async fn delete_cafe(&self, id: CafeId) -> RepositoryResult<()> {
        let mut data = self.data.write();
        data.ensure_healthy("delete_cafe")?;
        let removed = data
            .cafes
            .remove(&id)
            .ok_or_else(|| RepositoryError::cafe_not_found("delete_cafe", id))?;
        data.ids_by_name.remove(&removed.name);
        Ok(())
    }

    async fn count_cafes(&self) -> RepositoryResult<usize> {
        let data = self.data.read();
        data.ensure_healthy("count_cafes")?;
        Ok(data.cafes.len())
    }

    async fn seed_if_empty(&self, cafes: &[NewCafe]) -> RepositoryResult<usize> {
        for cafe in cafes {
            ensure_valid_candidate(cafe, "seed_if_empty")?;
        }

        let mut data = self.data.write();
        data.ensure_healthy("seed_if_empty")?;
        if !data.cafes.is_empty() {
            return Ok(0);
        }

        // Stage into a copy so a duplicate halfway through leaves nothing behind.
        let mut staged = LocalData {
            cafes: BTreeMap::new(),
            ids_by_name: HashMap::new(),
            next_id: data.next_id,
            is_healthy: true,
        };
        for cafe in cafes {
            staged
                .insert(cafe)
                .map_err(|e| e.with_operation("seed_if_empty"))?;
        }

        data.cafes = staged.cafes;
        data.ids_by_name = staged.ids_by_name;
        data.next_id = staged.next_id;
        Ok(cafes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cafe(name: &str, location: &str) -> NewCafe {
        NewCafe {
            name: name.to_string(),
            map_url: format!("https://maps.example.com/?q={}", name),
            img_url: format!("https://img.example.com/{}.jpg", name),
            location: location.to_string(),
            has_sockets: true,
            has_toilet: true,
            has_wifi: false,
            can_take_calls: false,
            seats: Some("20-30".to_string()),
            coffee_price: Some("$3.50".to_string()),
        }
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let repo = LocalRepository::new();
        let first = repo.create_cafe(&cafe("A", "X")).await.unwrap();
        repo.delete_cafe(first.id).await.unwrap();
        let second = repo.create_cafe(&cafe("A", "X")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_deleted_name_can_be_used_again() {
        let repo = LocalRepository::new();
        let first = repo.create_cafe(&cafe("Reborn", "X")).await.unwrap();
        repo.delete_cafe(first.id).await.unwrap();
        assert!(repo.create_cafe(&cafe("Reborn", "Y")).await.is_ok());
    }

    #[tokio::test]
    async fn test_unhealthy_repository_fails_every_operation() {
        let repo = LocalRepository::new();
        let stored = repo.create_cafe(&cafe("A", "X")).await.unwrap();
        repo.set_healthy(false);

        assert!(!repo.health_check().await.unwrap());
        let err = repo.create_cafe(&cafe("B", "X")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConnectionError { .. }));
        assert!(repo.get_cafe(stored.id).await.is_err());
        assert!(repo.update_price(stored.id, "$1").await.is_err());
        assert!(repo.delete_cafe(stored.id).await.is_err());

        repo.set_healthy(true);
        assert_eq!(repo.cafe_count(), 1);
        assert_eq!(repo.get_cafe(stored.id).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_seed_is_all_or_nothing() {
        let repo = LocalRepository::new();
        let batch = vec![cafe("A", "X"), cafe("B", "X"), cafe("A", "Y")];
        let err = repo.seed_if_empty(&batch).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateName { .. }));
        assert_eq!(repo.cafe_count(), 0);

        let inserted = repo.seed_if_empty(&batch[..2]).await.unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(repo.seed_if_empty(&[cafe("C", "Z")]).await.unwrap(), 0);
        assert_eq!(repo.cafe_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_keeps_id_counter() {
        let repo = LocalRepository::new();
        let first = repo.create_cafe(&cafe("A", "X")).await.unwrap();
        repo.clear();
        assert_eq!(repo.cafe_count(), 0);
        let next = repo.create_cafe(&cafe("A", "X")).await.unwrap();
        assert!(next.id > first.id);
    }
}
