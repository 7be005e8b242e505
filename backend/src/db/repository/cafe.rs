//! Cafe repository trait.
//!
//! Defines the store operations every backend provides. Implementations own
//! id assignment and the uniqueness of `name`; callers never write records
//! directly.

use async_trait::async_trait;

use super::error::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{exceeds_limit, Cafe, CafeId, NewCafe, MAX_TEXT_CHARS};

/// Reject a candidate with an empty required text field or a field longer
/// than its column.
///
/// Backends call this before writing anything so that the rules are the same
/// whichever storage is in use.
pub fn ensure_valid_candidate(cafe: &NewCafe, operation: &str) -> RepositoryResult<()> {
    let missing = cafe.missing_fields();
    if !missing.is_empty() {
        return Err(RepositoryError::validation_with_context(
            format!("Missing required field(s): {}", missing.join(", ")),
            ErrorContext::new(operation).with_entity("cafe"),
        ));
    }

    let oversized = cafe.oversized_fields();
    if !oversized.is_empty() {
        return Err(RepositoryError::validation_with_context(
            describe_oversized(&oversized),
            ErrorContext::new(operation).with_entity("cafe"),
        ));
    }
    Ok(())
}

/// Reject a price that does not fit the `coffee_price` column.
pub fn ensure_price_fits(new_price: &str, id: CafeId, operation: &str) -> RepositoryResult<()> {
    if !exceeds_limit(new_price, MAX_TEXT_CHARS) {
        return Ok(());
    }
    Err(RepositoryError::validation_with_context(
        describe_oversized(&[("coffee_price", MAX_TEXT_CHARS)]),
        ErrorContext::new(operation)
            .with_entity("cafe")
            .with_entity_id(id),
    ))
}

/// `Field(s) too long: name (max 250 characters), ...`
pub fn describe_oversized(fields: &[(&str, usize)]) -> String {
    let list: Vec<String> = fields
        .iter()
        .map(|(field, limit)| format!("{} (max {} characters)", field, limit))
        .collect();
    format!("Field(s) too long: {}", list.join(", "))
}

/// Persistent collection of cafes.
///
/// # Atomicity
/// Every mutating method is all-or-nothing with respect to concurrent callers:
/// a reader either sees the complete effect of a create/update/delete or none
/// of it, and two concurrent creates with the same name yield exactly one
/// success.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to be shared across request tasks.
#[async_trait]
pub trait CafeRepository: Send + Sync {
    /// Check if the backing storage is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store a new cafe and return it with its assigned id.
    ///
    /// # Errors
    /// * `RepositoryError::ValidationError` - a required text field is empty or
    ///   a field is longer than its column
    /// * `RepositoryError::DuplicateName` - a cafe with the same name exists
    async fn create_cafe(&self, cafe: &NewCafe) -> RepositoryResult<Cafe>;

    /// Retrieve a cafe by id.
    ///
    /// # Errors
    /// * `RepositoryError::NotFound` - no cafe with that id
    async fn get_cafe(&self, id: CafeId) -> RepositoryResult<Cafe>;

    /// All cafes, ascending by name.
    async fn list_cafes(&self) -> RepositoryResult<Vec<Cafe>>;

    /// Cafes whose location equals `location` exactly, ascending by id.
    ///
    /// No match is an empty vector, not an error.
    async fn list_cafes_by_location(&self, location: &str) -> RepositoryResult<Vec<Cafe>>;

    /// A cafe chosen uniformly at random, or `None` when the store is empty.
    async fn random_cafe(&self) -> RepositoryResult<Option<Cafe>>;

    /// Replace the coffee price of a cafe, leaving every other field untouched.
    ///
    /// # Errors
    /// * `RepositoryError::NotFound` - no cafe with that id; nothing is changed
    /// * `RepositoryError::ValidationError` - the price is longer than its column
    async fn update_price(&self, id: CafeId, new_price: &str) -> RepositoryResult<Cafe>;

    /// Permanently remove a cafe.
    ///
    /// # Errors
    /// * `RepositoryError::NotFound` - no cafe with that id
    async fn delete_cafe(&self, id: CafeId) -> RepositoryResult<()>;

    /// Number of stored cafes.
    async fn count_cafes(&self) -> RepositoryResult<usize>;

    /// Insert `cafes` in one transaction, but only if the store is empty.
    ///
    /// # Returns
    /// * `Ok(n)` - number of inserted cafes (0 when the store already had data)
    /// * `Err(RepositoryError)` - nothing was inserted
    async fn seed_if_empty(&self, cafes: &[NewCafe]) -> RepositoryResult<usize>;
}
