//! Seed file import into an empty store.

mod support;

use std::io::Write;

use cafe_directory::db::repositories::LocalRepository;
use cafe_directory::db::repository::{CafeRepository, RepositoryError};
use cafe_directory::db::{seed, services, SeedError};
use support::cafe;
use tempfile::NamedTempFile;

const SEED: &str = "\
name,map_url,img_url,location,has_sockets,has_toilet,has_wifi,can_take_calls,seats,coffee_price
\"Brew & Bytes\",https://maps.example.com/bb,https://img.example.com/bb.jpg,Tech District,true,true,true,yes,15-20,$4.00
Central Perk,https://maps.example.com/cp,https://img.example.com/cp.jpg,City Center,1,0,1,0,,
";

fn seed_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_seed_file_is_imported_once() {
    let file = seed_file(SEED);
    let cafes = seed::load_file(file.path()).unwrap();
    assert_eq!(cafes.len(), 2);

    let repo = LocalRepository::new();
    assert_eq!(services::seed_if_empty(&repo, &cafes).await.unwrap(), 2);
    assert_eq!(services::seed_if_empty(&repo, &cafes).await.unwrap(), 0);

    let stored = repo.list_cafes().await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].name, "Brew & Bytes");
    assert!(stored[0].can_take_calls);
    assert_eq!(stored[1].seats, None);
    assert_eq!(stored[1].coffee_price, None);
}

#[tokio::test]
async fn test_seed_skips_non_empty_store() {
    let repo = LocalRepository::new();
    repo.create_cafe(&cafe("Existing", "X")).await.unwrap();

    let imported = services::seed_if_empty(&repo, &seed::sample_cafes())
        .await
        .unwrap();
    assert_eq!(imported, 0);
    assert_eq!(repo.cafe_count(), 1);
}

#[tokio::test]
async fn test_seed_with_duplicate_imports_nothing() {
    let duplicated = format!(
        "{}Central Perk,https://maps.example.com/x,https://img.example.com/x.jpg,Elsewhere,no,no,no,no,,\n",
        SEED
    );
    let file = seed_file(&duplicated);
    let cafes = seed::load_file(file.path()).unwrap();
    assert_eq!(cafes.len(), 3);

    let repo = LocalRepository::new();
    let err = services::seed_if_empty(&repo, &cafes).await.unwrap_err();
    assert!(matches!(err, RepositoryError::DuplicateName { .. }));
    assert_eq!(repo.cafe_count(), 0);

    // The failed import leaves the store usable.
    repo.create_cafe(&cafe("After", "X")).await.unwrap();
    assert_eq!(repo.cafe_count(), 1);
}

#[tokio::test]
async fn test_sample_cafes_seed_cleanly() {
    let repo = LocalRepository::new();
    let samples = seed::sample_cafes();
    let imported = services::seed_if_empty(&repo, &samples).await.unwrap();
    assert_eq!(imported, samples.len());

    let random = repo.random_cafe().await.unwrap().unwrap();
    assert!(samples.contains(&random.to_new_cafe()));
}

#[test]
fn test_missing_seed_file_is_io_error() {
    let err = seed::load_file("/nonexistent/cafe-data.csv").unwrap_err();
    assert!(matches!(err, SeedError::Io(_)));
}

#[test]
fn test_bad_row_rejects_whole_file() {
    let broken = format!("{}Nameless,,https://img.example.com/n.jpg,X,true,true,true,true,,\n", SEED);
    let file = seed_file(&broken);
    let err = seed::load_file(file.path()).unwrap_err();
    assert!(matches!(
        err,
        SeedError::EmptyField {
            line: 4,
            column: "map_url"
        }
    ));
}
