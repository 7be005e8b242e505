#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use cafe_directory::models::NewCafe;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on drop (also when `f` panics) and serializes
/// access to the process environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

/// Every variable the server reads, cleared so a developer's shell does not
/// leak into a test.
pub const CLEAN_ENV: [(&str, Option<&str>); 10] = [
    ("CAFES_CONFIG", None),
    ("HOST", None),
    ("PORT", None),
    ("CAFES_API_KEY", None),
    ("CAFES_SEED_FILE", None),
    ("CAFES_SEED_SAMPLE", None),
    ("REPOSITORY_TYPE", None),
    ("DATABASE_URL", None),
    ("PG_DATABASE_URL", None),
    ("PG_POOL_MAX", None),
];

/// [`CLEAN_ENV`] followed by `overrides`.
pub fn clean_env_with<'a>(
    overrides: &[(&'a str, Option<&'a str>)],
) -> Vec<(&'a str, Option<&'a str>)> {
    CLEAN_ENV
        .iter()
        .copied()
        .filter(|(key, _)| !overrides.iter().any(|(k, _)| k == key))
        .chain(overrides.iter().copied())
        .collect()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// A complete candidate record.
pub fn cafe(name: &str, location: &str) -> NewCafe {
    let slug = name.to_lowercase().replace(' ', "-");
    NewCafe {
        name: name.to_string(),
        map_url: format!("https://maps.example.com/{}", slug),
        img_url: format!("https://img.example.com/{}.jpg", slug),
        location: location.to_string(),
        has_sockets: true,
        has_toilet: false,
        has_wifi: true,
        can_take_calls: false,
        seats: Some("10-15".to_string()),
        coffee_price: Some("$3.00".to_string()),
    }
}
