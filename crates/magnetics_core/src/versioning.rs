//! Version gate for persisted stores.
//!
//! When the persisted schema changes incompatibly the cutoff date is moved
//! forward; any client whose stored date is older (or missing) starts from a
//! clean slate on its next load.

use chrono::{DateTime, NaiveDate};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::traits::KeyValueStore;

pub const STORE_VERSION_KEY: &str = "openMagnetics_storeVersionDate";
pub const STORE_VERSION_DATE: &str = "2026-01-28";
pub const PERSISTENT_STORE_KEYS: [&str; 7] = [
    "adviseCache",
    "catalog",
    "crossReferencer",
    "mas",
    "settings",
    "state",
    "user",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreVersionConfig {
    pub version_key: String,
    /// Cutoff in `YYYY-MM-DD` form.
    pub version_date: String,
    pub store_keys: Vec<String>,
}

impl Default for StoreVersionConfig {
    fn default() -> Self {
        Self {
            version_key: STORE_VERSION_KEY.to_string(),
            version_date: STORE_VERSION_DATE.to_string(),
            store_keys: PERSISTENT_STORE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

fn clear_all_persistent_stores<S: KeyValueStore + ?Sized>(
    storage: &mut S,
    config: &StoreVersionConfig,
) -> Result<(), StoreError> {
    info!("clearing all persistent stores");
    for key in &config.store_keys {
        if storage.get(key)?.is_some() {
            storage.remove(key)?;
            info!("cleared store {key}");
        }
    }
    Ok(())
}

fn update_stored_version_date<S: KeyValueStore + ?Sized>(
    storage: &mut S,
    config: &StoreVersionConfig,
) -> Result<(), StoreError> {
    storage.set(&config.version_key, &config.version_date)?;
    info!("store version date set to {}", config.version_date);
    Ok(())
}

/// Clears every persistent store when the stored version date is missing,
/// unreadable or older than the cutoff, then records the cutoff. Returns
/// whether anything was cleared. Must run before any store is loaded.
pub fn check_and_clear_outdated_stores<S: KeyValueStore + ?Sized>(
    storage: &mut S,
    config: &StoreVersionConfig,
) -> Result<bool, StoreError> {
    let stored = storage.get(&config.version_key)?;
    info!(
        "store version date: required {}, stored {}",
        config.version_date,
        stored.as_deref().unwrap_or("not set")
    );

    let outdated = match stored.as_deref().filter(|s| !s.is_empty()) {
        None => true,
        Some(stored) => match (parse_date(stored), parse_date(&config.version_date)) {
            (Some(stored), Some(required)) => stored < required,
            _ => true,
        },
    };

    if !outdated {
        return Ok(false);
    }
    clear_all_persistent_stores(storage, config)?;
    update_stored_version_date(storage, config)?;
    Ok(true)
}

/// Clears every persistent store regardless of the stored date.
pub fn force_reset_all_stores<S: KeyValueStore + ?Sized>(
    storage: &mut S,
    config: &StoreVersionConfig,
) -> Result<(), StoreError> {
    clear_all_persistent_stores(storage, config)?;
    update_stored_version_date(storage, config)
}

pub fn stored_version_date<S: KeyValueStore + ?Sized>(
    storage: &S,
    config: &StoreVersionConfig,
) -> Result<Option<String>, StoreError> {
    storage.get(&config.version_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;

    fn populated() -> MemoryStore {
        let mut storage = MemoryStore::new();
        for key in PERSISTENT_STORE_KEYS {
            storage.set(key, "{}").expect("set");
        }
        storage.set("unrelated", "keep").expect("set");
        storage
    }

    #[test]
    fn missing_version_clears_all_stores_and_writes_date() {
        let mut storage = populated();
        let config = StoreVersionConfig::default();
        assert!(check_and_clear_outdated_stores(&mut storage, &config).expect("check"));

        for key in PERSISTENT_STORE_KEYS {
            assert_eq!(storage.get(key).expect("get"), None, "{key} should be cleared");
        }
        assert_eq!(storage.get("unrelated").expect("get").as_deref(), Some("keep"));
        assert_eq!(
            stored_version_date(&storage, &config).expect("get").as_deref(),
            Some("2026-01-28")
        );
    }

    #[test]
    fn current_or_newer_version_is_left_alone() {
        let config = StoreVersionConfig::default();
        for date in ["2026-01-28", "2026-03-01", "2026-02-01T10:00:00Z"] {
            let mut storage = populated();
            storage.set(STORE_VERSION_KEY, date).expect("set");
            let before = storage.clone();
            assert!(!check_and_clear_outdated_stores(&mut storage, &config).expect("check"));
            assert_eq!(storage, before, "no writes for {date}");
        }
    }

    #[test]
    fn older_version_is_cleared() {
        let mut storage = populated();
        storage.set(STORE_VERSION_KEY, "2025-12-31").expect("set");
        let config = StoreVersionConfig::default();
        assert!(check_and_clear_outdated_stores(&mut storage, &config).expect("check"));
        assert_eq!(storage.get("mas").expect("get"), None);
        assert_eq!(
            storage.get(STORE_VERSION_KEY).expect("get").as_deref(),
            Some("2026-01-28")
        );
    }

    #[test]
    fn unreadable_version_is_treated_as_outdated() {
        let mut storage = populated();
        storage.set(STORE_VERSION_KEY, "last tuesday").expect("set");
        let config = StoreVersionConfig::default();
        assert!(check_and_clear_outdated_stores(&mut storage, &config).expect("check"));
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn force_reset_ignores_stored_date() {
        let mut storage = populated();
        storage.set(STORE_VERSION_KEY, "2030-01-01").expect("set");
        let config = StoreVersionConfig::default();
        force_reset_all_stores(&mut storage, &config).expect("reset");
        assert_eq!(storage.get("settings").expect("get"), None);
        assert_eq!(
            stored_version_date(&storage, &config).expect("get").as_deref(),
            Some("2026-01-28")
        );
    }
}
