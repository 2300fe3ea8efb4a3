//! Persisted design session: version gate, stores and operating points,
//! all read from and written back to `localStorage`.

use log::info;
use magnetics_core::error::StoreError;
use magnetics_core::mas::MasKind;
use magnetics_core::operating_point;
use magnetics_core::stores::{
    AdviseCache, CatalogStore, CrossReferencerStore, DesignState, MasStore, OperatingPointsMode,
    PersistedStore, Settings,
};
use magnetics_core::versioning::{self, StoreVersionConfig};
use wasm_bindgen::prelude::*;

use crate::storage::LocalStorage;
use crate::{from_js, from_js_or_default, to_js};

fn store_error(err: StoreError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn local_storage() -> Result<LocalStorage, JsValue> {
    LocalStorage::new().map_err(store_error)
}

/// Clears outdated persisted stores. Must run before the UI loads any store.
#[wasm_bindgen]
pub fn check_and_clear_outdated_stores(config: JsValue) -> Result<bool, JsValue> {
    let config: StoreVersionConfig = from_js_or_default(config, "store version config")?;
    let mut storage = local_storage()?;
    versioning::check_and_clear_outdated_stores(&mut storage, &config).map_err(store_error)
}

#[wasm_bindgen]
pub fn force_reset_all_stores() -> Result<(), JsValue> {
    let mut storage = local_storage()?;
    versioning::force_reset_all_stores(&mut storage, &StoreVersionConfig::default())
        .map_err(store_error)?;
    info!("forced store reset complete, reload the page");
    Ok(())
}

#[wasm_bindgen]
pub fn stored_version_date() -> Result<Option<String>, JsValue> {
    let storage = local_storage()?;
    versioning::stored_version_date(&storage, &StoreVersionConfig::default()).map_err(store_error)
}

#[wasm_bindgen]
pub fn load_settings() -> Result<JsValue, JsValue> {
    load_store::<Settings>()
}

#[wasm_bindgen]
pub fn reset_settings() -> Result<JsValue, JsValue> {
    let mut storage = local_storage()?;
    let mut settings = Settings::load(&storage).map_err(store_error)?;
    settings.reset();
    settings.save(&mut storage).map_err(store_error)?;
    to_js(&settings)
}

fn load_store<T: PersistedStore>() -> Result<JsValue, JsValue> {
    let storage = local_storage()?;
    to_js(&T::load(&storage).map_err(store_error)?)
}

/// Validates `value` against the store's shape before writing it.
fn save_store<T: PersistedStore>(value: JsValue) -> Result<(), JsValue> {
    let store: T = from_js(value, T::KEY)?;
    let mut storage = local_storage()?;
    store.save(&mut storage).map_err(store_error)
}

#[wasm_bindgen]
pub fn load_catalog() -> Result<JsValue, JsValue> {
    load_store::<CatalogStore>()
}

#[wasm_bindgen]
pub fn save_catalog(catalog: JsValue) -> Result<(), JsValue> {
    save_store::<CatalogStore>(catalog)
}

#[wasm_bindgen]
pub fn load_advise_cache() -> Result<JsValue, JsValue> {
    load_store::<AdviseCache>()
}

#[wasm_bindgen]
pub fn save_advise_cache(cache: JsValue) -> Result<(), JsValue> {
    save_store::<AdviseCache>(cache)
}

/// Drops the cached magnetic and core advises.
#[wasm_bindgen]
pub fn clean_advise_cache() -> Result<(), JsValue> {
    let mut storage = local_storage()?;
    let mut cache = AdviseCache::load(&storage).map_err(store_error)?;
    cache.clean_mas_advises();
    cache.clean_core_advises();
    cache.save(&mut storage).map_err(store_error)
}

#[wasm_bindgen]
pub fn load_cross_referencer() -> Result<JsValue, JsValue> {
    load_store::<CrossReferencerStore>()
}

#[wasm_bindgen]
pub fn save_cross_referencer(store: JsValue) -> Result<(), JsValue> {
    save_store::<CrossReferencerStore>(store)
}

/// Resets the stored MAS document to the defaults for `kind`
/// (`"power"` or `"filter"`).
#[wasm_bindgen]
pub fn reset_mas(kind: JsValue) -> Result<JsValue, JsValue> {
    let kind: MasKind = from_js(kind, "design kind")?;
    let mut storage = local_storage()?;
    let mut store = MasStore::load(&storage).map_err(store_error)?;
    store.reset(kind);
    store.save(&mut storage).map_err(store_error)?;
    to_js(&store.mas)
}

/// Runs `edit` on the stored MAS document and design state and saves both.
fn with_design<T>(
    edit: impl FnOnce(&mut MasStore, &mut DesignState) -> T,
) -> Result<(T, MasStore), JsValue> {
    let mut storage = local_storage()?;
    let mut mas = MasStore::load(&storage).map_err(store_error)?;
    let mut state = DesignState::load(&storage).map_err(store_error)?;
    let result = edit(&mut mas, &mut state);
    mas.save(&mut storage).map_err(store_error)?;
    state.save(&mut storage).map_err(store_error)?;
    Ok((result, mas))
}

/// Returns the updated operating point list.
#[wasm_bindgen]
pub fn initialize_operating_points(temperature: f64) -> Result<JsValue, JsValue> {
    let ((), store) = with_design(|mas, state| {
        operating_point::initialize_operating_points(&mut mas.mas, state, temperature)
    })?;
    to_js(&store.mas.inputs.operating_points)
}

/// `mode` is `"Manual"`, `"CircuitSimulatorImport"` or `"HarmonicsList"`.
/// Returns the index of the new operating point, or `undefined` when
/// `source_index` does not exist.
#[wasm_bindgen]
pub fn add_operating_point(source_index: usize, mode: JsValue) -> Result<Option<usize>, JsValue> {
    let mode: OperatingPointsMode = from_js(mode, "operating point mode")?;
    let (index, _) = with_design(|mas, state| {
        operating_point::add_operating_point(&mut mas.mas, state, source_index, mode)
    })?;
    Ok(index)
}

#[wasm_bindgen]
pub fn remove_operating_point(index: usize) -> Result<bool, JsValue> {
    let (removed, _) = with_design(|mas, state| {
        operating_point::remove_operating_point(&mut mas.mas, state, index)
    })?;
    Ok(removed.is_some())
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn advise_cache_survives_a_round_trip_through_local_storage() {
        let mut cache = AdviseCache::default();
        cache.current_core_advises = Some(serde_json::json!([{"name": "E 42"}]));
        save_advise_cache(to_js(&cache).expect("cache")).expect("save");

        let loaded: AdviseCache =
            from_js(load_advise_cache().expect("load"), "cache").expect("decode");
        assert_eq!(loaded, cache);

        clean_advise_cache().expect("clean");
        let cleaned: AdviseCache =
            from_js(load_advise_cache().expect("load"), "cache").expect("decode");
        assert!(cleaned.no_core_advises());
    }

    #[wasm_bindgen_test]
    fn malformed_catalog_is_rejected_before_writing() {
        assert!(save_catalog(JsValue::from_str("not a catalog")).is_err());
    }
}
