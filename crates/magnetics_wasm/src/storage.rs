use magnetics_core::error::StoreError;
use magnetics_core::traits::KeyValueStore;
use web_sys::Storage;

use crate::bridge::js_error_text;

/// [`KeyValueStore`] backed by the window's `localStorage`.
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn new() -> Result<Self, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::Backend("no window available".into()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StoreError::Backend(js_error_text(&e)))?
            .ok_or_else(|| StoreError::Backend("localStorage is disabled".into()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| StoreError::Backend(js_error_text(&e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError::Backend(js_error_text(&e)))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StoreError::Backend(js_error_text(&e)))
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn local_storage_round_trip() {
        let mut storage = LocalStorage::new().expect("localStorage");
        storage.set("magnetics_test_key", "42").expect("set");
        assert_eq!(
            storage.get("magnetics_test_key").expect("get").as_deref(),
            Some("42")
        );
        storage.remove("magnetics_test_key").expect("remove");
        assert_eq!(storage.get("magnetics_test_key").expect("get"), None);
    }
}
