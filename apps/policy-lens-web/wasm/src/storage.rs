//! localStorage-backed analysis records

use policy_engine::store::KEY_PREFIX;
use policy_engine::{analysis_key, AnalysisStore, StoreError};
use shared_types::StoredAnalysis;
use wasm_bindgen::JsValue;

fn backend(err: JsValue) -> StoreError {
    StoreError::Backend(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

/// Records live under `analysis_<visit id>` in the window's localStorage
pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    pub fn open() -> Result<Self, StoreError> {
        let window = web_sys::window().ok_or_else(|| StoreError::Unavailable("No window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|err| StoreError::Unavailable(format!("{:?}", err)))?
            .ok_or_else(|| StoreError::Unavailable("localStorage not available".into()))?;
        Ok(Self { storage })
    }

    fn analysis_keys(&self) -> Result<Vec<String>, StoreError> {
        let count = self.storage.length().map_err(backend)?;
        let mut keys = Vec::new();
        for i in 0..count {
            if let Some(key) = self.storage.key(i).map_err(backend)? {
                if key.starts_with(KEY_PREFIX) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}

impl AnalysisStore for LocalStore {
    fn save(&self, visit_id: &str, record: &StoredAnalysis) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        self.storage
            .set_item(&analysis_key(visit_id), &json)
            .map_err(backend)
    }

    fn load(&self, visit_id: &str) -> Result<Option<StoredAnalysis>, StoreError> {
        let raw = self
            .storage
            .get_item(&analysis_key(visit_id))
            .map_err(backend)?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn remove(&self, visit_id: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(&analysis_key(visit_id))
            .map_err(backend)
    }

    fn clear_all(&self) -> Result<usize, StoreError> {
        let keys = self.analysis_keys()?;
        for key in &keys {
            self.storage.remove_item(key).map_err(backend)?;
        }
        Ok(keys.len())
    }
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use shared_types::AnalysisResult;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_records_round_trip_and_clear() {
        let store = LocalStore::open().unwrap();
        store.clear_all().unwrap();

        let record = StoredAnalysis::completed(AnalysisResult::default(), "https://example.com", 1);
        store.save("visit-1", &record).unwrap();
        store.save("visit-2", &record).unwrap();
        assert_eq!(store.load("visit-1").unwrap(), Some(record));

        store.remove("visit-1").unwrap();
        assert_eq!(store.load("visit-1").unwrap(), None);
        assert_eq!(store.clear_all().unwrap(), 1);
    }
}
