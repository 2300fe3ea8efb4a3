use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, StoreError};

/// One positional argument of an engine call.
///
/// Structured values travel as JSON text; everything else keeps its
/// primitive type so the bridge can hand it to the engine unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EngineArg {
    Json(String),
    Text(String),
    Number(f64),
    Integer(i64),
    Bool(bool),
}

/// The engine, as seen from this side of the worker boundary.
///
/// `method` follows the engine's `verb_noun` naming (`calculate_core_data`,
/// `load_wires`, ...). The returned text is either a JSON payload or a string
/// starting with `Exception`.
#[async_trait(?Send)]
pub trait EngineBridge {
    async fn invoke(&self, method: &str, args: &[EngineArg]) -> Result<String, BridgeError>;
}

/// String key-value storage used to persist the client stores.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}
