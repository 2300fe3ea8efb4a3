use magnetics_core::history::History;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::{from_js, to_js};

/// Undo/redo over design snapshots. `back` and `forward` start a restore;
/// the UI calls `finish_restore` once it has applied the snapshot, and
/// pushes made in between are ignored.
#[wasm_bindgen]
pub struct WasmHistory {
    history: History<Value>,
}

#[wasm_bindgen]
impl WasmHistory {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmHistory {
        WasmHistory {
            history: History::new(),
        }
    }

    pub fn push(&mut self, snapshot: JsValue) -> Result<bool, JsValue> {
        let snapshot: Value = from_js(snapshot, "snapshot")?;
        Ok(self.history.push(&snapshot))
    }

    /// The previous snapshot, or `null` when the history is empty.
    pub fn back(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.history.back())
    }

    pub fn forward(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.history.forward())
    }

    pub fn finish_restore(&mut self) {
        self.history.finish_restore();
    }

    pub fn is_restoring(&self) -> bool {
        self.history.is_restoring()
    }

    pub fn current(&self) -> Result<JsValue, JsValue> {
        to_js(&self.history.current())
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    pub fn block_additions(&mut self) {
        self.history.block_additions();
    }

    pub fn unblock_additions(&mut self) {
        self.history.unblock_additions();
    }

    pub fn reset(&mut self) {
        self.history.reset();
    }

    pub fn pointer(&self) -> isize {
        self.history.pointer()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for WasmHistory {
    fn default() -> Self {
        Self::new()
    }
}
