//! Client-side state containers persisted under fixed keys.
//!
//! Each store is plain data with a handful of mutators. Persistence goes
//! through [`PersistedStore`], which serializes the whole store to JSON text
//! and writes it to a [`KeyValueStore`] under the store's key.

use std::collections::BTreeMap;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::StoreError;
use crate::mas::{default_mas, Inputs, Mas, MasKind};
use crate::traits::KeyValueStore;

/// In-memory [`KeyValueStore`], used natively and in tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A store saved as one JSON document under [`PersistedStore::KEY`].
pub trait PersistedStore: Serialize + DeserializeOwned + Default {
    const KEY: &'static str;

    /// Reads the store, falling back to its defaults when nothing is saved.
    fn load<S: KeyValueStore + ?Sized>(storage: &S) -> Result<Self, StoreError> {
        match storage.get(Self::KEY)? {
            Some(text) => serde_json::from_str(&text).map_err(|source| StoreError::Decode {
                key: Self::KEY,
                source,
            }),
            None => {
                debug!("store {} not found, using defaults", Self::KEY);
                Ok(Self::default())
            }
        }
    }

    fn save<S: KeyValueStore + ?Sized>(&self, storage: &mut S) -> Result<(), StoreError> {
        let text = serde_json::to_string(self).map_err(|source| StoreError::Encode {
            key: Self::KEY,
            source,
        })?;
        storage.set(Self::KEY, &text)
    }
}

// Settings

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdviserSettings {
    pub use_only_cores_in_stock: bool,
    pub allow_distributed_gaps: bool,
    pub allow_stacks: bool,
    pub allow_toroidal_cores: bool,
    pub core_advise_mode: String,
}

impl Default for AdviserSettings {
    fn default() -> Self {
        Self {
            use_only_cores_in_stock: true,
            allow_distributed_gaps: true,
            allow_stacks: true,
            allow_toroidal_cores: true,
            core_advise_mode: "available cores".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MagneticBuilderSettings {
    pub use_only_cores_in_stock: bool,
    pub allow_distributed_gaps: bool,
    pub allow_stacks: bool,
    pub allow_toroidal_cores: bool,
    pub advanced_mode: bool,
    pub auto_redraw: bool,
    pub enable_simulation: bool,
    pub enable_auto_simulation: bool,
}

impl Default for MagneticBuilderSettings {
    fn default() -> Self {
        Self {
            use_only_cores_in_stock: true,
            allow_distributed_gaps: true,
            allow_stacks: true,
            allow_toroidal_cores: true,
            advanced_mode: false,
            auto_redraw: true,
            enable_simulation: true,
            enable_auto_simulation: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreAdviserSettings {
    pub weights: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MagneticAdviserSettings {
    pub weights: Option<Value>,
    pub maximum_number_results: u32,
}

impl Default for MagneticAdviserSettings {
    fn default() -> Self {
        Self {
            weights: None,
            maximum_number_results: 6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatingPointSettings {
    pub advanced_mode: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogAdviserSettings {
    pub advanced_mode: bool,
    pub use_all_parts: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub adviser_settings: AdviserSettings,
    pub magnetic_builder_settings: MagneticBuilderSettings,
    pub core_adviser_settings: CoreAdviserSettings,
    pub magnetic_adviser_settings: MagneticAdviserSettings,
    pub operating_point_settings: OperatingPointSettings,
    pub catalog_adviser_settings: CatalogAdviserSettings,
}

impl Settings {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl PersistedStore for Settings {
    const KEY: &'static str = "settings";
}

// Catalog

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogStore {
    /// Weight per adviser filter, keyed by the filter's display name.
    pub filters: BTreeMap<String, f64>,
    pub advises: Vec<Value>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        let filters = [
            ("Turns Ratios", 100.0),
            ("Solid Insulation Requirements", 100.0),
            ("Magnetizing Inductance", 100.0),
            ("Dc Current Density", 10.0),
            ("Effective Current Density", 10.0),
            ("Volume", 10.0),
            ("Area", 10.0),
            ("Height", 10.0),
            ("Losses No Proximity", 10.0),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();
        Self {
            filters,
            advises: Vec::new(),
        }
    }
}

impl PersistedStore for CatalogStore {
    const KEY: &'static str = "catalog";
}

// Advise cache

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdviseCache {
    pub current_mas_advises: Option<Value>,
    pub current_core_advises: Option<Value>,
}

impl AdviseCache {
    pub fn clean_mas_advises(&mut self) {
        self.current_mas_advises = None;
    }

    pub fn no_mas_advises(&self) -> bool {
        self.current_mas_advises.is_none()
    }

    pub fn clean_core_advises(&mut self) {
        self.current_core_advises = None;
    }

    pub fn no_core_advises(&self) -> bool {
        self.current_core_advises.is_none()
    }
}

impl PersistedStore for AdviseCache {
    const KEY: &'static str = "adviseCache";
}

// Cross referencer

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreReferenceInputs {
    pub core: Value,
    pub number_turns: u32,
    pub temperature: f64,
    pub maximum_dimensions: Value,
    pub number_maximum_results: u32,
    pub enabled_core_types: Vec<String>,
}

impl Default for CoreReferenceInputs {
    fn default() -> Self {
        Self {
            core: json!({
                "functionalDescription": {
                    "type": "two-piece set",
                    "material": "3C97",
                    "shape": "PQ 40/40",
                    "gapping": [
                        {"type": "subtractive", "length": 0.001},
                        {"type": "residual", "length": 0.00001},
                        {"type": "residual", "length": 0.00001},
                    ],
                    "numberStacks": 1,
                }
            }),
            number_turns: 10,
            temperature: 25.0,
            maximum_dimensions: json!({"height": 0.05}),
            number_maximum_results: 20,
            enabled_core_types: ["Toroidal", "Two-Piece Set", "Only Cores In Stock"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreCrossReferenceResults {
    pub cross_referenced_cores: Vec<Value>,
    pub cross_referenced_cores_values: Vec<Value>,
    pub reference_scored_values: Vec<Value>,
    pub x_label: String,
    pub y_label: String,
}

impl Default for CoreCrossReferenceResults {
    fn default() -> Self {
        Self {
            cross_referenced_cores: Vec::new(),
            cross_referenced_cores_values: Vec::new(),
            reference_scored_values: Vec::new(),
            x_label: "Enveloping Volume".to_string(),
            y_label: "Core Losses".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreMaterialReferenceInputs {
    pub material: String,
    pub temperature: f64,
    pub number_maximum_results: u32,
    pub enabled_core_types: Vec<String>,
}

impl Default for CoreMaterialReferenceInputs {
    fn default() -> Self {
        Self {
            material: "3C97".to_string(),
            temperature: 25.0,
            number_maximum_results: 20,
            enabled_core_types: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreMaterialCrossReferenceResults {
    pub cross_referenced_core_materials: Vec<Value>,
    pub cross_referenced_core_materials_values: Vec<Value>,
    pub reference_scored_values: Vec<Value>,
    pub x_label: String,
    pub y_label: String,
}

impl Default for CoreMaterialCrossReferenceResults {
    fn default() -> Self {
        Self {
            cross_referenced_core_materials: Vec::new(),
            cross_referenced_core_materials_values: Vec::new(),
            reference_scored_values: Vec::new(),
            x_label: "Initial Permeability".to_string(),
            y_label: "Volumetric Losses".to_string(),
        }
    }
}

/// Selected indices are stored as `-1` when nothing is selected, matching
/// what the UI writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrossReferencerStore {
    pub core_reference_inputs: CoreReferenceInputs,
    pub core_results: CoreCrossReferenceResults,
    pub selected_core_index: i64,
    pub core_material_reference_inputs: CoreMaterialReferenceInputs,
    pub core_material_results: CoreMaterialCrossReferenceResults,
    pub selected_core_material_index: i64,
}

impl Default for CrossReferencerStore {
    fn default() -> Self {
        Self {
            core_reference_inputs: CoreReferenceInputs::default(),
            core_results: CoreCrossReferenceResults::default(),
            selected_core_index: -1,
            core_material_reference_inputs: CoreMaterialReferenceInputs::default(),
            core_material_results: CoreMaterialCrossReferenceResults::default(),
            selected_core_material_index: -1,
        }
    }
}

impl CrossReferencerStore {
    pub fn selected_core(&self) -> Option<&Value> {
        usize::try_from(self.selected_core_index)
            .ok()
            .and_then(|i| self.core_results.cross_referenced_cores.get(i))
    }

    pub fn selected_core_material(&self) -> Option<&Value> {
        usize::try_from(self.selected_core_material_index)
            .ok()
            .and_then(|i| {
                self.core_material_results
                    .cross_referenced_core_materials
                    .get(i)
            })
    }
}

impl PersistedStore for CrossReferencerStore {
    const KEY: &'static str = "crossReferencer";
}

// MAS document

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasStore {
    pub mas: Mas,
}

impl Default for MasStore {
    fn default() -> Self {
        Self {
            mas: default_mas(MasKind::Power),
        }
    }
}

impl MasStore {
    pub fn set_mas(&mut self, mas: Mas) {
        self.mas = mas;
    }

    pub fn set_inputs(&mut self, inputs: Inputs) {
        self.mas.inputs = inputs;
    }

    pub fn reset(&mut self, kind: MasKind) {
        self.mas = default_mas(kind);
    }

    /// Replaces only the magnetic, keeping inputs and outputs.
    pub fn reset_magnetic(&mut self, kind: MasKind) {
        self.mas.magnetic = default_mas(kind).magnetic;
    }
}

impl PersistedStore for MasStore {
    const KEY: &'static str = "mas";
}

// Design state

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingPointsMode {
    Manual,
    CircuitSimulatorImport,
    HarmonicsList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Application {
    Power,
    CommonModeChoke,
    CommonModeChokeCatalog,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Wizard {
    CommonModeChoke,
    DifferentialModeChoke,
    Flyback,
    Buck,
    Boost,
    IsolatedBuck,
    IsolatedBuckBoost,
    PushPull,
    SingleSwitchForward,
    TwoSwitchForward,
    ActiveClampForward,
    Pfc,
    DualActiveBridge,
    LlcResonant,
    CllcResonant,
    PhaseShiftFullBridge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuilderMode {
    Basic,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreSubmode {
    Shape,
    Material,
    Gapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderModes {
    pub core: BuilderMode,
    pub wire: BuilderMode,
    pub coil: BuilderMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderSubmodes {
    pub core: CoreSubmode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagneticBuilderState {
    pub mode: BuilderModes,
    pub submode: BuilderSubmodes,
}

impl Default for MagneticBuilderState {
    fn default() -> Self {
        Self {
            mode: BuilderModes {
                core: BuilderMode::Basic,
                wire: BuilderMode::Basic,
                coil: BuilderMode::Basic,
            },
            submode: BuilderSubmodes {
                core: CoreSubmode::Shape,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphParameters {
    pub graph: String,
    pub x_axis_mode: String,
    pub y_axis_mode: String,
    pub minimum_frequency: f64,
    pub maximum_frequency: f64,
    pub minimum_temperature: f64,
    pub maximum_temperature: f64,
    pub minimum_dc_bias: f64,
    pub maximum_dc_bias: f64,
    pub number_points: u32,
}

impl Default for GraphParameters {
    fn default() -> Self {
        Self {
            graph: "impedanceOverFrequency".to_string(),
            x_axis_mode: "log".to_string(),
            y_axis_mode: "log".to_string(),
            minimum_frequency: 1e3,
            maximum_frequency: 4e6,
            minimum_temperature: -40.0,
            maximum_temperature: 150.0,
            minimum_dc_bias: 0.0,
            maximum_dc_bias: 25.0,
            number_points: 25,
        }
    }
}

/// Column mapping state of the circuit-simulator import, one entry per
/// operating point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CircuitSimulatorColumns {
    pub column_names: Vec<Vec<Value>>,
    pub all_last_read_column_names: Vec<String>,
    /// Per operating point, whether each winding's columns were confirmed.
    pub confirmed_columns: Vec<Vec<bool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatingPointModes {
    pub mode_per_point: Vec<Option<OperatingPointsMode>>,
}

impl Default for OperatingPointModes {
    fn default() -> Self {
        Self {
            mode_per_point: vec![None],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolState {
    pub subsection: String,
    pub can_continue: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_advise: Option<usize>,
}

impl ToolState {
    fn new(subsection: &str, steps: &[&str]) -> Self {
        Self {
            subsection: subsection.to_string(),
            can_continue: steps.iter().map(|s| (s.to_string(), false)).collect(),
            selected_advise: None,
        }
    }
}

/// Tool states per workflow, each keyed by tool name.
pub type ToolboxStates = BTreeMap<String, BTreeMap<String, ToolState>>;

const BUILDER_STEPS: &[&str] = &[
    "designRequirements",
    "operatingPoints",
    "magneticAdviser",
    "magneticBuilder",
    "magneticSummary",
];
const AGNOSTIC_STEPS: &[&str] = &["designRequirements", "operatingPoints", "toolSelector"];

pub fn default_toolbox_states() -> ToolboxStates {
    let workflow = |tools: Vec<(&str, ToolState)>| {
        tools
            .into_iter()
            .map(|(name, state)| (name.to_string(), state))
            .collect::<BTreeMap<_, _>>()
    };

    let mut filter_adviser = ToolState::new("designRequirements", BUILDER_STEPS);
    filter_adviser.selected_advise = Some(0);

    let mut states = ToolboxStates::new();
    states.insert(
        "design".to_string(),
        workflow(vec![
            ("magneticBuilder", ToolState::new("designRequirements", BUILDER_STEPS)),
            ("agnosticTool", ToolState::new("designRequirements", AGNOSTIC_STEPS)),
        ]),
    );
    states.insert(
        "filter".to_string(),
        workflow(vec![
            ("magneticAdviser", filter_adviser),
            ("magneticBuilder", ToolState::new("designRequirements", BUILDER_STEPS)),
            ("agnosticTool", ToolState::new("designRequirements", AGNOSTIC_STEPS)),
        ]),
    );
    states.insert(
        "insulationCoordinator".to_string(),
        workflow(vec![(
            "insulationAdviser",
            ToolState::new("insulationRequirements", &["insulationRequirements"]),
        )]),
    );
    states.insert(
        "catalog".to_string(),
        workflow(vec![
            (
                "catalogAdviser",
                ToolState::new(
                    "designRequirements",
                    &["designRequirements", "operatingPoints", "catalogAdviser", "magneticViewer"],
                ),
            ),
            (
                "magneticCatalogAndBuilder",
                ToolState::new(
                    "designRequirements",
                    &[
                        "designRequirements",
                        "operatingPoints",
                        "catalogAdviser",
                        "magneticBuilder",
                        "magneticSummary",
                    ],
                ),
            ),
        ]),
    );
    states.insert(
        "magneticViewer".to_string(),
        workflow(vec![(
            "magneticViewer",
            ToolState::new("magneticViewer", &["magneticViewer"]),
        )]),
    );
    states
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignState {
    pub current_operating_point: usize,
    pub operating_points_circuit_simulator: CircuitSimulatorColumns,
    pub operating_points: OperatingPointModes,
    pub graph_parameters: GraphParameters,
    pub magnetic_builder: MagneticBuilderState,
    pub any_design_loaded: bool,
    pub loading_design: bool,
    pub toolbox_states: ToolboxStates,
    pub selected_workflow: String,
    pub selected_application: Application,
    pub selected_tool: String,
    pub selected_wizard: Wizard,
}

impl Default for DesignState {
    fn default() -> Self {
        Self {
            current_operating_point: 0,
            operating_points_circuit_simulator: CircuitSimulatorColumns::default(),
            operating_points: OperatingPointModes::default(),
            graph_parameters: GraphParameters::default(),
            magnetic_builder: MagneticBuilderState::default(),
            any_design_loaded: false,
            loading_design: false,
            toolbox_states: default_toolbox_states(),
            selected_workflow: "design".to_string(),
            selected_application: Application::Power,
            selected_tool: "magneticBuilder".to_string(),
            selected_wizard: Wizard::Flyback,
        }
    }
}

impl DesignState {
    pub fn is_any_design_loaded(&self) -> bool {
        self.any_design_loaded
    }

    pub fn design_loaded(&mut self) {
        self.any_design_loaded = true;
    }

    pub fn current_toolbox_state(&self) -> Option<&BTreeMap<String, ToolState>> {
        self.toolbox_states.get(&self.selected_workflow)
    }

    pub fn current_tool_state(&self) -> Option<&ToolState> {
        let state = self
            .current_toolbox_state()
            .and_then(|tools| tools.get(&self.selected_tool));
        if state.is_none() {
            debug!(
                "no tool state for {} in workflow {}",
                self.selected_tool, self.selected_workflow
            );
        }
        state
    }

    fn current_tool_state_mut(&mut self) -> Option<&mut ToolState> {
        self.toolbox_states
            .get_mut(&self.selected_workflow)
            .and_then(|tools| tools.get_mut(&self.selected_tool))
    }

    /// Moves the current tool to `subsection`; `None` when no tool is selected.
    pub fn set_current_tool_subsection(&mut self, subsection: &str) -> Option<&str> {
        let state = self.current_tool_state_mut()?;
        state.subsection = subsection.to_string();
        Some(state.subsection.as_str())
    }

    pub fn set_current_tool_subsection_status(
        &mut self,
        subsection: &str,
        can_continue: bool,
    ) -> Option<bool> {
        let state = self.current_tool_state_mut()?;
        state
            .can_continue
            .insert(subsection.to_string(), can_continue);
        Some(can_continue)
    }

    pub fn select_workflow(&mut self, workflow: impl Into<String>) {
        self.selected_workflow = workflow.into();
    }

    pub fn select_tool(&mut self, tool: impl Into<String>) {
        self.selected_tool = tool.into();
    }

    pub fn select_application(&mut self, application: Application) {
        self.selected_application = application;
    }

    pub fn select_wizard(&mut self, wizard: Wizard) {
        self.selected_wizard = wizard;
    }

    /// Common mode chokes wind every winding identically.
    pub fn has_current_application_mirrored_windings(&self) -> bool {
        matches!(
            self.selected_application,
            Application::CommonModeChoke | Application::CommonModeChokeCatalog
        )
    }

    pub fn reset_magnetic_tool(&mut self) {
        self.any_design_loaded = false;
        self.loading_design = false;
        self.selected_tool = "agnosticTool".to_string();
        self.selected_workflow = "design".to_string();
        self.selected_application = Application::Power;
        self.toolbox_states = default_toolbox_states();
    }

    /// Clears operating point bookkeeping and view parameters. The reset graph
    /// samples 100 points instead of the initial 25.
    pub fn reset(&mut self) {
        self.current_operating_point = 0;
        self.operating_points_circuit_simulator = CircuitSimulatorColumns::default();
        self.operating_points = OperatingPointModes::default();
        self.graph_parameters = GraphParameters {
            number_points: 100,
            ..GraphParameters::default()
        };
        self.magnetic_builder = MagneticBuilderState::default();
    }
}

impl PersistedStore for DesignState {
    const KEY: &'static str = "state";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_store_loads_defaults() {
        let storage = MemoryStore::new();
        let settings = Settings::load(&storage).expect("settings");
        assert_eq!(settings.magnetic_adviser_settings.maximum_number_results, 6);
        assert_eq!(settings.adviser_settings.core_advise_mode, "available cores");
    }

    #[test]
    fn saved_store_round_trips_under_its_key() {
        let mut storage = MemoryStore::new();
        let mut cache = AdviseCache::default();
        assert!(cache.no_mas_advises());
        cache.current_mas_advises = Some(json!([{"scoring": 0.9}]));
        cache.save(&mut storage).expect("save");

        assert_eq!(storage.keys().collect::<Vec<_>>(), vec!["adviseCache"]);
        let loaded = AdviseCache::load(&storage).expect("load");
        assert!(!loaded.no_mas_advises());
        assert!(loaded.no_core_advises());

        let mut loaded = loaded;
        loaded.clean_mas_advises();
        assert!(loaded.no_mas_advises());
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let mut storage = MemoryStore::new();
        storage
            .set("settings", r#"{"operatingPointSettings": {"advancedMode": true}}"#)
            .expect("set");
        let settings = Settings::load(&storage).expect("settings");
        assert!(settings.operating_point_settings.advanced_mode);
        assert!(settings.magnetic_builder_settings.auto_redraw);
    }

    #[test]
    fn corrupt_document_is_a_decode_error() {
        let mut storage = MemoryStore::new();
        storage.set("catalog", "{not json").expect("set");
        let err = CatalogStore::load(&storage).expect_err("decode");
        assert!(matches!(err, StoreError::Decode { key: "catalog", .. }));
    }

    #[test]
    fn settings_reset_restores_defaults() {
        let mut settings = Settings::default();
        settings.adviser_settings.allow_stacks = false;
        settings.catalog_adviser_settings.use_all_parts = true;
        settings.reset();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn cross_referencer_selection_uses_minus_one_for_none() {
        let mut store = CrossReferencerStore::default();
        assert_eq!(store.selected_core(), None);
        store.core_results.cross_referenced_cores = vec![json!({"name": "PQ 40/40"})];
        store.selected_core_index = 0;
        assert_eq!(store.selected_core(), Some(&json!({"name": "PQ 40/40"})));
        assert_eq!(store.selected_core_material(), None);
    }

    #[test]
    fn mas_reset_magnetic_keeps_inputs() {
        let mut store = MasStore::default();
        store
            .mas
            .inputs
            .design_requirements
            .turns_ratios
            .push(json!({"nominal": 2}));
        store.reset_magnetic(MasKind::Filter);
        assert_eq!(store.mas.inputs.design_requirements.number_windings(), 2);
        assert_eq!(
            store.mas.magnetic["core"]["functionalDescription"]["type"],
            json!("toroidal")
        );
        store.reset(MasKind::Power);
        assert_eq!(store.mas.inputs.design_requirements.number_windings(), 1);
    }

    #[test]
    fn tool_state_follows_selected_workflow_and_tool() {
        let mut state = DesignState::default();
        assert_eq!(
            state.set_current_tool_subsection("operatingPoints"),
            Some("operatingPoints")
        );
        assert_eq!(
            state.set_current_tool_subsection_status("designRequirements", true),
            Some(true)
        );
        let tool = state.current_tool_state().expect("tool");
        assert_eq!(tool.can_continue["designRequirements"], true);

        state.select_workflow("insulationCoordinator");
        assert_eq!(state.current_tool_state(), None);
        assert_eq!(state.set_current_tool_subsection("x"), None);

        state.reset_magnetic_tool();
        assert_eq!(state.selected_tool, "agnosticTool");
        assert_eq!(
            state.current_tool_state().expect("agnostic").subsection,
            "designRequirements"
        );
    }

    #[test]
    fn mirrored_windings_only_for_common_mode_chokes() {
        let mut state = DesignState::default();
        assert!(!state.has_current_application_mirrored_windings());
        state.select_application(Application::CommonModeChokeCatalog);
        assert!(state.has_current_application_mirrored_windings());
    }

    #[test]
    fn state_reset_uses_dense_graph() {
        let mut state = DesignState::default();
        state.current_operating_point = 3;
        state.reset();
        assert_eq!(state.current_operating_point, 0);
        assert_eq!(state.graph_parameters.number_points, 100);
        assert_eq!(state.operating_points.mode_per_point, vec![None]);
    }
}
