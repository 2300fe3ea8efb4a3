pub mod dispatch;
pub mod error;
pub mod history;
pub mod mas;
pub mod operating_point;
/// The `magnetics_core` crate holds the platform-independent half of the
/// magnetics design frontend. The numerical engine itself lives elsewhere and
/// is reached through the `EngineBridge` trait.
///
/// Key components:
/// - **Dispatch**: `TaskDispatcher`, one async call per engine capability behind a ready gate.
/// - **Waveform**: periodization, voltage/current pairing and plot-ready clipping.
/// - **History**: undo/redo over design snapshots.
/// - **Stores**: persisted client state, its version gate, and form helpers for tolerances and units.
pub mod stores;
pub mod tolerance;
pub mod traits;
pub mod units;
pub mod versioning;
pub mod waveform;
