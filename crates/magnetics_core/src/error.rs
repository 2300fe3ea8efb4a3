//! Error types shared by the dispatcher and the persisted stores.

use thiserror::Error;

/// Failure reported by the engine itself through the `Exception` prefix.
///
/// The message is kept verbatim, prefix included, so the UI can show exactly
/// what the engine said.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Transport-level failure of the bridge (worker gone, method missing, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("engine bridge failure: {0}")]
pub struct BridgeError(pub String);

impl From<anyhow::Error> for BridgeError {
    fn from(err: anyhow::Error) -> Self {
        BridgeError(format!("{err:#}"))
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("failed to serialize argument for {method}: {source}")]
    Serialize {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse response of {method}: {source}")]
    Parse {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is not supported by the engine")]
    Unsupported(String),
}

impl DispatchError {
    /// The raw engine message, when the engine itself rejected the call.
    pub fn engine_message(&self) -> Option<&str> {
        match self {
            DispatchError::Engine(err) => Some(&err.message),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode store {key}: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode store {key}: {source}")]
    Decode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_displays_message_verbatim() {
        let err = DispatchError::from(EngineError::new("Exception: bad core"));
        assert_eq!(err.to_string(), "Exception: bad core");
        assert_eq!(err.engine_message(), Some("Exception: bad core"));
    }

    #[test]
    fn bridge_error_keeps_anyhow_context() {
        let err: BridgeError = anyhow::anyhow!("worker terminated")
            .context("calling calculate_core_data")
            .into();
        assert!(err.0.contains("calling calculate_core_data"));
        assert!(err.0.contains("worker terminated"));
    }
}
