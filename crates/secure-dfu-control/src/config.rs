//! Control point configuration.

use secure_dfu_protocol::CONTROL_POINT_UUID;
use serde::{Deserialize, Serialize};

/// Configuration for a control point session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPointConfig {
    /// Label used in log output (usually the target device name).
    pub name: String,
    /// UUID of the control point characteristic, for log output.
    pub characteristic: String,
    /// Log every flow control signal received during upload.
    pub log_progress: bool,
}

impl Default for ControlPointConfig {
    fn default() -> Self {
        ControlPointConfig {
            name: "ControlPoint".to_string(),
            characteristic: CONTROL_POINT_UUID.to_string(),
            log_progress: false,
        }
    }
}

impl ControlPointConfig {
    /// Create a configuration with the given name and default settings.
    pub fn named(name: impl Into<String>) -> Self {
        ControlPointConfig {
            name: name.into(),
            ..Default::default()
        }
    }
}
