use serde::{Deserialize, Serialize};

/// An audio input device backing a capture provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

impl DeviceInfo {
    pub fn default_input() -> Self {
        Self {
            id: "default-input".into(),
            name: "Default Input".into(),
            is_default: true,
        }
    }
}
