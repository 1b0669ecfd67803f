use serde::{Deserialize, Serialize};

/// The client context a serving request carries. Platform and device
/// matching is case-insensitive downstream, so values are kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdRequest {
    pub country_code: String,
    pub platform: String,
    pub os_version: String,
    pub device: String,
}

impl AdRequest {
    pub fn new(
        country_code: impl Into<String>,
        platform: impl Into<String>,
        os_version: impl Into<String>,
        device: impl Into<String>,
    ) -> Self {
        Self {
            country_code: country_code.into(),
            platform: platform.into(),
            os_version: os_version.into(),
            device: device.into(),
        }
    }
}
