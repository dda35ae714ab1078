//! Query parameter extractors.

use serde::Deserialize;

/// Query parameters for the usage report endpoint.
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    /// UTC days to include, today counted. Values below 1 are treated as 1.
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    7
}
