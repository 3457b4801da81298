//! JSON output formatting

use serde::Serialize;

/// Pretty JSON rendering for any serializable value
pub trait JsonOutput {
    fn to_json(&self) -> Result<String, serde_json::Error>;
}

impl<T: Serialize + ?Sized> JsonOutput for T {
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
