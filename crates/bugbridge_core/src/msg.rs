use serde::{Deserialize, Serialize};

/// Messages relayed from the background side to a page.
///
/// The wire form is `{"event": "<tag>"}`; any other fields are ignored, and the
/// page re-derives its state from its own location rather than the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum PageMessage {
    /// The tab's URL changed within the watched issue pages.
    #[serde(rename = "pageChange")]
    PageChanged,
}

impl PageMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
