use serde::{Deserialize, Serialize};

/// Default limit on nested object levels in a delta document.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Options controlling graph delta construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphDeltaOptions {
    /// Maximum number of nested object levels below the root document.
    /// Construction fails with `DepthExceeded` beyond it.
    pub max_depth: usize,
}

impl Default for GraphDeltaOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
