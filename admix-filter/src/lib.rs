pub mod engine;
pub mod rules;

pub use engine::FilterEngine;
pub use rules::{load_postfilter, load_prefilter, PostfilterRules, PrefilterRule};

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("failed to read rule file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rule file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
