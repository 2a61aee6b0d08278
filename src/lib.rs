// Public library surface for integration tests (and potential reuse).

pub mod archive;
pub mod cache;
pub mod cleanup;
pub mod config;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod run;
pub mod runlock;
pub mod score;
pub mod source;
pub mod stats;
pub mod store;
pub mod timeutil;

// ---- Re-exports for the common entry points ----
pub use crate::config::CuratorConfig;
pub use crate::pipeline::{Curator, RunOutcome};
pub use crate::run::{run_curation, RunReport};
pub use crate::store::{Story, StoredCollection};
