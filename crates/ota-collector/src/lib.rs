//! Collection pipeline for daily trending topics.
//!
//! One call to [`Collector::collect`] drives a single attempt:
//! create run → ask the provider → parse → validate → persist items →
//! finalize run. Every failure after the run exists is recorded on the run
//! with as much of the provider's raw answer as was obtained.

pub mod error;
pub mod ids;
pub mod parse;
pub mod prompt;
pub mod repository;
pub mod service;

pub use error::{CollectError, MalformedResponse};
pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use prompt::build_collection_prompt;
pub use repository::{CollectionRepository, RepositoryError};
pub use service::Collector;
