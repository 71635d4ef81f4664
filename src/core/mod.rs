pub mod cleaning;
pub mod etl;
pub mod ingest;
pub mod normalizer;
pub mod transformer;
pub mod trigger;
pub mod watcher;

pub use crate::domain::model::{CleanedRecord, RawRecord, TransformOutcome, TransformResult, WatchResult};
pub use crate::domain::ports::{Fetcher, ObjectStore};
pub use crate::utils::error::Result;
