//! The sequential ETL stages, leaves first: normalization, indexing,
//! chunking, search, artifact emission, and the orchestrator that runs them.

pub mod artifacts;
pub mod chunker;
pub mod indexer;
pub mod normalize;
pub mod orchestrator;
pub mod search;
