//! Musing Memory — bounded in-memory store for insights produced by the thinker
//!
//! Every retrieval is a full read-modify-write pass over the store:
//! - prune: drop stale consumed records, then evict down to capacity
//! - aggregate: fold near-duplicate unconsumed records into representatives
//! - rank: filter, order, slice, then mark consumed (and evict over-repeated ones)
//!
//! Nothing here does I/O or locking; the owner serializes access.

pub mod aggregate;
pub mod config;
pub mod ranker;
pub mod similarity;
pub mod store;

pub use config::MemoryConfig;
pub use ranker::RetrievalQuery;
pub use similarity::similar;
pub use store::InsightStore;
