//! `countyjoin-series`: groups per-county time series by measure.
//!
//! Titles are reduced to a location-independent key by [`title::canonicalize`],
//! records are grouped per shard (one shard per state), and shard outputs are
//! consolidated into a single [`Archive`] whose finalization never discards a
//! shard unless the archive itself was written.

pub mod aggregate;
pub mod archive;
pub mod error;
pub mod load;
pub mod model;
pub mod store;
pub mod title;

pub use aggregate::{aggregate, shard, Aggregation};
pub use archive::{consolidate, finalize, ArchiveStore, FinalizeOptions, FinalizeReport};
pub use error::SeriesError;
pub use load::{load_listings, Listings};
pub use model::{Archive, RawSeriesRecord, SeriesGroup, SeriesRecord};
pub use store::FsArchiveStore;
pub use title::canonicalize;
