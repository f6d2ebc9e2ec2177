//! `countyjoin-recon`: county entity reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded entity records from two registries,
//! returns matched pairs plus the records each side could not place. File
//! loaders for the known registry formats live in [`load`].

pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod key;
pub mod load;
pub mod model;
pub mod normalize;
pub mod tables;

pub use config::ReconConfig;
pub use engine::{reconcile, EmptyJurisdictionPolicy, Reconciler};
pub use error::ReconError;
pub use model::{EntityRecord, JoinKey, Origin, ReconciliationResult};
pub use normalize::normalize;
pub use tables::Tables;
