//! `countyjoin-core`: types shared by the reconciliation and series crates.

pub mod jurisdiction;

pub use jurisdiction::{Jurisdiction, JurisdictionScope};
