//! `rosterlink-linkage`: multi-pass profile/payroll record linkage engine.
//!
//! Pure engine crate: receives CSV text or pre-built records, returns linked
//! and unmatched results. No CLI or file IO.

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod report;
pub mod resolver;
pub mod rounds;
pub mod summary;

pub use config::LinkConfig;
pub use engine::run;
pub use error::{LinkError, ParseError};
pub use model::{LinkResult, MergedRecord, Payroll, Profile, YearLinkage};
pub use summary::LinkSummary;
