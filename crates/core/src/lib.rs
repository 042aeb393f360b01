//! Domain building blocks shared by every Lasy crate.
//!
//! This crate has no internal dependencies and performs no I/O, so the
//! rules it encodes (bundle extraction, site assembly, credit pricing,
//! payment signature checks, plan catalogue) can be unit tested in
//! isolation and reused by the API, the job pipeline and any tooling.

pub mod bundle;
pub mod credits;
pub mod error;
pub mod plans;
pub mod site;
pub mod types;
pub mod webhook_signature;
