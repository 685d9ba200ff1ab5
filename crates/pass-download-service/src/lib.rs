//! Core services of the PASS download service.
//!
//! The download service discovers open access manuscripts for a DOI, validates that a requested
//! download URL belongs to one of them, and deposits the downloaded content into the PASS
//! repository. See [`services::SharedServices`] for how the individual services are wired up.

#[macro_use]
pub mod metrics;

pub mod address;
pub mod caching;
pub mod config;
pub mod download;
pub mod fetch;
pub mod logging;
pub mod lookup;
pub mod services;
pub mod store;
pub mod types;
pub mod utils;
