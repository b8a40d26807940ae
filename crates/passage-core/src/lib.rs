//! Service plumbing shared by Passage binaries: env config, tracing setup,
//! request-id middleware, health probes and serde helpers.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
