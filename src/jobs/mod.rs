//! Job tracking: identity, status, progress and results of generation runs.
//!
//! `JobStore` is the single source of truth. It is injected wherever job
//! state is read or written; there is no global instance.

mod models;
mod store;

pub use models::{Job, JobStatus, JobUpdate};
pub use store::JobStore;
