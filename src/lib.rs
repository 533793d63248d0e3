//! Credit-weighted academic record aggregation over an immutable snapshot of
//! carriers, course offerings, enrollments and assessment scores.
//!
//! The computations (grades, course statistics, cohort averages, term
//! summaries and cumulative records) are pure functions of a [`Snapshot`];
//! [`db`] and the JSON loader only produce snapshots.

pub mod average;
pub mod cohort;
pub mod config;
pub mod course_stats;
pub mod cumulative;
pub mod curriculum;
pub mod db;
pub mod error;
pub mod grade;
pub mod logging;
pub mod models;
pub mod profile;
pub mod report;
pub mod snapshot;
pub mod summary;
pub mod transcript;

pub use error::{RecordError, RecordResult};
pub use snapshot::{Snapshot, SnapshotData};
