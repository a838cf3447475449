//! Flow execution engine.
//!
//! A [`Flow`] runs its [`Job`]s in order. Each job partitions its actions
//! into groups ([`batch::partition`]) and runs every [`Group`] concurrently
//! on a bounded worker pool, stopping at the first failed group.

pub mod batch;
pub mod group;
pub mod job;
pub mod runner;
pub mod summary;

pub use batch::partition;
pub use group::{default_max_workers, Group, GroupReport};
pub use job::Job;
pub use runner::Flow;
pub use summary::{ActionReport, FlowReport, GroupSummary, JobReport};
