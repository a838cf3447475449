//! Execution state tracking.
//!
//! Every executable entity (action, group, job, flow) carries a
//! [`StateMachine`] moving through [`State`]:
//!
//! ```text
//! pending --start--> running --complete--> success
//!                            \--fail-----> failure
//! ```
//!
//! Any other move is rejected with
//! [`FlowError::InvalidTransition`](crate::error::FlowError::InvalidTransition).

pub mod machine;

pub use machine::{State, StateMachine, Transition};
