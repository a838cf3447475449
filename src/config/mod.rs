//! Flow documents and process settings.
//!
//! - [`schema`] - the YAML document model
//! - [`interpolation`] - `${NAME}` placeholder substitution
//! - [`loader`] - two-pass loading into an executable [`Flow`](crate::flow::Flow)
//! - [`settings`] - `AF_*` environment settings

pub mod interpolation;
pub mod loader;
pub mod schema;
pub mod settings;

pub use interpolation::{
    extract_variables, has_interpolation, parse_interpolation, substitute, InterpolationContext,
    Segment,
};
pub use loader::{load_flow, FlowLoader};
pub use schema::{ContextConfig, FlowDocument, JobConfig, StepConfig};
pub use settings::Settings;
