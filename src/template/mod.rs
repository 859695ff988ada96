//! Heat template loading and resolution.
//!
//! - `types`: document model, declarations, references and type classification
//! - `loader`: YAML parsing and version checks
//! - `resolver`: turns declarations into stack resources with deferred retries

pub mod loader;
pub mod resolver;
pub mod types;

pub use loader::{load_template, parse_template, TemplateError};
pub use resolver::{resolve_template, Outcome, ResolutionReport, Resolver, RetryPolicy};
pub use types::{Declaration, Parameters, Reference, ResourceKind, Template};
