//! Programmatic assembly of the CloudFormation templates behind an
//! ECS-hosted Parse Server stack.
//!
//! The library models a template as an object graph — parameters, mappings,
//! resources, outputs, and the reference expressions between them — and
//! renders it to the JSON document the deployment pipeline consumes. The
//! binaries under `src/bin/` each build one template and print it to stdout.

pub mod init;
pub mod intrinsics;
pub mod parameter;
pub mod policies;
pub mod policy;
pub mod resources;
pub mod template;

pub use intrinsics::{pseudo, Value};
pub use parameter::{Parameter, ParameterType};
pub use template::{Error, MappingTable, Output, Template};
