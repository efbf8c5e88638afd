#![deny(unsafe_code)]

//! TDD → openEHR RM composition rewriting.
//!
//! [`TransformEngine`] walks a [`TemplateInstance`] in postorder, correlates
//! each node with its schema definition through a
//! [`SchemaIndex`](tdd_schema::SchemaIndex), and applies the rewrite rule
//! registered for the node's RM type.

pub mod context;
pub mod engine;
pub mod error;
pub mod instance;
pub mod namespace;
pub mod rm_type;
pub mod rules;

pub use crate::context::{RewriteContext, RewriteTarget};
pub use crate::engine::{TransformEngine, TransformOptions};
pub use crate::error::{Result, TransformError};
pub use crate::instance::TemplateInstance;
pub use crate::namespace::{NamespaceStyle, OPENEHR_NS, RM_VERSION};
pub use crate::rm_type::RmType;
pub use crate::rules::{RewriteRegistry, RewriteRule};
