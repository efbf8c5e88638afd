#![deny(unsafe_code)]

//! Mutable XML element tree.
//!
//! Documents are parsed with `quick-xml` into an owned tree of [`Element`]s
//! that rewrite code can rename, reorder and annotate in place, then
//! serialized back with an XML declaration and two-space indentation.

pub mod error;
pub mod node;
pub mod read;
pub mod write;

pub use crate::error::{Result, XmlError};
pub use crate::node::{Attribute, Document, Element, Node};
