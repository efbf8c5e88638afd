//! Postorder transform engine.
//!
//! Each node is correlated with its schema definition through the path
//! signature accumulated on the way down. Nodes without an archetype node id
//! end the descent; everything below them is copied untouched. Children are
//! rewritten before their parent, so a rule always sees the final shape of
//! its subtree.

use std::sync::Arc;

use chrono::Local;
use tdd_schema::{SchemaIndex, SchemaPath, SchemaResolver};
use tdd_xml::{Document, Element};
use tracing::{debug, info, info_span, trace, warn};

use crate::context::{RewriteContext, RewriteTarget};
use crate::error::Result;
use crate::instance::TemplateInstance;
use crate::namespace::{NamespaceStyle, RM_VERSION};
use crate::rm_type::RmType;
use crate::rules::{RewriteRegistry, locatable};

const ORIGIN_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub namespace_style: NamespaceStyle,
    /// Fixed timestamp for synthesized OBSERVATION origins. Defaults to the
    /// local time at the start of each transform.
    pub origin_time: Option<String>,
}

impl TransformOptions {
    /// Options producing a default-namespace (unprefixed) composition.
    pub fn canonical() -> Self {
        Self {
            namespace_style: NamespaceStyle::Default,
            ..Self::default()
        }
    }

    pub fn with_origin_time(mut self, origin_time: impl Into<String>) -> Self {
        self.origin_time = Some(origin_time.into());
        self
    }

    fn origin_time(&self) -> String {
        self.origin_time
            .clone()
            .unwrap_or_else(|| Local::now().format(ORIGIN_TIME_FORMAT).to_string())
    }
}

#[derive(Default)]
pub struct TransformEngine {
    registry: RewriteRegistry,
    options: TransformOptions,
}

impl TransformEngine {
    pub fn new(registry: RewriteRegistry, options: TransformOptions) -> Self {
        Self { registry, options }
    }

    /// Engine with every built-in rule and the given options.
    pub fn standard(options: TransformOptions) -> Self {
        Self::new(RewriteRegistry::standard(), options)
    }

    pub fn registry(&self) -> &RewriteRegistry {
        &self.registry
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Resolve the instance's schema and transform it.
    ///
    /// # Errors
    ///
    /// [`TransformError::SchemaUnresolved`](crate::TransformError::SchemaUnresolved)
    /// when no schema can be found, otherwise as [`Self::transform_with_schema`].
    pub fn transform(&self, instance: &TemplateInstance, resolver: &dyn SchemaResolver) -> Result<Document> {
        let schema: Arc<SchemaIndex> = instance.resolve_schema(resolver)?;
        self.transform_with_schema(instance, &schema)
    }

    /// Transform a copy of the instance against an already resolved schema.
    ///
    /// # Errors
    ///
    /// [`TransformError::UnsupportedType`](crate::TransformError::UnsupportedType)
    /// when a node resolves to a type without an enabled rule. No partial
    /// output is returned.
    pub fn transform_with_schema(&self, instance: &TemplateInstance, schema: &SchemaIndex) -> Result<Document> {
        let template_id = instance
            .template_id()
            .map(str::to_string)
            .or_else(|| schema.template_id())
            .unwrap_or_default();
        let origin_time = self.options.origin_time();
        let context = RewriteContext {
            template_id: &template_id,
            prefix: instance.namespace_prefix(),
            rm_version: RM_VERSION,
            origin_time: &origin_time,
            namespace_style: self.options.namespace_style,
            schema,
        };

        let span = info_span!("transform", template_id = %template_id);
        let _guard = span.enter();

        let mut root = instance.root().clone();
        self.rewrite_node(&mut root, &SchemaPath::root(), &context)?;
        info!(root = root.name(), warm_cache = schema.is_loaded(), "Transformed instance");
        Ok(Document::new(root))
    }

    fn rewrite_node(&self, element: &mut Element, path: &SchemaPath, context: &RewriteContext<'_>) -> Result<()> {
        let metadata = context.schema.metadata(path);
        let Some(node_id) = metadata.archetype_node_id else {
            trace!(node = element.name(), path = %path, "Not locatable; subtree left as is");
            return Ok(());
        };

        for position in element.element_positions() {
            if let Some(child) = element.node_element_mut(position) {
                let child_path = path.child(child.local_name());
                self.rewrite_node(child, &child_path, context)?;
            }
        }

        let rm_type = resolve_type(&node_id, metadata.rm_type.as_deref());
        let target = RewriteTarget {
            node_id: &node_id,
            rm_type: rm_type.as_ref(),
            path,
        };
        locatable::rewrite_locatable(element, &target, context)?;

        let Some(rm_type) = rm_type.as_ref() else {
            trace!(node = element.name(), node_id = %node_id, "No RM type; locatable stamp only");
            return Ok(());
        };
        let rule = self.registry.get(rm_type)?;
        debug!(node = element.name(), rm_type = %rm_type, rule = rule.description(), "Applying rewrite");
        rule.rewrite(element, &target, context)
    }
}

/// The type embedded in an archetype id wins over the schema's `type`.
fn resolve_type(node_id: &str, schema_type: Option<&str>) -> Option<RmType> {
    match (RmType::from_node_id(node_id), schema_type) {
        (Some(embedded), Some(declared)) => {
            if embedded.as_str() != declared {
                warn!(
                    node_id,
                    embedded = %embedded,
                    declared,
                    "Schema type disagrees with archetype id; using archetype id"
                );
            }
            Some(embedded)
        }
        (Some(embedded), None) => Some(embedded),
        (None, declared) => declared.map(RmType::parse),
    }
}
