//! Rewrite rules, one per RM type.
//!
//! Each rule reshapes a single node that the engine has already correlated
//! with its schema definition. Rules only touch the node and its subtree; the
//! ELEMENT rule is the only one that consults the schema again.
//!
//! # Rules
//!
//! | RM type | Rewrite |
//! |---------|---------|
//! | ACTION, ADMIN_ENTRY, EVALUATION, INSTRUCTION, INTERVAL_EVENT | none beyond the locatable stamp |
//! | ACTIVITY | renamed to `activities`; second child moved to index 3 |
//! | CLUSTER, SECTION | children other than `name`/`archetype_details` become `items` |
//! | COMPOSITION | renamed to `composition`; trailing children become `content`; namespaces normalized |
//! | ELEMENT | `value` typed from the schema value type; DV_PROPORTION and DV_QUANTITY fix-ups |
//! | ITEM_TREE | `name` inserted; original children become `items` |
//! | LOCATABLE | archetype node id, `xsi:type` and `archetype_details` |
//! | OBSERVATION | `data` typed as HISTORY; children become `events`; `origin` synthesized |
//! | POINT_EVENT | name set to ANY_EVENT; trailing empty `state` dropped |

mod activity;
mod common;
mod composition;
mod container;
mod element;
mod entry;
mod item_tree;
pub(crate) mod locatable;
mod observation;
mod point_event;

use std::collections::{HashMap, HashSet};

use tdd_xml::Element;

use crate::context::{RewriteContext, RewriteTarget};
use crate::error::{Result, TransformError};
use crate::rm_type::RmType;

/// Rewrite applied to nodes of one RM type.
pub trait RewriteRule: Send + Sync {
    fn rm_type(&self) -> RmType;

    fn description(&self) -> &'static str {
        "Rewrite rule"
    }

    /// Reshape `element` in place.
    ///
    /// # Errors
    ///
    /// Built-in rules absorb structural surprises with a warning; custom
    /// rules may fail the transform.
    fn rewrite(
        &self,
        element: &mut Element,
        target: &RewriteTarget<'_>,
        context: &RewriteContext<'_>,
    ) -> Result<()>;
}

type RewriteFn = fn(&mut Element, &RewriteTarget<'_>, &RewriteContext<'_>) -> Result<()>;

/// Adapts a rewrite function to [`RewriteRule`].
struct FunctionRule {
    rm_type: RmType,
    description: &'static str,
    rewrite_fn: RewriteFn,
}

impl RewriteRule for FunctionRule {
    fn rm_type(&self) -> RmType {
        self.rm_type.clone()
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn rewrite(
        &self,
        element: &mut Element,
        target: &RewriteTarget<'_>,
        context: &RewriteContext<'_>,
    ) -> Result<()> {
        (self.rewrite_fn)(element, target, context)
    }
}

/// Built-in rule for a type; `None` only for unrecognized types.
fn builtin_rule(rm_type: &RmType) -> Option<FunctionRule> {
    let (description, rewrite_fn): (&'static str, RewriteFn) = match rm_type {
        RmType::Action => ("Action entry", entry::rewrite_entry),
        RmType::Activity => ("Instruction activity", activity::rewrite_activity),
        RmType::AdminEntry => ("Administrative entry", entry::rewrite_entry),
        RmType::Cluster => ("Cluster items", container::rewrite_container),
        RmType::Composition => ("Composition root", composition::rewrite_composition),
        RmType::Element => ("Element value", element::rewrite_element),
        RmType::Evaluation => ("Evaluation entry", entry::rewrite_entry),
        RmType::Instruction => ("Instruction entry", entry::rewrite_entry),
        RmType::IntervalEvent => ("Interval event", entry::rewrite_entry),
        RmType::ItemTree => ("Item tree", item_tree::rewrite_item_tree),
        RmType::Locatable => ("Locatable stamp", locatable::rewrite_locatable),
        RmType::Observation => ("Observation history", observation::rewrite_observation),
        RmType::PointEvent => ("Point event", point_event::rewrite_point_event),
        RmType::Section => ("Section items", container::rewrite_container),
        RmType::Unrecognized(_) => return None,
    };
    Some(FunctionRule {
        rm_type: rm_type.clone(),
        description,
        rewrite_fn,
    })
}

/// Rules indexed by RM type.
pub struct RewriteRegistry {
    rules: HashMap<RmType, Box<dyn RewriteRule>>,
    disabled: HashSet<RmType>,
}

impl RewriteRegistry {
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
            disabled: HashSet::new(),
        }
    }

    /// Registry with a built-in rule for every known RM type.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for rm_type in RmType::KNOWN {
            if let Some(rule) = builtin_rule(&rm_type) {
                registry.register(Box::new(rule));
            }
        }
        registry
    }

    /// Register a rule, replacing any rule for the same type.
    pub fn register(&mut self, rule: Box<dyn RewriteRule>) {
        self.rules.insert(rule.rm_type(), rule);
    }

    pub fn disable(&mut self, rm_type: RmType) {
        self.disabled.insert(rm_type);
    }

    pub fn enable(&mut self, rm_type: &RmType) {
        self.disabled.remove(rm_type);
    }

    /// Rule for `rm_type`.
    ///
    /// # Errors
    ///
    /// [`TransformError::UnsupportedType`] when no enabled rule exists.
    pub fn get(&self, rm_type: &RmType) -> Result<&dyn RewriteRule> {
        if self.disabled.contains(rm_type) {
            return Err(TransformError::unsupported(rm_type.as_str()));
        }
        self.rules
            .get(rm_type)
            .map(AsRef::as_ref)
            .ok_or_else(|| TransformError::unsupported(rm_type.as_str()))
    }

    pub fn contains(&self, rm_type: &RmType) -> bool {
        self.get(rm_type).is_ok()
    }

    /// Enabled types, sorted.
    pub fn registered_types(&self) -> Vec<RmType> {
        let mut types: Vec<RmType> = self
            .rules
            .keys()
            .filter(|rm_type| !self.disabled.contains(*rm_type))
            .cloned()
            .collect();
        types.sort();
        types
    }

    /// Number of enabled rules.
    pub fn len(&self) -> usize {
        self.rules
            .keys()
            .filter(|rm_type| !self.disabled.contains(*rm_type))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RewriteRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
