//! openEHR RM types the transformer knows how to rewrite.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Archetype root ids embed their RM type: `openEHR-EHR-OBSERVATION.blood_pressure.v1`.
static EMBEDDED_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^openEHR-\w+-([^.]+).*$").expect("Invalid embedded type regex"));

/// Prefix marking an archetype root node id.
pub const ARCHETYPE_ROOT_PREFIX: &str = "openEHR-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RmType {
    Action,
    Activity,
    AdminEntry,
    Cluster,
    Composition,
    Element,
    Evaluation,
    Instruction,
    IntervalEvent,
    ItemTree,
    Locatable,
    Observation,
    PointEvent,
    Section,
    /// A type name no rule exists for.
    Unrecognized(String),
}

impl RmType {
    pub const KNOWN: [RmType; 14] = [
        RmType::Action,
        RmType::Activity,
        RmType::AdminEntry,
        RmType::Cluster,
        RmType::Composition,
        RmType::Element,
        RmType::Evaluation,
        RmType::Instruction,
        RmType::IntervalEvent,
        RmType::ItemTree,
        RmType::Locatable,
        RmType::Observation,
        RmType::PointEvent,
        RmType::Section,
    ];

    pub fn parse(name: &str) -> Self {
        match name {
            "ACTION" => RmType::Action,
            "ACTIVITY" => RmType::Activity,
            "ADMIN_ENTRY" => RmType::AdminEntry,
            "CLUSTER" => RmType::Cluster,
            "COMPOSITION" => RmType::Composition,
            "ELEMENT" => RmType::Element,
            "EVALUATION" => RmType::Evaluation,
            "INSTRUCTION" => RmType::Instruction,
            "INTERVAL_EVENT" => RmType::IntervalEvent,
            "ITEM_TREE" => RmType::ItemTree,
            "LOCATABLE" => RmType::Locatable,
            "OBSERVATION" => RmType::Observation,
            "POINT_EVENT" => RmType::PointEvent,
            "SECTION" => RmType::Section,
            other => RmType::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RmType::Action => "ACTION",
            RmType::Activity => "ACTIVITY",
            RmType::AdminEntry => "ADMIN_ENTRY",
            RmType::Cluster => "CLUSTER",
            RmType::Composition => "COMPOSITION",
            RmType::Element => "ELEMENT",
            RmType::Evaluation => "EVALUATION",
            RmType::Instruction => "INSTRUCTION",
            RmType::IntervalEvent => "INTERVAL_EVENT",
            RmType::ItemTree => "ITEM_TREE",
            RmType::Locatable => "LOCATABLE",
            RmType::Observation => "OBSERVATION",
            RmType::PointEvent => "POINT_EVENT",
            RmType::Section => "SECTION",
            RmType::Unrecognized(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RmType::Unrecognized(_))
    }

    /// RM type embedded in an archetype root node id, if any.
    pub fn from_node_id(node_id: &str) -> Option<RmType> {
        EMBEDDED_TYPE
            .captures(node_id)
            .and_then(|captures| captures.get(1))
            .map(|m| RmType::parse(m.as_str()))
    }
}

pub fn is_archetype_root(node_id: &str) -> bool {
    node_id.starts_with(ARCHETYPE_ROOT_PREFIX)
}

impl FromStr for RmType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RmType::parse(s))
    }
}

impl fmt::Display for RmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
