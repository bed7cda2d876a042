//! The browser session trait and its structured query language.

use async_trait::async_trait;
use formpilot_core_types::{ControlKind, ControlRef};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Structured query against the live control tree.
///
/// The resolver's strategies express their searches in this enum instead
/// of raw selector strings, so any session implementation (real browser
/// or fixture) can answer them without parsing CSS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    /// All controls of a kind (dropdowns are exposed per option)
    Kind(ControlKind),
    /// Controls of a kind whose raw value attribute equals `value` verbatim
    KindWithValue { kind: ControlKind, value: String },
    /// All label nodes on the page
    Labels,
    /// The control a label is associated with (`for` reference first,
    /// structural nesting second)
    LabelTarget { label: ControlRef },
    /// Text nodes whose content contains `containing` (case-insensitive)
    TextNodes { containing: String },
    /// Controls in the structural neighborhood of a node (same container,
    /// parent, or sibling subtree)
    Neighborhood { of: ControlRef },
    /// Recurring layout containers of one idiom
    Containers(ContainerIdiom),
    /// Controls nested inside a container node
    ContainerControls { container: ControlRef },
    /// Controls whose accessibility label contains `containing`
    AccessibilityLabel { containing: String },
}

/// Recurring form-layout idioms recognized by structure heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerIdiom {
    /// `<div>` holding a label + input pair
    LabeledPair,
    /// Fieldset group
    Fieldset,
    /// List item wrapping an input
    ListItem,
    /// Table cell wrapping an input
    TableCell,
}

impl ContainerIdiom {
    pub fn name(&self) -> &'static str {
        match self {
            ContainerIdiom::LabeledPair => "labeled-pair",
            ContainerIdiom::Fieldset => "fieldset",
            ContainerIdiom::ListItem => "list-item",
            ContainerIdiom::TableCell => "table-cell",
        }
    }

    /// All idioms in the order structure heuristics probe them.
    pub fn all() -> [ContainerIdiom; 4] {
        [
            ContainerIdiom::LabeledPair,
            ContainerIdiom::Fieldset,
            ContainerIdiom::ListItem,
            ContainerIdiom::TableCell,
        ]
    }
}

/// Element geometry as reported by the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// A zero-area box means the node is not actually rendered.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Action the engine applied through the session; fixtures record these
/// so tests can assert on what was driven.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppliedAction {
    Clicked(ControlRef),
    Filled(ControlRef, String),
    Selected(ControlRef, String),
}

/// Narrow browser-session surface the engine consumes.
///
/// Queries may suspend while the collaborator talks to the live page;
/// a collaborator-enforced timeout surfaces as [`crate::SessionError::Timeout`]
/// and is treated as a non-match by callers.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Run a structured query and return matching handles.
    async fn query_all(&self, query: &Query) -> Result<Vec<ControlRef>>;

    async fn is_visible(&self, control: &ControlRef) -> Result<bool>;

    async fn is_enabled(&self, control: &ControlRef) -> Result<bool>;

    /// Visible text of the node (label text, option text, node content).
    async fn text(&self, control: &ControlRef) -> Result<String>;

    /// Raw value attribute, empty when the node carries none.
    async fn value(&self, control: &ControlRef) -> Result<String>;

    /// Text of the node's immediate container, for proximity scoring.
    async fn container_text(&self, control: &ControlRef) -> Result<String>;

    /// Kind of the control, `None` for non-control nodes (labels, text).
    async fn control_kind(&self, control: &ControlRef) -> Result<Option<ControlKind>>;

    async fn click(&self, control: &ControlRef) -> Result<()>;

    async fn fill(&self, control: &ControlRef, text: &str) -> Result<()>;

    async fn select_option(&self, control: &ControlRef, value: &str) -> Result<()>;

    async fn bounding_box(&self, control: &ControlRef) -> Result<Option<BoundingBox>>;
}
