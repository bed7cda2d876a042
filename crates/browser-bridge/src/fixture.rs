//! In-memory control tree implementing [`BrowserSession`].
//!
//! Tests across the workspace build pages from this fixture instead of
//! driving a real browser. Node handles follow a small scheme: controls
//! keep their caller-given ids, while labels, text nodes and containers
//! get `label:N` / `text:N` / `container:N` pseudo handles.

use async_trait::async_trait;
use formpilot_core_types::{ControlKind, ControlRef};
use parking_lot::RwLock;

use crate::errors::{Result, SessionError};
use crate::session::{AppliedAction, BoundingBox, BrowserSession, ContainerIdiom, Query};

/// One control in the fixture tree.
#[derive(Debug, Clone)]
pub struct ControlSpec {
    pub id: String,
    pub kind: ControlKind,
    pub value: String,
    pub text: String,
    pub visible: bool,
    pub enabled: bool,
    pub aria_label: Option<String>,
    pub bbox: Option<BoundingBox>,
}

impl ControlSpec {
    pub fn new(id: impl Into<String>, kind: ControlKind) -> Self {
        Self {
            id: id.into(),
            kind,
            value: String::new(),
            text: String::new(),
            visible: true,
            enabled: true,
            aria_label: None,
            bbox: None,
        }
    }

    pub fn radio(id: impl Into<String>) -> Self {
        Self::new(id, ControlKind::Radio)
    }

    pub fn checkbox(id: impl Into<String>) -> Self {
        Self::new(id, ControlKind::Checkbox)
    }

    pub fn dropdown_option(id: impl Into<String>) -> Self {
        Self::new(id, ControlKind::Dropdown)
    }

    pub fn text_input(id: impl Into<String>) -> Self {
        Self::new(id, ControlKind::Text)
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    pub fn bbox(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bbox = Some(BoundingBox {
            x,
            y,
            width,
            height,
        });
        self
    }
}

#[derive(Debug, Clone)]
struct Label {
    text: String,
    for_id: Option<String>,
    nested_id: Option<String>,
}

#[derive(Debug, Clone)]
struct TextNode {
    text: String,
    nearby: Vec<String>,
}

#[derive(Debug, Clone)]
struct Container {
    idiom: ContainerIdiom,
    text: String,
    controls: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    controls: Vec<ControlSpec>,
    labels: Vec<Label>,
    text_nodes: Vec<TextNode>,
    containers: Vec<Container>,
    applied: Vec<AppliedAction>,
    timeout_queries: Vec<Query>,
}

/// Builder for a fixture page.
#[derive(Debug, Default)]
pub struct FixturePageBuilder {
    inner: Inner,
}

impl FixturePageBuilder {
    pub fn control(mut self, spec: ControlSpec) -> Self {
        self.inner.controls.push(spec);
        self
    }

    /// Label associated with a control through its `for` reference.
    pub fn label_for(mut self, text: impl Into<String>, control_id: impl Into<String>) -> Self {
        self.inner.labels.push(Label {
            text: text.into(),
            for_id: Some(control_id.into()),
            nested_id: None,
        });
        self
    }

    /// Label wrapping a control structurally (no `for` attribute).
    pub fn label_wrapping(mut self, text: impl Into<String>, control_id: impl Into<String>) -> Self {
        self.inner.labels.push(Label {
            text: text.into(),
            for_id: None,
            nested_id: Some(control_id.into()),
        });
        self
    }

    /// Free-standing text with a structural neighborhood of controls.
    pub fn text_node(mut self, text: impl Into<String>, nearby: &[&str]) -> Self {
        self.inner.text_nodes.push(TextNode {
            text: text.into(),
            nearby: nearby.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn container(
        mut self,
        idiom: ContainerIdiom,
        text: impl Into<String>,
        controls: &[&str],
    ) -> Self {
        self.inner.containers.push(Container {
            idiom,
            text: text.into(),
            controls: controls.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Make the page answer a specific query with a timeout error.
    pub fn timeout_on(mut self, query: Query) -> Self {
        self.inner.timeout_queries.push(query);
        self
    }

    pub fn build(self) -> FixturePage {
        FixturePage {
            inner: RwLock::new(self.inner),
        }
    }
}

/// In-memory page fixture.
pub struct FixturePage {
    inner: RwLock<Inner>,
}

impl FixturePage {
    pub fn builder() -> FixturePageBuilder {
        FixturePageBuilder::default()
    }

    /// Empty page (no controls at all).
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Actions the engine has applied so far, in order.
    pub fn applied(&self) -> Vec<AppliedAction> {
        self.inner.read().applied.clone()
    }

    fn usable(&self, id: &str) -> Result<ControlSpec> {
        let inner = self.inner.read();
        let control = inner
            .controls
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownControl(id.to_string()))?;
        if !control.visible || !control.enabled {
            return Err(SessionError::ApplyFailed(format!(
                "control {} is not usable",
                id
            )));
        }
        Ok(control)
    }
}

fn pseudo(prefix: &str, index: usize) -> ControlRef {
    ControlRef::new(format!("{}:{}", prefix, index))
}

fn parse_pseudo<'a>(handle: &'a ControlRef, prefix: &str) -> Option<usize> {
    handle
        .0
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(':'))
        .and_then(|idx| idx.parse().ok())
}

#[async_trait]
impl BrowserSession for FixturePage {
    async fn query_all(&self, query: &Query) -> Result<Vec<ControlRef>> {
        let inner = self.inner.read();

        if inner.timeout_queries.contains(query) {
            return Err(SessionError::Timeout(format!("{:?}", query)));
        }

        let refs = match query {
            Query::Kind(kind) => inner
                .controls
                .iter()
                .filter(|c| c.kind == *kind)
                .map(|c| ControlRef::new(c.id.clone()))
                .collect(),
            Query::KindWithValue { kind, value } => inner
                .controls
                .iter()
                .filter(|c| c.kind == *kind && c.value == *value)
                .map(|c| ControlRef::new(c.id.clone()))
                .collect(),
            Query::Labels => (0..inner.labels.len()).map(|i| pseudo("label", i)).collect(),
            Query::LabelTarget { label } => {
                let Some(index) = parse_pseudo(label, "label") else {
                    return Err(SessionError::QueryFailed(format!(
                        "not a label handle: {}",
                        label
                    )));
                };
                let Some(entry) = inner.labels.get(index) else {
                    return Err(SessionError::UnknownControl(label.0.clone()));
                };
                entry
                    .for_id
                    .iter()
                    .chain(entry.nested_id.iter())
                    .filter(|id| inner.controls.iter().any(|c| c.id == **id))
                    .map(|id| ControlRef::new(id.clone()))
                    .collect()
            }
            Query::TextNodes { containing } => {
                let needle = containing.to_lowercase();
                (0..inner.text_nodes.len())
                    .filter(|i| inner.text_nodes[*i].text.to_lowercase().contains(&needle))
                    .map(|i| pseudo("text", i))
                    .collect()
            }
            Query::Neighborhood { of } => {
                if let Some(index) = parse_pseudo(of, "text") {
                    inner
                        .text_nodes
                        .get(index)
                        .map(|node| {
                            node.nearby
                                .iter()
                                .map(|id| ControlRef::new(id.clone()))
                                .collect()
                        })
                        .unwrap_or_default()
                } else {
                    // Sibling controls sharing a container with this control
                    inner
                        .containers
                        .iter()
                        .filter(|c| c.controls.iter().any(|id| *id == of.0))
                        .flat_map(|c| c.controls.iter())
                        .filter(|id| **id != of.0)
                        .map(|id| ControlRef::new(id.clone()))
                        .collect()
                }
            }
            Query::Containers(idiom) => (0..inner.containers.len())
                .filter(|i| inner.containers[*i].idiom == *idiom)
                .map(|i| pseudo("container", i))
                .collect(),
            Query::ContainerControls { container } => {
                let Some(index) = parse_pseudo(container, "container") else {
                    return Err(SessionError::QueryFailed(format!(
                        "not a container handle: {}",
                        container
                    )));
                };
                inner
                    .containers
                    .get(index)
                    .map(|c| {
                        c.controls
                            .iter()
                            .map(|id| ControlRef::new(id.clone()))
                            .collect()
                    })
                    .unwrap_or_default()
            }
            Query::AccessibilityLabel { containing } => {
                let needle = containing.to_lowercase();
                inner
                    .controls
                    .iter()
                    .filter(|c| {
                        c.aria_label
                            .as_deref()
                            .map(|l| l.to_lowercase().contains(&needle))
                            .unwrap_or(false)
                    })
                    .map(|c| ControlRef::new(c.id.clone()))
                    .collect()
            }
        };
        Ok(refs)
    }

    async fn is_visible(&self, control: &ControlRef) -> Result<bool> {
        let inner = self.inner.read();
        if let Some(c) = inner.controls.iter().find(|c| c.id == control.0) {
            return Ok(c.visible);
        }
        // Labels, text nodes and containers are plain rendered nodes.
        Ok(true)
    }

    async fn is_enabled(&self, control: &ControlRef) -> Result<bool> {
        let inner = self.inner.read();
        if let Some(c) = inner.controls.iter().find(|c| c.id == control.0) {
            return Ok(c.enabled);
        }
        Ok(true)
    }

    async fn text(&self, control: &ControlRef) -> Result<String> {
        let inner = self.inner.read();
        if let Some(c) = inner.controls.iter().find(|c| c.id == control.0) {
            return Ok(c.text.clone());
        }
        if let Some(index) = parse_pseudo(control, "label") {
            return inner
                .labels
                .get(index)
                .map(|l| l.text.clone())
                .ok_or_else(|| SessionError::UnknownControl(control.0.clone()));
        }
        if let Some(index) = parse_pseudo(control, "text") {
            return inner
                .text_nodes
                .get(index)
                .map(|n| n.text.clone())
                .ok_or_else(|| SessionError::UnknownControl(control.0.clone()));
        }
        if let Some(index) = parse_pseudo(control, "container") {
            return inner
                .containers
                .get(index)
                .map(|c| c.text.clone())
                .ok_or_else(|| SessionError::UnknownControl(control.0.clone()));
        }
        Err(SessionError::UnknownControl(control.0.clone()))
    }

    async fn value(&self, control: &ControlRef) -> Result<String> {
        let inner = self.inner.read();
        Ok(inner
            .controls
            .iter()
            .find(|c| c.id == control.0)
            .map(|c| c.value.clone())
            .unwrap_or_default())
    }

    async fn container_text(&self, control: &ControlRef) -> Result<String> {
        let inner = self.inner.read();
        Ok(inner
            .containers
            .iter()
            .find(|c| c.controls.iter().any(|id| *id == control.0))
            .map(|c| c.text.clone())
            .unwrap_or_default())
    }

    async fn control_kind(&self, control: &ControlRef) -> Result<Option<ControlKind>> {
        let inner = self.inner.read();
        Ok(inner
            .controls
            .iter()
            .find(|c| c.id == control.0)
            .map(|c| c.kind))
    }

    async fn click(&self, control: &ControlRef) -> Result<()> {
        self.usable(&control.0)?;
        self.inner
            .write()
            .applied
            .push(AppliedAction::Clicked(control.clone()));
        Ok(())
    }

    async fn fill(&self, control: &ControlRef, text: &str) -> Result<()> {
        let spec = self.usable(&control.0)?;
        if spec.kind != ControlKind::Text {
            return Err(SessionError::ApplyFailed(format!(
                "cannot fill a {} control",
                spec.kind
            )));
        }
        self.inner
            .write()
            .applied
            .push(AppliedAction::Filled(control.clone(), text.to_string()));
        Ok(())
    }

    async fn select_option(&self, control: &ControlRef, value: &str) -> Result<()> {
        let spec = self.usable(&control.0)?;
        if spec.kind != ControlKind::Dropdown {
            return Err(SessionError::ApplyFailed(format!(
                "cannot select in a {} control",
                spec.kind
            )));
        }
        self.inner
            .write()
            .applied
            .push(AppliedAction::Selected(control.clone(), value.to_string()));
        Ok(())
    }

    async fn bounding_box(&self, control: &ControlRef) -> Result<Option<BoundingBox>> {
        let inner = self.inner.read();
        if let Some((index, c)) = inner
            .controls
            .iter()
            .enumerate()
            .find(|(_, c)| c.id == control.0)
        {
            if let Some(bbox) = c.bbox {
                return Ok(Some(bbox));
            }
            // Unspecified geometry defaults to a plausible on-screen box.
            return Ok(Some(BoundingBox {
                x: 10.0,
                y: 20.0 * index as f64,
                width: 120.0,
                height: 20.0,
            }));
        }
        Ok(None)
    }
}
