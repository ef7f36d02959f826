use std::fmt::{Display, Formatter};

use shipping::ShipmentId;

/// Identity of a control in the current view, stable only while the control exists.
#[derive(Debug, Clone, Copy, Default)]
#[derive(Hash, PartialEq, Eq, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ControlId(pub u64);

impl Display for ControlId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ControlAction {
    Manage,
    Add,
    Link,
}

/// A structured snapshot of an interactive control and the context it sits in.
#[derive(Debug, Clone, Default, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ControlDescriptor {
    pub id: ControlId,
    pub label: String,
    pub hint: Option<String>,
    pub identifier: Option<String>,
    pub declared_action: Option<String>,
    pub icon_marker: Option<String>,

    pub disabled: bool,
    pub hidden: bool,
    /// Inside a dialog or other transient surface that is recreated on every open.
    pub in_overlay: bool,
    /// Already carries a handler.
    pub bound: bool,

    /// The shipment identifier carried by the enclosing row, if any.
    pub row_shipment_id: Option<ShipmentId>,
}

impl ControlDescriptor {
    pub fn new(id: u64, label: &str) -> Self {
        Self {
            id: ControlId(id),
            label: label.to_string(),
            ..Self::default()
        }
    }

    pub fn in_row(mut self, shipment_id: &str) -> Self {
        self.row_shipment_id = Some(ShipmentId::from(shipment_id));
        self
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }

    pub fn with_identifier(mut self, identifier: &str) -> Self {
        self.identifier = Some(identifier.to_string());
        self
    }

    pub fn with_declared_action(mut self, declared_action: &str) -> Self {
        self.declared_action = Some(declared_action.to_string());
        self
    }

    pub fn with_icon_marker(mut self, icon_marker: &str) -> Self {
        self.icon_marker = Some(icon_marker.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn in_overlay(mut self) -> Self {
        self.in_overlay = true;
        self
    }

    pub fn bound(mut self) -> Self {
        self.bound = true;
        self
    }

    pub fn is_interactable(&self) -> bool {
        !self.disabled && !self.hidden
    }

    /// The text the user sees or that names the control, matched against the exclusion vocabulary.
    pub fn visible_text(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.label.as_str())
            .chain(self.hint.as_deref())
            .chain(self.identifier.as_deref())
    }

    /// All text fields, matched against the inclusion vocabulary.
    pub fn all_text(&self) -> impl Iterator<Item = &str> {
        self.visible_text()
            .chain(self.declared_action.as_deref())
            .chain(self.icon_marker.as_deref())
    }
}
