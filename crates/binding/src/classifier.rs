use thiserror::Error;
use tracing::{debug, trace};

use crate::control::{ControlAction, ControlDescriptor};
use crate::vocabulary;

/// Why a control is not a linking control.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("Control is disabled or hidden")]
    NotInteractable,
    #[error("Control is inside an overlay")]
    InOverlay,
    #[error("Control matches an excluded term. term: '{0}'")]
    Excluded(&'static str),
    #[error("Control does not name a product-linking action")]
    NotLinking,
    #[error("Control is not inside a shipment row")]
    OutsideShipmentRow,
}

/// Decides whether a control is a product-linking control.
#[derive(Debug, Clone, Default)]
pub struct ControlClassifier {
    /// Log positive classifications at debug level.
    trace_positive: bool,
}

impl ControlClassifier {
    pub fn new(trace_positive: bool) -> Self {
        Self {
            trace_positive,
        }
    }

    pub fn is_linking_control(&self, control: &ControlDescriptor) -> bool {
        self.classify(control).is_ok()
    }

    /// Returns the inferred action of a linking control, or the first rule it fails.
    pub fn classify(&self, control: &ControlDescriptor) -> Result<ControlAction, Rejection> {
        if !control.is_interactable() {
            return Err(Rejection::NotInteractable);
        }
        if control.in_overlay {
            return Err(Rejection::InOverlay);
        }
        if let Some(term) = control
            .visible_text()
            .find_map(vocabulary::find_exclusion)
        {
            return Err(Rejection::Excluded(term));
        }
        let action = infer_action(control).ok_or(Rejection::NotLinking)?;
        let Some(shipment_id) = control
            .row_shipment_id
            .as_ref()
            .filter(|shipment_id| !shipment_id.as_str().trim().is_empty())
        else {
            return Err(Rejection::OutsideShipmentRow);
        };

        if self.trace_positive {
            debug!(
                "Linking control. control: {}, action: {}, shipment: {}, label: '{}'",
                control.id, action, shipment_id, control.label
            );
        } else {
            trace!("Linking control. control: {}, action: {}", control.id, action);
        }

        Ok(action)
    }
}

/// The action a control performs, if its text names one.
///
/// An explicit declared tag wins, otherwise an action verb must appear together with a product
/// term or a product icon.
pub fn infer_action(control: &ControlDescriptor) -> Option<ControlAction> {
    if let Some(action) = control
        .declared_action
        .as_deref()
        .and_then(vocabulary::declared_tag)
    {
        return Some(action);
    }

    let mentions_product = control
        .all_text()
        .any(vocabulary::mentions_product)
        || control
            .icon_marker
            .as_deref()
            .is_some_and(vocabulary::is_product_icon);
    if !mentions_product {
        return None;
    }

    control
        .all_text()
        .find_map(vocabulary::find_action)
}
