//! Error taxonomy for plot, routing and transit operations
//!
//! - Lookup: an id or display name that is not plotted
//! - Validation: a route that would be degenerate
//! - State: a routing operation invoked in the wrong state
//! - Parse: a malformed encoded path
//! - Persistence: the persistence collaborator refused a write
//!
//! Every failing operation leaves the registry and the routing session untouched.
//! Drawable rejections are per-object diagnostics and live in their own type.

use thiserror::Error;

use crate::model::{StarId, Vec3};
use crate::routing::RoutingState;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlotError {
    #[error("Unknown star: {0}")]
    Lookup(String),
    #[error("Invalid route: {0}")]
    Validation(String),
    #[error("Cannot {operation} while routing is {state}")]
    State {
        operation: &'static str,
        state: RoutingState,
    },
    #[error("Malformed path '{input}': {reason}")]
    Parse { input: String, reason: String },
    #[error("Persistence failed: {0}")]
    Persistence(String),
}

impl PlotError {
    pub fn unknown_id(id: &StarId) -> Self {
        PlotError::Lookup(id.to_string())
    }

    pub fn unknown_name(name: &str) -> Self {
        PlotError::Lookup(name.to_string())
    }
}

/// A star whose real-world position lies outside the drawable box
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Star '{name}' ({id}) at {coordinates:?} is outside the drawable box {min:?}..{max:?}")]
pub struct DrawableRejection {
    pub id: StarId,
    pub name: String,
    pub coordinates: Vec3,
    pub min: Vec3,
    pub max: Vec3,
}
