//! Route construction
//!
//! - builder: interactive IDLE/BUILDING state machine
//! - path: routes from an encoded "[name1,name2,...]" path
//!
//! Lengths always come from real-world coordinates; waypoints are plot-space.

pub mod builder;
pub mod path;

pub use builder::*;
pub use path::*;

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoutingState {
    Idle,
    Building,
}

impl fmt::Display for RoutingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingState::Idle => f.write_str("idle"),
            RoutingState::Building => f.write_str("building"),
        }
    }
}
