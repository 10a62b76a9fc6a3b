//! Starplot - interactive 3-D star plotting core
//!
//! - transform: real-world light-years to plot space
//! - registry: the stars currently on screen
//! - routing: route builder state machine and encoded paths
//! - transits: candidate links between nearby stars
//! - labels: 2-D overlay labels clamped to the viewport
//! - state: command dispatcher and single source of truth

pub mod config;
pub mod error;
pub mod events;
pub mod labels;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod plotter;
pub mod registry;
pub mod renderer;
pub mod routing;
pub mod state;
pub mod stellar;
pub mod transform;
pub mod transits;

pub use error::PlotError;
pub use events::{Command, Event};
pub use state::AppState;
