//! Commands in, events out
//!
//! The front end sends `Command`s to `AppState::dispatch`; the core answers with
//! `Event`s queued until the front end drains them. A refused command queues nothing.

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

use crate::config::TransitBand;
use crate::labels::{Camera, PlacedLabel};
use crate::model::{Catalog, CatalogObject, Color, RouteDescriptor, StarDisplayRecord, StarId};

#[derive(Debug, Clone)]
pub enum Command {
    Plot {
        catalog: Catalog,
    },
    ClearPlot,
    Recenter {
        id: StarId,
    },
    StartRoute {
        origin: StarId,
        name: String,
        color: Color,
        line_width: f64,
    },
    ContinueRoute {
        id: StarId,
    },
    FinishRoute {
        id: StarId,
    },
    ResetRoute,
    BuildPath {
        source: String,
        destination: String,
        path_name: String,
        color: Color,
        line_width: f64,
        encoded_path: String,
    },
    PlotRoutes {
        routes: Vec<RouteDescriptor>,
    },
    FindTransits {
        band: TransitBand,
    },
    ClearTransits,
    RemoveTransit {
        key: String,
    },
    CreateRouteFromTransit {
        key: String,
        name: String,
        color: Color,
        line_width: f64,
    },
    AddTransitToRoute {
        key: String,
    },
    CompleteRouteFromTransit {
        key: String,
    },
    UpdateNotes {
        id: StarId,
        notes: String,
    },
    RemoveStar {
        id: StarId,
    },
    EditStar {
        object: CatalogObject,
    },
    ShowTransits {
        on: bool,
    },
    ShowTransitLengths {
        on: bool,
    },
    ShowRoutes {
        on: bool,
    },
    UpdateView {
        camera: Camera,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Plot { .. } => "plot",
            Command::ClearPlot => "clear-plot",
            Command::Recenter { .. } => "recenter",
            Command::StartRoute { .. } => "start-route",
            Command::ContinueRoute { .. } => "continue-route",
            Command::FinishRoute { .. } => "finish-route",
            Command::ResetRoute => "reset-route",
            Command::BuildPath { .. } => "build-path",
            Command::PlotRoutes { .. } => "plot-routes",
            Command::FindTransits { .. } => "find-transits",
            Command::ClearTransits => "clear-transits",
            Command::RemoveTransit { .. } => "remove-transit",
            Command::CreateRouteFromTransit { .. } => "create-route-from-transit",
            Command::AddTransitToRoute { .. } => "add-transit-to-route",
            Command::CompleteRouteFromTransit { .. } => "complete-route-from-transit",
            Command::UpdateNotes { .. } => "update-notes",
            Command::RemoveStar { .. } => "remove-star",
            Command::EditStar { .. } => "edit-star",
            Command::ShowTransits { .. } => "show-transits",
            Command::ShowTransitLengths { .. } => "show-transit-lengths",
            Command::ShowRoutes { .. } => "show-routes",
            Command::UpdateView { .. } => "update-view",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Event {
    ListChanged(StarDisplayRecord),
    ListCleared,
    RecenterRequested(StarDisplayRecord),
    RouteCreated(RouteDescriptor),
    RouteUpdated(RouteDescriptor),
    RouteDeleted(RouteDescriptor),
    RoutingStatusChanged(bool),
    TransitsChanged(usize),
    LabelsPlaced(Vec<PlacedLabel>),
}

#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Position to roll back to if the command in flight is refused
    pub fn mark(&self) -> usize {
        self.events.len()
    }

    pub fn rollback(&mut self, mark: usize) {
        self.events.truncate(mark);
    }

    /// Take every queued event in emission order
    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}
