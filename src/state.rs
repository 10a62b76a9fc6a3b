//! Application State - Single Source of Truth (SSOT)
//!
//! Owns the registry, transformer, routing session, transit set and label
//! anchors. Every mutation arrives as a `Command` through `dispatch`; every
//! outcome leaves as an `Event` in the queue.

use serde::Serialize;

use crate::config::Config;
use crate::error::PlotError;
use crate::events::{Command, Event, EventQueue};
use crate::labels::{Camera, LabelKey, LabelLayoutEngine, PlacedLabel};
use crate::log_refused;
use crate::model::{Catalog, CatalogObject, Color, RouteDescriptor, StarId, Vec3};
use crate::persistence::Persistence;
use crate::plotter::{PlotSummary, PlotTarget, Plotter};
use crate::registry::PlotRegistry;
use crate::renderer::{Layer, Renderer};
use crate::routing::{build_path, RouteBuilder, RoutingState};
use crate::stellar::StellarCatalog;
use crate::transform::CoordinateTransformer;
use crate::transits::{TransitBand, TransitGraphComputer};

/// One line of a distance report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceEntry {
    pub id: StarId,
    pub name: String,
    pub distance: f64,
}

pub struct AppState<R: Renderer, P: Persistence> {
    config: Config,
    plotter: Plotter,
    transformer: CoordinateTransformer,
    registry: PlotRegistry,
    builder: RouteBuilder,
    transits: TransitGraphComputer,
    labels: LabelLayoutEngine,
    camera: Camera,
    renderer: R,
    persistence: P,
    dataset: String,
    objects: Vec<CatalogObject>,
    center_name: Option<String>,
    plotted_routes: Vec<RouteDescriptor>,
    routes_visible: bool,
    last_plot: Option<PlotSummary>,
    events: EventQueue,
}

impl<R: Renderer, P: Persistence> AppState<R, P> {
    pub fn new(config: Config, renderer: R, persistence: P) -> Self {
        Self {
            plotter: Plotter::new(StellarCatalog::standard(), config.stars.clone()),
            transformer: CoordinateTransformer::new(config.grid.clone()),
            registry: PlotRegistry::new(config.drawable.clone()),
            builder: RouteBuilder::new(),
            transits: TransitGraphComputer::new(),
            labels: LabelLayoutEngine::new(config.labels.clone()),
            camera: Camera::default(),
            renderer,
            persistence,
            dataset: String::new(),
            objects: Vec::new(),
            center_name: None,
            plotted_routes: Vec::new(),
            routes_visible: true,
            last_plot: None,
            events: EventQueue::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &PlotRegistry {
        &self.registry
    }

    pub fn transformer(&self) -> &CoordinateTransformer {
        &self.transformer
    }

    pub fn routing_state(&self) -> RoutingState {
        self.builder.state()
    }

    pub fn current_route(&self) -> Option<&RouteDescriptor> {
        self.builder.current()
    }

    pub fn transits(&self) -> &TransitGraphComputer {
        &self.transits
    }

    pub fn labels(&self) -> &LabelLayoutEngine {
        &self.labels
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn plotted_routes(&self) -> &[RouteDescriptor] {
        &self.plotted_routes
    }

    pub fn routes_visible(&self) -> bool {
        self.routes_visible
    }

    pub fn last_plot(&self) -> Option<&PlotSummary> {
        self.last_plot.as_ref()
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    /// Apply one command. A refused command changes nothing and emits nothing.
    pub fn dispatch(&mut self, command: Command) -> Result<(), PlotError> {
        let name = command.name();
        let mark = self.events.mark();
        tracing::debug!("Dispatching {}", name);

        let result = self.apply(command);
        if let Err(err) = &result {
            self.events.rollback(mark);
            log_refused!(name, err);
        }
        result
    }

    fn apply(&mut self, command: Command) -> Result<(), PlotError> {
        match command {
            Command::Plot { catalog } => {
                self.plot(catalog);
                Ok(())
            }
            Command::ClearPlot => {
                self.clear_plot();
                Ok(())
            }
            Command::Recenter { id } => self.recenter(&id),
            Command::StartRoute {
                origin,
                name,
                color,
                line_width,
            } => self.start_route(&origin, &name, color, line_width),
            Command::ContinueRoute { id } => self.continue_route(&id),
            Command::FinishRoute { id } => self.finish_route(&id),
            Command::ResetRoute => {
                self.reset_route();
                Ok(())
            }
            Command::BuildPath {
                source,
                destination,
                path_name,
                color,
                line_width,
                encoded_path,
            } => self.build_path(&source, &destination, &path_name, color, line_width, &encoded_path),
            Command::PlotRoutes { routes } => {
                self.plot_routes(&routes);
                Ok(())
            }
            Command::FindTransits { band } => {
                self.find_transits(&band);
                Ok(())
            }
            Command::ClearTransits => {
                self.clear_transits();
                Ok(())
            }
            Command::RemoveTransit { key } => self.remove_transit(&key),
            Command::CreateRouteFromTransit {
                key,
                name,
                color,
                line_width,
            } => self.create_route_from_transit(&key, &name, color, line_width),
            Command::AddTransitToRoute { key } => self.add_transit_to_route(&key),
            Command::CompleteRouteFromTransit { key } => self.complete_route_from_transit(&key),
            Command::UpdateNotes { id, notes } => self.update_notes(&id, &notes),
            Command::RemoveStar { id } => self.remove_star(&id),
            Command::EditStar { object } => self.edit_star(object),
            Command::ShowTransits { on } => {
                self.show_transits(on);
                Ok(())
            }
            Command::ShowTransitLengths { on } => {
                self.transits.toggle_lengths(on);
                self.relabel();
                Ok(())
            }
            Command::ShowRoutes { on } => {
                self.show_routes(on);
                Ok(())
            }
            Command::UpdateView { camera } => {
                self.camera = camera.clamped();
                self.relabel();
                Ok(())
            }
        }
    }

    // ---------------------------------------------------------------- plot

    fn plot(&mut self, catalog: Catalog) {
        let center = catalog.center_coordinates();
        tracing::info!(
            "Plotting dataset '{}' ({} objects) centered on {}",
            catalog.dataset,
            catalog.objects.len(),
            catalog.center.as_deref().unwrap_or("the origin")
        );

        self.discard_route();
        self.drop_transits();
        self.renderer.clear_routes();
        self.plotted_routes.clear();

        self.dataset = catalog.dataset;
        self.center_name = catalog.center;
        self.objects = catalog.objects;
        self.relayout(center);
    }

    fn clear_plot(&mut self) {
        self.discard_route();
        self.drop_transits();
        self.renderer.clear_stars();
        self.renderer.clear_routes();
        self.registry.clear();
        self.labels.clear();
        self.objects.clear();
        self.plotted_routes.clear();
        self.center_name = None;
        self.last_plot = None;
        self.events.push(Event::ListCleared);
        tracing::info!("Plot cleared");
    }

    fn recenter(&mut self, id: &StarId) -> Result<(), PlotError> {
        let record = self.registry.find(id).cloned().ok_or_else(|| PlotError::unknown_id(id))?;
        tracing::info!("Recenter on {}", record.name);
        self.events.push(Event::RecenterRequested(record.clone()));
        self.center_name = Some(record.name);
        self.relayout(record.actual_coordinates);
        Ok(())
    }

    /// Full O(n) relayout of the current objects on `center`, then re-derive
    /// every plot-space geometry that depends on it
    fn relayout(&mut self, center: Vec3) {
        let summary = self.plotter.plot(
            &self.objects,
            center,
            self.center_name.as_deref(),
            PlotTarget {
                transformer: &mut self.transformer,
                registry: &mut self.registry,
                renderer: &mut self.renderer,
                events: &mut self.events,
            },
        );
        self.last_plot = Some(summary);

        self.drop_transits();

        self.renderer.clear_routes();
        let routes = std::mem::take(&mut self.plotted_routes);
        self.plot_routes(&routes);

        let was_building = self.builder.is_active();
        match self.builder.rebind_current(&self.registry).cloned() {
            Some(route) => self.draw_preview(&route),
            None if was_building => {
                self.events.push(Event::RoutingStatusChanged(false));
            }
            None => {}
        }

        self.labels.sync_stars(&self.registry);
        self.relabel();
    }

    /// Redraw every registered star after a single-object change
    fn redraw_stars(&mut self) {
        self.renderer.clear_stars();
        self.events.push(Event::ListCleared);
        let center_name = self.center_name.clone();
        let records: Vec<_> = self.registry.records().cloned().collect();
        for record in records {
            let handle = self.renderer.draw_star(&record, center_name.as_deref());
            self.registry.attach_handle(&record.id, handle);
            self.events.push(Event::ListChanged(record));
        }
        self.renderer.raise_to_front(Layer::Labels);
        self.labels.sync_stars(&self.registry);
        self.relabel();
    }

    // ------------------------------------------------------------- routing

    fn start_route(&mut self, origin: &StarId, name: &str, color: Color, line_width: f64) -> Result<(), PlotError> {
        self.builder.start_route(&self.registry, origin, name, color, line_width)?;
        self.events.push(Event::RoutingStatusChanged(true));
        Ok(())
    }

    fn continue_route(&mut self, id: &StarId) -> Result<(), PlotError> {
        let route = self.builder.continue_route(&self.registry, id)?.clone();
        self.draw_preview(&route);
        self.events.push(Event::RouteUpdated(route));
        Ok(())
    }

    fn finish_route(&mut self, id: &StarId) -> Result<(), PlotError> {
        let dataset = self.dataset.clone();
        let persistence = &mut self.persistence;
        let route = self
            .builder
            .finish_route(&self.registry, id, |route| save_route(persistence, &dataset, route))?;
        self.route_finished(route);
        Ok(())
    }

    fn reset_route(&mut self) {
        if !self.builder.is_active() {
            tracing::debug!("Reset requested with no route in progress");
        }
        self.discard_route();
    }

    /// Drop the route in progress, telling the front end if there was one
    fn discard_route(&mut self) {
        if let Some(route) = self.builder.reset_route() {
            self.renderer.draw_route_preview(&[], route.color, route.line_width);
            self.events.push(Event::RouteDeleted(route));
            self.events.push(Event::RoutingStatusChanged(false));
        }
    }

    fn route_finished(&mut self, route: RouteDescriptor) {
        self.renderer.draw_route_preview(&[], route.color, route.line_width);
        if self.routes_visible {
            self.renderer.draw_route(&route);
            self.renderer.raise_to_front(Layer::Labels);
        }
        self.plotted_routes.push(route.clone());
        self.events.push(Event::RouteCreated(route));
        self.events.push(Event::RoutingStatusChanged(false));
    }

    fn draw_preview(&mut self, route: &RouteDescriptor) {
        self.renderer
            .draw_route_preview(&route.segments(), route.color, route.line_width);
    }

    fn build_path(
        &mut self,
        source: &str,
        destination: &str,
        path_name: &str,
        color: Color,
        line_width: f64,
        encoded: &str,
    ) -> Result<(), PlotError> {
        let route = build_path(&self.registry, source, destination, path_name, color, line_width, encoded)?;
        save_route(&mut self.persistence, &self.dataset, &route)?;

        if self.routes_visible {
            self.renderer.draw_route(&route);
        }
        self.plotted_routes.push(route.clone());
        self.events.push(Event::RouteCreated(route));
        Ok(())
    }

    /// Draw stored routes whose stars are all plotted; returns how many were drawn
    fn plot_routes(&mut self, routes: &[RouteDescriptor]) -> usize {
        let mut drawn = 0;
        for route in routes {
            let Some(rebound) = RouteBuilder::rebind(&self.registry, route) else {
                tracing::debug!("Route '{}' has stars outside the plot, skipped", route.name);
                continue;
            };
            if self.routes_visible {
                self.renderer.draw_route(&rebound);
            }
            self.plotted_routes.push(rebound);
            drawn += 1;
        }
        if !routes.is_empty() {
            tracing::info!("Plotted {} of {} routes", drawn, routes.len());
        }
        drawn
    }

    /// Hide or show plotted routes; the route in progress stays on screen
    fn show_routes(&mut self, on: bool) {
        self.routes_visible = on;
        self.renderer.clear_routes();
        if on {
            for route in &self.plotted_routes {
                self.renderer.draw_route(route);
            }
            self.renderer.raise_to_front(Layer::Labels);
        }
        if let Some(route) = self.builder.current().cloned() {
            self.draw_preview(&route);
        }
        tracing::debug!("Routes {}", if on { "shown" } else { "hidden" });
    }

    // ------------------------------------------------------------ transits

    fn find_transits(&mut self, band: &TransitBand) {
        let visible: Vec<_> = self.registry.records().cloned().collect();
        let count = self.transits.find_transits_in_band(band, &visible);
        self.renderer.clear_transits();
        self.renderer.draw_transits(self.transits.transits());
        self.labels.sync_transits(self.transits.transits());
        self.renderer.raise_to_front(Layer::Labels);
        self.events.push(Event::TransitsChanged(count));
        self.relabel();
    }

    fn clear_transits(&mut self) {
        self.drop_transits();
        self.events.push(Event::TransitsChanged(0));
        self.relabel();
    }

    /// Forget transits whose endpoints are no longer valid
    fn drop_transits(&mut self) {
        let had_transits = !self.transits.is_empty();
        self.transits.clear_transits();
        self.renderer.clear_transits();
        self.labels.clear_transits();
        if had_transits {
            self.events.push(Event::TransitsChanged(0));
        }
    }

    fn remove_transit(&mut self, key: &str) -> Result<(), PlotError> {
        self.transits
            .remove_transit(key)
            .ok_or_else(|| PlotError::Lookup(format!("transit {}", key)))?;
        self.labels.remove(&LabelKey::Transit(key.to_string()));
        self.redraw_transits();
        self.events.push(Event::TransitsChanged(self.transits.len()));
        self.relabel();
        Ok(())
    }

    fn show_transits(&mut self, on: bool) {
        self.transits.set_visible(on);
        self.redraw_transits();
        self.relabel();
    }

    fn redraw_transits(&mut self) {
        self.renderer.clear_transits();
        if self.transits.is_visible() {
            self.renderer.draw_transits(self.transits.transits());
        }
    }

    fn create_route_from_transit(&mut self, key: &str, name: &str, color: Color, line_width: f64) -> Result<(), PlotError> {
        let previous = self.builder.current().cloned();
        let route = self
            .transits
            .create_new_route(key, &mut self.builder, &self.registry, name, color, line_width)?;

        if let Some(previous) = previous {
            self.events.push(Event::RouteDeleted(previous));
        }
        self.draw_preview(&route);
        self.events.push(Event::RoutingStatusChanged(true));
        self.events.push(Event::RouteUpdated(route));
        Ok(())
    }

    fn add_transit_to_route(&mut self, key: &str) -> Result<(), PlotError> {
        let route = self.transits.add_to_route(key, &mut self.builder, &self.registry)?;
        self.draw_preview(&route);
        self.events.push(Event::RouteUpdated(route));
        Ok(())
    }

    fn complete_route_from_transit(&mut self, key: &str) -> Result<(), PlotError> {
        let dataset = self.dataset.clone();
        let persistence = &mut self.persistence;
        let route = self.transits.complete_the_route(key, &mut self.builder, &self.registry, |route| {
            save_route(persistence, &dataset, route)
        })?;
        self.route_finished(route);
        Ok(())
    }

    // ------------------------------------------------------------- objects

    fn update_notes(&mut self, id: &StarId, notes: &str) -> Result<(), PlotError> {
        if notes.trim().is_empty() {
            tracing::debug!("Empty notes for {} ignored", id);
            return Ok(());
        }
        if !self.registry.contains(id) {
            return Err(PlotError::unknown_id(id));
        }
        self.persistence
            .update_notes(id, notes)
            .map_err(|e| PlotError::Persistence(e.to_string()))?;

        if let Some(object) = self.objects.iter_mut().find(|o| &o.id == id) {
            object.notes = notes.to_string();
        }
        if let Some(record) = self.registry.set_notes(id, notes).cloned() {
            self.events.push(Event::ListChanged(record));
        }
        Ok(())
    }

    fn remove_star(&mut self, id: &StarId) -> Result<(), PlotError> {
        if !self.registry.contains(id) {
            return Err(PlotError::unknown_id(id));
        }
        self.persistence
            .remove_object(id)
            .map_err(|e| PlotError::Persistence(e.to_string()))?;

        if let Some(record) = self.registry.remove(id) {
            tracing::info!("Removed star '{}'", record.name);
        }
        self.objects.retain(|o| &o.id != id);
        self.labels.remove(&LabelKey::Star(id.clone()));

        if self.builder.current().is_some_and(|r| r.route_list.contains(id)) {
            self.discard_route();
        }

        let touching: Vec<String> = self
            .transits
            .transits()
            .iter()
            .filter(|t| t.touches(id))
            .map(|t| t.key())
            .collect();
        if !touching.is_empty() {
            for key in &touching {
                self.transits.remove_transit(key);
                self.labels.remove(&LabelKey::Transit(key.clone()));
            }
            self.redraw_transits();
            self.events.push(Event::TransitsChanged(self.transits.len()));
        }

        let routes = std::mem::take(&mut self.plotted_routes);
        self.renderer.clear_routes();
        self.plot_routes(&routes);

        self.redraw_stars();
        Ok(())
    }

    fn edit_star(&mut self, object: CatalogObject) -> Result<(), PlotError> {
        self.persistence
            .update_object(&object)
            .map_err(|e| PlotError::Persistence(e.to_string()))?;

        if self.builder.current().is_some_and(|r| r.route_list.contains(&object.id)) {
            self.discard_route();
        }

        // The plot follows its center star when that star moves
        let was_center = self
            .objects
            .iter()
            .find(|o| o.id == object.id)
            .is_some_and(|o| self.center_name.as_deref() == Some(o.name.as_str()));
        let center = if was_center {
            self.center_name = Some(object.name.clone());
            object.coordinates
        } else {
            self.transformer.center()
        };

        tracing::info!("Edited star '{}' ({}), replotting", object.name, object.id);
        match self.objects.iter_mut().find(|o| o.id == object.id) {
            Some(existing) => *existing = object,
            None => self.objects.push(object),
        }
        self.relayout(center);
        Ok(())
    }

    // -------------------------------------------------------------- labels

    fn relabel(&mut self) {
        let viewport = self.renderer.viewport();
        let lengths_visible = self.transits.is_visible() && self.transits.lengths_visible();
        let placed: Vec<PlacedLabel> = self
            .labels
            .layout(&self.camera, viewport)
            .into_iter()
            .filter(|label| lengths_visible || matches!(label.key, LabelKey::Star(_)))
            .collect();
        self.renderer.place_labels(&placed);
        self.events.push(Event::LabelsPlaced(placed));
    }

    // ------------------------------------------------------------- queries

    /// Real-world distance from one plotted star to every other, nearest first
    pub fn distance_report(&self, id: &StarId) -> Result<Vec<DistanceEntry>, PlotError> {
        let origin = self.registry.find(id).ok_or_else(|| PlotError::unknown_id(id))?;
        let mut report: Vec<DistanceEntry> = self
            .registry
            .records()
            .filter(|r| &r.id != id)
            .map(|r| DistanceEntry {
                id: r.id.clone(),
                name: r.name.clone(),
                distance: origin.distance_to(r),
            })
            .collect();
        report.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.name.cmp(&b.name)));
        Ok(report)
    }
}

fn save_route<P: Persistence>(persistence: &mut P, dataset: &str, route: &RouteDescriptor) -> Result<(), PlotError> {
    persistence
        .add_route_to_dataset(dataset, route)
        .map_err(|e| PlotError::Persistence(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::transit_key;
    use crate::persistence::MemoryStore;
    use crate::renderer::RecordingRenderer;

    type TestState = AppState<RecordingRenderer, MemoryStore>;

    fn object(id: &str, name: &str, at: Vec3) -> CatalogObject {
        CatalogObject {
            id: StarId::from(id),
            name: name.to_string(),
            coordinates: at,
            radius: None,
            spectral_class: Some("G2V".to_string()),
            color: None,
            group: None,
            notes: String::new(),
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            dataset: "local".to_string(),
            center: Some("Alpha".to_string()),
            objects: vec![
                object("a", "Alpha", [0.0, 0.0, 0.0]),
                object("b", "Beta", [3.0, 0.0, 0.0]),
                object("c", "Gamma", [3.0, 4.0, 0.0]),
            ],
        }
    }

    fn plotted() -> TestState {
        let mut state = AppState::new(Config::default(), RecordingRenderer::default(), MemoryStore::new());
        state.dispatch(Command::Plot { catalog: catalog() }).unwrap();
        state.drain_events();
        state
    }

    fn id(s: &str) -> StarId {
        StarId::from(s)
    }

    fn start(state: &mut TestState, origin: &str) {
        state
            .dispatch(Command::StartRoute {
                origin: id(origin),
                name: "trip".to_string(),
                color: [1.0, 0.0, 0.0],
                line_width: 0.5,
            })
            .unwrap();
    }

    #[test]
    fn test_plot_emits_list_events_and_labels() {
        let mut state = AppState::new(Config::default(), RecordingRenderer::default(), MemoryStore::new());
        state.dispatch(Command::Plot { catalog: catalog() }).unwrap();

        let events = state.drain_events();
        assert_eq!(events[0], Event::ListCleared);
        let changed = events.iter().filter(|e| matches!(e, Event::ListChanged(_))).count();
        assert_eq!(changed, 3);
        assert!(matches!(events.last(), Some(Event::LabelsPlaced(labels)) if labels.len() == 3));
        assert_eq!(state.dataset(), "local");
        assert_eq!(state.renderer().stars.iter().filter(|s| s.central).count(), 1);
        assert_eq!(state.last_plot().unwrap().plotted, 3);
    }

    #[test]
    fn test_route_scenario_persists_once() {
        let mut state = plotted();
        start(&mut state, "a");
        state.dispatch(Command::ContinueRoute { id: id("b") }).unwrap();
        state.dispatch(Command::FinishRoute { id: id("c") }).unwrap();

        let saved = state.persistence().routes("local");
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].route_list, vec![id("a"), id("b"), id("c")]);
        assert_eq!(saved[0].total_length, 7.0);
        assert_eq!(state.routing_state(), RoutingState::Idle);
        assert_eq!(state.renderer().routes.len(), 1);
        assert!(state.renderer().preview.is_empty());

        let events = state.drain_events();
        assert_eq!(events[0], Event::RoutingStatusChanged(true));
        assert!(matches!(events[1], Event::RouteUpdated(_)));
        assert!(matches!(events[2], Event::RouteCreated(_)));
        assert_eq!(events[3], Event::RoutingStatusChanged(false));
    }

    #[test]
    fn test_refused_command_emits_nothing() {
        let mut state = plotted();
        let err = state.dispatch(Command::ContinueRoute { id: id("b") }).unwrap_err();
        assert!(matches!(err, PlotError::State { .. }));
        assert!(state.drain_events().is_empty());

        let err = state.dispatch(Command::Recenter { id: id("nope") }).unwrap_err();
        assert!(matches!(err, PlotError::Lookup(_)));
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_failed_persist_keeps_route_building() {
        let mut state = plotted();
        start(&mut state, "a");
        state.drain_events();
        state.persistence.fail_writes = true;

        let err = state.dispatch(Command::FinishRoute { id: id("b") }).unwrap_err();
        assert!(matches!(err, PlotError::Persistence(_)));
        assert_eq!(state.routing_state(), RoutingState::Building);
        assert_eq!(state.current_route().unwrap().route_list, vec![id("a")]);
        assert!(state.drain_events().is_empty());
        assert!(state.renderer().routes.is_empty());
    }

    #[test]
    fn test_reset_route_twice() {
        let mut state = plotted();
        start(&mut state, "a");
        state.dispatch(Command::ContinueRoute { id: id("b") }).unwrap();
        assert_eq!(state.renderer().preview.len(), 1);
        state.drain_events();

        state.dispatch(Command::ResetRoute).unwrap();
        state.dispatch(Command::ResetRoute).unwrap();
        assert_eq!(state.routing_state(), RoutingState::Idle);
        assert!(state.renderer().preview.is_empty());

        let events = state.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::RouteDeleted(_)));
        assert_eq!(events[1], Event::RoutingStatusChanged(false));
    }

    #[test]
    fn test_find_transits_draws_and_labels() {
        let mut state = plotted();
        state
            .dispatch(Command::FindTransits {
                band: TransitBand::up_to(5.0),
            })
            .unwrap();

        assert_eq!(state.transits().len(), 3);
        assert_eq!(state.renderer().transits.len(), 3);
        let events = state.drain_events();
        assert_eq!(events[0], Event::TransitsChanged(3));
        match events.last() {
            Some(Event::LabelsPlaced(labels)) => assert_eq!(labels.len(), 6),
            other => panic!("unexpected {:?}", other),
        }

        state.dispatch(Command::ShowTransitLengths { on: false }).unwrap();
        assert_eq!(state.renderer().labels.len(), 3);

        state.dispatch(Command::ShowTransits { on: false }).unwrap();
        assert!(state.renderer().transits.is_empty());
        state.dispatch(Command::ShowTransits { on: true }).unwrap();
        assert_eq!(state.renderer().transits.len(), 3);
        assert_eq!(state.renderer().labels.len(), 6);
    }

    #[test]
    fn test_show_routes_hides_plotted_routes() {
        let mut state = plotted();
        start(&mut state, "a");
        state.dispatch(Command::FinishRoute { id: id("b") }).unwrap();
        assert_eq!(state.renderer().routes.len(), 1);

        state.dispatch(Command::ShowRoutes { on: false }).unwrap();
        assert!(!state.routes_visible());
        assert!(state.renderer().routes.is_empty());

        // Hidden routes are still charted and kept across a recenter
        start(&mut state, "b");
        state.dispatch(Command::ContinueRoute { id: id("c") }).unwrap();
        assert_eq!(state.renderer().preview.len(), 1);
        state.dispatch(Command::FinishRoute { id: id("a") }).unwrap();
        state.dispatch(Command::Recenter { id: id("c") }).unwrap();
        assert!(state.renderer().routes.is_empty());
        assert_eq!(state.plotted_routes().len(), 2);

        state.dispatch(Command::ShowRoutes { on: true }).unwrap();
        assert_eq!(state.renderer().routes.len(), 2);
    }

    #[test]
    fn test_remove_transit() {
        let mut state = plotted();
        state.dispatch(Command::FindTransits { band: TransitBand::up_to(5.0) }).unwrap();
        state.drain_events();

        let key = transit_key(&id("a"), &id("c"));
        state.dispatch(Command::RemoveTransit { key: key.clone() }).unwrap();
        assert_eq!(state.transits().len(), 2);
        assert_eq!(state.renderer().transits.len(), 2);
        assert!(state.drain_events().contains(&Event::TransitsChanged(2)));

        let err = state.dispatch(Command::RemoveTransit { key }).unwrap_err();
        assert!(matches!(err, PlotError::Lookup(_)));
    }

    #[test]
    fn test_route_from_transits() {
        let mut state = plotted();
        state.dispatch(Command::FindTransits { band: TransitBand::up_to(5.0) }).unwrap();
        state
            .dispatch(Command::CreateRouteFromTransit {
                key: transit_key(&id("a"), &id("b")),
                name: "hop".to_string(),
                color: [0.0, 1.0, 0.0],
                line_width: 1.0,
            })
            .unwrap();
        assert_eq!(state.routing_state(), RoutingState::Building);

        state
            .dispatch(Command::CompleteRouteFromTransit {
                key: transit_key(&id("b"), &id("c")),
            })
            .unwrap();
        let saved = state.persistence().routes("local");
        assert_eq!(saved[0].name, "hop");
        assert_eq!(saved[0].total_length, 7.0);
        assert_eq!(state.routing_state(), RoutingState::Idle);

        let err = state
            .dispatch(Command::AddTransitToRoute {
                key: transit_key(&id("a"), &id("b")),
            })
            .unwrap_err();
        assert!(matches!(err, PlotError::State { .. }));
    }

    #[test]
    fn test_recenter_rebinds_routes() {
        let mut state = plotted();
        start(&mut state, "a");
        state.dispatch(Command::FinishRoute { id: id("b") }).unwrap();
        state.drain_events();

        state.dispatch(Command::Recenter { id: id("b") }).unwrap();
        let events = state.drain_events();
        assert!(matches!(&events[0], Event::RecenterRequested(r) if r.id == id("b")));

        let b = state.registry().find(&id("b")).unwrap();
        assert_eq!(b.coordinates, [0.0, 0.0, 0.0]);
        assert_eq!(state.transformer().center(), [3.0, 0.0, 0.0]);

        let route = &state.plotted_routes()[0];
        assert_eq!(route.waypoints[1], [0.0, 0.0, 0.0]);
        assert_eq!(route.total_length, 3.0);
        assert_eq!(state.renderer().routes.len(), 1);
        assert!(state.renderer().stars.iter().any(|s| s.central && s.record.name == "Beta"));
    }

    #[test]
    fn test_plot_routes_skips_incomplete_routes() {
        let mut state = plotted();
        let complete = build_path(&state.registry, "Alpha", "Gamma", "1", [1.0; 3], 0.5, "[Alpha,Beta,Gamma]").unwrap();
        let mut broken = complete.clone();
        broken.route_list.push(id("zeta"));

        state
            .dispatch(Command::PlotRoutes {
                routes: vec![complete, broken],
            })
            .unwrap();
        assert_eq!(state.plotted_routes().len(), 1);
        assert_eq!(state.renderer().routes.len(), 1);
    }

    #[test]
    fn test_build_path_command() {
        let mut state = plotted();
        state
            .dispatch(Command::BuildPath {
                source: "Alpha".to_string(),
                destination: "Gamma".to_string(),
                path_name: "2".to_string(),
                color: [1.0; 3],
                line_width: 0.5,
                encoded_path: "[Alpha, Gamma]".to_string(),
            })
            .unwrap();
        let saved = state.persistence().routes("local");
        assert_eq!(saved[0].name, "Route Alpha to Gamma, path 2");
        assert_eq!(saved[0].total_length, 5.0);

        let err = state
            .dispatch(Command::BuildPath {
                source: "Alpha".to_string(),
                destination: "Gamma".to_string(),
                path_name: "3".to_string(),
                color: [1.0; 3],
                line_width: 0.5,
                encoded_path: "Alpha, Gamma".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, PlotError::Parse { .. }));
        assert_eq!(state.persistence().routes("local").len(), 1);
    }

    #[test]
    fn test_update_notes() {
        let mut state = plotted();
        state
            .dispatch(Command::UpdateNotes {
                id: id("b"),
                notes: "   ".to_string(),
            })
            .unwrap();
        assert!(state.drain_events().is_empty());

        state
            .dispatch(Command::UpdateNotes {
                id: id("b"),
                notes: "binary?".to_string(),
            })
            .unwrap();
        assert_eq!(state.registry().find(&id("b")).unwrap().notes, "binary?");
        assert!(matches!(&state.drain_events()[0], Event::ListChanged(r) if r.notes == "binary?"));

        let err = state
            .dispatch(Command::UpdateNotes {
                id: id("x"),
                notes: "n".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, PlotError::Lookup(_)));
    }

    #[test]
    fn test_remove_star_drops_its_transits() {
        let mut state = plotted();
        state.dispatch(Command::FindTransits { band: TransitBand::up_to(5.0) }).unwrap();
        state.dispatch(Command::RemoveStar { id: id("c") }).unwrap();

        assert!(state.registry().find(&id("c")).is_none());
        assert_eq!(state.transits().len(), 1);
        assert_eq!(state.renderer().stars.len(), 2);
        assert!(state.persistence().data.removed.contains(&id("c")));
    }

    #[test]
    fn test_edit_star_moves_record() {
        let mut state = plotted();
        let mut moved = object("c", "Gamma", [3.0, 0.0, 4.0]);
        moved.spectral_class = Some("M2".to_string());
        state.dispatch(Command::EditStar { object: moved.clone() }).unwrap();

        let record = state.registry().find(&id("c")).unwrap();
        assert_eq!(record.actual_coordinates, [3.0, 0.0, 4.0]);
        assert_eq!(state.persistence().get_object(&id("c")), Some(moved));
    }

    #[test]
    fn test_edit_star_rederives_routes_and_transits() {
        let mut state = plotted();
        state.dispatch(Command::FindTransits { band: TransitBand::up_to(5.0) }).unwrap();
        start(&mut state, "a");
        state.dispatch(Command::ContinueRoute { id: id("b") }).unwrap();
        state.drain_events();

        state
            .dispatch(Command::EditStar {
                object: object("b", "Beta", [50.0, 0.0, 0.0]),
            })
            .unwrap();

        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, Event::RouteDeleted(r) if r.name == "trip")));
        assert!(events.contains(&Event::RoutingStatusChanged(false)));
        assert!(events.contains(&Event::TransitsChanged(0)));
        assert_eq!(state.routing_state(), RoutingState::Idle);
        assert!(state.transits().get(&transit_key(&id("a"), &id("b"))).is_none());

        let half = state.config().grid.plot_half_extent;
        for record in state.registry().records() {
            assert!(record.coordinates.iter().all(|c| c.abs() <= half + 1e-9));
        }
        let report = state.distance_report(&id("a")).unwrap();
        assert_eq!(report.last().unwrap().id, id("b"));
        assert_eq!(report.last().unwrap().distance, 50.0);
    }

    #[test]
    fn test_edit_star_updates_plotted_route_length() {
        let mut state = plotted();
        start(&mut state, "a");
        state.dispatch(Command::FinishRoute { id: id("b") }).unwrap();
        assert_eq!(state.plotted_routes()[0].total_length, 3.0);

        state
            .dispatch(Command::EditStar {
                object: object("b", "Beta", [0.0, 0.0, 12.0]),
            })
            .unwrap();
        assert_eq!(state.plotted_routes().len(), 1);
        assert_eq!(state.plotted_routes()[0].total_length, 12.0);
        let b = state.registry().find(&id("b")).unwrap();
        assert_eq!(state.plotted_routes()[0].waypoints[1], b.coordinates);
    }

    #[test]
    fn test_edit_star_out_of_bounds_leaves_route_usable() {
        let mut state = plotted();
        start(&mut state, "a");
        state.dispatch(Command::ContinueRoute { id: id("b") }).unwrap();

        state
            .dispatch(Command::EditStar {
                object: object("b", "Beta", [50_000.0, 0.0, 0.0]),
            })
            .unwrap();
        assert!(!state.registry().contains(&id("b")));
        assert_eq!(state.routing_state(), RoutingState::Idle);

        start(&mut state, "a");
        state.dispatch(Command::ContinueRoute { id: id("c") }).unwrap();
        assert_eq!(state.current_route().unwrap().total_length, 5.0);
    }

    #[test]
    fn test_update_view_keeps_labels_on_screen() {
        let mut state = plotted();
        state
            .dispatch(Command::UpdateView {
                camera: Camera {
                    yaw: 0.3,
                    pitch: 0.2,
                    zoom: 40.0,
                    pan: [500.0, -500.0],
                },
            })
            .unwrap();
        assert_eq!(state.camera().zoom, 10.0);

        let viewport = state.renderer().viewport();
        for label in &state.renderer().labels {
            assert!(label.x >= 0.0 && label.x <= viewport.width);
            assert!(label.y >= 0.0 && label.y <= viewport.height);
        }
    }

    #[test]
    fn test_distance_report_sorted() {
        let state = plotted();
        let report = state.distance_report(&id("a")).unwrap();
        let distances: Vec<f64> = report.iter().map(|e| e.distance).collect();
        assert_eq!(distances, vec![3.0, 5.0]);
        assert!(state.distance_report(&id("x")).is_err());
    }

    #[test]
    fn test_demo_catalog() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/local_stars.yaml");
        let catalog = Catalog::load(path).unwrap();
        let mut state = AppState::new(Config::default(), RecordingRenderer::default(), MemoryStore::new());
        state.dispatch(Command::Plot { catalog }).unwrap();
        assert_eq!(state.last_plot().unwrap().plotted, 16);
        assert_eq!(state.last_plot().unwrap().rejected, 0);

        state
            .dispatch(Command::BuildPath {
                source: "Sol".to_string(),
                destination: "Proxima Centauri".to_string(),
                path_name: "1".to_string(),
                color: [1.0; 3],
                line_width: 0.5,
                encoded_path: "[Sol, Alpha Centauri A, Proxima Centauri]".to_string(),
            })
            .unwrap();
        let route = &state.persistence().routes("local")[0];
        assert!(route.total_length > 4.3 && route.total_length < 4.5);

        let sirius_b = state.registry().find_by_name("Sirius B").unwrap();
        let white_dwarf = StellarCatalog::standard().color_for("DA").unwrap();
        assert_eq!(sirius_b.color, white_dwarf);
    }

    #[test]
    fn test_clear_plot() {
        let mut state = plotted();
        start(&mut state, "a");
        state.drain_events();
        state.dispatch(Command::ClearPlot).unwrap();

        assert!(state.registry().is_empty());
        assert!(state.renderer().stars.is_empty());
        assert_eq!(state.routing_state(), RoutingState::Idle);
        let events = state.drain_events();
        assert!(events.contains(&Event::RoutingStatusChanged(false)));
        assert_eq!(events.last(), Some(&Event::ListCleared));
    }
}
