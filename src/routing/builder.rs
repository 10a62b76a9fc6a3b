//! Interactive route builder
//!
//! States: Idle (initial and terminal) and Building. Every operation is
//! all-or-nothing: all checks run before the session is touched.

use crate::error::PlotError;
use crate::model::{distance, Color, RouteDescriptor, StarDisplayRecord, StarId, Vec3};
use crate::registry::PlotRegistry;

use super::RoutingState;

#[derive(Debug, Clone, Default)]
pub struct RouteBuilder {
    current: Option<RouteDescriptor>,
}

impl RouteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RoutingState {
        if self.current.is_some() {
            RoutingState::Building
        } else {
            RoutingState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// The route being built, if any
    pub fn current(&self) -> Option<&RouteDescriptor> {
        self.current.as_ref()
    }

    /// Line segments of the in-progress route for preview drawing
    pub fn preview_segments(&self) -> Vec<(Vec3, Vec3)> {
        self.current.as_ref().map(|r| r.segments()).unwrap_or_default()
    }

    pub fn start_route(
        &mut self,
        registry: &PlotRegistry,
        origin: &StarId,
        name: &str,
        color: Color,
        line_width: f64,
    ) -> Result<(), PlotError> {
        if self.is_active() {
            return Err(self.wrong_state("start a route"));
        }
        let record = registry.find(origin).ok_or_else(|| PlotError::unknown_id(origin))?;

        tracing::info!("Start charting the route '{}' at {}", name, record.name);
        self.current = Some(RouteDescriptor::new(name, record, color, line_width));
        Ok(())
    }

    pub fn continue_route(&mut self, registry: &PlotRegistry, next: &StarId) -> Result<&RouteDescriptor, PlotError> {
        let (record, length) = self.check_next(registry, next, "continue a route")?;
        let route = self.append(record, length)?;
        tracing::info!(
            "Next routing step to {}: {} segments, {:.2}ly",
            next,
            route.segment_count(),
            route.total_length
        );
        Ok(route)
    }

    /// Append the last star, hand the route to `persist`, then go back to Idle.
    /// If `persist` fails the session is left exactly as it was.
    pub fn finish_route<F>(
        &mut self,
        registry: &PlotRegistry,
        next: &StarId,
        persist: F,
    ) -> Result<RouteDescriptor, PlotError>
    where
        F: FnOnce(&RouteDescriptor) -> Result<(), PlotError>,
    {
        let (record, length) = self.check_next(registry, next, "finish a route")?;
        let mut finished = match self.current.clone() {
            Some(route) => route,
            None => return Err(self.wrong_state("finish a route")),
        };
        finished.route_list.push(record.id.clone());
        finished.waypoints.push(record.coordinates);
        finished.total_length += length;

        persist(&finished)?;

        self.current = None;
        tracing::info!(
            "Route '{}' finished: {} stars, {:.2}ly",
            finished.name,
            finished.route_list.len(),
            finished.total_length
        );
        Ok(finished)
    }

    /// Drop any in-progress route; a no-op when idle
    pub fn reset_route(&mut self) -> Option<RouteDescriptor> {
        let discarded = self.current.take();
        if let Some(route) = &discarded {
            tracing::info!("Resetting the route '{}'", route.name);
        }
        discarded
    }

    /// A route can only be drawn when every one of its stars is plotted
    pub fn check_if_route_can_be_plotted(registry: &PlotRegistry, route: &RouteDescriptor) -> bool {
        route.route_list.iter().all(|id| registry.contains(id))
    }

    /// Re-derive the waypoints and real-world length of a route from the
    /// current plot. None if any of its stars is missing.
    pub fn rebind(registry: &PlotRegistry, route: &RouteDescriptor) -> Option<RouteDescriptor> {
        let stars = route
            .route_list
            .iter()
            .map(|id| registry.find(id))
            .collect::<Option<Vec<&StarDisplayRecord>>>()?;
        let waypoints: Vec<Vec3> = stars.iter().map(|r| r.coordinates).collect();
        let total_length = stars
            .windows(2)
            .map(|pair| distance(pair[0].actual_coordinates, pair[1].actual_coordinates))
            .sum();
        Some(RouteDescriptor {
            waypoints,
            total_length,
            ..route.clone()
        })
    }

    /// Refresh the in-progress waypoints after a relayout.
    /// The route is dropped if one of its stars is no longer plotted.
    pub fn rebind_current(&mut self, registry: &PlotRegistry) -> Option<&RouteDescriptor> {
        let route = self.current.take()?;
        match Self::rebind(registry, &route) {
            Some(rebound) => {
                self.current = Some(rebound);
                self.current.as_ref()
            }
            None => {
                tracing::warn!("Route '{}' lost a star in the relayout, discarding it", route.name);
                None
            }
        }
    }

    fn check_next<'r>(
        &self,
        registry: &'r PlotRegistry,
        next: &StarId,
        operation: &'static str,
    ) -> Result<(&'r StarDisplayRecord, f64), PlotError> {
        let route = self.current.as_ref().ok_or_else(|| self.wrong_state(operation))?;
        let record = registry.find(next).ok_or_else(|| PlotError::unknown_id(next))?;

        let last_id = route.last_id().unwrap_or(&route.start_id);
        if last_id == next {
            return Err(PlotError::Validation(format!(
                "{} is already the end of the route",
                record.name
            )));
        }
        let last = registry.find(last_id).ok_or_else(|| PlotError::unknown_id(last_id))?;

        Ok((record, distance(last.actual_coordinates, record.actual_coordinates)))
    }

    fn append(&mut self, record: &StarDisplayRecord, length: f64) -> Result<&RouteDescriptor, PlotError> {
        let Some(route) = self.current.as_mut() else {
            return Err(PlotError::State {
                operation: "continue a route",
                state: RoutingState::Idle,
            });
        };
        route.route_list.push(record.id.clone());
        route.waypoints.push(record.coordinates);
        route.total_length += length;
        Ok(route)
    }

    fn wrong_state(&self, operation: &'static str) -> PlotError {
        PlotError::State {
            operation,
            state: self.state(),
        }
    }
}
