//! Transit graph - candidate links between visible stars
//!
//! Every query replaces the working set wholesale. The pair search is O(n²)
//! over the visible stars, which stay in the low hundreds.

use std::collections::HashMap;

use crate::error::PlotError;
use crate::model::{Color, RouteDescriptor, StarDisplayRecord, StarId, TransitRoute};
use crate::registry::PlotRegistry;
use crate::routing::{RouteBuilder, RoutingState};

pub use crate::config::TransitBand;

#[derive(Debug, Clone, Default)]
pub struct TransitGraphComputer {
    transits: Vec<TransitRoute>,
    by_key: HashMap<String, usize>,
    visible: bool,
    lengths_visible: bool,
}

impl TransitGraphComputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All pairs within `max_distance`, default styling
    pub fn find_transits(&mut self, max_distance: f64, stars: &[StarDisplayRecord]) -> usize {
        self.find_transits_in_band(&TransitBand::up_to(max_distance), stars)
    }

    /// All pairs with `band.lower <= d <= band.upper` in real-world light-years
    pub fn find_transits_in_band(&mut self, band: &TransitBand, stars: &[StarDisplayRecord]) -> usize {
        self.clear_transits();
        self.visible = true;
        self.lengths_visible = true;

        for (i, source) in stars.iter().enumerate() {
            for target in &stars[i + 1..] {
                if source.id == target.id {
                    continue;
                }
                let distance = source.distance_to(target);
                if !band.contains(distance) {
                    continue;
                }
                let transit = TransitRoute {
                    source: source.id.clone(),
                    target: target.id.clone(),
                    source_name: source.name.clone(),
                    target_name: target.name.clone(),
                    source_endpoint: source.coordinates,
                    target_endpoint: target.coordinates,
                    distance,
                    color: band.color,
                    line_weight: band.line_weight,
                };
                let key = transit.key();
                if self.by_key.contains_key(&key) {
                    continue;
                }
                tracing::debug!("{}", transit.hover_text());
                self.by_key.insert(key, self.transits.len());
                self.transits.push(transit);
            }
        }

        tracing::info!(
            "Found {} transits between {:.2}ly and {:.2}ly among {} stars",
            self.transits.len(),
            band.lower,
            band.upper,
            stars.len()
        );
        self.transits.len()
    }

    pub fn transits(&self) -> &[TransitRoute] {
        &self.transits
    }

    pub fn len(&self) -> usize {
        self.transits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transits.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&TransitRoute> {
        self.by_key.get(key).map(|&i| &self.transits[i])
    }

    /// Drop one edge; the key map is rebuilt
    pub fn remove_transit(&mut self, key: &str) -> Option<TransitRoute> {
        let slot = self.by_key.get(key).copied()?;
        let removed = self.transits.remove(slot);
        self.by_key = self
            .transits
            .iter()
            .enumerate()
            .map(|(i, t)| (t.key(), i))
            .collect();
        tracing::info!("Removed transit {}", removed.hover_text());
        Some(removed)
    }

    /// Empty the set and hide transits and their length labels
    pub fn clear_transits(&mut self) {
        self.transits.clear();
        self.by_key.clear();
        self.visible = false;
        self.lengths_visible = false;
    }

    /// Show or hide transits together with their length labels
    pub fn set_visible(&mut self, on: bool) {
        self.visible = on;
        self.lengths_visible = on;
    }

    pub fn toggle_lengths(&mut self, on: bool) {
        tracing::info!("transit labels visibility: {}", on);
        self.lengths_visible = on;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn lengths_visible(&self) -> bool {
        self.lengths_visible
    }

    fn lookup(&self, key: &str) -> Result<&TransitRoute, PlotError> {
        self.get(key)
            .ok_or_else(|| PlotError::Lookup(format!("transit {}", key)))
    }

    /// Start a fresh route over one transit, discarding any route in progress.
    /// Nothing changes if either endpoint is no longer plotted.
    pub fn create_new_route(
        &self,
        key: &str,
        builder: &mut RouteBuilder,
        registry: &PlotRegistry,
        name: &str,
        color: Color,
        line_width: f64,
    ) -> Result<RouteDescriptor, PlotError> {
        let transit = self.lookup(key)?;
        for id in [&transit.source, &transit.target] {
            if !registry.contains(id) {
                return Err(PlotError::unknown_id(id));
            }
        }

        builder.reset_route();
        builder.start_route(registry, &transit.source, name, color, line_width)?;
        let route = builder.continue_route(registry, &transit.target)?;
        Ok(route.clone())
    }

    /// Extend the route in progress across a transit touching its end
    pub fn add_to_route(
        &self,
        key: &str,
        builder: &mut RouteBuilder,
        registry: &PlotRegistry,
    ) -> Result<RouteDescriptor, PlotError> {
        let next = self.next_stop(key, builder, "add a transit to a route")?;
        let route = builder.continue_route(registry, &next)?;
        Ok(route.clone())
    }

    /// Append across a transit and finish the route
    pub fn complete_the_route<F>(
        &self,
        key: &str,
        builder: &mut RouteBuilder,
        registry: &PlotRegistry,
        persist: F,
    ) -> Result<RouteDescriptor, PlotError>
    where
        F: FnOnce(&RouteDescriptor) -> Result<(), PlotError>,
    {
        let next = self.next_stop(key, builder, "complete a route")?;
        builder.finish_route(registry, &next, persist)
    }

    fn next_stop(&self, key: &str, builder: &RouteBuilder, operation: &'static str) -> Result<StarId, PlotError> {
        let end = match builder.current() {
            Some(route) => route.last_id().unwrap_or(&route.start_id).clone(),
            None => {
                return Err(PlotError::State {
                    operation,
                    state: RoutingState::Idle,
                })
            }
        };
        let transit = self.lookup(key)?;
        transit.other_end(&end).cloned().ok_or_else(|| {
            PlotError::Validation(format!(
                "transit {} <--> {} does not touch the route end",
                transit.source_name, transit.target_name
            ))
        })
    }
}
