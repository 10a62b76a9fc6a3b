//! Renderer seam
//!
//! The core decides what to draw and where (plot-space coordinates); a renderer
//! turns that into primitives. `RecordingRenderer` keeps the draw calls in memory
//! and backs the command-line front end and the tests.

use crate::labels::{PlacedLabel, Viewport};
use crate::model::{Color, RouteDescriptor, StarDisplayRecord, TransitRoute, Vec3};

/// Opaque reference to a renderer-owned visual node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Grid,
    Stars,
    Routes,
    Transits,
    Labels,
}

pub trait Renderer {
    /// Draw one star; the center star gets the central indicator
    fn draw_star(&mut self, record: &StarDisplayRecord, center_name: Option<&str>) -> RenderHandle;

    fn clear_stars(&mut self);

    fn rebuild_grid(&mut self, scale_increment: f64, grid_scale: f64);

    fn raise_to_front(&mut self, layer: Layer);

    /// Current viewport size in pixels
    fn viewport(&self) -> Viewport;

    fn draw_route(&mut self, route: &RouteDescriptor);

    fn clear_routes(&mut self);

    /// Segments of the route being built; an empty slice removes the preview
    fn draw_route_preview(&mut self, _segments: &[(Vec3, Vec3)], _color: Color, _line_width: f64) {}

    fn draw_transits(&mut self, transits: &[TransitRoute]);

    fn clear_transits(&mut self);

    fn place_labels(&mut self, _labels: &[PlacedLabel]) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnStar {
    pub handle: RenderHandle,
    pub record: StarDisplayRecord,
    pub central: bool,
}

/// In-memory renderer that records what it was asked to draw
#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    viewport: Viewport,
    next_handle: u64,
    pub stars: Vec<DrawnStar>,
    pub grid: Option<(f64, f64)>,
    pub raised: Vec<Layer>,
    pub routes: Vec<RouteDescriptor>,
    pub preview: Vec<(Vec3, Vec3)>,
    pub transits: Vec<TransitRoute>,
    pub labels: Vec<PlacedLabel>,
    pub star_clears: usize,
}

impl RecordingRenderer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            next_handle: 1,
            stars: Vec::new(),
            grid: None,
            raised: Vec::new(),
            routes: Vec::new(),
            preview: Vec::new(),
            transits: Vec::new(),
            labels: Vec::new(),
            star_clears: 0,
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new(Viewport {
            width: 1200.0,
            height: 800.0,
        })
    }
}

impl Renderer for RecordingRenderer {
    fn draw_star(&mut self, record: &StarDisplayRecord, center_name: Option<&str>) -> RenderHandle {
        let handle = RenderHandle(self.next_handle);
        self.next_handle += 1;
        let central = center_name == Some(record.name.as_str());
        if central {
            tracing::debug!("Central star '{}' at {:?}", record.name, record.actual_coordinates);
        }
        self.stars.push(DrawnStar {
            handle,
            record: record.clone(),
            central,
        });
        handle
    }

    fn clear_stars(&mut self) {
        self.stars.clear();
        self.labels.clear();
        self.star_clears += 1;
    }

    fn rebuild_grid(&mut self, scale_increment: f64, grid_scale: f64) {
        self.grid = Some((scale_increment, grid_scale));
    }

    fn raise_to_front(&mut self, layer: Layer) {
        self.raised.push(layer);
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn draw_route(&mut self, route: &RouteDescriptor) {
        self.routes.push(route.clone());
    }

    fn clear_routes(&mut self) {
        self.routes.clear();
        self.preview.clear();
    }

    fn draw_route_preview(&mut self, segments: &[(Vec3, Vec3)], _color: Color, _line_width: f64) {
        self.preview = segments.to_vec();
    }

    fn draw_transits(&mut self, transits: &[TransitRoute]) {
        self.transits = transits.to_vec();
    }

    fn clear_transits(&mut self) {
        self.transits.clear();
    }

    fn place_labels(&mut self, labels: &[PlacedLabel]) {
        self.labels = labels.to_vec();
    }
}
