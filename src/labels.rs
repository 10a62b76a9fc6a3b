//! Label layout engine
//!
//! 2-D overlay labels anchored to 3-D plot positions. On every view change the
//! anchors are projected into viewport pixels and clamped so that no label is
//! ever partly outside the viewport, even when the camera swings an anchor
//! off-screen. The only state kept is the anchor map itself.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::LabelSettings;
use crate::model::{midpoint, Color, StarId, TransitRoute, Vec3};
use crate::registry::PlotRegistry;

/// Viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Orbit camera: yaw around Y, then pitch around X, then pan and zoom
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub yaw: f64,
    pub pitch: f64,
    pub zoom: f64,
    pub pan: [f64; 2],
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            zoom: 1.0,
            pan: [0.0, 0.0],
        }
    }
}

impl Camera {
    /// Keep pitch short of the poles and zoom in a usable range
    pub fn clamped(mut self) -> Self {
        self.pitch = self.pitch.clamp(-1.5, 1.5);
        self.zoom = self.zoom.clamp(0.1, 10.0);
        self
    }

    /// Project a plot-space point into viewport pixels (y grows downwards)
    pub fn project(&self, p: Vec3, viewport: Viewport) -> [f64; 2] {
        let (sin_x, cos_x) = self.pitch.sin_cos();
        let (sin_y, cos_y) = self.yaw.sin_cos();

        // Rotate around Y axis (yaw)
        let x1 = p[0] * cos_y + p[2] * sin_y;
        let z1 = -p[0] * sin_y + p[2] * cos_y;

        // Rotate around X axis (pitch)
        let y1 = p[1] * cos_x - z1 * sin_x;

        [
            viewport.width / 2.0 + (x1 + self.pan[0]) * self.zoom,
            viewport.height / 2.0 - (y1 + self.pan[1]) * self.zoom,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LabelKey {
    Star(StarId),
    Transit(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnchoredLabel {
    pub text: String,
    pub anchor: Vec3,
    pub width: f64,
    pub height: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLabel {
    pub key: LabelKey,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: Color,
}

/// Clamp a projected label position into the viewport:
/// x in [0, width - label_width - margin], y in [0, height - label_height - margin]
pub fn clamp_label(projected: [f64; 2], viewport: Viewport, label_size: (f64, f64), margin: f64) -> [f64; 2] {
    let max_x = viewport.width - label_size.0 - margin;
    let max_y = viewport.height - label_size.1 - margin;
    [projected[0].min(max_x).max(0.0), projected[1].min(max_y).max(0.0)]
}

#[derive(Debug, Clone, Default)]
pub struct LabelLayoutEngine {
    settings: LabelSettings,
    anchors: BTreeMap<LabelKey, AnchoredLabel>,
}

impl LabelLayoutEngine {
    pub fn new(settings: LabelSettings) -> Self {
        Self {
            settings,
            anchors: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn get(&self, key: &LabelKey) -> Option<&AnchoredLabel> {
        self.anchors.get(key)
    }

    pub fn insert(&mut self, key: LabelKey, text: &str, anchor: Vec3, color: Color) {
        let (width, height) = self.settings.label_size(text);
        self.anchors.insert(
            key,
            AnchoredLabel {
                text: text.to_string(),
                anchor,
                width,
                height,
                color,
            },
        );
    }

    pub fn remove(&mut self, key: &LabelKey) -> bool {
        self.anchors.remove(key).is_some()
    }

    /// Replace all star labels with one per registered star
    pub fn sync_stars(&mut self, registry: &PlotRegistry) {
        self.anchors.retain(|key, _| !matches!(key, LabelKey::Star(_)));
        for record in registry.records() {
            self.insert(
                LabelKey::Star(record.id.clone()),
                &record.name,
                record.coordinates,
                record.color,
            );
        }
    }

    /// Replace all transit length labels; each sits at its transit's midpoint
    pub fn sync_transits(&mut self, transits: &[TransitRoute]) {
        self.clear_transits();
        for transit in transits {
            self.insert(
                LabelKey::Transit(transit.key()),
                &transit.length_label(),
                midpoint(transit.source_endpoint, transit.target_endpoint),
                transit.color,
            );
        }
    }

    pub fn clear_transits(&mut self) {
        self.anchors.retain(|key, _| !matches!(key, LabelKey::Transit(_)));
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
    }

    /// Project and clamp every label for the given view
    pub fn layout(&self, camera: &Camera, viewport: Viewport) -> Vec<PlacedLabel> {
        self.anchors
            .iter()
            .map(|(key, label)| {
                let projected = camera.project(label.anchor, viewport);
                let [x, y] = clamp_label(projected, viewport, (label.width, label.height), self.settings.margin);
                PlacedLabel {
                    key: key.clone(),
                    text: label.text.clone(),
                    x,
                    y,
                    color: label.color,
                }
            })
            .collect()
    }
}
