//! Coordinate transformer
//!
//! Maps real-world positions (light-years) into the bounded plot cube:
//! - Recenter every object on the chosen center star
//! - Pick the smallest round grid division that keeps the gridline count in budget
//! - Scale so the farthest object lands on the plot cube face
//!
//! Re-centering is always a full relayout because the scale factor can change.

use crate::config::GridSettings;
use crate::model::{scale, sub, Vec3};

/// Per-axis extent of the recentered object set
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Largest absolute recentered coordinate on any axis
    pub fn max_extent(&self) -> f64 {
        self.min
            .iter()
            .chain(self.max.iter())
            .fold(0.0f64, |acc, v| acc.max(v.abs()))
    }
}

/// Result of choosing a scale for a set of bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingParameters {
    /// Light-years between gridlines
    pub scale_increment: f64,
    /// Plot-space units between gridlines
    pub grid_scale: f64,
    /// Plot-space units per light-year
    pub scale_factor: f64,
}

impl Default for ScalingParameters {
    fn default() -> Self {
        Self {
            scale_increment: 1.0,
            grid_scale: 1.0,
            scale_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoordinateTransformer {
    settings: GridSettings,
    center: Vec3,
    bounds: Bounds,
    scaling: ScalingParameters,
}

impl CoordinateTransformer {
    pub fn new(settings: GridSettings) -> Self {
        Self {
            settings,
            center: [0.0, 0.0, 0.0],
            bounds: Bounds::default(),
            scaling: ScalingParameters::default(),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn scaling(&self) -> ScalingParameters {
        self.scaling
    }

    /// Recenter all objects on `center` and record the per-axis min/max.
    /// An empty set leaves identity (zero) bounds.
    pub fn compute_bounds(&mut self, objects: &[Vec3], center: Vec3) -> Bounds {
        self.center = center;

        let mut iter = objects.iter().map(|&p| sub(p, center));
        let bounds = match iter.next() {
            None => Bounds::default(),
            Some(first) => iter.fold(Bounds { min: first, max: first }, |mut b, p| {
                for axis in 0..3 {
                    b.min[axis] = b.min[axis].min(p[axis]);
                    b.max[axis] = b.max[axis].max(p[axis]);
                }
                b
            }),
        };

        tracing::debug!(
            "Bounds around {:?}: min={:?} max={:?} ({} objects)",
            center,
            bounds.min,
            bounds.max,
            objects.len()
        );
        self.bounds = bounds;
        bounds
    }

    /// Pick the smallest division keeping `extent / division` within the gridline budget
    pub fn choose_scale(&mut self, bounds: &Bounds) -> ScalingParameters {
        let extent = bounds.max_extent();
        let divisions = &self.settings.divisions;

        let scale_increment = divisions
            .iter()
            .copied()
            .find(|&d| d > 0.0 && extent / d <= self.settings.gridline_budget)
            .or_else(|| divisions.last().copied())
            .unwrap_or(1.0);

        let scale_factor = if extent > 0.0 {
            self.settings.plot_half_extent / extent
        } else {
            1.0
        };

        let scaling = ScalingParameters {
            scale_increment,
            grid_scale: scale_increment * scale_factor,
            scale_factor,
        };
        tracing::debug!(
            "Scale chosen: extent={:.3}ly increment={}ly factor={:.5}",
            extent,
            scale_increment,
            scale_factor
        );
        self.scaling = scaling;
        scaling
    }

    /// (point - center) * scale_factor
    pub fn transform(&self, point: Vec3) -> Vec3 {
        scale(sub(point, self.center), self.scaling.scale_factor)
    }

    /// Inverse of `transform` for the same center and scale factor
    pub fn untransform(&self, plot: Vec3) -> Vec3 {
        let real = scale(plot, 1.0 / self.scaling.scale_factor);
        [real[0] + self.center[0], real[1] + self.center[1], real[2] + self.center[2]]
    }

    /// Full relayout: bounds, scale and every plot-space coordinate from scratch
    pub fn recenter(&mut self, new_center: Vec3, objects: &[Vec3]) -> Vec<Vec3> {
        let bounds = self.compute_bounds(objects, new_center);
        self.choose_scale(&bounds);
        objects.iter().map(|&p| self.transform(p)).collect()
    }
}
