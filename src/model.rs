//! Plot data model
//!
//! - Real-world coordinates are light-years and never change after creation
//! - Plot-space coordinates are derived by the transformer and change on rescale
//! - Routes and transits measure length on real-world coordinates only

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// 3-vector as [x, y, z]
pub type Vec3 = [f64; 3];

/// RGB color with components in 0.0..=1.0
pub type Color = [f32; 3];

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(v: Vec3, factor: f64) -> Vec3 {
    [v[0] * factor, v[1] * factor, v[2] * factor]
}

pub fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0, (a[2] + b[2]) / 2.0]
}

/// Euclidean distance between two points
pub fn distance(a: Vec3, b: Vec3) -> f64 {
    let d = sub(a, b);
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

/// Stable identifier of a stellar object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StarId(String);

impl StarId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StarId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A plotted star. Owned by the registry; everyone else gets copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarDisplayRecord {
    pub id: StarId,
    pub name: String,
    pub actual_coordinates: Vec3,
    pub coordinates: Vec3,
    pub radius: f64,
    pub color: Color,
    pub group: Option<String>,
    pub notes: String,
}

impl StarDisplayRecord {
    /// Real-world distance to another record
    pub fn distance_to(&self, other: &StarDisplayRecord) -> f64 {
        distance(self.actual_coordinates, other.actual_coordinates)
    }
}

/// An ordered path through plotted stars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub name: String,
    pub route_list: Vec<StarId>,
    pub waypoints: Vec<Vec3>,
    pub total_length: f64,
    pub color: Color,
    pub line_width: f64,
    pub start_id: StarId,
    #[serde(default)]
    pub notes: String,
}

impl RouteDescriptor {
    /// A route seeded with its origin star
    pub fn new(name: &str, origin: &StarDisplayRecord, color: Color, line_width: f64) -> Self {
        Self {
            name: name.to_string(),
            route_list: vec![origin.id.clone()],
            waypoints: vec![origin.coordinates],
            total_length: 0.0,
            color,
            line_width,
            start_id: origin.id.clone(),
            notes: String::new(),
        }
    }

    pub fn segment_count(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    pub fn last_id(&self) -> Option<&StarId> {
        self.route_list.last()
    }

    /// Consecutive waypoint pairs in insertion order
    pub fn segments(&self) -> Vec<(Vec3, Vec3)> {
        self.waypoints.windows(2).map(|w| (w[0], w[1])).collect()
    }
}

/// A candidate link between two visible stars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitRoute {
    pub source: StarId,
    pub target: StarId,
    pub source_name: String,
    pub target_name: String,
    pub source_endpoint: Vec3,
    pub target_endpoint: Vec3,
    pub distance: f64,
    pub color: Color,
    pub line_weight: f64,
}

impl TransitRoute {
    /// Dedupe key, canonical on the id pair
    pub fn key(&self) -> String {
        transit_key(&self.source, &self.target)
    }

    /// Text for the length label drawn at the transit midpoint
    pub fn length_label(&self) -> String {
        format!("{:.2}ly", self.distance)
    }

    pub fn hover_text(&self) -> String {
        format!(
            "transit: {} <--> {} is {:.2}ly",
            self.source_name, self.target_name, self.distance
        )
    }

    pub fn touches(&self, id: &StarId) -> bool {
        &self.source == id || &self.target == id
    }

    /// The endpoint that is not `id`, if `id` is one of the endpoints
    pub fn other_end(&self, id: &StarId) -> Option<&StarId> {
        if &self.source == id {
            Some(&self.target)
        } else if &self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

pub fn transit_key(a: &StarId, b: &StarId) -> String {
    if a <= b {
        format!("{},{}", a, b)
    } else {
        format!("{},{}", b, a)
    }
}

/// One entry of an input catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogObject {
    pub id: StarId,
    pub name: String,
    pub coordinates: Vec3,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub spectral_class: Option<String>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub notes: String,
}

/// A dataset of stellar objects loaded from YAML or JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub dataset: String,
    #[serde(default)]
    pub center: Option<String>,
    pub objects: Vec<CatalogObject>,
}

impl Catalog {
    /// Load a catalog, picking the format from the file extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let catalog: Catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        tracing::debug!("Loaded catalog '{}' with {} objects", catalog.dataset, catalog.objects.len());
        Ok(catalog)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&CatalogObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Position the plot is centered on: the named center star, else the origin
    pub fn center_coordinates(&self) -> Vec3 {
        self.center
            .as_deref()
            .and_then(|name| self.find_by_name(name))
            .map(|o| o.coordinates)
            .unwrap_or([0.0, 0.0, 0.0])
    }
}
