//! Persistence seam - finished routes and per-object edits
//!
//! - MemoryStore: in-process store, used by tests and dry runs
//! - JsonRouteStore: `<data_dir>/routes.json`, rewritten on every change

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::model::{CatalogObject, RouteDescriptor, StarId};

pub trait Persistence {
    /// Store a finished route under its dataset
    fn add_route_to_dataset(&mut self, dataset: &str, route: &RouteDescriptor) -> Result<()>;

    fn routes(&self, dataset: &str) -> Vec<RouteDescriptor>;

    fn get_object(&self, id: &StarId) -> Option<CatalogObject>;

    fn update_object(&mut self, object: &CatalogObject) -> Result<()>;

    fn remove_object(&mut self, id: &StarId) -> Result<()>;

    fn update_notes(&mut self, id: &StarId, notes: &str) -> Result<()>;
}

/// Everything a store keeps; serialized as-is by JsonRouteStore
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub saved_at: Option<String>,
    #[serde(default)]
    pub routes: BTreeMap<String, Vec<RouteDescriptor>>,
    #[serde(default)]
    pub objects: BTreeMap<StarId, CatalogObject>,
    /// Notes for objects the store has no full copy of
    #[serde(default)]
    pub notes: BTreeMap<StarId, String>,
    #[serde(default)]
    pub removed: BTreeSet<StarId>,
}

impl StoreData {
    fn add_route(&mut self, dataset: &str, route: &RouteDescriptor) {
        self.routes.entry(dataset.to_string()).or_default().push(route.clone());
    }

    fn routes(&self, dataset: &str) -> Vec<RouteDescriptor> {
        self.routes.get(dataset).cloned().unwrap_or_default()
    }

    fn get_object(&self, id: &StarId) -> Option<CatalogObject> {
        if self.removed.contains(id) {
            return None;
        }
        let mut object = self.objects.get(id)?.clone();
        if let Some(notes) = self.notes.get(id) {
            object.notes = notes.clone();
        }
        Some(object)
    }

    fn update_object(&mut self, object: &CatalogObject) {
        self.removed.remove(&object.id);
        self.notes.remove(&object.id);
        self.objects.insert(object.id.clone(), object.clone());
    }

    fn remove_object(&mut self, id: &StarId) {
        self.objects.remove(id);
        self.notes.remove(id);
        self.removed.insert(id.clone());
    }

    fn update_notes(&mut self, id: &StarId, notes: &str) -> Result<()> {
        if self.removed.contains(id) {
            bail!("object {} was removed", id);
        }
        self.notes.insert(id.clone(), notes.to_string());
        Ok(())
    }
}

/// In-memory store; `fail_writes` makes every write fail
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub data: StoreData,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects(objects: impl IntoIterator<Item = CatalogObject>) -> Self {
        let mut store = Self::new();
        for object in objects {
            store.data.objects.insert(object.id.clone(), object);
        }
        store
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            bail!("store is read-only");
        }
        Ok(())
    }
}

impl Persistence for MemoryStore {
    fn add_route_to_dataset(&mut self, dataset: &str, route: &RouteDescriptor) -> Result<()> {
        self.check_writable()?;
        self.data.add_route(dataset, route);
        Ok(())
    }

    fn routes(&self, dataset: &str) -> Vec<RouteDescriptor> {
        self.data.routes(dataset)
    }

    fn get_object(&self, id: &StarId) -> Option<CatalogObject> {
        self.data.get_object(id)
    }

    fn update_object(&mut self, object: &CatalogObject) -> Result<()> {
        self.check_writable()?;
        self.data.update_object(object);
        Ok(())
    }

    fn remove_object(&mut self, id: &StarId) -> Result<()> {
        self.check_writable()?;
        self.data.remove_object(id);
        Ok(())
    }

    fn update_notes(&mut self, id: &StarId, notes: &str) -> Result<()> {
        self.check_writable()?;
        self.data.update_notes(id, notes)
    }
}

/// JSON file store under the data directory
#[derive(Debug, Clone)]
pub struct JsonRouteStore {
    path: PathBuf,
    data: StoreData,
}

impl JsonRouteStore {
    pub const FILE_NAME: &'static str = "routes.json";

    /// Open `<data_dir>/routes.json`, starting empty if it does not exist yet
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let path = data_dir.as_ref().join(Self::FILE_NAME);
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
        } else {
            StoreData::default()
        };
        tracing::debug!(
            "Opened route store {} ({} datasets)",
            path.display(),
            data.routes.len()
        );
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    /// Apply a change and write the file; the in-memory copy only changes if the write succeeds
    fn commit<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut StoreData) -> Result<()>,
    {
        let mut next = self.data.clone();
        change(&mut next)?;
        next.saved_at = Some(chrono::Utc::now().to_rfc3339());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&next)?;
        std::fs::write(&self.path, json).with_context(|| format!("writing {}", self.path.display()))?;

        self.data = next;
        tracing::debug!("Saved {}", self.path.display());
        Ok(())
    }
}

impl Persistence for JsonRouteStore {
    fn add_route_to_dataset(&mut self, dataset: &str, route: &RouteDescriptor) -> Result<()> {
        self.commit(|data| {
            data.add_route(dataset, route);
            Ok(())
        })?;
        tracing::info!("Saved route '{}' to dataset '{}'", route.name, dataset);
        Ok(())
    }

    fn routes(&self, dataset: &str) -> Vec<RouteDescriptor> {
        self.data.routes(dataset)
    }

    fn get_object(&self, id: &StarId) -> Option<CatalogObject> {
        self.data.get_object(id)
    }

    fn update_object(&mut self, object: &CatalogObject) -> Result<()> {
        self.commit(|data| {
            data.update_object(object);
            Ok(())
        })
    }

    fn remove_object(&mut self, id: &StarId) -> Result<()> {
        self.commit(|data| {
            data.remove_object(id);
            Ok(())
        })
    }

    fn update_notes(&mut self, id: &StarId, notes: &str) -> Result<()> {
        self.commit(|data| data.update_notes(id, notes))
    }
}
