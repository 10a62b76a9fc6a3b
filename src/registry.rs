//! Plot registry - the authoritative set of stars currently on screen
//!
//! Records live in an arena indexed by id, with a name index for path lookups.
//! Renderer handles are stored beside each record for lookup only; the renderer
//! owns the lifecycle of its own nodes.

use std::collections::HashMap;

use crate::config::DrawableBounds;
use crate::error::DrawableRejection;
use crate::model::{StarDisplayRecord, StarId, Vec3};
use crate::renderer::RenderHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub record: StarDisplayRecord,
    pub handle: Option<RenderHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct PlotRegistry {
    drawable: DrawableBounds,
    entries: Vec<RegistryEntry>,
    index: HashMap<StarId, usize>,
    names: HashMap<String, Vec<StarId>>,
    rejections: Vec<DrawableRejection>,
}

impl PlotRegistry {
    pub fn new(drawable: DrawableBounds) -> Self {
        Self {
            drawable,
            ..Self::default()
        }
    }

    pub fn drawable(&self) -> &DrawableBounds {
        &self.drawable
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &StarId) -> bool {
        self.index.contains_key(id)
    }

    /// Insert or overwrite by id. Stars outside the drawable box are refused,
    /// logged and kept in the rejection log; the caller's batch goes on.
    pub fn upsert(&mut self, record: StarDisplayRecord) -> Result<(), DrawableRejection> {
        if !self.drawable.contains(record.actual_coordinates) {
            let rejection = DrawableRejection {
                id: record.id.clone(),
                name: record.name.clone(),
                coordinates: record.actual_coordinates,
                min: self.drawable.min,
                max: self.drawable.max,
            };
            tracing::warn!("star record is not drawable: {}", rejection);
            self.rejections.push(rejection.clone());
            return Err(rejection);
        }

        let existing = self.index.get(&record.id).copied();
        match existing {
            Some(slot) => {
                let old_name = self.entries[slot].record.name.clone();
                self.forget_name(&old_name, &record.id);
                self.remember_name(&record.name, &record.id);
                tracing::debug!("Updated star '{}' ({})", record.name, record.id);
                self.entries[slot].record = record;
            }
            None => {
                self.remember_name(&record.name, &record.id);
                self.index.insert(record.id.clone(), self.entries.len());
                tracing::debug!("Registered star '{}' ({})", record.name, record.id);
                self.entries.push(RegistryEntry { record, handle: None });
            }
        }
        Ok(())
    }

    /// Remove one star; returns its record if it was present
    pub fn remove(&mut self, id: &StarId) -> Option<StarDisplayRecord> {
        let slot = self.index.remove(id)?;
        let entry = self.entries.swap_remove(slot);
        if let Some(moved) = self.entries.get(slot) {
            self.index.insert(moved.record.id.clone(), slot);
        }
        self.forget_name(&entry.record.name, id);
        tracing::debug!("Removed star '{}' ({})", entry.record.name, id);
        Some(entry.record)
    }

    /// Drop every record and renderer handle
    pub fn clear(&mut self) {
        tracing::debug!("Clearing {} registered stars", self.entries.len());
        self.entries.clear();
        self.index.clear();
        self.names.clear();
    }

    pub fn find(&self, id: &StarId) -> Option<&StarDisplayRecord> {
        self.index.get(id).map(|&slot| &self.entries[slot].record)
    }

    /// Case-sensitive exact name match. With duplicate names the most
    /// recently registered star wins.
    pub fn find_by_name(&self, name: &str) -> Option<&StarDisplayRecord> {
        self.names
            .get(name)
            .and_then(|ids| ids.last())
            .and_then(|id| self.find(id))
    }

    /// Copies of all records sorted by name (ties broken by id)
    pub fn snapshot(&self) -> Vec<StarDisplayRecord> {
        let mut records: Vec<StarDisplayRecord> =
            self.entries.iter().map(|e| e.record.clone()).collect();
        records.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        records
    }

    /// Borrowing iteration in registration order
    pub fn records(&self) -> impl Iterator<Item = &StarDisplayRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn handle(&self, id: &StarId) -> Option<RenderHandle> {
        self.index.get(id).and_then(|&slot| self.entries[slot].handle)
    }

    pub fn attach_handle(&mut self, id: &StarId, handle: RenderHandle) -> bool {
        match self.index.get(id) {
            Some(&slot) => {
                self.entries[slot].handle = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Forget all renderer handles after the renderer cleared its nodes
    pub fn detach_handles(&mut self) {
        for entry in &mut self.entries {
            entry.handle = None;
        }
    }

    pub fn set_notes(&mut self, id: &StarId, notes: &str) -> Option<&StarDisplayRecord> {
        let slot = *self.index.get(id)?;
        self.entries[slot].record.notes = notes.to_string();
        Some(&self.entries[slot].record)
    }

    /// Update derived plot-space coordinates after a rescale
    pub fn set_plot_coordinates(&mut self, id: &StarId, coordinates: Vec3) -> bool {
        match self.index.get(id) {
            Some(&slot) => {
                self.entries[slot].record.coordinates = coordinates;
                true
            }
            None => false,
        }
    }

    pub fn rejections(&self) -> &[DrawableRejection] {
        &self.rejections
    }

    pub fn clear_rejections(&mut self) {
        self.rejections.clear();
    }

    fn remember_name(&mut self, name: &str, id: &StarId) {
        self.names.entry(name.to_string()).or_default().push(id.clone());
    }

    fn forget_name(&mut self, name: &str, id: &StarId) {
        if let Some(ids) = self.names.get_mut(name) {
            ids.retain(|other| other != id);
            if ids.is_empty() {
                self.names.remove(name);
            }
        }
    }
}
