use std::collections::TryReserveError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stable 1-based identifier of a scanned item.
pub type ItemId = usize;

/// Slots added at once when an empty registry first grows.
pub const GROW_STEP: usize = 100;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Out of memory growing registry: {0}")]
    Alloc(#[from] TryReserveError),

    #[error("Invalid item id: {id}")]
    InvalidId { id: ItemId },
}

/// Ordered list of scanned item paths.
///
/// Ids are handed out densely starting at 1 and never reused. Deleting an
/// item leaves an empty slot behind (a tombstone) so every other id stays
/// valid; the registry only shrinks when the trailing slot is deleted.
#[derive(Debug, Default)]
pub struct ItemRegistry {
    slots: Vec<Option<PathBuf>>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Create a registry with room for at least `capacity` slots
    pub fn with_capacity(capacity: usize) -> Result<Self, RegistryError> {
        let mut slots = Vec::new();
        if capacity > 0 {
            slots.try_reserve_exact(capacity)?;
        }
        Ok(Self { slots })
    }

    /// Number of logical slots, live or tombstoned.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots that still hold a path
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Path stored under `id`, or `None` when out of range or tombstoned.
    pub fn get(&self, id: ItemId) -> Option<&Path> {
        if id == 0 {
            return None;
        }
        self.slots.get(id - 1)?.as_deref()
    }

    /// Append a path and return its id.
    ///
    /// The path is stored as given, byte for byte, so names that are not
    /// valid UTF-8 survive untouched.
    pub fn append<P: AsRef<Path>>(&mut self, path: P) -> Result<ItemId, RegistryError> {
        let path = owned_path(path.as_ref())?;
        if self.slots.len() == self.slots.capacity() {
            self.grow()?;
        }
        self.slots.push(Some(path));
        Ok(self.slots.len())
    }

    /// Overwrite the slot at `id`, or tombstone it when `path` is `None`.
    ///
    /// Writing past the current size extends the registry; every slot
    /// between the old size and `id` is left empty.
    pub fn set(&mut self, id: ItemId, path: Option<&Path>) -> Result<(), RegistryError> {
        if id == 0 {
            return Err(RegistryError::InvalidId { id });
        }

        if id > self.slots.len() {
            if id > self.slots.capacity() {
                self.slots
                    .try_reserve_exact(id - self.slots.len() + GROW_STEP)?;
            }
            self.slots.resize(id, None);
        }

        let value = path.map(owned_path).transpose()?;
        self.slots[id - 1] = value;
        Ok(())
    }

    /// Tombstone the slot at `id`.
    ///
    /// Out-of-range or already empty ids are ignored. The size drops by one
    /// only when `id` is the trailing slot.
    pub fn delete(&mut self, id: ItemId) {
        if id == 0 || id > self.slots.len() {
            return;
        }
        if self.slots[id - 1].take().is_none() {
            return;
        }
        if id == self.slots.len() {
            self.slots.pop();
        }
    }

    /// Drop every path and the backing storage.
    pub fn release(&mut self) {
        self.slots = Vec::new();
    }

    /// Live `(id, path)` pairs in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Path)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_deref().map(|path| (index + 1, path)))
    }

    fn grow(&mut self) -> Result<(), TryReserveError> {
        let capacity = self.slots.capacity();
        let target = if capacity == 0 {
            GROW_STEP
        } else {
            capacity * 2
        };
        self.slots.try_reserve_exact(target - self.slots.len())
    }
}

fn owned_path(path: &Path) -> Result<PathBuf, TryReserveError> {
    let mut owned = PathBuf::new();
    owned.try_reserve_exact(path.as_os_str().len())?;
    owned.push(path);
    Ok(owned)
}
