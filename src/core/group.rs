use crate::core::registry::ItemId;
use std::collections::TryReserveError;
use thiserror::Error;

/// Slots added at once when an empty group first grows.
pub const GROW_STEP: usize = 10;

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("Out of memory growing group #{number}: {source}")]
    Alloc {
        number: usize,
        #[source]
        source: TryReserveError,
    },
}

/// A set of item ids judged similar to each other.
///
/// Members keep first-insertion order. Groups hold ids only, the paths stay
/// in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    number: usize,
    ids: Vec<ItemId>,
}

impl Group {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ids: Vec::new(),
        }
    }

    pub fn with_capacity(number: usize, capacity: usize) -> Result<Self, GroupError> {
        let mut group = Self::new(number);
        if capacity > 0 {
            group
                .ids
                .try_reserve_exact(capacity)
                .map_err(|source| GroupError::Alloc { number, source })?;
        }
        Ok(group)
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ids.capacity()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    /// Add `id` unless it is already a member.
    ///
    /// Returns `true` when the id was inserted. Groups stay small, so the
    /// membership check is a plain scan.
    pub fn append(&mut self, id: ItemId) -> Result<bool, GroupError> {
        if self.contains(id) {
            return Ok(false);
        }

        if self.ids.len() == self.ids.capacity() {
            let capacity = self.ids.capacity();
            let target = if capacity == 0 {
                GROW_STEP
            } else {
                capacity * 2
            };
            self.ids
                .try_reserve_exact(target - self.ids.len())
                .map_err(|source| GroupError::Alloc {
                    number: self.number,
                    source,
                })?;
        }

        self.ids.push(id);
        Ok(true)
    }

    pub fn release(&mut self) {
        self.ids = Vec::new();
    }
}
