use std::collections::BTreeMap;

use crate::error::{FramesiftError, Result};

/// Ordering boundary between the batch-parallel similarity stage and the
/// sequential decision stage.
///
/// Results may be inserted in any order; they leave in ascending frame index
/// order. An index already pending is a duplicate, and an index at or below
/// one already released arrived out of order; both are rejected.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    pending: BTreeMap<usize, T>,
    last_released: Option<usize>,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            last_released: None,
        }
    }

    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        if let Some(last) = self.last_released {
            if index <= last {
                return Err(FramesiftError::OutOfOrder { index, last });
            }
        }
        if self.pending.contains_key(&index) {
            return Err(FramesiftError::DuplicateIndex { index });
        }
        self.pending.insert(index, item);
        Ok(())
    }

    /// Release everything buffered, in index order.
    ///
    /// Call once every result of a batch has been inserted.
    pub fn flush(&mut self) -> Vec<(usize, T)> {
        let drained = std::mem::take(&mut self.pending);
        if let Some((&last, _)) = drained.last_key_value() {
            self.last_released = Some(last);
        }
        drained.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
