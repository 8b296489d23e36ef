use crate::error::{BulkDeleteError, Result};
use std::sync::Arc;

/// Opaque remote record identifier
pub type RecordId = String;

/// A contiguous slice of the enumerated ids, processed by exactly one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    index: usize,
    ids: Arc<[RecordId]>,
}

impl Batch {
    /// Zero-based position of this batch in its plan
    pub fn index(&self) -> usize {
        self.index
    }

    /// Record ids assigned to this batch, in enumeration order
    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    /// Shared handle to the ids, for jobs that outlive the borrow of the plan
    pub fn shared_ids(&self) -> Arc<[RecordId]> {
        Arc::clone(&self.ids)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Ordered, non-overlapping partition of an id set into batches of at most
/// `batch_size` records. Only the last batch may be smaller. Created once per
/// run and never mutated.
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    batches: Vec<Batch>,
    batch_size: usize,
    total_records: usize,
}

impl BatchPlan {
    /// Partition `ids` into contiguous chunks.
    ///
    /// Deterministic: the same input always yields the same boundaries.
    /// An empty input yields an empty plan.
    pub fn partition(ids: &[RecordId], batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(BulkDeleteError::validation("batch_size must be greater than zero"));
        }

        let batches = ids
            .chunks(batch_size)
            .enumerate()
            .map(|(index, chunk)| Batch {
                index,
                ids: Arc::from(chunk),
            })
            .collect();

        Ok(Self {
            batches,
            batch_size,
            total_records: ids.len(),
        })
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn get(&self, index: usize) -> Option<&Batch> {
        self.batches.get(index)
    }

    /// Number of batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }
}
