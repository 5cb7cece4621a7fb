use std::iter::StepBy;
use std::ops::Range;

use crate::config::Partitioning;

/// Indices of the key set assigned to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shard {
    Contiguous { start: usize, end: usize },
    Striped { offset: usize, step: usize },
}

impl Shard {
    pub fn indices(&self, total: usize) -> StepBy<Range<usize>> {
        match *self {
            Shard::Contiguous { start, end } => (start.min(total)..end.min(total)).step_by(1),
            Shard::Striped { offset, step } => (offset.min(total)..total).step_by(step.max(1)),
        }
    }

    pub fn len(&self, total: usize) -> usize {
        self.indices(total).len()
    }

    pub fn is_empty(&self, total: usize) -> bool {
        self.len(total) == 0
    }
}

/// Split `total` keys into `workers` disjoint shards covering every index.
///
/// Zero workers yields no shards.
pub fn partition(total: usize, workers: usize, policy: Partitioning) -> Vec<Shard> {
    if workers == 0 {
        return Vec::new();
    }

    match policy {
        Partitioning::Contiguous => {
            let base = total / workers;
            let extra = total % workers;
            let mut start = 0;
            (0..workers)
                .map(|worker| {
                    let len = base + usize::from(worker < extra);
                    let shard = Shard::Contiguous {
                        start,
                        end: start + len,
                    };
                    start += len;
                    shard
                })
                .collect()
        }
        Partitioning::Striped => (0..workers)
            .map(|offset| Shard::Striped {
                offset,
                step: workers,
            })
            .collect(),
    }
}
