//! Line-lease allocator (C5): assigns lyric lines to one of a handful of
//! on-screen row positions, keeping a blank buffer row between the
//! newest and oldest live line.

const DEFAULT_POOL_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveLease {
    line_id: u64,
    start_ms: i64,
    end_ms: i64,
}

/// A pool of abstract Y positions, leased out to lines by time range.
pub struct LineLeaseAllocator {
    pool_size: usize,
    /// `leases[i]` is the lease currently occupying pool slot `i`, if any.
    leases: Vec<Option<ActiveLease>>,
    cursor: usize,
    buffer: usize,
}

impl Default for LineLeaseAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl LineLeaseAllocator {
    #[must_use]
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size >= 2, "pool must hold at least one line and one buffer slot");
        Self {
            pool_size,
            leases: vec![None; pool_size],
            cursor: 0,
            buffer: pool_size - 1,
        }
    }

    /// The normalized (0-1000) Y coordinate of pool slot `index`.
    #[must_use]
    pub fn position_for_slot(&self, index: usize) -> u32 {
        let step = 1000 / u32::try_from(self.pool_size).unwrap_or(1);
        step * u32::try_from(index).unwrap_or(0) + step / 2
    }

    fn expire(&mut self, start_ms: i64) {
        for slot in &mut self.leases {
            if let Some(lease) = slot {
                if lease.end_ms < start_ms {
                    *slot = None;
                }
            }
        }
    }

    fn conflicts(&self, index: usize, start_ms: i64, end_ms: i64) -> bool {
        self.leases[index].is_some_and(|lease| lease.start_ms < end_ms && start_ms < lease.end_ms)
    }

    fn advance_past(&mut self, index: usize) {
        self.buffer = (index + 1) % self.pool_size;
        self.cursor = (index + 1) % self.pool_size;
    }

    /// Leases one Y position for `line_id` over `[start_ms, end_ms)`.
    pub fn lease(&mut self, line_id: u64, start_ms: i64, end_ms: i64) -> u32 {
        self.expire(start_ms);

        for offset in 0..self.pool_size {
            let index = (self.cursor + offset) % self.pool_size;
            if index == self.buffer {
                continue;
            }
            if !self.conflicts(index, start_ms, end_ms) {
                self.leases[index] = Some(ActiveLease { line_id, start_ms, end_ms });
                self.advance_past(index);
                return self.position_for_slot(index);
            }
        }

        let index = self.cursor;
        self.leases[index] = Some(ActiveLease { line_id, start_ms, end_ms });
        self.advance_past(index);
        self.position_for_slot(index)
    }

    /// Leases `group_size` contiguous, non-conflicting, non-buffer pool
    /// positions for a single multi-line block (e.g. duet lyrics).
    pub fn lease_group(&mut self, line_id: u64, start_ms: i64, end_ms: i64, group_size: usize) -> Vec<u32> {
        if group_size <= 1 {
            return vec![self.lease(line_id, start_ms, end_ms)];
        }

        self.expire(start_ms);

        'search: for offset in 0..self.pool_size {
            let base = (self.cursor + offset) % self.pool_size;
            let mut indices = Vec::with_capacity(group_size);
            for step in 0..group_size {
                let index = (base + step) % self.pool_size;
                if index == self.buffer || self.conflicts(index, start_ms, end_ms) {
                    continue 'search;
                }
                indices.push(index);
            }

            for &index in &indices {
                self.leases[index] = Some(ActiveLease { line_id, start_ms, end_ms });
            }
            let last = *indices.last().unwrap();
            self.advance_past(last);
            return indices.into_iter().map(|i| self.position_for_slot(i)).collect();
        }

        // Exhausted: fall back to the cursor position, overlap permitted.
        vec![self.lease(line_id, start_ms, end_ms)]
    }

    /// True iff no two currently-active leases occupy the same slot
    /// (always true by construction; exposed for property tests).
    #[must_use]
    pub fn no_position_conflicts_at(&self, time_ms: i64) -> bool {
        let mut seen = Vec::new();
        for slot in self.leases.iter().flatten() {
            if slot.start_ms <= time_ms && time_ms < slot.end_ms {
                if seen.contains(&slot.start_ms) {
                    return false;
                }
                seen.push(slot.start_ms);
            }
        }
        true
    }
}
