use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub(crate) slot: usize,
    pub(crate) start_us: i64,
    pub(crate) end_us: i64,
}

/// Messages must be fed in ascending time order. When every row is busy, the message
/// waits for the row that frees up first instead of being dropped.
pub struct SlotAllocator {
    expires: Vec<Option<i64>>,
    display_us: i64,
}

impl SlotAllocator {
    pub fn new(slot_count: usize, display_us: i64) -> Self {
        assert!(slot_count > 0, "at least one row is required");
        SlotAllocator {
            expires: vec![None; slot_count],
            display_us,
        }
    }

    pub fn place(&mut self, time_us: i64) -> Placement {
        self.release_expired(time_us);

        let (slot, start_us) = match self.expires.iter().position(Option::is_none) {
            Some(slot) => (slot, time_us),
            None => {
                let (slot, expires_at) = self.earliest_expiring();
                debug!(
                    "All {} rows busy at {}us, deferring to row {} at {}us",
                    self.expires.len(),
                    time_us,
                    slot,
                    expires_at
                );
                (slot, expires_at)
            }
        };

        let end_us = start_us.saturating_add(self.display_us);
        self.expires[slot] = Some(end_us);
        Placement {
            slot,
            start_us,
            end_us,
        }
    }

    fn release_expired(&mut self, now_us: i64) {
        for expires in self.expires.iter_mut() {
            if matches!(*expires, Some(at) if at <= now_us) {
                *expires = None;
            }
        }
    }

    // Ties go to the lowest row.
    fn earliest_expiring(&self) -> (usize, i64) {
        self.expires
            .iter()
            .enumerate()
            .filter_map(|(slot, expires)| expires.map(|at| (slot, at)))
            .min_by_key(|&(slot, at)| (at, slot))
            .unwrap_or_else(|| unreachable!("Looked for a busy row in an empty table."))
    }
}
