//! Translation lookaside buffer: a small, process-agnostic VPN→PFN cache
//! with LRU eviction, flushed wholesale on every context switch.

use std::collections::HashMap;

use crate::geometry::{Pfn, Vpn};

#[derive(Debug, Clone, Copy)]
struct TlbEntry {
    pfn: Pfn,
    read: bool,
    write: bool,
    execute: bool,
    last_access: u64,
}

#[derive(Debug)]
pub struct Tlb {
    entries: HashMap<Vpn, TlbEntry>,
    capacity: usize,
    tick: u64,
}

impl Tlb {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            tick: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Returns the cached PFN and refreshes its recency tick on a hit. A
    /// zero-capacity TLB never holds entries, so it never hits. A miss does
    /// not advance the tick: only hits and insertions do.
    pub fn lookup(&mut self, vpn: Vpn) -> Option<Pfn> {
        if !self.entries.contains_key(&vpn) {
            return None;
        }
        let tick = self.next_tick();
        let entry = self.entries.get_mut(&vpn)?;
        entry.last_access = tick;
        Some(entry.pfn)
    }

    /// Installs or refreshes a mapping, evicting the least-recently-used
    /// entry first if the TLB is already at capacity. A no-op when
    /// `capacity == 0`.
    pub fn update(&mut self, vpn: Vpn, pfn: Pfn, read: bool, write: bool, execute: bool) {
        if self.capacity == 0 {
            return;
        }
        if !self.entries.contains_key(&vpn) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        let tick = self.next_tick();
        self.entries.insert(
            vpn,
            TlbEntry {
                pfn,
                read,
                write,
                execute,
                last_access: tick,
            },
        );
    }

    fn evict_lru(&mut self) {
        if let Some(&victim) = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_access)
            .map(|(vpn, _)| vpn)
        {
            self.entries.remove(&victim);
        }
    }

    pub fn delete(&mut self, vpn: Vpn) {
        self.entries.remove(&vpn);
    }

    pub fn flush(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_never_hits() {
        let mut tlb = Tlb::new(0);
        tlb.update(1, 1, true, true, true);
        assert_eq!(tlb.lookup(1), None);
        assert!(tlb.is_empty());
    }

    #[test]
    fn miss_does_not_advance_the_tick() {
        let mut tlb = Tlb::new(2);
        let tick_before = tlb.tick;
        assert_eq!(tlb.lookup(99), None);
        assert_eq!(tlb.tick, tick_before);
    }

    #[test]
    fn hit_refreshes_recency() {
        let mut tlb = Tlb::new(2);
        tlb.update(1, 10, true, true, true);
        tlb.update(2, 20, true, true, true);
        // Touch VPN 1 so it becomes the most-recently-used.
        assert_eq!(tlb.lookup(1), Some(10));
        tlb.update(3, 30, true, true, true);
        // VPN 2 should have been evicted, not VPN 1.
        assert_eq!(tlb.lookup(2), None);
        assert_eq!(tlb.lookup(1), Some(10));
        assert_eq!(tlb.lookup(3), Some(30));
    }

    #[test]
    fn delete_removes_single_entry() {
        let mut tlb = Tlb::new(4);
        tlb.update(1, 1, true, true, true);
        tlb.delete(1);
        assert_eq!(tlb.lookup(1), None);
    }

    #[test]
    fn flush_clears_everything_and_is_idempotent() {
        let mut tlb = Tlb::new(4);
        tlb.update(1, 1, true, true, true);
        tlb.update(2, 2, true, true, true);
        tlb.flush();
        assert!(tlb.is_empty());
        tlb.flush();
        assert!(tlb.is_empty());
    }

    #[test]
    fn update_beyond_capacity_keeps_size_bounded() {
        let mut tlb = Tlb::new(2);
        for vpn in 0..10 {
            tlb.update(vpn, vpn, true, true, true);
        }
        assert_eq!(tlb.len(), 2);
    }
}
