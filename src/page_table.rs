//! Two-level, per-process page table with a CLOCK-driven replacement path.

use std::collections::HashMap;

use crate::clock::ClockRing;
use crate::geometry::{AddressGeometry, Pfn, Vpn};
use crate::pte::PageTableEntry;

/// Fixed per-entry size used only for the reported memory-usage statistics
/// used only for the reported memory-usage statistics; never enforced
/// against any real allocation.
const PTE_SIZE_BYTES: u64 = 8;
const L1_SLOT_SIZE_BYTES: u64 = 8;

#[derive(Debug)]
pub struct PageTable {
    geometry: AddressGeometry,
    l1: HashMap<u32, HashMap<u32, PageTableEntry>>,
    clock: ClockRing,
}

impl PageTable {
    pub fn new(geometry: AddressGeometry) -> Self {
        Self {
            geometry,
            l1: HashMap::new(),
            clock: ClockRing::new(),
        }
    }

    pub fn is_valid_range(&self, vpn: Vpn) -> bool {
        self.geometry.is_valid_vpn(vpn)
    }

    /// Immutable borrow of the PTE at `vpn`, regardless of validity. Used by
    /// the CLOCK ring, which may legitimately need to see an invalid entry
    /// left behind mid-replacement.
    pub(crate) fn pte_ref(&self, vpn: Vpn) -> Option<&PageTableEntry> {
        let (l1, l2) = self.geometry.l1_l2(vpn);
        self.l1.get(&l1)?.get(&l2)
    }

    pub(crate) fn pte_mut(&mut self, vpn: Vpn) -> Option<&mut PageTableEntry> {
        let (l1, l2) = self.geometry.l1_l2(vpn);
        self.l1.get_mut(&l1)?.get_mut(&l2)
    }

    /// Mutable borrow of a *valid* PTE only.
    pub fn entry(&mut self, vpn: Vpn) -> Option<&mut PageTableEntry> {
        let pte = self.pte_mut(vpn)?;
        pte.valid.then_some(pte)
    }

    /// Looks up `vpn`, bumping its reference counter and re-registering it
    /// with CLOCK on a hit (idempotent). Returns `None` on any miss,
    /// including out-of-range VPNs.
    pub fn lookup(&mut self, vpn: Vpn) -> Option<Pfn> {
        if !self.is_valid_range(vpn) {
            log::warn!("page table lookup: VPN {vpn} is out of range");
            return None;
        }
        let frame = {
            let pte = self.pte_mut(vpn)?;
            if !pte.valid {
                return None;
            }
            pte.reference_inc();
            pte.frame
        }?;
        self.clock.add(vpn);
        log::debug!("page table lookup: VPN {vpn} -> PFN {frame}");
        Some(frame)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        vpn: Vpn,
        frame: Pfn,
        valid: bool,
        dirty: bool,
        read: bool,
        write: bool,
        execute: bool,
        reference: u8,
    ) {
        if !self.is_valid_range(vpn) {
            log::warn!("page table update: VPN {vpn} is out of range, ignoring");
            return;
        }
        let (l1, l2) = self.geometry.l1_l2(vpn);
        let sub = self.l1.entry(l1).or_default();
        let pte = sub.entry(l2).or_default();
        pte.frame = Some(frame);
        pte.valid = valid;
        pte.dirty = dirty;
        pte.read = read;
        pte.write = write;
        pte.execute = execute;
        pte.reference = reference.min(crate::pte::MAX_REFERENCE);
        log::debug!("page table update: VPN {vpn} -> PFN {frame} (valid={valid}, dirty={dirty})");

        if valid {
            self.clock.add(vpn);
        } else {
            self.clock.remove(vpn);
        }
    }

    /// Removes the PTE at `vpn`, pruning an emptied L2 sub-map, and returns
    /// the frame it held (if any).
    pub fn remove(&mut self, vpn: Vpn) -> Option<Pfn> {
        let (l1, l2) = self.geometry.l1_l2(vpn);
        let frame = {
            let sub = self.l1.get_mut(&l1)?;
            let pte = sub.remove(&l2)?;
            if sub.is_empty() {
                self.l1.remove(&l1);
            }
            pte.frame
        };
        self.clock.remove(vpn);
        frame
    }

    /// Drives CLOCK replacement to make room for `new_vpn`. Returns `false`
    /// only when CLOCK has no candidate at all (an empty ring).
    pub fn replace_using_clock(&mut self, new_vpn: Vpn) -> bool {
        loop {
            // Detach the ring so `select_victim` can borrow `self` (the
            // page table it victimizes) without conflicting with the
            // `self.clock` borrow — see DESIGN.md's CLOCK/PT note.
            let mut clock = std::mem::take(&mut self.clock);
            let victim = clock.select_victim(self);
            self.clock = clock;

            let Some(victim_vpn) = victim else {
                return false;
            };

            match self.pte_ref(victim_vpn) {
                Some(pte) if pte.valid => {
                    let old_frame = pte.frame.expect("valid PTE always carries a frame");
                    if pte.dirty {
                        println!("Writing frame {old_frame} back to disk");
                    }
                    log::info!(
                        "CLOCK replacement: evicting VPN {victim_vpn} (frame {old_frame}) to install VPN {new_vpn}"
                    );
                    self.remove(victim_vpn);
                    self.update(new_vpn, old_frame, true, false, true, true, true, 0);
                    return true;
                }
                _ => {
                    // Stale ring entry: present-but-invalid, or vanished
                    // between select_victim's own check and here. Drop it
                    // and ask CLOCK again.
                    self.clock.remove(victim_vpn);
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.l1.clear();
        self.clock.reset();
    }

    /// Total number of stored (L1, L2) entries, valid or not.
    pub fn allocated_entries(&self) -> u64 {
        self.l1.values().map(|sub| sub.len() as u64).sum()
    }

    /// Illustrative memory footprint of the two-level table as actually
    /// populated (fixed per-entry constants, not an enforced budget).
    pub fn total_memory_usage(&self) -> u64 {
        self.l1.len() as u64 * L1_SLOT_SIZE_BYTES + self.allocated_entries() * PTE_SIZE_BYTES
    }

    /// Illustrative footprint a flat, single-level table covering the whole
    /// address space would cost, for comparison against `total_memory_usage`.
    pub fn single_level_memory_usage(&self) -> u64 {
        self.geometry.address_space_pages * PTE_SIZE_BYTES
    }

    #[cfg(test)]
    pub(crate) fn clock_vpns(&self) -> Vec<Vpn> {
        self.clock.vpns().to_vec()
    }
}
