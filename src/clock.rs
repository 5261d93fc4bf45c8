//! CLOCK ring: the reference-counter second-chance replacement engine.
//!
//! Kept as a value-type owned by the page table rather than wired back to it
//! (the original C++ forward-declares `PageTable` inside the clock header to
//! avoid a cyclic include; here `select_victim` simply borrows the page
//! table it victimizes for the duration of one call — see
//! `PageTable::replace_using_clock` for how the borrow conflict with
//! `self.clock` is resolved).

use std::collections::HashSet;

use crate::geometry::Vpn;
use crate::page_table::PageTable;

#[derive(Debug, Default)]
pub struct ClockRing {
    ring: Vec<Vpn>,
    members: HashSet<Vpn>,
    hand: Option<usize>,
}

impl ClockRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn contains(&self, vpn: Vpn) -> bool {
        self.members.contains(&vpn)
    }

    /// Snapshot of the ring in hand-relative order, for diagnostics/tests.
    pub fn vpns(&self) -> &[Vpn] {
        &self.ring
    }

    /// Appends `vpn` if it is not already present; idempotent.
    pub fn add(&mut self, vpn: Vpn) {
        if !self.members.insert(vpn) {
            return;
        }
        self.ring.push(vpn);
        if self.ring.len() == 1 {
            self.hand = Some(0);
        }
    }

    /// Removes `vpn` if present, repositioning the hand to its successor.
    pub fn remove(&mut self, vpn: Vpn) {
        let Some(idx) = self.ring.iter().position(|&v| v == vpn) else {
            return;
        };
        self.members.remove(&vpn);
        self.ring.remove(idx);

        if self.ring.is_empty() {
            self.hand = None;
            return;
        }

        if let Some(hand) = self.hand {
            if hand == idx {
                // Elements after `idx` shifted down by one, so `idx` itself
                // now names the successor — unless it ran off the end, in
                // which case the ring wraps to the start.
                self.hand = Some(if idx >= self.ring.len() { 0 } else { idx });
            } else if idx < hand {
                self.hand = Some(hand - 1);
            }
        }
    }

    fn advance(&mut self) {
        if self.ring.is_empty() {
            self.hand = None;
            return;
        }
        self.hand = Some(match self.hand {
            Some(h) => (h + 1) % self.ring.len(),
            None => 0,
        });
    }

    /// Circular scan for a victim VPN with `reference == 0`, aging the whole
    /// ring whenever a full pass finds none. Terminates in at most three
    /// aging passes when every counter starts saturated at 3.
    pub fn select_victim(&mut self, pt: &mut PageTable) -> Option<Vpn> {
        if self.ring.is_empty() {
            return None;
        }

        let mut scanned = 0usize;
        loop {
            let scan_limit = self.ring.len();
            if scan_limit == 0 {
                return None;
            }
            let hand = self.hand.unwrap_or(0);
            let vpn = self.ring[hand];

            match pt.pte_ref(vpn) {
                None => {
                    log::warn!("CLOCK consistency breach: VPN {vpn} has no page table entry, dropping from ring");
                    self.remove(vpn);
                    scanned = 0;
                    continue;
                }
                Some(pte) if pte.reference == 0 => {
                    self.advance();
                    return Some(vpn);
                }
                Some(_) => {
                    self.advance();
                    scanned += 1;
                }
            }

            if scanned >= scan_limit {
                log::debug!(
                    "CLOCK aging pass: no zero-reference victim among {scan_limit} entries, decrementing all counters"
                );
                for &v in &self.ring {
                    if let Some(pte) = pt.pte_mut(v) {
                        pte.reference_dec();
                    }
                }
                scanned = 0;
            }
        }
    }

    pub fn reset(&mut self) {
        self.ring.clear();
        self.members.clear();
        self.hand = None;
    }
}
