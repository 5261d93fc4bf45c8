//! A process: its private page table, the frames it owns but hasn't yet
//! mapped, and its access statistics.

use std::collections::VecDeque;

use crate::geometry::{AddressGeometry, Pfn};
use crate::page_table::PageTable;
use crate::stats::Stats;

/// Number of frames identity-mapped at process construction.
pub const DEFAULT_PREALLOCATED_FRAMES: u32 = 8;

#[derive(Debug)]
pub struct Process {
    pub id: u32,
    pub page_table: PageTable,
    pub max_frames: u32,
    available_frames: VecDeque<Pfn>,
    allocated_frames: u32,
    pub stats: Stats,
}

impl Process {
    pub fn new(id: u32, max_frames: u32, geometry: AddressGeometry) -> Self {
        Self {
            id,
            page_table: PageTable::new(geometry),
            max_frames,
            available_frames: VecDeque::new(),
            allocated_frames: 0,
            stats: Stats::default(),
        }
    }

    pub fn allocated_frames(&self) -> u32 {
        self.allocated_frames
    }

    pub fn allocation_quota(&self) -> u32 {
        self.max_frames.saturating_sub(self.allocated_frames)
    }

    /// Pops a frame this process already owns but hasn't mapped yet. Does
    /// not change `allocated_frames`: the frame was already charged against
    /// quota the moment it was granted.
    pub fn take_frame(&mut self) -> Option<Pfn> {
        self.available_frames.pop_front()
    }

    pub fn return_frame(&mut self, pfn: Pfn) {
        self.available_frames.push_back(pfn);
    }

    /// Grants newly-acquired frames to the process, charging them against
    /// its quota. Callers are responsible for checking `allocation_quota`
    /// beforehand; this never itself rejects frames.
    pub fn allocate_memory(&mut self, frames: impl IntoIterator<Item = Pfn>) {
        let mut granted = 0u32;
        for frame in frames {
            self.available_frames.push_back(frame);
            granted += 1;
        }
        self.allocated_frames += granted;
    }

    /// Records that one frame this process owned has been released back to
    /// the physical frame manager. Replacement (`replace_using_clock`)
    /// reuses a frame the process already owns without going through this
    /// path, and never touches this counter.
    pub fn free_memory(&mut self) {
        self.allocated_frames = self.allocated_frames.saturating_sub(1);
    }

    /// Identity-maps `0..frames.len()` to `frames`, charging them all
    /// against quota immediately.
    pub(crate) fn install_identity_mapping(&mut self, frames: &[Pfn]) {
        for (vpn, &frame) in frames.iter().enumerate() {
            self.page_table
                .update(vpn as u32, frame, true, false, true, true, true, 0);
        }
        self.allocated_frames += frames.len() as u32;
    }
}
