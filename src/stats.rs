//! Per-process access counters and the hit-rate metrics derived from them.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Stats {
    pub accesses: u64,
    pub tlb_hits: u64,
    pub tlb_misses: u64,
    pub pt_hits: u64,
    pub pt_misses: u64,
}

impl Stats {
    pub fn tlb_hit_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.tlb_hits as f64 / self.accesses as f64
        }
    }

    pub fn pt_hit_rate(&self) -> f64 {
        if self.tlb_misses == 0 {
            0.0
        } else {
            self.pt_hits as f64 / self.tlb_misses as f64
        }
    }
}

/// A process's stats plus its identity, the shape reported at the end of a
/// run (the final per-process statistics block, and the `--json-stats`
/// equivalent).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProcessReport {
    pub pid: u32,
    pub accesses: u64,
    pub tlb_hits: u64,
    pub tlb_misses: u64,
    pub pt_hits: u64,
    pub pt_misses: u64,
    pub tlb_hit_rate: f64,
    pub pt_hit_rate: f64,
}

impl ProcessReport {
    pub fn new(pid: u32, stats: &Stats) -> Self {
        Self {
            pid,
            accesses: stats.accesses,
            tlb_hits: stats.tlb_hits,
            tlb_misses: stats.tlb_misses,
            pt_hits: stats.pt_hits,
            pt_misses: stats.pt_misses,
            tlb_hit_rate: stats.tlb_hit_rate(),
            pt_hit_rate: stats.pt_hit_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_are_zero_with_no_activity() {
        let stats = Stats::default();
        assert_eq!(stats.tlb_hit_rate(), 0.0);
        assert_eq!(stats.pt_hit_rate(), 0.0);
    }

    #[test]
    fn rates_compute_from_counters() {
        let stats = Stats {
            accesses: 4,
            tlb_hits: 1,
            tlb_misses: 3,
            pt_hits: 2,
            pt_misses: 1,
        };
        assert_eq!(stats.tlb_hit_rate(), 0.25);
        assert!((stats.pt_hit_rate() - (2.0 / 3.0)).abs() < 1e-9);
    }
}
