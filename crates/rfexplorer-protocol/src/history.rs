//! Recent-sweep history and per-bin peak hold.

use std::collections::VecDeque;

use rfexplorer_core::SweepFrame;

/// Default number of sweeps kept in [`SweepHistory`].
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Level every peak-hold bin starts from, in dBm.
pub const PEAK_HOLD_FLOOR_DBM: f32 = -120.0;

/// Bounded ring of the most recent sweeps, oldest first.
#[derive(Debug, Clone)]
pub struct SweepHistory {
    frames: VecDeque<SweepFrame>,
    depth: usize,
}

impl SweepHistory {
    /// Create an empty history holding at most `depth` sweeps.
    pub fn new(depth: usize) -> Self {
        SweepHistory {
            frames: VecDeque::with_capacity(depth),
            depth,
        }
    }

    /// Add a sweep, evicting the oldest when full.
    pub fn push(&mut self, frame: SweepFrame) {
        if self.depth == 0 {
            return;
        }
        while self.frames.len() >= self.depth {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SweepFrame> + ExactSizeIterator {
        self.frames.iter()
    }

    /// The newest sweep, if any.
    pub fn latest(&self) -> Option<&SweepFrame> {
        self.frames.back()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Maximum number of sweeps kept.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl Default for SweepHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

/// Per-bin running maximum since the last reset.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakHold {
    levels: Vec<f32>,
}

impl PeakHold {
    /// Create a peak hold with `points` bins at the floor.
    pub fn new(points: usize) -> Self {
        PeakHold {
            levels: vec![PEAK_HOLD_FLOOR_DBM; points],
        }
    }

    /// Fold a sweep into the running maximum.
    ///
    /// A sweep with a different bin count resizes the hold and starts over.
    pub fn update(&mut self, readings: &[f32]) {
        if readings.len() != self.levels.len() {
            self.levels = vec![PEAK_HOLD_FLOOR_DBM; readings.len()];
        }
        for (held, &level) in self.levels.iter_mut().zip(readings) {
            if level > *held {
                *held = level;
            }
        }
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    /// Drop every bin back to the floor.
    pub fn reset(&mut self) {
        self.levels.fill(PEAK_HOLD_FLOOR_DBM);
    }
}
