//! Filling empty grid bins from nearby samples before synchronization.
//!
//! Cameras and joint-state publishers drift against each other, so a bin can
//! miss a sample that exists just outside it. Interpolation assigns such a
//! bin the nearest sample in time, within a bounded tolerance, instead of
//! failing the whole episode.

use crate::domain::model::TimeStampedSequence;

pub trait Interpolator: Send + Sync {
    /// Fill `None` entries of `bins` with sample indices where a sample lies
    /// close enough to the bin center. Existing entries are never replaced.
    fn fill_bins<T>(
        &self,
        seq: &TimeStampedSequence<T>,
        t_start: f64,
        period: f64,
        bins: &mut [Option<usize>],
    );
}

/// Nearest sample in time, accepted within `tolerance_bins` bin widths.
#[derive(Debug, Clone, Copy)]
pub struct NearestNeighbour {
    pub tolerance_bins: f64,
}

impl Default for NearestNeighbour {
    fn default() -> Self {
        Self {
            tolerance_bins: 1.0,
        }
    }
}

impl NearestNeighbour {
    fn nearest_index(times: &[f64], target: f64) -> Option<usize> {
        if times.is_empty() {
            return None;
        }
        let insert = times.partition_point(|&t| t < target);
        let mut best: Option<usize> = None;
        for candidate in [insert.checked_sub(1), Some(insert)].into_iter().flatten() {
            if candidate >= times.len() {
                continue;
            }
            let better = match best {
                None => true,
                Some(current) => {
                    (times[candidate] - target).abs() < (times[current] - target).abs()
                }
            };
            if better {
                best = Some(candidate);
            }
        }
        best
    }
}

impl Interpolator for NearestNeighbour {
    fn fill_bins<T>(
        &self,
        seq: &TimeStampedSequence<T>,
        t_start: f64,
        period: f64,
        bins: &mut [Option<usize>],
    ) {
        let tolerance = self.tolerance_bins * period;
        for (bin, slot) in bins.iter_mut().enumerate() {
            if slot.is_some() {
                continue;
            }
            let center = t_start + period * (bin as f64 + 0.5);
            if let Some(idx) = Self::nearest_index(&seq.time_list, center) {
                if (seq.time_list[idx] - center).abs() <= tolerance {
                    *slot = Some(idx);
                }
            }
        }
    }
}

/// Apply one interpolator uniformly to every topic's bin row.
#[derive(Debug, Clone, Copy)]
pub struct AllSameRule<I: Interpolator> {
    interpolator: I,
}

impl<I: Interpolator> AllSameRule<I> {
    pub fn new(interpolator: I) -> Self {
        Self { interpolator }
    }

    pub fn apply<T>(
        &self,
        seqs: &[TimeStampedSequence<T>],
        t_start: f64,
        period: f64,
        tables: &mut [Vec<Option<usize>>],
    ) {
        for (seq, row) in seqs.iter().zip(tables.iter_mut()) {
            self.interpolator.fill_bins(seq, t_start, period, row);
        }
    }
}
