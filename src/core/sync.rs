//! Bin synchronization of time-stamped topic sequences.
//!
//! Every sequence is packed onto one fixed-width time grid starting at the
//! union time bound. A grid bin is valid when every sequence has a sample in
//! it; leading and trailing invalid bins are trimmed, an interior invalid
//! bin is an error (the sampling frequency is too high for the data).

use crate::domain::model::TimeStampedSequence;
use crate::utils::error::{EtlError, Result};

/// Earliest first-timestamp and latest last-timestamp across all sequences.
pub fn union_time_bound<T>(seqs: &[TimeStampedSequence<T>]) -> Result<(f64, f64)> {
    let mut bounds = Vec::with_capacity(seqs.len());
    for seq in seqs {
        bounds.push(seq.time_bound().ok_or_else(|| EtlError::ProcessingError {
            message: format!("topic '{}' has an empty sequence", seq.topic_name),
        })?);
    }
    let t_start = bounds
        .iter()
        .map(|b| b.0)
        .min_by(f64::total_cmp)
        .ok_or_else(|| EtlError::ProcessingError {
            message: "cannot synchronize an empty sequence list".to_string(),
        })?;
    let t_end = bounds
        .iter()
        .map(|b| b.1)
        .max_by(f64::total_cmp)
        .expect("non-empty checked above");
    Ok((t_start, t_end))
}

/// Number of grid bins covering `[t_start, t_end]` with width `period`.
pub fn bin_count(t_start: f64, t_end: f64, period: f64) -> usize {
    ((t_end - t_start) / period) as usize + 2
}

/// Map each sample to its grid bin. Later samples win a contested bin.
pub fn pack_to_bins<T>(
    seq: &TimeStampedSequence<T>,
    t_start: f64,
    period: f64,
    n_bins: usize,
) -> Vec<Option<usize>> {
    let mut bins = vec![None; n_bins];
    for (seq_idx, &t) in seq.time_list.iter().enumerate() {
        let bin_idx = ((t - t_start) / period).floor() as i64;
        if (0..n_bins as i64).contains(&bin_idx) {
            bins[bin_idx as usize] = Some(seq_idx);
        }
    }
    bins
}

/// Align pre-binned sequences onto the shared grid.
///
/// `tables` is one bin row per sequence (see [`pack_to_bins`]); interpolation
/// may have filled holes in the rows beforehand. Output sequences all share
/// the surviving bins' center times.
pub fn synchronize_binned<T: Clone>(
    seqs: &[TimeStampedSequence<T>],
    tables: &[Vec<Option<usize>>],
    t_start: f64,
    period: f64,
) -> Result<Vec<TimeStampedSequence<T>>> {
    debug_assert_eq!(seqs.len(), tables.len());
    let n_bins = tables.first().map_or(0, Vec::len);

    let valid: Vec<bool> = (0..n_bins)
        .map(|bin| tables.iter().all(|row| row[bin].is_some()))
        .collect();

    let first_valid = valid.iter().position(|&v| v);
    let last_valid = valid.iter().rposition(|&v| v);
    let (first_valid, last_valid) = match (first_valid, last_valid) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(EtlError::ProcessingError {
                message: "no grid bin contains a sample from every topic".to_string(),
            })
        }
    };

    if valid[first_valid..=last_valid].iter().any(|&v| !v) {
        return Err(EtlError::ProcessingError {
            message: "synchronized bins have an interior gap; lower the sampling frequency"
                .to_string(),
        });
    }

    let times: Vec<f64> = (first_valid..=last_valid)
        .map(|bin| t_start + period * (bin as f64 + 0.5))
        .collect();

    let mut out = Vec::with_capacity(seqs.len());
    for (seq, row) in seqs.iter().zip(tables) {
        let objects: Vec<T> = (first_valid..=last_valid)
            .map(|bin| seq.object_list[row[bin].expect("valid bin")].clone())
            .collect();
        out.push(TimeStampedSequence {
            topic_name: seq.topic_name.clone(),
            object_list: objects,
            time_list: times.clone(),
        });
    }
    Ok(out)
}

/// Pack and align in one step, without interpolation.
pub fn synchronize<T: Clone>(
    seqs: &[TimeStampedSequence<T>],
    period: f64,
) -> Result<Vec<TimeStampedSequence<T>>> {
    let (t_start, t_end) = union_time_bound(seqs)?;
    let n_bins = bin_count(t_start, t_end, period);
    let tables: Vec<Vec<Option<usize>>> = seqs
        .iter()
        .map(|seq| pack_to_bins(seq, t_start, period, n_bins))
        .collect();
    synchronize_binned(seqs, &tables, t_start, period)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(topic: &str, times: &[f64]) -> TimeStampedSequence<usize> {
        TimeStampedSequence {
            topic_name: topic.to_string(),
            object_list: (0..times.len()).collect(),
            time_list: times.to_vec(),
        }
    }

    #[test]
    fn test_union_time_bound() {
        let seqs = vec![seq("/a", &[1.0, 5.0]), seq("/b", &[0.5, 4.0])];
        assert_eq!(union_time_bound(&seqs).unwrap(), (0.5, 5.0));
    }

    #[test]
    fn test_union_time_bound_rejects_empty_sequence() {
        let seqs = vec![seq("/a", &[1.0]), seq("/b", &[])];
        assert!(union_time_bound(&seqs).is_err());
    }

    #[test]
    fn test_pack_to_bins_last_sample_wins() {
        let s = seq("/a", &[0.1, 0.2, 1.1]);
        let bins = pack_to_bins(&s, 0.0, 1.0, 3);
        assert_eq!(bins, vec![Some(1), Some(2), None]);
    }

    #[test]
    fn test_synchronize_aligned_streams() {
        // Both topics publish once per bin over [0, 3).
        let a = seq("/a", &[0.1, 1.1, 2.1]);
        let b = seq("/b", &[0.2, 1.2, 2.2]);
        let synced = synchronize(&[a, b], 1.0).unwrap();

        assert_eq!(synced.len(), 2);
        assert_eq!(synced[0].len(), 3);
        assert_eq!(synced[0].time_list, synced[1].time_list);
        // Bin centers.
        assert_eq!(synced[0].time_list, vec![0.6, 1.6, 2.6]);
        assert_eq!(synced[0].object_list, vec![0, 1, 2]);
    }

    #[test]
    fn test_synchronize_trims_ragged_edges() {
        // /a starts a bin earlier and /b ends a bin later.
        let a = seq("/a", &[0.5, 1.5, 2.5]);
        let b = seq("/b", &[1.6, 2.6, 3.6]);
        let synced = synchronize(&[a, b], 1.0).unwrap();

        assert_eq!(synced[0].len(), 2);
        assert_eq!(synced[0].object_list, vec![1, 2]);
        assert_eq!(synced[1].object_list, vec![0, 1]);
    }

    #[test]
    fn test_interior_gap_is_an_error() {
        let a = seq("/a", &[0.5, 1.5, 2.5, 3.5]);
        let b = seq("/b", &[0.6, 2.6, 3.6]); // nothing in bin 1
        let err = synchronize(&[a, b], 1.0).unwrap_err();
        assert!(matches!(err, EtlError::ProcessingError { .. }));
    }

    #[test]
    fn test_disjoint_streams_have_no_valid_bin() {
        let a = seq("/a", &[0.5]);
        let b = seq("/b", &[10.5]);
        assert!(synchronize(&[a, b], 1.0).is_err());
    }

    #[test]
    fn test_output_times_strictly_increasing() {
        let a = seq("/a", &[0.1, 0.6, 1.1, 1.6, 2.1]);
        let b = seq("/b", &[0.2, 0.7, 1.2, 1.7, 2.2]);
        let synced = synchronize(&[a, b], 0.5).unwrap();
        let times = &synced[0].time_list;
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }
}
