//! Discrete cross-correlation of the vision and IMU angle signals
//!
//! For two equally long signals `v` and `u` of length `n`, the correlation at
//! shift `s` is
//!
//! ```text
//! c[s] = Σ_i v[i] · u[i - s],   s ∈ [-(n-1), n-1]
//! ```
//!
//! with out-of-range terms dropped. The peak is picked on the coefficient
//! normalized by the energies of the overlapping parts only, so short
//! overlaps at large `|s|` are not penalized for having fewer terms. Shifts
//! whose overlap is shorter than half the window are not searched. A
//! negative shift means the IMU signal lags the vision signal.

use contracts::TimeAlignmentConfig;

use crate::buffer::CorrelationWindow;

/// Full correlation sequence, index `k` holds shift `k - (n - 1)`.
///
/// Returns an empty vector when the signals are empty or differ in length.
pub fn cross_correlation(vision: &[f64], imu: &[f64]) -> Vec<f64> {
    let n = vision.len();
    if n == 0 || imu.len() != n {
        return Vec::new();
    }
    let n = n as i64;
    (-(n - 1)..n)
        .map(|shift| correlation_at(vision, imu, shift))
        .collect()
}

/// Index range of `vision` that overlaps `imu` shifted by `shift`
fn overlap(len: usize, shift: i64) -> std::ops::Range<i64> {
    let n = len as i64;
    shift.max(0)..(n + shift).min(n)
}

fn correlation_at(vision: &[f64], imu: &[f64], shift: i64) -> f64 {
    overlap(vision.len(), shift)
        .map(|i| vision[i as usize] * imu[(i - shift) as usize])
        .sum()
}

/// Correlation at `shift` divided by the energies of the overlapping parts,
/// 0 when either part is flat at zero.
pub fn overlap_cosine(vision: &[f64], imu: &[f64], shift: i64) -> f64 {
    let (mut cross, mut vision_energy, mut imu_energy) = (0.0, 0.0, 0.0);
    for i in overlap(vision.len(), shift) {
        let (v, u) = (vision[i as usize], imu[(i - shift) as usize]);
        cross += v * u;
        vision_energy += v * v;
        imu_energy += u * u;
    }
    if vision_energy > 0.0 && imu_energy > 0.0 {
        cross / (vision_energy * imu_energy).sqrt()
    } else {
        0.0
    }
}

/// Shortest overlap searched for a window of `len` slots
pub fn minimum_overlap(len: usize) -> usize {
    len.div_ceil(2).max(2).min(len)
}

/// Best correlation in the searched shift range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationPeak {
    /// Slots between the two signals, negative when the IMU lags
    pub shift: i64,
    /// Raw coefficient at `shift`
    pub score: f64,
    /// Overlap-normalized coefficient at `shift`, in [-1, 1]
    pub normalized: f64,
}

/// Locate the normalized correlation maximum. Exact ties go to the smallest
/// `|shift|`.
pub fn find_peak(vision: &[f64], imu: &[f64]) -> Option<CorrelationPeak> {
    let n = vision.len();
    if n == 0 || imu.len() != n {
        return None;
    }
    let reach = (n - minimum_overlap(n)) as i64;

    let (shift, normalized) = (-reach..=reach)
        .map(|shift| (shift, overlap_cosine(vision, imu, shift)))
        .fold(None, |best: Option<(i64, f64)>, (shift, score)| match best {
            Some((best_shift, best_score))
                if score < best_score
                    || (score == best_score && shift.abs() >= best_shift.abs()) =>
            {
                Some((best_shift, best_score))
            }
            _ => Some((shift, score)),
        })?;

    Some(CorrelationPeak {
        shift,
        score: correlation_at(vision, imu, shift),
        normalized,
    })
}

/// Time shift estimate derived from a full window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationEstimate {
    pub peak: CorrelationPeak,
    /// Reported shift in slots
    pub shift_slots: i64,
    /// IMU periods represented by one window slot
    pub ticks_per_slot: i64,
    /// Shift to apply to IMU timestamps (seconds)
    pub imu_time_shift: f64,
}

/// Turns a window into an IMU time shift.
///
/// In IMU-rate mode a slot is one IMU period and the lag adjacent to zero is
/// not admissible: a nonzero peak reports one slot closer to zero. In
/// frame-rate mode a slot is one frame, converted to IMU periods with the
/// window's mean tick count.
#[derive(Debug, Clone, Copy)]
pub struct CrossCorrelationEstimator {
    imu_rate: bool,
    sampling_time_s: f64,
}

impl CrossCorrelationEstimator {
    pub fn new(imu_rate: bool, sampling_time_s: f64) -> Self {
        Self {
            imu_rate,
            sampling_time_s,
        }
    }

    pub fn from_config(config: &TimeAlignmentConfig) -> Self {
        Self::new(
            config.do_imu_rate_time_alignment,
            config.nominal_sampling_time_s,
        )
    }

    pub fn estimate(&self, window: &CorrelationWindow) -> Option<CorrelationEstimate> {
        let peak = find_peak(&window.vision_angles(), &window.imu_angles())?;

        let (shift_slots, ticks_per_slot) = if self.imu_rate {
            (peak.shift - peak.shift.signum(), 1)
        } else {
            (peak.shift, (window.mean_imu_ticks().round() as i64).max(1))
        };

        Some(CorrelationEstimate {
            peak,
            shift_slots,
            ticks_per_slot,
            imu_time_shift: (shift_slots * ticks_per_slot) as f64 * self.sampling_time_s,
        })
    }
}
