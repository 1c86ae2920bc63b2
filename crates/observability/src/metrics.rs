//! 时间对齐运行指标
//!
//! 逐帧结果由 time_aligner 自身通过 `metrics` 宏上报；
//! 这里记录整次运行级别的指标，并在内存中聚合生成摘要。

use std::collections::BTreeMap;

use contracts::AlignmentOutcome;
use metrics::{counter, gauge, histogram};

/// 记录数据集加载规模
pub fn record_dataset_loaded(frames: usize, imu_samples: usize) {
    gauge!("time_alignment_dataset_frames").set(frames as f64);
    gauge!("time_alignment_dataset_imu_samples").set(imu_samples as f64);
}

/// 记录一帧的对齐结果
pub fn record_alignment_outcome(outcome: AlignmentOutcome) {
    counter!("time_alignment_frames_processed_total", "outcome" => outcome.as_str()).increment(1);
}

/// 记录收敛后的时间偏移 (秒) 与相关峰质量
pub fn record_converged_shift(imu_time_shift: f64, peak_quality: f64) {
    gauge!("time_alignment_imu_time_shift_s").set(imu_time_shift);
    gauge!("time_alignment_peak_quality").set(peak_quality);
}

/// 记录一次运行结束
pub fn record_run_finished(converged: bool, frames: u64) {
    let status = if converged { "converged" } else { "not_converged" };
    counter!("time_alignment_runs_total", "status" => status).increment(1);
    histogram!("time_alignment_frames_to_finish").record(frames as f64);
}

/// 时间对齐指标聚合器
///
/// 在内存中聚合逐帧结果，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct AlignmentMetricsAggregator {
    /// 总帧数
    pub total_frames: u64,

    /// 各结果类型计数
    pub outcome_counts: BTreeMap<&'static str, u64>,

    /// 窗口填充率统计
    pub window_fill_stats: RunningStats,

    /// IMU 方差统计 (仅窗口已满的帧)
    pub variance_stats: RunningStats,

    /// 收敛时的帧序号 (从 1 开始)
    pub converged_at_frame: Option<u64>,

    /// 收敛得到的时间偏移 (秒)
    pub imu_time_shift: Option<f64>,

    /// 归一化相关峰值
    pub peak_quality: Option<f64>,
}

impl AlignmentMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一帧的结果
    pub fn update(&mut self, outcome: AlignmentOutcome, window_fill: f64) {
        self.total_frames += 1;
        *self.outcome_counts.entry(outcome.as_str()).or_insert(0) += 1;
        self.window_fill_stats.push(window_fill);
    }

    /// 记录窗口已满时的 IMU 方差
    pub fn record_variance(&mut self, variance: f64) {
        self.variance_stats.push(variance);
    }

    /// 记录收敛
    pub fn record_convergence(&mut self, imu_time_shift: f64, peak_quality: f64) {
        if self.converged_at_frame.is_none() {
            self.converged_at_frame = Some(self.total_frames);
        }
        self.imu_time_shift = Some(imu_time_shift);
        self.peak_quality = Some(peak_quality);
    }

    pub fn count(&self, outcome: AlignmentOutcome) -> u64 {
        self.outcome_counts
            .get(outcome.as_str())
            .copied()
            .unwrap_or(0)
    }

    /// 生成摘要报告
    pub fn summary(&self) -> AlignmentSummary {
        let degenerate = self.count(AlignmentOutcome::DegenerateTracking);
        AlignmentSummary {
            total_frames: self.total_frames,
            converged_at_frame: self.converged_at_frame,
            imu_time_shift: self.imu_time_shift,
            peak_quality: self.peak_quality,
            degenerate_rate: if self.total_frames > 0 {
                degenerate as f64 / self.total_frames as f64 * 100.0
            } else {
                0.0
            },
            outcome_counts: self.outcome_counts.clone(),
            window_fill: StatsSummary::from(&self.window_fill_stats),
            imu_variance: StatsSummary::from(&self.variance_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 运行摘要
#[derive(Debug, Clone, Default)]
pub struct AlignmentSummary {
    pub total_frames: u64,
    pub converged_at_frame: Option<u64>,
    pub imu_time_shift: Option<f64>,
    pub peak_quality: Option<f64>,
    /// 跟踪退化帧占比 (%)
    pub degenerate_rate: f64,
    pub outcome_counts: BTreeMap<&'static str, u64>,
    pub window_fill: StatsSummary,
    pub imu_variance: StatsSummary,
}

impl std::fmt::Display for AlignmentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Time Alignment Summary ===")?;
        writeln!(f, "Total frames: {}", self.total_frames)?;
        match (self.converged_at_frame, self.imu_time_shift) {
            (Some(frame), Some(shift)) => writeln!(
                f,
                "Converged at frame {}: imu_time_shift = {:.9} s (peak quality {:.3})",
                frame,
                shift,
                self.peak_quality.unwrap_or(0.0)
            )?,
            _ => writeln!(f, "Not converged")?,
        }
        writeln!(f, "Degenerate tracking: {:.2}%", self.degenerate_rate)?;
        writeln!(f, "Window fill: {}", self.window_fill)?;
        writeln!(f, "IMU variance: {}", self.imu_variance)?;

        if !self.outcome_counts.is_empty() {
            writeln!(f, "Outcomes:")?;
            for (outcome, count) in &self.outcome_counts {
                writeln!(f, "  {}: {}", outcome, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3e}, max={:.3e}, mean={:.3e}, std={:.3e} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差 (n - 1)
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
