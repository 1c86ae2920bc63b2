//! IMU signal variance gate
//!
//! A correlation peak over a flat IMU signal is meaningless. The window is
//! only handed to the correlator when the IMU angle variance reaches
//! `variance_threshold_scaling * gyro_noise_density²`.

use contracts::TimeAlignmentConfig;

/// Unbiased sample variance (n - 1 denominator), 0 for fewer than two values
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    sum_sq / (n - 1) as f64
}

/// Gate verdict for one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub variance: f64,
    pub threshold: f64,
    pub admitted: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct VarianceGate {
    threshold: f64,
}

impl VarianceGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &TimeAlignmentConfig) -> Self {
        Self::new(config.variance_threshold())
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Admit unless the variance is strictly below the threshold.
    pub fn evaluate(&self, imu_angles: &[f64]) -> GateDecision {
        let variance = sample_variance(imu_angles);
        GateDecision {
            variance,
            threshold: self.threshold,
            admitted: variance >= self.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_variance() {
        assert_eq!(sample_variance(&[]), 0.0);
        assert_eq!(sample_variance(&[3.0]), 0.0);
        // mean 2.5, squared deviations sum 5.0
        assert!((sample_variance(&[1.0, 2.0, 3.0, 4.0]) - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_flat_signal_rejected_with_noise() {
        let config = TimeAlignmentConfig {
            gyro_noise_density: 1.0,
            ..Default::default()
        };
        let gate = VarianceGate::from_config(&config);
        assert!((gate.threshold() - 30.0).abs() < 1e-12);

        let decision = gate.evaluate(&[0.0; 10]);
        assert!(!decision.admitted);
        assert_eq!(decision.variance, 0.0);
    }

    #[test]
    fn test_zero_noise_admits_flat_signal() {
        let config = TimeAlignmentConfig {
            gyro_noise_density: 0.0,
            ..Default::default()
        };
        let decision = VarianceGate::from_config(&config).evaluate(&[0.0; 10]);
        assert!(decision.admitted);
    }

    #[test]
    fn test_boundary_is_admitted() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let gate = VarianceGate::new(sample_variance(&values));
        assert!(gate.evaluate(&values).admitted);
    }
}
