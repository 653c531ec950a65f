// Normal density curves for tooltip decoration
use serde::Serialize;
use std::f64::consts::PI;
use thiserror::Error;

pub const GAUSSIAN_STEPS: usize = 300;
/// Pixel row of the distribution axis inside the tooltip glyph
pub const BASELINE_Y: f64 = 75.0;
pub const HEIGHT_SCALE: f64 = 16.0;

#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("standard deviation must be positive and finite, got {0}")]
    DegenerateStdDev(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
}

pub fn normal_pdf(x: f64, mean: f64, std: f64) -> f64 {
    (1.0 / (std * (2.0 * PI).sqrt())) * (-0.5 * ((x - mean) / std).powi(2)).exp()
}

/// Trace the density over [mean - 3std, mean + 3std] in `steps` equal steps
/// (`steps + 1` points). `to_x` maps values to pixels; y grows downwards from
/// `BASELINE_Y`.
pub fn gaussian_curve(
    mean: f64,
    std: f64,
    to_x: impl Fn(f64) -> f64,
    steps: usize,
) -> Result<Vec<CurvePoint>, CurveError> {
    if !(std.is_finite() && std > 0.0) {
        return Err(CurveError::DegenerateStdDev(std));
    }
    let steps = steps.max(1);

    Ok((0..=steps)
        .map(|i| {
            let value = mean + (i as f64 / steps as f64) * 6.0 * std - 3.0 * std;
            CurvePoint {
                x: to_x(value),
                y: BASELINE_Y - normal_pdf(value, mean, std) * HEIGHT_SCALE,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extent::LinearScale;

    #[test]
    fn test_peak_sits_at_the_mean() {
        let scale = LinearScale::new((36.0, 38.0), (0.0, 130.0));
        let curve = gaussian_curve(37.0, 0.2, |v| scale.apply(v), GAUSSIAN_STEPS).unwrap();
        assert_eq!(curve.len(), GAUSSIAN_STEPS + 1);

        let (peak_index, peak) = curve
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.y.total_cmp(&b.1.y))
            .unwrap();
        assert_eq!(peak_index, GAUSSIAN_STEPS / 2);
        assert!((peak.x - scale.apply(37.0)).abs() < 1e-9);

        let expected_y = BASELINE_Y - HEIGHT_SCALE / (0.2 * (2.0 * PI).sqrt());
        assert!((peak.y - expected_y).abs() < 1e-9);
    }

    #[test]
    fn test_curve_spans_three_standard_deviations() {
        let curve = gaussian_curve(10.0, 2.0, |v| v, 60).unwrap();
        assert!((curve[0].x - 4.0).abs() < 1e-9);
        assert!((curve[60].x - 16.0).abs() < 1e-9);
        // Symmetric around the mean
        assert!((curve[10].y - curve[50].y).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_std_is_rejected() {
        assert_eq!(
            gaussian_curve(37.0, 0.0, |v| v, GAUSSIAN_STEPS),
            Err(CurveError::DegenerateStdDev(0.0))
        );
        assert!(gaussian_curve(37.0, -0.1, |v| v, GAUSSIAN_STEPS).is_err());
        assert!(gaussian_curve(37.0, f64::NAN, |v| v, GAUSSIAN_STEPS).is_err());
    }

    #[test]
    fn test_normal_pdf_matches_standard_normal() {
        assert!((normal_pdf(0.0, 0.0, 1.0) - 0.398_942_280_401_432_7).abs() < 1e-12);
        assert!((normal_pdf(1.0, 0.0, 1.0) - 0.241_970_724_519_143_37).abs() < 1e-12);
    }
}
