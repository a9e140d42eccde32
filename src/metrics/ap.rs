//! Average Precision (AP) calculation.

use crate::types::{ApMethod, PrecisionRecallPoint};

/// Integrate a precision-recall curve into Average Precision.
///
/// An empty curve (a class with ground truth but no detections) gives 0.0.
///
/// # Example
///
/// ```
/// use map_eval::metrics::ap::integrate;
/// use map_eval::types::{ApMethod, PrecisionRecallPoint};
///
/// let curve = vec![PrecisionRecallPoint::new(1.0, 1.0)];
/// assert_eq!(integrate(&curve, ApMethod::Envelope), 1.0);
/// ```
pub fn integrate(curve: &[PrecisionRecallPoint], method: ApMethod) -> f64 {
    if curve.is_empty() {
        return 0.0;
    }

    match method {
        ApMethod::Envelope => envelope_area(curve),
        ApMethod::Interpolated101 => interpolated_101(curve),
    }
}

/// Replace each precision with the maximum precision at the same or any
/// higher recall. Input must be sorted by recall.
pub fn precision_envelope(curve: &[PrecisionRecallPoint]) -> Vec<f64> {
    let mut envelope: Vec<f64> = curve.iter().map(|p| p.precision).collect();
    for i in (0..envelope.len().saturating_sub(1)).rev() {
        envelope[i] = envelope[i].max(envelope[i + 1]);
    }
    envelope
}

fn sorted_by_recall(curve: &[PrecisionRecallPoint]) -> Vec<PrecisionRecallPoint> {
    let mut points = curve.to_vec();
    points.sort_by(|a, b| a.recall.total_cmp(&b.recall));
    points
}

/// Area under the precision envelope, trapezoid rule over distinct recall
/// values, starting from (0, envelope at the first point).
fn envelope_area(curve: &[PrecisionRecallPoint]) -> f64 {
    let points = sorted_by_recall(curve);
    let envelope = precision_envelope(&points);

    // One sample per distinct recall. The first point of a run of equal
    // recalls carries the largest envelope value of the run.
    let mut samples: Vec<(f64, f64)> = Vec::with_capacity(points.len() + 1);
    samples.push((0.0, envelope[0]));
    for (point, &env) in points.iter().zip(&envelope) {
        if let Some(&(last_recall, _)) = samples.last() {
            if point.recall == last_recall {
                continue;
            }
        }
        samples.push((point.recall, env));
    }

    samples
        .windows(2)
        .map(|w| {
            let (r0, p0) = w[0];
            let (r1, p1) = w[1];
            (r1 - r0) * (p0 + p1) / 2.0
        })
        .sum()
}

/// COCO-style 101-point interpolation.
fn interpolated_101(curve: &[PrecisionRecallPoint]) -> f64 {
    let interpolated = interpolate_precision(curve);
    interpolated.iter().sum::<f64>() / interpolated.len() as f64
}

/// Interpolated precision at the 101 recall levels 0.00, 0.01, ..., 1.00.
///
/// Each level takes the maximum precision among points with recall at or
/// above it, or 0.0 if the curve never reaches that recall.
pub fn interpolate_precision(curve: &[PrecisionRecallPoint]) -> Vec<f64> {
    (0..=100)
        .map(|i| {
            let recall_level = i as f64 / 100.0;
            curve
                .iter()
                .filter(|p| p.recall >= recall_level)
                .map(|p| p.precision)
                .fold(0.0f64, f64::max)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(points: &[(f64, f64)]) -> Vec<PrecisionRecallPoint> {
        points
            .iter()
            .map(|&(r, p)| PrecisionRecallPoint::new(r, p))
            .collect()
    }

    #[test]
    fn test_empty_curve() {
        assert_eq!(integrate(&[], ApMethod::Envelope), 0.0);
        assert_eq!(integrate(&[], ApMethod::Interpolated101), 0.0);
    }

    #[test]
    fn test_single_perfect_point() {
        let c = curve(&[(1.0, 1.0)]);
        assert_eq!(integrate(&c, ApMethod::Envelope), 1.0);
        assert!((integrate(&c, ApMethod::Interpolated101) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_false_positive() {
        let c = curve(&[(0.0, 0.0)]);
        assert_eq!(integrate(&c, ApMethod::Envelope), 0.0);
        assert_eq!(integrate(&c, ApMethod::Interpolated101), 0.0);
    }

    #[test]
    fn test_perfect_ranking() {
        let c = curve(&[(0.25, 1.0), (0.5, 1.0), (0.75, 1.0), (1.0, 1.0)]);
        assert!((integrate(&c, ApMethod::Envelope) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_envelope_lifts_dips() {
        let c = curve(&[(0.5, 1.0), (0.5, 0.5), (1.0, 2.0 / 3.0)]);
        let envelope = precision_envelope(&c);
        assert_eq!(envelope[0], 1.0);
        assert!((envelope[1] - 2.0 / 3.0).abs() < 1e-12);
        assert!((envelope[2] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_trapezoid_area() {
        // Samples: (0, 1), (0.5, 1), (1.0, 2/3)
        let c = curve(&[(0.5, 1.0), (0.5, 0.5), (1.0, 2.0 / 3.0)]);
        let expected = 0.5 * 1.0 + 0.5 * (1.0 + 2.0 / 3.0) / 2.0;
        assert!((integrate(&c, ApMethod::Envelope) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_leading_false_positive() {
        // FP then TP with one ground truth: samples (0, 0.5), (1.0, 0.5)
        let c = curve(&[(0.0, 0.0), (1.0, 0.5)]);
        assert!((integrate(&c, ApMethod::Envelope) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_partial_recall() {
        // One of two ground truths found: samples (0, 1), (0.5, 1)
        let c = curve(&[(0.5, 1.0)]);
        assert!((integrate(&c, ApMethod::Envelope) - 0.5).abs() < 1e-12);
        // Levels 0.00..=0.50 are 1.0, the rest 0.0
        assert!((integrate(&c, ApMethod::Interpolated101) - 51.0 / 101.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate_precision_len() {
        let c = curve(&[(0.25, 1.0), (0.5, 1.0), (0.5, 0.67), (0.75, 0.75), (0.75, 0.6)]);
        let interpolated = interpolate_precision(&c);
        assert_eq!(interpolated.len(), 101);
        assert_eq!(interpolated[0], 1.0);
        assert_eq!(interpolated[100], 0.0);
    }

    #[test]
    fn test_unsorted_input_is_sorted_first() {
        let sorted = curve(&[(0.5, 1.0), (1.0, 0.5)]);
        let unsorted = curve(&[(1.0, 0.5), (0.5, 1.0)]);
        assert_eq!(
            integrate(&sorted, ApMethod::Envelope),
            integrate(&unsorted, ApMethod::Envelope)
        );
    }
}
