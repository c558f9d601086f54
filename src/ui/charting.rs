/// Chart points for a per-word speed series: `(word number, wpm)`, starting at 1.
pub fn word_speed_points(wpm_over_time: &[f64]) -> Vec<(f64, f64)> {
    wpm_over_time
        .iter()
        .enumerate()
        .map(|(i, wpm)| ((i + 1) as f64, *wpm))
        .collect()
}

/// Compute X (word number) and Y (WPM) bounds for the speed chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let highest_wpm = points.iter().map(|&(_, wpm)| wpm).fold(0.0, f64::max);

    let overall = points.last().map(|p| p.0).unwrap_or(1.0).max(2.0);

    (overall, highest_wpm.ceil().max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[]);
        assert_eq!(x, 2.0);
        assert_eq!(y, 1.0);
    }

    #[test]
    fn test_compute_chart_params_series() {
        let points = word_speed_points(&[40.2, 71.5, 55.0]);
        assert_eq!(points[0], (1.0, 40.2));
        assert_eq!(points[2], (3.0, 55.0));

        let (x, y) = compute_chart_params(&points);
        assert_eq!(x, 3.0);
        assert_eq!(y, 72.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
