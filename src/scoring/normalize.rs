/// Which end of a signal is preferable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Population z-scores over the present values.
///
/// Missing (or non-finite) entries get z = 0. If the present values have
/// zero variance every entry gets z = 0. `LowerIsBetter` negates the result.
pub fn z_scores(values: &[Option<f64>], direction: Direction) -> Vec<f64> {
    let valid: Vec<f64> = values
        .iter()
        .filter_map(|v| v.filter(|x| x.is_finite()))
        .collect();

    if valid.is_empty() {
        return vec![0.0; values.len()];
    }

    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    let variance = valid.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    // all-equal values can still leave rounding noise in the variance
    let constant = valid.iter().all(|x| *x == valid[0]);
    if constant || std_dev == 0.0 {
        return vec![0.0; values.len()];
    }

    let sign = match direction {
        Direction::HigherIsBetter => 1.0,
        Direction::LowerIsBetter => -1.0,
    };

    values
        .iter()
        .map(|v| match v.filter(|x| x.is_finite()) {
            Some(x) => sign * (x - mean) / std_dev,
            None => 0.0,
        })
        .collect()
}

/// `100 / (1 + exp(-k z))`; z = 0 maps to 50.
pub fn logistic(z: f64, steepness: f64) -> f64 {
    100.0 / (1.0 + (-steepness * z).exp())
}

/// Z-score then logistic transform, one 0-100 score per input entry.
pub fn normalize(values: &[Option<f64>], direction: Direction, steepness: f64) -> Vec<f64> {
    z_scores(values, direction)
        .into_iter()
        .map(|z| logistic(z, steepness))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_z_scores() {
        // mean 2, population std sqrt(2/3)
        let z = z_scores(&[Some(1.0), Some(2.0), Some(3.0)], Direction::HigherIsBetter);
        let std = (2.0f64 / 3.0).sqrt();
        assert!((z[0] + 1.0 / std).abs() < 1e-12);
        assert_eq!(z[1], 0.0);
        assert!((z[2] - 1.0 / std).abs() < 1e-12);
    }

    #[test]
    fn test_lower_is_better_negates() {
        let higher = z_scores(&[Some(10.0), Some(20.0)], Direction::HigherIsBetter);
        let lower = z_scores(&[Some(10.0), Some(20.0)], Direction::LowerIsBetter);
        assert_eq!(higher[0], -lower[0]);
        assert!(lower[0] > 0.0);
    }

    #[test]
    fn test_zero_variance_is_neutral() {
        let scores = normalize(&[Some(4.2), Some(4.2), None], Direction::HigherIsBetter, 1.0);
        assert_eq!(scores, vec![50.0, 50.0, 50.0]);

        let single = normalize(&[Some(7.0)], Direction::LowerIsBetter, 3.0);
        assert_eq!(single, vec![50.0]);
    }

    #[test]
    fn test_missing_is_neutral_in_both_directions() {
        let values = [Some(1.0), None, Some(5.0)];
        for direction in [Direction::HigherIsBetter, Direction::LowerIsBetter] {
            let scores = normalize(&values, direction, 2.0);
            assert_eq!(scores[1], 50.0);
        }
    }

    #[test]
    fn test_missing_excluded_from_statistics() {
        let with_missing = z_scores(&[Some(1.0), None, Some(3.0)], Direction::HigherIsBetter);
        let without = z_scores(&[Some(1.0), Some(3.0)], Direction::HigherIsBetter);
        assert_eq!(with_missing[0], without[0]);
        assert_eq!(with_missing[2], without[1]);
    }

    #[test]
    fn test_all_missing() {
        assert_eq!(
            normalize(&[None, None], Direction::HigherIsBetter, 1.0),
            vec![50.0, 50.0]
        );
        assert!(normalize(&[], Direction::HigherIsBetter, 1.0).is_empty());
    }

    #[test]
    fn test_logistic_shape() {
        assert_eq!(logistic(0.0, 5.0), 50.0);
        assert!(logistic(1.0, 2.0) > logistic(1.0, 1.0));
        assert!(logistic(-50.0, 1.0) >= 0.0);
        assert!(logistic(50.0, 1.0) <= 100.0);
    }
}
