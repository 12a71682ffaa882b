use tracing::warn;

use super::normalize::{normalize, Direction};
use crate::config::MarketParams;
use crate::model::AggregatedEntity;

/// Blend of review-count and rating normalizations, both higher-is-better.
///
/// A zero weight sum falls back to a denominator of 1.
pub fn market_scores(entities: &[AggregatedEntity], params: &MarketParams) -> Vec<f64> {
    let reviews: Vec<Option<f64>> = entities.iter().map(|e| e.review_count).collect();
    let ratings: Vec<Option<f64>> = entities.iter().map(|e| e.rating).collect();

    let review_scores = normalize(&reviews, Direction::HigherIsBetter, params.steepness_review);
    let rating_scores = normalize(&ratings, Direction::HigherIsBetter, params.steepness_rating);

    let denominator = weight_denominator(&[params.weight_review, params.weight_rating], "market");

    review_scores
        .iter()
        .zip(&rating_scores)
        .map(|(review, rating)| {
            (review * params.weight_review + rating * params.weight_rating) / denominator
        })
        .collect()
}

/// Sum of `weights`, or 1 if it is 0.
pub(crate) fn weight_denominator(weights: &[f64], blend: &str) -> f64 {
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        warn!(blend, "blend weights sum to 0; using a denominator of 1");
        1.0
    } else {
        total
    }
}
