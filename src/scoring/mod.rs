pub mod aggregate;
pub mod composite;
pub mod curve;
pub mod engine;
pub mod extract;
pub mod market;
pub mod normalize;
pub mod tags;
pub mod validation;

pub use aggregate::aggregate_entities;
pub use composite::{composite_scores, CompositeScores};
pub use curve::dose_response_score;
pub use engine::{
    prepare_comparison, run_pipeline, ComparisonRow, ComponentContribution, Ranking,
    ScoreBreakdown,
};
pub use extract::{extract_dose, DosePattern};
pub use market::market_scores;
pub use normalize::{normalize, Direction};
pub use tags::{has_tag, tag_scores};
pub use validation::validate_rule_book;
