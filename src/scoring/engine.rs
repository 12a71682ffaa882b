use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

use super::aggregate::aggregate_entities;
use super::composite::{composite_scores, CompositeScores};
use super::market::{market_scores, weight_denominator};
use super::normalize::{normalize, Direction};
use super::tags::tag_scores;
use crate::config::RuleBook;
use crate::error::EngineError;
use crate::model::{AggregatedEntity, ComponentGroupKind, RawTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentContribution {
    pub group: ComponentGroupKind,
    pub name: String,
    pub enabled: bool,
    /// Curve score times component weight; 0 for disabled components
    pub value: f64,
}

impl ComponentContribution {
    /// Column label such as `A_EPA` or `C1_VitaminE`.
    pub fn column_label(&self) -> String {
        format!("{}_{}", self.group.label(), self.name)
    }
}

/// Every score computed for one entity in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub identifier: String,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub review_count: Option<f64>,
    pub rating: Option<f64>,
    pub final_score: f64,
    /// Primary components
    pub score_a: f64,
    /// Price, lower is better
    pub score_b: f64,
    /// Blend of C1 and C2
    pub score_c: f64,
    pub market_score: f64,
    /// Secondary components
    pub score_c1: f64,
    /// Tags
    pub score_c2: f64,
    /// Primary contributions first, then secondary, each in name order
    pub contributions: Vec<ComponentContribution>,
}

/// Ranked output of one pipeline run, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub rows: Vec<ScoreBreakdown>,
}

impl Ranking {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Contribution column labels shared by every row.
    pub fn contribution_labels(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.contributions.iter().map(|c| c.column_label()).collect())
            .unwrap_or_default()
    }
}

/// An aggregated entity paired with its Market Score, as consumed by the
/// comparison filters.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub entity: AggregatedEntity,
    pub market_score: f64,
}

/// Run the whole pipeline:
/// aggregate -> market -> A -> B -> C -> combine -> sort.
///
/// The rule book is only read. Ties on the final score keep aggregation
/// order.
///
/// # Errors
///
/// Aggregation failures come back wrapped in [`EngineError::Preprocess`].
pub fn run_pipeline(table: &RawTable, rules: &RuleBook) -> Result<Ranking, EngineError> {
    let entities = aggregate(table, rules)?;

    let market = market_scores(&entities, &rules.market);

    let primary = composite_scores(&entities, &rules.primary, ComponentGroupKind::Primary);

    let prices: Vec<Option<f64>> = entities.iter().map(|e| e.price).collect();
    let score_b = normalize(&prices, Direction::LowerIsBetter, rules.price.steepness);

    let secondary = composite_scores(&entities, &rules.secondary, ComponentGroupKind::Secondary);
    let score_c2 = tag_scores(&entities, &rules.tags, &rules.markers);
    let sub = &rules.sub_weights;
    let c_denominator = weight_denominator(&[sub.secondary_curve, sub.tags], "sub");
    let score_c: Vec<f64> = secondary
        .scores
        .iter()
        .zip(&score_c2)
        .map(|(c1, c2)| (c1 * sub.secondary_curve + c2 * sub.tags) / c_denominator)
        .collect();

    let fw = &rules.final_weights;
    let final_denominator = weight_denominator(&[fw.components, fw.price, fw.secondary], "final");

    let mut rows: Vec<ScoreBreakdown> = entities
        .into_iter()
        .enumerate()
        .map(|(i, entity)| {
            let score_a = primary.scores[i];
            let final_score = (score_a * fw.components
                + score_b[i] * fw.price
                + score_c[i] * fw.secondary)
                / final_denominator;

            let mut contributions = contributions_at(&primary, rules, ComponentGroupKind::Primary, i);
            contributions.extend(contributions_at(
                &secondary,
                rules,
                ComponentGroupKind::Secondary,
                i,
            ));

            ScoreBreakdown {
                identifier: entity.identifier,
                brand: entity.brand,
                price: entity.price,
                review_count: entity.review_count,
                rating: entity.rating,
                final_score,
                score_a,
                score_b: score_b[i],
                score_c: score_c[i],
                market_score: market[i],
                score_c1: secondary.scores[i],
                score_c2: score_c2[i],
                contributions,
            }
        })
        .collect();

    // Vec::sort_by is stable, so ties keep aggregation order
    rows.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
    });

    debug!(entities = rows.len(), "ranked entities");

    Ok(Ranking { rows })
}

/// Aggregate and attach Market Scores only, for the comparison filters.
pub fn prepare_comparison(
    table: &RawTable,
    rules: &RuleBook,
) -> Result<Vec<ComparisonRow>, EngineError> {
    let entities = aggregate(table, rules)?;
    let market = market_scores(&entities, &rules.market);

    Ok(entities
        .into_iter()
        .zip(market)
        .map(|(entity, market_score)| ComparisonRow {
            entity,
            market_score,
        })
        .collect())
}

fn aggregate(table: &RawTable, rules: &RuleBook) -> Result<Vec<AggregatedEntity>, EngineError> {
    warn_degenerate_rules(rules);

    let entities = aggregate_entities(table, rules).map_err(|e| EngineError::Preprocess {
        source: Box::new(e),
    })?;
    debug!(entities = entities.len(), "aggregated input");
    Ok(entities)
}

fn contributions_at(
    scores: &CompositeScores,
    rules: &RuleBook,
    kind: ComponentGroupKind,
    index: usize,
) -> Vec<ComponentContribution> {
    let group = match kind {
        ComponentGroupKind::Primary => &rules.primary,
        ComponentGroupKind::Secondary => &rules.secondary,
    };

    scores
        .contributions
        .iter()
        .map(|(name, values)| ComponentContribution {
            group: kind,
            name: name.clone(),
            enabled: group.rules.get(name).is_some_and(|r| r.enabled),
            value: values[index],
        })
        .collect()
}

/// Log enabled rules whose curve parameters had to be nudged to stay finite.
fn warn_degenerate_rules(rules: &RuleBook) {
    let groups = [
        (ComponentGroupKind::Primary, &rules.primary),
        (ComponentGroupKind::Secondary, &rules.secondary),
    ];

    for (kind, group) in groups {
        for (name, rule) in group.enabled_rules() {
            if rule.rec_dose == rule.min_dose {
                warn!(group = kind.label(), component = %name, "rec_dose equals min_dose");
            } else if rule.rec_dose == 0.0 {
                warn!(group = kind.label(), component = %name, "rec_dose is 0");
            }
        }
    }
}
