use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::ComponentGroup;
use crate::model::{AggregatedEntity, ComponentGroupKind};

/// Output of [`composite_scores`] for one component group.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeScores {
    /// Renormalized weighted mean of the enabled components, per entity
    pub scores: Vec<f64>,
    /// `curve score * weight` per component, per entity. Every component in
    /// the group is listed; disabled ones carry zeros.
    pub contributions: BTreeMap<String, Vec<f64>>,
}

/// Weighted mean of dose-response scores over the group's enabled
/// components. Disabled components take no part in either sum. With no
/// enabled weight every entity scores 0.
pub fn composite_scores(
    entities: &[AggregatedEntity],
    group: &ComponentGroup,
    kind: ComponentGroupKind,
) -> CompositeScores {
    let mut contributions: BTreeMap<String, Vec<f64>> = group
        .rules
        .keys()
        .map(|name| (name.clone(), vec![0.0; entities.len()]))
        .collect();

    let (sums, total_weight) = group.enabled_rules().fold(
        (vec![0.0; entities.len()], 0.0),
        |(mut sums, total), (name, rule)| {
            let weighted: Vec<f64> = entities
                .iter()
                .map(|e| rule.score(e.dose(kind, name)) * rule.weight)
                .collect();
            for (sum, value) in sums.iter_mut().zip(&weighted) {
                *sum += value;
            }
            contributions.insert(name.clone(), weighted);
            (sums, total + rule.weight)
        },
    );

    debug!(
        group = kind.label(),
        enabled = group.enabled_rules().count(),
        total_weight,
        "scored component group"
    );

    let scores = if total_weight == 0.0 {
        if !group.rules.is_empty() {
            warn!(
                group = kind.label(),
                "no enabled component weight; group scores 0 for every entity"
            );
        }
        vec![0.0; entities.len()]
    } else {
        sums.into_iter().map(|s| s / total_weight).collect()
    };

    CompositeScores {
        scores,
        contributions,
    }
}
