use crate::config::{Markers, TagGroup};
use crate::model::AggregatedEntity;

use super::extract::match_positions;

/// True if `raw` contains `tag` followed, after optional whitespace, by
/// `marker`. The tag name is matched literally and case-sensitively.
pub fn has_tag(raw: &str, tag: &str, marker: &str) -> bool {
    if tag.is_empty() || marker.is_empty() {
        return false;
    }

    match_positions(raw, tag)
        .into_iter()
        .any(|at| raw[at + tag.len()..].trim_start().starts_with(marker))
}

/// Additive tag score per entity. Tags scored 0 (and blank tag names) are
/// skipped; entities without tag text score 0.
pub fn tag_scores(entities: &[AggregatedEntity], tags: &TagGroup, markers: &Markers) -> Vec<f64> {
    let active: Vec<(&str, f64)> = tags
        .scores
        .iter()
        .filter(|(name, score)| !name.trim().is_empty() && **score != 0.0)
        .map(|(name, score)| (name.as_str(), *score))
        .collect();

    entities
        .iter()
        .map(|entity| {
            let Some(raw) = entity.tags_raw.as_deref() else {
                return 0.0;
            };
            active
                .iter()
                .filter(|(name, _)| has_tag(raw, name, &markers.tag))
                .map(|(_, score)| score)
                .sum()
        })
        .collect()
}
