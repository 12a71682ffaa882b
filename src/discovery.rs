//! Rule-book bootstrapping: find the component names, tag names and
//! categorical columns present in an input table.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::{ComponentRule, Markers, RuleBook};
use crate::model::RawTable;
use crate::scoring::extract::{match_positions, normalize};

/// Text columns with fewer distinct values than this are categorical.
const MAX_CATEGORY_VALUES: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscoveredRules {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
    pub tags: Vec<String>,
    /// Categorical column name -> sorted distinct values
    pub text_columns: BTreeMap<String, Vec<String>>,
    pub brand_present: bool,
}

/// Scan `table` using the column mapping and markers of `rules`.
///
/// Component names come from the first `marker : name` listing in each
/// cell, the name running up to the next `,`. Tags are split on the tag
/// separator with tag markers removed. Every output list is sorted.
pub fn scan_for_rules(table: &RawTable, rules: &RuleBook) -> DiscoveredRules {
    let scan_components = |column: &str| -> Vec<String> {
        let Some(col) = table.column_index(column) else {
            return Vec::new();
        };
        table
            .column_values(col)
            .filter_map(|text| first_component_name(text, &rules.markers))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };

    let primary = scan_components(&rules.primary.column);
    let secondary = scan_components(&rules.secondary.column);

    let tags: Vec<String> = table
        .column_index(&rules.tags.column)
        .map(|col| {
            table
                .column_values(col)
                .flat_map(|text| split_tags(text, &rules.markers))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
        .unwrap_or_default();

    let columns = &rules.columns;
    let excluded = [
        columns.identifier.as_str(),
        columns.price.as_str(),
        columns.review_count.as_str(),
        columns.rating.as_str(),
        rules.primary.column.as_str(),
        rules.secondary.column.as_str(),
        rules.tags.column.as_str(),
    ];

    let text_columns: BTreeMap<String, Vec<String>> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !excluded.contains(&name.as_str()))
        .filter_map(|(col, name)| {
            let values: BTreeSet<&str> = table.column_values(col).collect();
            let numeric = values.iter().all(|v| v.trim().parse::<f64>().is_ok());
            if numeric || values.len() <= 1 || values.len() >= MAX_CATEGORY_VALUES {
                return None;
            }
            Some((
                name.clone(),
                values.into_iter().map(str::to_string).collect::<Vec<_>>(),
            ))
        })
        .collect();

    let brand_present = columns
        .brand
        .as_deref()
        .is_some_and(|brand| table.has_column(brand));

    let discovered = DiscoveredRules {
        primary,
        secondary,
        tags,
        text_columns,
        brand_present,
    };
    debug!(
        primary = discovered.primary.len(),
        secondary = discovered.secondary.len(),
        tags = discovered.tags.len(),
        text_columns = discovered.text_columns.len(),
        "scanned input for rules"
    );
    discovered
}

impl DiscoveredRules {
    /// Merge discoveries into `base`, keeping any rule `base` already has.
    ///
    /// New components get the enabled primary/secondary default rules, new
    /// tags a score of 0, and categorical columns become attributes. A
    /// mapped brand column missing from the input is cleared.
    pub fn into_rule_book(self, base: RuleBook) -> RuleBook {
        let mut rules = base;

        for name in self.primary {
            rules
                .primary
                .rules
                .entry(name)
                .or_insert_with(ComponentRule::primary_default);
        }
        for name in self.secondary {
            rules
                .secondary
                .rules
                .entry(name)
                .or_insert_with(ComponentRule::secondary_default);
        }
        for tag in self.tags {
            rules.tags.scores.entry(tag).or_insert(0.0);
        }

        let brand = rules.columns.brand.clone();
        for column in self.text_columns.into_keys() {
            if Some(&column) != brand.as_ref() && !rules.columns.attributes.contains(&column) {
                rules.columns.attributes.push(column);
            }
        }

        if !self.brand_present {
            rules.columns.brand = None;
        }

        rules
    }
}

/// Name from the first `marker : name` listing in `text`, whitespace removed.
///
/// The marker is matched on the same normalised text the dose extractor
/// uses; the name keeps its original case.
fn first_component_name(text: &str, markers: &Markers) -> Option<String> {
    let marker = normalize(&markers.component);
    if marker.is_empty() {
        return None;
    }

    let stripped: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    // (normalised offset, stripped offset) at every character boundary
    let mut folded = String::with_capacity(stripped.len());
    let mut offsets = Vec::with_capacity(stripped.len() + 1);
    let mut buf = [0u8; 4];
    for (at, c) in stripped.char_indices() {
        offsets.push((folded.len(), at));
        folded.push_str(&normalize(c.encode_utf8(&mut buf)));
    }
    offsets.push((folded.len(), stripped.len()));

    match_positions(&folded, &marker).into_iter().find_map(|at| {
        let end = at + marker.len();
        let slot = offsets.binary_search_by_key(&end, |&(f, _)| f).ok()?;
        let rest = stripped[offsets[slot].1..].strip_prefix(':')?;
        let name = rest.split(',').next().unwrap_or_default();
        (!name.is_empty()).then(|| name.to_string())
    })
}

fn split_tags<'a>(text: &'a str, markers: &'a Markers) -> impl Iterator<Item = String> + 'a {
    text.split(markers.tag_separator.as_str())
        .map(|tag| tag.replace(markers.tag.as_str(), "").trim().to_string())
        .filter(|tag| !tag.is_empty())
}
