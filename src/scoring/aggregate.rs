use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::extract::{fold_digit, DosePattern};
use crate::config::{ComponentGroup, RuleBook};
use crate::error::EngineError;
use crate::model::{AggregatedEntity, RawTable};

/// Collapse raw rows into one [`AggregatedEntity`] per identifier.
///
/// The identifier column is forward-filled top to bottom; rows still without
/// an identifier are dropped. Entities come out in order of first appearance.
///
/// # Errors
///
/// - [`EngineError::MissingColumn`] if the identifier column is absent
/// - [`EngineError::MissingBrandColumn`] if a brand column is mapped but absent
///
/// Any other absent column degrades the corresponding field to missing.
pub fn aggregate_entities(
    table: &RawTable,
    rules: &RuleBook,
) -> Result<Vec<AggregatedEntity>, EngineError> {
    let columns = &rules.columns;

    let id_col = table
        .column_index(&columns.identifier)
        .ok_or_else(|| EngineError::MissingColumn {
            logical: "identifier",
            physical: columns.identifier.clone(),
        })?;

    let brand_col = match &columns.brand {
        Some(name) => Some(
            table
                .column_index(name)
                .ok_or_else(|| EngineError::MissingBrandColumn {
                    physical: name.clone(),
                })?,
        ),
        None => None,
    };

    let groups = group_rows(table, id_col);
    debug!(
        rows = table.rows.len(),
        entities = groups.len(),
        "grouped input rows"
    );

    let pattern = DosePattern::from_markers(&rules.markers);
    let price_col = table.column_index(&columns.price);
    let review_col = table.column_index(&columns.review_count);
    let rating_col = table.column_index(&columns.rating);
    let tags_col = table.column_index(&rules.tags.column);

    let entities = groups
        .into_iter()
        .map(|(identifier, rows)| {
            let values = |col: Option<usize>| {
                col.map(|c| {
                    rows.iter()
                        .filter_map(|&r| table.cell(r, c))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
            };

            let mut entity = AggregatedEntity::new(identifier);
            entity.price = first_numeric(values(price_col));
            entity.review_count = first_numeric(values(review_col));
            entity.rating = first_numeric(values(rating_col));
            entity.brand = first_text(values(brand_col));
            entity.tags_raw = first_text(values(tags_col));
            entity.primary_doses = extract_group(table, &rows, &rules.primary, &pattern);
            entity.secondary_doses = extract_group(table, &rows, &rules.secondary, &pattern);
            entity.attributes = columns
                .attributes
                .iter()
                .map(|name| (name.clone(), first_text(values(table.column_index(name)))))
                .collect();
            // the brand is also reachable under its column name
            if let Some(name) = &columns.brand {
                entity.attributes.insert(name.clone(), entity.brand.clone());
            }
            entity
        })
        .collect();

    Ok(entities)
}

/// Forward-fill the identifier column and group row indices by identifier,
/// preserving first-appearance order.
fn group_rows(table: &RawTable, id_col: usize) -> Vec<(String, Vec<usize>)> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut current: Option<String> = None;

    for row in 0..table.rows.len() {
        if let Some(id) = table.cell(row, id_col) {
            current = Some(id.to_string());
        }
        let Some(id) = current.as_ref() else {
            continue;
        };

        match index.get(id) {
            Some(&slot) => groups[slot].1.push(row),
            None => {
                index.insert(id.clone(), groups.len());
                groups.push((id.clone(), vec![row]));
            }
        }
    }

    groups
}

/// Extract a dose for every named component in the group, enabled or not.
fn extract_group(
    table: &RawTable,
    rows: &[usize],
    group: &ComponentGroup,
    pattern: &DosePattern,
) -> BTreeMap<String, Option<f64>> {
    let column = table.column_index(&group.column);

    group
        .rules
        .keys()
        .map(|name| {
            let dose = column.and_then(|c| {
                pattern.extract(rows.iter().filter_map(|&r| table.cell(r, c)), name)
            });
            (name.clone(), dose)
        })
        .collect()
}

/// First value in `values` that parses as a number once full-width digits
/// are folded and every character other than ASCII digits and `.` is
/// stripped ("12,000원" -> 12000).
pub fn first_numeric<'a, I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().find_map(parse_numeric)
}

pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .map(fold_digit)
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

fn first_text<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().next().map(str::to_string)
}
