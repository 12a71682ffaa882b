pub mod filter;

pub use filter::{apply_filters, validate_filter_attributes, DoseRange, Filter, Presence};

use serde::Serialize;
use std::cmp::Ordering;

use crate::config::Markers;
use crate::scoring::ComparisonRow;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupSummary {
    pub count: usize,
    /// Mean over rows with a price; None if no row has one
    pub mean_price: Option<f64>,
    pub mean_market: Option<f64>,
}

/// One side of an A/B comparison, best Market Score first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonGroup {
    pub rows: Vec<ComparisonRow>,
    pub summary: GroupSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub a: ComparisonGroup,
    pub b: ComparisonGroup,
}

/// Split rows into groups A and B.
///
/// Group A holds the rows matching every filter in `a`. With a `b` filter
/// set, group B holds the rows matching it (the groups may overlap);
/// without one, group B is every row not in A.
pub fn split_groups(
    rows: Vec<ComparisonRow>,
    a: &[Filter],
    b: Option<&[Filter]>,
    markers: &Markers,
) -> Comparison {
    let in_a: Vec<bool> = rows
        .iter()
        .map(|row| a.iter().all(|f| f.matches(row, markers)))
        .collect();

    let in_b: Vec<bool> = match b {
        Some(filters) => rows
            .iter()
            .map(|row| filters.iter().all(|f| f.matches(row, markers)))
            .collect(),
        None => in_a.iter().map(|hit| !hit).collect(),
    };

    let mut group_a = Vec::new();
    let mut group_b = Vec::new();
    for ((row, hit_a), hit_b) in rows.into_iter().zip(in_a).zip(in_b) {
        match (hit_a, hit_b) {
            (true, true) => {
                group_b.push(row.clone());
                group_a.push(row);
            }
            (true, false) => group_a.push(row),
            (false, true) => group_b.push(row),
            (false, false) => {}
        }
    }

    Comparison {
        a: into_group(group_a),
        b: into_group(group_b),
    }
}

fn into_group(mut rows: Vec<ComparisonRow>) -> ComparisonGroup {
    rows.sort_by(|x, y| {
        y.market_score
            .partial_cmp(&x.market_score)
            .unwrap_or(Ordering::Equal)
    });
    let summary = summarize(&rows);
    ComparisonGroup { rows, summary }
}

pub fn summarize(rows: &[ComparisonRow]) -> GroupSummary {
    GroupSummary {
        count: rows.len(),
        mean_price: mean(rows.iter().filter_map(|r| r.entity.price)),
        mean_market: mean(rows.iter().map(|r| r.market_score)),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AggregatedEntity;

    fn row(id: &str, epa: Option<f64>, price: Option<f64>, market: f64) -> ComparisonRow {
        let mut entity = AggregatedEntity::new(id);
        entity.primary_doses.insert("EPA".to_string(), epa);
        entity.price = price;
        ComparisonRow {
            entity,
            market_score: market,
        }
    }

    fn rows() -> Vec<ComparisonRow> {
        vec![
            row("a", Some(500.0), Some(100.0), 40.0),
            row("b", None, Some(300.0), 70.0),
            row("c", Some(900.0), None, 60.0),
            row("d", None, None, 55.0),
        ]
    }

    fn ids(group: &ComparisonGroup) -> Vec<&str> {
        group.rows.iter().map(|r| r.entity.identifier.as_str()).collect()
    }

    #[test]
    fn test_b_defaults_to_rest() {
        let a = vec![Filter::parse("dose:EPA").unwrap()];
        let comparison = split_groups(rows(), &a, None, &Markers::default());

        assert_eq!(ids(&comparison.a), vec!["c", "a"]);
        assert_eq!(ids(&comparison.b), vec!["b", "d"]);
    }

    #[test]
    fn test_explicit_b_may_overlap() {
        let a = vec![Filter::parse("dose:EPA").unwrap()];
        let b = vec![Filter::parse("dose:EPA=800..").unwrap()];
        let comparison = split_groups(rows(), &a, Some(&b), &Markers::default());

        assert_eq!(ids(&comparison.a), vec!["c", "a"]);
        assert_eq!(ids(&comparison.b), vec!["c"]);
    }

    #[test]
    fn test_summaries() {
        let a = vec![Filter::parse("dose:EPA").unwrap()];
        let comparison = split_groups(rows(), &a, None, &Markers::default());

        let summary = &comparison.a.summary;
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean_price, Some(100.0));
        assert_eq!(summary.mean_market, Some(50.0));

        let summary = &comparison.b.summary;
        assert_eq!(summary.mean_price, Some(300.0));
        assert_eq!(summary.mean_market, Some(62.5));
    }

    #[test]
    fn test_empty_group_summary() {
        let a = vec![Filter::parse("dose:Krill").unwrap()];
        let comparison = split_groups(rows(), &a, None, &Markers::default());
        assert_eq!(comparison.a.summary, GroupSummary::default());
        assert_eq!(comparison.b.rows.len(), 4);
    }
}
