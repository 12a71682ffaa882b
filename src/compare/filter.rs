use anyhow::{bail, Context, Result};
use std::fmt;

use crate::config::{ColumnMapping, Markers};
use crate::scoring::{has_tag, ComparisonRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

/// Inclusive dose range; either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoseRange {
    pub low: f64,
    pub high: f64,
}

impl DoseRange {
    /// Parse `LO..HI`, `LO..` or `..HI`.
    pub fn parse(s: &str) -> Result<Self> {
        let Some((low, high)) = s.split_once("..") else {
            bail!("Invalid range format: {} (expected LO..HI)", s)
        };
        let low = match low.trim() {
            "" => f64::NEG_INFINITY,
            v => v.parse().with_context(|| format!("Invalid range bound: {}", v))?,
        };
        let high = match high.trim() {
            "" => f64::INFINITY,
            v => v.parse().with_context(|| format!("Invalid range bound: {}", v))?,
        };
        if low > high {
            bail!("Invalid range: {} is above {}", low, high);
        }
        Ok(DoseRange { low, high })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// One comparison predicate. A filter set is a conjunction.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Dose of a component (from either group) present or absent, optionally
    /// within a range. A range only ever matches present doses.
    Dose {
        component: String,
        presence: Presence,
        range: Option<DoseRange>,
    },
    /// Tag present or absent, using the same rule as tag scoring
    Tag { tag: String, presence: Presence },
    /// Text attribute value is one of `allowed`; missing never matches
    Category {
        attribute: String,
        allowed: Vec<String>,
    },
}

impl Filter {
    /// Parse the compact command-line form:
    ///
    /// - `dose:NAME`, `no-dose:NAME`, `dose:NAME=LO..HI`
    /// - `tag:NAME`, `no-tag:NAME`
    /// - `cat:ATTR=V1,V2`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix("no-dose:") {
            let (component, range) = parse_dose_target(rest)?;
            Ok(Filter::Dose {
                component,
                presence: Presence::Absent,
                range,
            })
        } else if let Some(rest) = s.strip_prefix("dose:") {
            let (component, range) = parse_dose_target(rest)?;
            Ok(Filter::Dose {
                component,
                presence: Presence::Present,
                range,
            })
        } else if let Some(rest) = s.strip_prefix("no-tag:") {
            Ok(Filter::Tag {
                tag: non_empty(rest, "tag")?,
                presence: Presence::Absent,
            })
        } else if let Some(rest) = s.strip_prefix("tag:") {
            Ok(Filter::Tag {
                tag: non_empty(rest, "tag")?,
                presence: Presence::Present,
            })
        } else if let Some(rest) = s.strip_prefix("cat:") {
            let Some((attribute, values)) = rest.split_once('=') else {
                bail!("Category filter must look like cat:ATTR=V1,V2: {}", s)
            };
            let allowed: Vec<String> = values
                .split(',')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if allowed.is_empty() {
                bail!("Category filter needs at least one value: {}", s);
            }
            Ok(Filter::Category {
                attribute: non_empty(attribute, "attribute")?,
                allowed,
            })
        } else {
            bail!(
                "Filter must start with dose:, no-dose:, tag:, no-tag: or cat: ({})",
                s
            )
        }
    }

    pub fn matches(&self, row: &ComparisonRow, markers: &Markers) -> bool {
        match self {
            Filter::Dose {
                component,
                presence,
                range,
            } => {
                let dose = row.entity.any_dose(component);
                let present = match presence {
                    Presence::Present => dose.is_some(),
                    Presence::Absent => dose.is_none(),
                };
                present && range.map_or(true, |r| dose.is_some_and(|d| r.contains(d)))
            }
            Filter::Tag { tag, presence } => {
                let found = row
                    .entity
                    .tags_raw
                    .as_deref()
                    .is_some_and(|raw| has_tag(raw, tag, &markers.tag));
                match presence {
                    Presence::Present => found,
                    Presence::Absent => !found,
                }
            }
            Filter::Category { attribute, allowed } => row
                .entity
                .attribute(attribute)
                .is_some_and(|value| allowed.iter().any(|a| a == value)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Dose {
                component,
                presence,
                range,
            } => {
                let prefix = match presence {
                    Presence::Present => "dose",
                    Presence::Absent => "no-dose",
                };
                write!(f, "{}:{}", prefix, component)?;
                if let Some(r) = range {
                    let bound = |v: f64| if v.is_finite() { v.to_string() } else { String::new() };
                    write!(f, "={}..{}", bound(r.low), bound(r.high))?;
                }
                Ok(())
            }
            Filter::Tag { tag, presence } => match presence {
                Presence::Present => write!(f, "tag:{}", tag),
                Presence::Absent => write!(f, "no-tag:{}", tag),
            },
            Filter::Category { attribute, allowed } => {
                write!(f, "cat:{}={}", attribute, allowed.join(","))
            }
        }
    }
}

/// Keep the rows matching every filter, in their original order.
pub fn apply_filters<'r>(
    rows: &'r [ComparisonRow],
    filters: &[Filter],
    markers: &Markers,
) -> Vec<&'r ComparisonRow> {
    rows.iter()
        .filter(|row| filters.iter().all(|f| f.matches(row, markers)))
        .collect()
}

/// Check that every category filter names a known attribute: `brand`, the
/// mapped brand column, or a column listed in `columns.attributes`.
pub fn validate_filter_attributes(
    filters: &[Filter],
    columns: &ColumnMapping,
) -> Result<(), Vec<String>> {
    let errors: Vec<String> = filters
        .iter()
        .filter_map(|filter| match filter {
            Filter::Category { attribute, .. } => Some(attribute),
            _ => None,
        })
        .filter(|attribute| {
            attribute.as_str() != "brand"
                && columns.brand.as_deref() != Some(attribute.as_str())
                && !columns.attributes.contains(*attribute)
        })
        .map(|attribute| {
            format!(
                "cat:{}: unknown attribute (expected brand, the brand column or one of columns.attributes)",
                attribute
            )
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn parse_dose_target(s: &str) -> Result<(String, Option<DoseRange>)> {
    match s.split_once('=') {
        Some((name, range)) => Ok((non_empty(name, "component")?, Some(DoseRange::parse(range)?))),
        None => Ok((non_empty(s, "component")?, None)),
    }
}

fn non_empty(s: &str, what: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        bail!("Filter is missing a {} name", what);
    }
    Ok(s.to_string())
}
