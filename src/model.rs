use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tabular input snapshot: a header row plus data rows.
///
/// Cells are `None` when missing. Blank cells are treated as missing on read,
/// whichever way the table was built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row given as optional string slices (test and builder helper).
    pub fn push_row(&mut self, cells: &[Option<&str>]) {
        self.rows
            .push(cells.iter().map(|c| c.map(str::to_string)).collect());
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Non-blank value of `row[column]`, if any.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
            .filter(|c| !c.trim().is_empty())
    }

    /// Non-blank values of a column, top to bottom.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &str> + '_ {
        (0..self.rows.len()).filter_map(move |row| self.cell(row, column))
    }
}

/// Which of the two independent component groups a dose belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentGroupKind {
    Primary,
    Secondary,
}

impl ComponentGroupKind {
    pub fn label(&self) -> &'static str {
        match self {
            ComponentGroupKind::Primary => "A",
            ComponentGroupKind::Secondary => "C1",
        }
    }
}

/// One record per distinct identifier after forward-fill and grouping.
///
/// Doses are extracted for every component the rule book names, enabled or
/// not, so filters can read them independently of scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEntity {
    pub identifier: String,
    pub price: Option<f64>,
    pub review_count: Option<f64>,
    pub rating: Option<f64>,
    pub brand: Option<String>,
    pub tags_raw: Option<String>,
    pub primary_doses: BTreeMap<String, Option<f64>>,
    pub secondary_doses: BTreeMap<String, Option<f64>>,
    pub attributes: BTreeMap<String, Option<String>>,
}

impl AggregatedEntity {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            price: None,
            review_count: None,
            rating: None,
            brand: None,
            tags_raw: None,
            primary_doses: BTreeMap::new(),
            secondary_doses: BTreeMap::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn doses(&self, group: ComponentGroupKind) -> &BTreeMap<String, Option<f64>> {
        match group {
            ComponentGroupKind::Primary => &self.primary_doses,
            ComponentGroupKind::Secondary => &self.secondary_doses,
        }
    }

    pub fn dose(&self, group: ComponentGroupKind, component: &str) -> Option<f64> {
        self.doses(group).get(component).copied().flatten()
    }

    /// Dose of `component` from whichever group lists it, primary first.
    pub fn any_dose(&self, component: &str) -> Option<f64> {
        self.dose(ComponentGroupKind::Primary, component)
            .or_else(|| self.dose(ComponentGroupKind::Secondary, component))
    }

    /// Text attribute by name; `brand` maps to the brand field.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        if name == "brand" {
            return self.brand.as_deref();
        }
        self.attributes.get(name).and_then(|v| v.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_treats_blank_as_missing() {
        let mut table = RawTable::new(vec!["name".to_string(), "price".to_string()]);
        table.push_row(&[Some("A"), Some("  ")]);
        table.push_row(&[None, Some("100")]);

        assert_eq!(table.cell(0, 0), Some("A"));
        assert_eq!(table.cell(0, 1), None);
        assert_eq!(table.cell(1, 0), None);
        assert_eq!(table.cell(5, 0), None);
        assert_eq!(table.column_values(1).collect::<Vec<_>>(), vec!["100"]);
    }

    #[test]
    fn test_short_rows_read_as_missing() {
        let mut table = RawTable::new(vec!["name".to_string(), "price".to_string()]);
        table.push_row(&[Some("A")]);
        assert_eq!(table.cell(0, 1), None);
    }

    #[test]
    fn test_any_dose_prefers_primary() {
        let mut entity = AggregatedEntity::new("X");
        entity.primary_doses.insert("EPA".to_string(), None);
        entity
            .secondary_doses
            .insert("EPA".to_string(), Some(120.0));
        entity.primary_doses.insert("DHA".to_string(), Some(300.0));

        assert_eq!(entity.any_dose("EPA"), Some(120.0));
        assert_eq!(entity.any_dose("DHA"), Some(300.0));
        assert_eq!(entity.any_dose("B1"), None);
    }

    #[test]
    fn test_attribute_brand_alias() {
        let mut entity = AggregatedEntity::new("X");
        entity.brand = Some("Acme".to_string());
        entity
            .attributes
            .insert("origin".to_string(), Some("NO".to_string()));

        assert_eq!(entity.attribute("brand"), Some("Acme"));
        assert_eq!(entity.attribute("origin"), Some("NO"));
        assert_eq!(entity.attribute("missing"), None);
    }
}
