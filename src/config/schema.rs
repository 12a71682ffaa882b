use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full scoring configuration ("rule book").
///
/// Every section is optional; missing sections fall back to the defaults
/// below. A run never mutates the rule book it was given.
///
/// Example YAML:
/// ```yaml
/// columns:
///   identifier: 제품명
///   price: 1일 섭취량당 가격
///   brand: 브랜드
/// final_weights: { components: 0.5, price: 0.3, secondary: 0.2 }
/// primary:
///   column: 핵심성분명태그
///   rules:
///     EPA: { enabled: true, min_dose: 500, rec_dose: 1000, rec_score: 80, saturation_factor: 1.0, weight: 1.0 }
/// tags:
///   column: 특수태그
///   scores: { rTG: 5.0 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RuleBook {
    pub columns: ColumnMapping,
    pub final_weights: FinalWeights,
    pub sub_weights: SubWeights,
    pub primary: ComponentGroup,
    pub secondary: ComponentGroup,
    pub price: PriceRule,
    pub tags: TagGroup,
    pub market: MarketParams,
    pub markers: Markers,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            final_weights: FinalWeights::default(),
            sub_weights: SubWeights::default(),
            primary: ComponentGroup::primary_default(),
            secondary: ComponentGroup::secondary_default(),
            price: PriceRule::default(),
            tags: TagGroup::default(),
            market: MarketParams::default(),
            markers: Markers::default(),
        }
    }
}

/// Physical column names for each logical input column.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    /// Entity identifier; must exist in the input
    pub identifier: String,
    pub price: String,
    pub review_count: String,
    pub rating: String,
    /// Brand column. `null` opts out of brand extraction entirely.
    pub brand: Option<String>,
    /// Extra categorical text columns carried through for filtering
    pub attributes: Vec<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            identifier: "제품명".to_string(),
            price: "1일 섭취량당 가격".to_string(),
            review_count: "리뷰 개수".to_string(),
            rating: "리뷰 별점".to_string(),
            brand: Some("브랜드".to_string()),
            attributes: Vec::new(),
        }
    }
}

/// Blend of the three top-level sub-scores into the final score.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FinalWeights {
    /// Score A (primary components)
    pub components: f64,
    /// Score B (price)
    pub price: f64,
    /// Score C (secondary components + tags)
    pub secondary: f64,
}

impl Default for FinalWeights {
    fn default() -> Self {
        Self {
            components: 0.5,
            price: 0.3,
            secondary: 0.2,
        }
    }
}

/// Blend of C1 (secondary curve score) and C2 (tag score) into score C.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SubWeights {
    pub secondary_curve: f64,
    pub tags: f64,
}

impl Default for SubWeights {
    fn default() -> Self {
        Self {
            secondary_curve: 0.5,
            tags: 0.5,
        }
    }
}

/// A text column holding component listings, plus the per-component rules
/// applied to doses extracted from it. A group section written without a
/// `column` reads no column, so every dose in it is missing.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ComponentGroup {
    pub column: String,
    pub rules: BTreeMap<String, ComponentRule>,
}

impl ComponentGroup {
    pub fn primary_default() -> Self {
        Self {
            column: "핵심성분명태그".to_string(),
            rules: BTreeMap::new(),
        }
    }

    pub fn secondary_default() -> Self {
        Self {
            column: "보조성분명태그".to_string(),
            rules: BTreeMap::new(),
        }
    }

    /// Iterate the enabled rules only, in name order.
    pub fn enabled_rules(&self) -> impl Iterator<Item = (&String, &ComponentRule)> {
        self.rules.iter().filter(|(_, rule)| rule.enabled)
    }
}

/// Dose-response parameters for one named component.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ComponentRule {
    pub enabled: bool,
    pub min_dose: f64,
    pub rec_dose: f64,
    pub rec_score: f64,
    pub saturation_factor: f64,
    pub weight: f64,
}

impl Default for ComponentRule {
    fn default() -> Self {
        Self {
            enabled: false,
            min_dose: 0.0,
            rec_dose: 0.0,
            rec_score: 0.0,
            saturation_factor: 1.0,
            weight: 0.0,
        }
    }
}

impl ComponentRule {
    /// Rule proposed for a newly discovered primary component.
    pub fn primary_default() -> Self {
        Self {
            enabled: true,
            min_dose: 500.0,
            rec_dose: 1000.0,
            rec_score: 80.0,
            saturation_factor: 1.0,
            weight: 1.0,
        }
    }

    /// Rule proposed for a newly discovered secondary component.
    pub fn secondary_default() -> Self {
        Self {
            enabled: true,
            min_dose: 100.0,
            rec_dose: 200.0,
            rec_score: 70.0,
            saturation_factor: 0.5,
            weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PriceRule {
    /// Logistic steepness `k` for the price z-score
    pub steepness: f64,
}

impl Default for PriceRule {
    fn default() -> Self {
        Self { steepness: 1.0 }
    }
}

/// Tag column and additive score per tag. A score of 0 disables the tag.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TagGroup {
    pub column: String,
    pub scores: BTreeMap<String, f64>,
}

impl Default for TagGroup {
    fn default() -> Self {
        Self {
            column: "특수태그".to_string(),
            scores: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MarketParams {
    pub steepness_review: f64,
    pub steepness_rating: f64,
    pub weight_review: f64,
    pub weight_rating: f64,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            steepness_review: 2.0,
            steepness_rating: 1.0,
            weight_review: 0.7,
            weight_rating: 0.3,
        }
    }
}

/// Literal markers of the listing grammar:
/// `<component> : <name> , ... , <amount> : <number>` for doses and
/// `<tag name> <tag marker>` for tags.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Markers {
    pub component: String,
    pub amount: String,
    pub tag: String,
    pub tag_separator: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            component: "성분".to_string(),
            amount: "함유량".to_string(),
            tag: "*".to_string(),
            tag_separator: "|".to_string(),
        }
    }
}
