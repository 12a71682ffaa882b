//! Dose extraction from component listings such as
//! `"성분 : EPA, 함유량 : 690"`.
//!
//! The listing grammar, after all whitespace is removed, full-width digits
//! are folded to ASCII and letters are case-folded:
//!
//! ```text
//! listing := COMPONENT ':' NAME rest ',' AMOUNT ':' number
//! rest    := any characters except ','
//! number  := [0-9.]+
//! ```
//!
//! `NAME` is matched literally, so names containing punctuation such as
//! `EPA+DHA` or `B(1)` need no escaping.

use crate::config::Markers;

/// Literal markers of the dose grammar, normalised for matching.
#[derive(Debug, Clone)]
pub struct DosePattern {
    component_marker: String,
    amount_marker: String,
}

impl DosePattern {
    pub fn new(component_marker: &str, amount_marker: &str) -> Self {
        Self {
            component_marker: normalize(component_marker),
            amount_marker: normalize(amount_marker),
        }
    }

    pub fn from_markers(markers: &Markers) -> Self {
        Self::new(&markers.component, &markers.amount)
    }

    /// First structural match for `component` in `text`, returned as the raw
    /// numeric substring. Every occurrence of the component marker is tried in
    /// order until one completes the grammar.
    pub fn find_amount(&self, text: &str, component: &str) -> Option<String> {
        let text = normalize(text);
        let name = normalize(component);

        match_positions(&text, &self.component_marker)
            .into_iter()
            .find_map(|at| self.match_at(&text[at + self.component_marker.len()..], &name))
            .map(str::to_string)
    }

    fn match_at<'t>(&self, rest: &'t str, name: &str) -> Option<&'t str> {
        let rest = rest.strip_prefix(':')?;
        let rest = rest.strip_prefix(name)?;
        let (_, rest) = rest.split_once(',')?;
        let rest = rest.strip_prefix(self.amount_marker.as_str())?;
        let rest = rest.strip_prefix(':')?;

        let end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        Some(&rest[..end])
    }

    /// Extract the dose of `component` across `texts`.
    ///
    /// Texts are scanned in order and the first structural match wins. A
    /// match whose number does not parse (e.g. `1.2.3`) is skipped and
    /// scanning moves on to the next text.
    pub fn extract<'a, I>(&self, texts: I, component: &str) -> Option<f64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().find_map(|text| {
            self.find_amount(text, component)
                .and_then(|raw| raw.parse::<f64>().ok())
        })
    }
}

impl Default for DosePattern {
    fn default() -> Self {
        Self::from_markers(&Markers::default())
    }
}

/// Convenience wrapper over [`DosePattern::extract`].
pub fn extract_dose<'a, I>(texts: I, component: &str, markers: &Markers) -> Option<f64>
where
    I: IntoIterator<Item = &'a str>,
{
    DosePattern::from_markers(markers).extract(texts, component)
}

/// Strip every whitespace character, fold full-width digits and lowercase
/// the rest.
pub(crate) fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(fold_digit)
        .collect::<String>()
        .to_lowercase()
}

/// Map a full-width digit (`０`..`９`) to its ASCII form.
pub(crate) fn fold_digit(c: char) -> char {
    match c {
        '０'..='９' => char::from_digit(c as u32 - '０' as u32, 10).unwrap_or(c),
        _ => c,
    }
}

/// Byte offsets of every (possibly overlapping) occurrence of `needle`.
pub(crate) fn match_positions(haystack: &str, needle: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut from = 0;

    while from <= haystack.len() {
        let Some(offset) = haystack[from..].find(needle) else {
            break;
        };
        let at = from + offset;
        positions.push(at);
        from = at + haystack[at..].chars().next().map_or(1, char::len_utf8);
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> DosePattern {
        DosePattern::default()
    }

    #[test]
    fn test_basic_listing() {
        let dose = pattern().extract(["성분:EPA,함유량:690"], "EPA");
        assert_eq!(dose, Some(690.0));
    }

    #[test]
    fn test_whitespace_ignored() {
        let dose = pattern().extract(["성분 : EPA , 함유량 : 6 90.5"], "EPA");
        assert_eq!(dose, Some(690.5));
    }

    #[test]
    fn test_case_insensitive_name() {
        let dose = pattern().extract(["성분:Vitamin D,함유량:25"], "vitamind");
        assert_eq!(dose, Some(25.0));
    }

    #[test]
    fn test_name_metacharacters_are_literal() {
        let texts = ["성분:EPA+DHA,함유량:900", "성분:EPAADHA,함유량:1"];
        assert_eq!(pattern().extract(texts, "EPA+DHA"), Some(900.0));
        assert_eq!(pattern().extract(["성분:B(1),함유량:2.5"], "B(1)"), Some(2.5));
    }

    #[test]
    fn test_characters_between_name_and_separator() {
        let dose = pattern().extract(["성분:EPA(rTG형),함유량:400"], "EPA");
        assert_eq!(dose, Some(400.0));
    }

    #[test]
    fn test_later_listing_in_same_text() {
        let text = "성분:DHA,함유량:300,성분:EPA,함유량:690";
        assert_eq!(pattern().extract([text], "EPA"), Some(690.0));
        assert_eq!(pattern().extract([text], "DHA"), Some(300.0));
    }

    #[test]
    fn test_first_text_wins() {
        let texts = ["성분:EPA,함유량:500", "성분:EPA,함유량:900"];
        assert_eq!(pattern().extract(texts, "EPA"), Some(500.0));
    }

    #[test]
    fn test_unparseable_number_moves_to_next_text() {
        let texts = ["성분:EPA,함유량:1.2.3", "성분:EPA,함유량:700"];
        assert_eq!(pattern().extract(texts, "EPA"), Some(700.0));
    }

    #[test]
    fn test_full_width_digits() {
        let dose = pattern().extract(["성분:EPA,함유량:６９０.５"], "EPA");
        assert_eq!(dose, Some(690.5));
        assert_eq!(fold_digit('７'), '7');
        assert_eq!(fold_digit('a'), 'a');
    }

    #[test]
    fn test_no_match_is_missing() {
        assert_eq!(pattern().extract(["성분:DHA,함유량:300"], "EPA"), None);
        assert_eq!(pattern().extract(["성분:EPA"], "EPA"), None);
        assert_eq!(pattern().extract(["성분:EPA,함유량:"], "EPA"), None);
        assert_eq!(pattern().extract(Vec::<&str>::new(), "EPA"), None);
    }

    #[test]
    fn test_custom_markers() {
        let markers = Markers {
            component: "Ingredient".to_string(),
            amount: "Amount".to_string(),
            ..Markers::default()
        };
        let dose = extract_dose(["ingredient: Zinc, amount: 15"], "zinc", &markers);
        assert_eq!(dose, Some(15.0));
    }

    #[test]
    fn test_match_positions_overlapping() {
        assert_eq!(match_positions("aaa", "aa"), vec![0, 1]);
        assert_eq!(match_positions("성분성분", "성분"), vec![0, 6]);
        assert!(match_positions("abc", "x").is_empty());
    }
}
