use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::compare::{Comparison, ComparisonGroup, Filter, GroupSummary};
use crate::scoring::{Ranking, ScoreBreakdown};

const EMPTY_RANKING: &str = "No entities found.";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a 0-100 score with one decimal ("87.3")
pub fn format_score(score: f64) -> String {
    format!("{:.1}", score)
}

/// Format an optional number compactly: integers without decimals, others
/// with up to two, missing as "-"
pub fn format_value(value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
        Some(v) => {
            let s = format!("{:.2}", v);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
pub fn truncate_title(title: &str, max_width: usize) -> String {
    let chars: Vec<char> = title.chars().collect();
    if chars.len() <= max_width {
        title.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn pad_right(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// Format a ranking as a table:
/// Index, Final, A, B, C, Market, Brand, Identifier
///
/// Index column: 3 chars (fits "99."), right-aligned.
/// Score columns are right-aligned, 6 chars wide (fits "100.0").
pub fn format_ranking_table(rows: &[ScoreBreakdown], use_colors: bool) -> String {
    if rows.is_empty() {
        return EMPTY_RANKING.to_string();
    }

    let term_width = get_terminal_width();

    let index_width = 3;
    let score_width = 6;
    let brand_width = 12;
    let separator = "  ";
    let fixed_width = index_width + 1 + (score_width + separator.len()) * 5 + brand_width;

    let header = format!(
        "{:>index_width$} {:>w$}{sep}{:>w$}{sep}{:>w$}{sep}{:>w$}{sep}{:>w$}{sep}{}{}",
        "#",
        "Final",
        "A",
        "B",
        "C",
        "Market",
        pad_right("Brand", brand_width),
        "Identifier",
        index_width = index_width,
        w = score_width,
        sep = separator,
    );

    let mut lines = vec![if use_colors {
        header.dimmed().to_string()
    } else {
        header
    }];

    for (idx, row) in rows.iter().enumerate() {
        let index_str = format!("{:>2}.", idx + 1);
        let score = |v: f64| format!("{:>width$}", format_score(v), width = score_width);

        let brand = pad_right(
            &truncate_title(row.brand.as_deref().unwrap_or("-"), brand_width),
            brand_width,
        );

        let identifier = match term_width {
            Some(width) if width > fixed_width + 10 => {
                truncate_title(&row.identifier, width - fixed_width)
            }
            // Very narrow terminal, show truncated
            Some(_) => truncate_title(&row.identifier, 20),
            // No terminal (pipe), don't truncate
            None => row.identifier.clone(),
        };

        let subs = [row.score_a, row.score_b, row.score_c, row.market_score]
            .iter()
            .map(|v| score(*v))
            .collect::<Vec<_>>()
            .join(separator);

        let line = if use_colors {
            format!(
                "{} {}{}{}{}{}",
                index_str.dimmed(),
                score(row.final_score).bold(),
                separator,
                subs,
                separator,
                format!("{}{}", brand.yellow(), identifier)
            )
        } else {
            format!(
                "{} {}{}{}{}{}{}",
                index_str,
                score(row.final_score),
                separator,
                subs,
                separator,
                brand,
                identifier
            )
        };
        lines.push(line);
    }

    lines.join("\n")
}

/// Format a ranking as tab-separated values for scripting, with a header
/// row and one column per component contribution (no colors)
pub fn format_tsv(ranking: &Ranking) -> String {
    let mut header: Vec<String> = [
        "identifier",
        "brand",
        "final",
        "score_a",
        "score_b",
        "score_c",
        "market",
        "score_c1",
        "score_c2",
        "price",
        "review_count",
        "rating",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    header.extend(ranking.contribution_labels());

    let mut lines = vec![header.join("\t")];
    for row in &ranking.rows {
        let optional = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        let mut fields = vec![
            tsv_field(&row.identifier),
            tsv_field(row.brand.as_deref().unwrap_or("")),
            format!("{:.4}", row.final_score),
            format!("{:.4}", row.score_a),
            format!("{:.4}", row.score_b),
            format!("{:.4}", row.score_c),
            format!("{:.4}", row.market_score),
            format!("{:.4}", row.score_c1),
            format!("{:.4}", row.score_c2),
            optional(row.price),
            optional(row.review_count),
            optional(row.rating),
        ];
        fields.extend(row.contributions.iter().map(|c| format!("{:.4}", c.value)));
        lines.push(fields.join("\t"));
    }

    lines.join("\n")
}

fn tsv_field(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}

/// Format a ranking as pretty-printed JSON
pub fn format_json(ranking: &Ranking) -> serde_json::Result<String> {
    serde_json::to_string_pretty(ranking)
}

fn format_summary(summary: &GroupSummary) -> String {
    let mean = |v: Option<f64>| v.map(format_score).unwrap_or_else(|| "-".to_string());
    format!(
        "{} entities, mean price {}, mean market {}",
        summary.count,
        mean(summary.mean_price),
        mean(summary.mean_market)
    )
}

fn format_group(
    label: &str,
    filters: Option<&[Filter]>,
    group: &ComparisonGroup,
    use_colors: bool,
) -> String {
    let filter_text = match filters {
        Some(filters) if !filters.is_empty() => filters
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(" & "),
        Some(_) => "(all)".to_string(),
        None => "(rest)".to_string(),
    };

    let title = format!("Group {}: {}", label, filter_text);
    let mut lines = vec![if use_colors {
        title.bold().to_string()
    } else {
        title
    }];
    lines.push(format!("  {}", format_summary(&group.summary)));

    for (idx, row) in group.rows.iter().enumerate() {
        let entity = &row.entity;
        lines.push(format!(
            "{:>4}. {:>6}  {:>10}  {}{}",
            idx + 1,
            format_score(row.market_score),
            format_value(entity.price),
            entity
                .brand
                .as_deref()
                .map(|b| format!("[{}] ", b))
                .unwrap_or_default(),
            entity.identifier
        ));
    }

    lines.join("\n")
}

/// Format an A/B comparison: a summary line per group, then its rows
/// (index, market score, price, brand, identifier)
pub fn format_comparison(
    comparison: &Comparison,
    a: &[Filter],
    b: Option<&[Filter]>,
    use_colors: bool,
) -> String {
    [
        format_group("A", Some(a), &comparison.a, use_colors),
        format_group("B", b, &comparison.b, use_colors),
    ]
    .join("\n\n")
}
