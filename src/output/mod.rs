pub mod formatter;

pub use formatter::{
    format_comparison, format_json, format_ranking_table, format_score, format_tsv, format_value,
    should_use_colors, truncate_title,
};
