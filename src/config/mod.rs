mod schema;

pub use schema::{
    ColumnMapping, ComponentGroup, ComponentRule, FinalWeights, MarketParams, Markers, PriceRule,
    RuleBook, SubWeights, TagGroup,
};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/dose-rank/)
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".config").join("dose-rank"))
        .unwrap_or_else(|| PathBuf::from(".dose-rank"))
}

/// Get the default rule book path (~/.config/dose-rank/rulebook.yaml)
pub fn get_rule_book_path() -> PathBuf {
    get_config_dir().join("rulebook.yaml")
}

/// Ensure the parent directory of `path` exists
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Load a rule book from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to the rule book. If None, uses the default path
///   (~/.config/dose-rank/rulebook.yaml).
///
/// Returns `Ok(None)` when no path was given and the default file does not
/// exist, so the caller can fall back to discovered rules.
///
/// # Errors
///
/// Returns an error if:
/// - An explicit path was given and the file does not exist
/// - The file cannot be read
/// - The YAML cannot be parsed
pub fn load_rule_book(path: Option<PathBuf>) -> Result<Option<RuleBook>> {
    let explicit = path.is_some();
    let rule_book_path = path.unwrap_or_else(get_rule_book_path);

    if !rule_book_path.exists() {
        if explicit {
            anyhow::bail!("Rule book not found at {}", rule_book_path.display());
        }
        return Ok(None);
    }

    let content = fs::read_to_string(&rule_book_path).with_context(|| {
        format!("Failed to read rule book at {}", rule_book_path.display())
    })?;

    let rules = parse_rule_book(&content).with_context(|| {
        format!("Failed to parse rule book: invalid YAML in {}", rule_book_path.display())
    })?;

    Ok(Some(rules))
}

pub fn parse_rule_book(yaml: &str) -> Result<RuleBook> {
    serde_saphyr::from_str(yaml).map_err(|e| anyhow::anyhow!("{}", e))
}

pub fn rule_book_to_yaml(rules: &RuleBook) -> Result<String> {
    serde_saphyr::to_string(rules).map_err(|e| anyhow::anyhow!("Failed to serialize rule book: {}", e))
}

/// Save a rule book as YAML, atomically.
pub fn save_rule_book(path: &Path, rules: &RuleBook) -> Result<()> {
    let yaml = rule_book_to_yaml(rules)?;

    ensure_parent_dir(path)?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .context("Failed to write rule book")?;
    file.commit().context("Failed to save rule book")?;

    Ok(())
}
