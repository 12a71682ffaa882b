use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::RuleBook;
use crate::model::RawTable;
use crate::scoring::Ranking;

/// Configuration for ranking result caching
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool, // false when --no-cache
}

/// Get the platform-appropriate cache directory for dose-rank
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("dose-rank/results"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/dose-rank/results",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Clear the result cache directory
pub fn clear_cache() -> Result<()> {
    clear_cache_at(&get_cache_path())
}

pub fn clear_cache_at(cache_path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// Content hash of (input table, rule book).
///
/// Any change to either yields a new key, so entries are never overwritten
/// with different results. The crate version is mixed in so a release that
/// changes scoring does not serve stale rankings.
pub fn cache_key(table: &RawTable, rules: &RuleBook) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(env!("CARGO_PKG_VERSION").as_bytes());
    hasher.update(b"\0");
    hasher.update(serde_json::to_vec(table).context("Failed to hash input table")?);
    hasher.update(b"\0");
    hasher.update(serde_json::to_vec(rules).context("Failed to hash rule book")?);
    Ok(format!("ranking:{:x}", hasher.finalize()))
}

/// Read a cached ranking; any read or decode failure is a miss.
pub fn read_cached_ranking(cache_path: &Path, key: &str) -> Option<Ranking> {
    let bytes = cacache::read_sync(cache_path, key).ok()?;
    let ranking = serde_json::from_slice(&bytes).ok();
    debug!(key, hit = ranking.is_some(), "result cache lookup");
    ranking
}

/// Write a ranking to the cache
pub fn write_cached_ranking(cache_path: &Path, key: &str, ranking: &Ranking) -> Result<()> {
    let json = serde_json::to_vec(ranking)?;
    cacache::write_sync(cache_path, key, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreBreakdown;
    use std::env;

    fn table(price: &str) -> RawTable {
        let mut table = RawTable::new(vec!["제품명".to_string(), "1일 섭취량당 가격".to_string()]);
        table.push_row(&[Some("A"), Some(price)]);
        table
    }

    fn ranking() -> Ranking {
        Ranking {
            rows: vec![ScoreBreakdown {
                identifier: "A".to_string(),
                brand: None,
                price: Some(100.0),
                review_count: None,
                rating: None,
                final_score: 15.0,
                score_a: 0.0,
                score_b: 50.0,
                score_c: 0.0,
                market_score: 50.0,
                score_c1: 0.0,
                score_c2: 0.0,
                contributions: vec![],
            }],
        }
    }

    #[test]
    fn test_cache_key_is_stable() {
        let rules = RuleBook::default();
        assert_eq!(
            cache_key(&table("100"), &rules).unwrap(),
            cache_key(&table("100"), &rules.clone()).unwrap()
        );
    }

    #[test]
    fn test_cache_key_changes_with_inputs() {
        let rules = RuleBook::default();
        let base = cache_key(&table("100"), &rules).unwrap();
        assert_ne!(base, cache_key(&table("200"), &rules).unwrap());

        let mut changed = rules.clone();
        changed.price.steepness = 2.0;
        assert_ne!(base, cache_key(&table("100"), &changed).unwrap());
    }

    #[test]
    fn test_write_then_read() {
        let cache_path = env::temp_dir().join("dose_rank_test_result_cache");
        let _ = clear_cache_at(&cache_path);

        let key = cache_key(&table("100"), &RuleBook::default()).unwrap();
        assert!(read_cached_ranking(&cache_path, &key).is_none());

        write_cached_ranking(&cache_path, &key, &ranking()).unwrap();
        assert_eq!(read_cached_ranking(&cache_path, &key), Some(ranking()));

        clear_cache_at(&cache_path).unwrap();
        assert!(read_cached_ranking(&cache_path, &key).is_none());
    }

    #[test]
    fn test_cached_pipeline_ranking_is_bit_identical() {
        let mut table = RawTable::new(
            ["제품명", "1일 섭취량당 가격", "리뷰 개수", "리뷰 별점", "핵심성분명태그"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
        );
        for i in 0..200u32 {
            let id = format!("P{}", i);
            let price = format!("{}", 1000 + (i * 7919) % 30011);
            let reviews = format!("{}", (i * 104729) % 5003);
            let rating = format!("{:.1}", 1.0 + f64::from(i % 41) / 10.0);
            let listing = format!("성분:EPA,함유량:{}", 100 + (i * 331) % 1700);
            table.push_row(&[Some(&id), Some(&price), Some(&reviews), Some(&rating), Some(&listing)]);
        }

        let mut rules = RuleBook::default();
        rules.columns.brand = None;
        rules
            .primary
            .rules
            .insert("EPA".to_string(), crate::config::ComponentRule::primary_default());
        let fresh = crate::scoring::run_pipeline(&table, &rules).unwrap();

        let cache_path = env::temp_dir().join("dose_rank_test_bit_identical_cache");
        let _ = clear_cache_at(&cache_path);
        let key = cache_key(&table, &rules).unwrap();
        write_cached_ranking(&cache_path, &key, &fresh).unwrap();
        let cached = read_cached_ranking(&cache_path, &key).unwrap();
        let _ = clear_cache_at(&cache_path);

        assert_eq!(cached.len(), fresh.len());
        for (a, b) in fresh.rows.iter().zip(&cached.rows) {
            assert_eq!(a.identifier, b.identifier);
            for (x, y) in [
                (a.final_score, b.final_score),
                (a.score_a, b.score_a),
                (a.score_b, b.score_b),
                (a.score_c, b.score_c),
                (a.market_score, b.market_score),
            ] {
                assert_eq!(x.to_bits(), y.to_bits());
            }
            for (x, y) in a.contributions.iter().zip(&b.contributions) {
                assert_eq!(x.value.to_bits(), y.value.to_bits());
            }
        }
        assert_eq!(cached, fresh);
    }

    #[test]
    fn test_clear_missing_dir_is_ok() {
        let cache_path = env::temp_dir().join("dose_rank_test_never_created_cache");
        let _ = std::fs::remove_dir_all(&cache_path);
        assert!(clear_cache_at(&cache_path).is_ok());
    }
}
