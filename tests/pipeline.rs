use dose_rank::compare::{split_groups, validate_filter_attributes, Filter};
use dose_rank::config::{parse_rule_book, ComponentRule, RuleBook};
use dose_rank::discovery::scan_for_rules;
use dose_rank::input::read_table;
use dose_rank::scoring::{dose_response_score, prepare_comparison, run_pipeline};
use dose_rank::EngineError;

const CATALOG: &str = "\
제품명,브랜드,1일 섭취량당 가격,리뷰 개수,리뷰 별점,핵심성분명태그,보조성분명태그,특수태그
Omega-3 Plus,Acme,,,,\"성분:EPA,함유량:690\",,rTG*
,,\"12,000\",340,4.7,,\"성분:VitaminE,함유량:150\",
Krill Max,Sea,\"9,000\",80,4.2,\"성분 : EPA , 함유량 : 1200\",,IFOS*
Budget Fish,Acme,\"3,000\",1200,3.9,,,
";

const RULES: &str = r#"
primary:
  rules:
    EPA: { enabled: true, min_dose: 500, rec_dose: 1000, rec_score: 80, saturation_factor: 1.0, weight: 1.0 }
secondary:
  rules:
    VitaminE: { enabled: true, min_dose: 100, rec_dose: 200, rec_score: 70, saturation_factor: 0.5, weight: 1.0 }
tags:
  scores:
    rTG: 10
    IFOS: 0
"#;

#[test]
fn end_to_end_forward_filled_entity() {
    let table = read_table(CATALOG.as_bytes()).unwrap();
    let rules = parse_rule_book(RULES).unwrap();

    let ranking = run_pipeline(&table, &rules).unwrap();
    assert_eq!(ranking.len(), 3);

    let omega = ranking
        .rows
        .iter()
        .find(|r| r.identifier == "Omega-3 Plus")
        .unwrap();
    let expected = dose_response_score(Some(690.0), 500.0, 1000.0, 80.0, 1.0);
    assert_eq!(omega.score_a, expected);
    assert!(omega.score_a > 5.0 && omega.score_a < 80.0);
    assert_eq!(omega.price, Some(12000.0));
    assert_eq!(omega.review_count, Some(340.0));
    assert_eq!(omega.rating, Some(4.7));
    assert_eq!(omega.score_c2, 10.0);

    // IFOS is present on Krill Max but scored 0
    let krill = ranking
        .rows
        .iter()
        .find(|r| r.identifier == "Krill Max")
        .unwrap();
    assert_eq!(krill.score_c2, 0.0);

    for pair in ranking.rows.windows(2) {
        assert!(pair[0].final_score >= pair[1].final_score);
    }
    for row in &ranking.rows {
        for score in [row.final_score, row.score_a, row.score_b, row.score_c, row.market_score] {
            assert!((0.0..=100.0).contains(&score));
        }
    }
}

#[test]
fn identical_inputs_rank_identically() {
    let table = read_table(CATALOG.as_bytes()).unwrap();
    let rules = parse_rule_book(RULES).unwrap();

    let first = run_pipeline(&table, &rules).unwrap();
    let second = run_pipeline(&table.clone(), &parse_rule_book(RULES).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn mapped_brand_column_missing_is_reported() {
    let csv = "제품명,1일 섭취량당 가격\nA,100\n";
    let table = read_table(csv.as_bytes()).unwrap();

    let err = run_pipeline(&table, &RuleBook::default()).unwrap_err();
    assert!(err.is_configuration());
    match err {
        EngineError::Preprocess { source } => {
            assert!(matches!(*source, EngineError::MissingBrandColumn { .. }));
            assert!(source.to_string().contains("columns.brand"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn discovered_rules_rank_without_a_rule_book() {
    let table = read_table(CATALOG.as_bytes()).unwrap();
    let rules = scan_for_rules(&table, &RuleBook::default()).into_rule_book(RuleBook::default());

    assert_eq!(rules.primary.rules["EPA"], ComponentRule::primary_default());
    assert_eq!(rules.tags.scores.keys().collect::<Vec<_>>(), vec!["IFOS", "rTG"]);

    let ranking = run_pipeline(&table, &rules).unwrap();
    assert_eq!(ranking.len(), 3);
    // Krill Max has the largest EPA dose
    let best_a = ranking
        .rows
        .iter()
        .max_by(|x, y| x.score_a.total_cmp(&y.score_a))
        .unwrap();
    assert_eq!(best_a.identifier, "Krill Max");
}

#[test]
fn compare_epa_products_against_the_rest() {
    let table = read_table(CATALOG.as_bytes()).unwrap();
    let rules = parse_rule_book(RULES).unwrap();

    let rows = prepare_comparison(&table, &rules).unwrap();
    let a = vec![Filter::parse("dose:EPA=600..").unwrap()];
    let comparison = split_groups(rows, &a, None, &rules.markers);

    let group_a: Vec<&str> = comparison
        .a
        .rows
        .iter()
        .map(|r| r.entity.identifier.as_str())
        .collect();
    assert_eq!(group_a.len(), 2);
    assert!(group_a.contains(&"Omega-3 Plus"));
    assert!(group_a.contains(&"Krill Max"));
    assert_eq!(comparison.b.rows.len(), 1);
    assert_eq!(comparison.b.rows[0].entity.identifier, "Budget Fish");
    assert_eq!(comparison.b.summary.mean_price, Some(3000.0));
}

#[test]
fn brand_filter_by_column_name_with_discovered_rules() {
    let table = read_table(CATALOG.as_bytes()).unwrap();
    let rules = scan_for_rules(&table, &RuleBook::default()).into_rule_book(RuleBook::default());

    let by_column = vec![Filter::parse("cat:브랜드=Acme").unwrap()];
    let by_alias = vec![Filter::parse("cat:brand=Acme").unwrap()];
    assert!(validate_filter_attributes(&by_column, &rules.columns).is_ok());

    let rows = prepare_comparison(&table, &rules).unwrap();
    let column = split_groups(rows.clone(), &by_column, None, &rules.markers);
    let alias = split_groups(rows, &by_alias, None, &rules.markers);
    assert_eq!(column.a.rows.len(), 2);
    assert_eq!(column, alias);

    let unknown = vec![Filter::parse("cat:제조사=Acme").unwrap()];
    assert!(validate_filter_attributes(&unknown, &rules.columns).is_err());
}
