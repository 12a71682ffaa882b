use crate::config::{ComponentGroup, RuleBook};

/// Lint a rule book for degenerate-but-valid settings.
/// Returns all findings at once (not just the first).
///
/// Nothing reported here stops the pipeline from running; each case has a
/// neutral fallback. Callers decide whether to warn or abort.
pub fn validate_rule_book(rules: &RuleBook) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let fw = &rules.final_weights;
    check_weights(
        &mut errors,
        "final_weights",
        &[("components", fw.components), ("price", fw.price), ("secondary", fw.secondary)],
    );

    let sw = &rules.sub_weights;
    check_weights(
        &mut errors,
        "sub_weights",
        &[("secondary_curve", sw.secondary_curve), ("tags", sw.tags)],
    );

    let market = &rules.market;
    check_weights(
        &mut errors,
        "market",
        &[("weight_review", market.weight_review), ("weight_rating", market.weight_rating)],
    );
    if market.steepness_review <= 0.0 {
        errors.push("market.steepness_review: must be positive".to_string());
    }
    if market.steepness_rating <= 0.0 {
        errors.push("market.steepness_rating: must be positive".to_string());
    }

    if rules.price.steepness <= 0.0 {
        errors.push("price.steepness: must be positive".to_string());
    }

    check_group(&mut errors, "primary", &rules.primary);
    check_group(&mut errors, "secondary", &rules.secondary);

    for (tag, score) in &rules.tags.scores {
        if tag.trim().is_empty() && *score != 0.0 {
            errors.push("tags.scores: blank tag name is ignored".to_string());
        }
    }

    let markers = &rules.markers;
    for (field, value) in [
        ("component", &markers.component),
        ("amount", &markers.amount),
        ("tag", &markers.tag),
        ("tag_separator", &markers.tag_separator),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("markers.{}: must not be empty", field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_weights(errors: &mut Vec<String>, section: &str, weights: &[(&str, f64)]) {
    for (name, weight) in weights {
        if *weight < 0.0 {
            errors.push(format!("{}.{}: must be non-negative", section, name));
        }
    }
    if weights.iter().map(|(_, w)| w).sum::<f64>() == 0.0 {
        errors.push(format!(
            "{}: weights sum to 0, every blended score falls back to 0",
            section
        ));
    }
}

fn check_group(errors: &mut Vec<String>, section: &str, group: &ComponentGroup) {
    if !group.rules.is_empty() && group.column.trim().is_empty() {
        errors.push(format!("{}.column: no component column configured", section));
    }

    for (name, rule) in &group.rules {
        let path = format!("{}.rules.{}", section, name);

        if rule.weight < 0.0 {
            errors.push(format!("{}.weight: must be non-negative", path));
        }
        if rule.saturation_factor < 0.0 {
            errors.push(format!("{}.saturation_factor: must be non-negative", path));
        }
        if rule.rec_dose == rule.min_dose {
            errors.push(format!(
                "{}.rec_dose: equals min_dose ({}), the ramp collapses to a step",
                path, rule.min_dose
            ));
        } else if rule.rec_dose == 0.0 {
            errors.push(format!("{}.rec_dose: is 0, saturation is immediate", path));
        } else if rule.rec_dose < rule.min_dose {
            errors.push(format!(
                "{}.rec_dose: {} is below min_dose {}",
                path, rule.rec_dose, rule.min_dose
            ));
        }
        if !(0.0..=100.0).contains(&rule.rec_score) {
            errors.push(format!("{}.rec_score: must be within 0-100", path));
        }
    }

    if !group.rules.is_empty() && group.enabled_rules().next().is_none() {
        errors.push(format!(
            "{}: no enabled components, group scores 0 for every entity",
            section
        ));
    }
}
