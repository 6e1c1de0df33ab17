use gliderproc_core::recipe::{CorrectionRecipe, CorrectionToken};

#[test]
fn recipe_parses_tokens_in_order() {
    let recipe = CorrectionRecipe::parse("T_C_TH");
    assert_eq!(
        recipe.tokens(),
        &[
            CorrectionToken::SensorLagTemperature,
            CorrectionToken::SensorLagConductivity,
            CorrectionToken::ThermalLag,
        ]
    );
    assert!(recipe.removals().is_empty());
}

#[test]
fn unknown_tokens_are_ignored() {
    let recipe = CorrectionRecipe::parse("T_X_TH");
    assert_eq!(
        recipe.tokens(),
        &[
            CorrectionToken::SensorLagTemperature,
            CorrectionToken::ThermalLag,
        ]
    );
}

#[test]
fn duplicate_tokens_collapse() {
    let recipe = CorrectionRecipe::parse("T_T_C");
    assert_eq!(
        recipe.tokens(),
        &[
            CorrectionToken::SensorLagTemperature,
            CorrectionToken::SensorLagConductivity,
        ]
    );
}

#[test]
fn empty_spec_yields_empty_recipe() {
    assert!(CorrectionRecipe::parse("").is_empty());
    assert!(CorrectionRecipe::parse("__").is_empty());
}

#[test]
fn dropping_a_token_records_the_reason() {
    let mut recipe = CorrectionRecipe::parse("T_TH");
    recipe.drop_token(CorrectionToken::ThermalLag, "pressure is unavailable");

    assert!(!recipe.contains(CorrectionToken::ThermalLag));
    assert!(recipe.contains(CorrectionToken::SensorLagTemperature));
    assert_eq!(recipe.removals().len(), 1);
    assert_eq!(recipe.removals()[0].token, CorrectionToken::ThermalLag);
    assert_eq!(recipe.removals()[0].reason, "pressure is unavailable");
}

#[test]
fn dropping_an_absent_token_is_a_no_op() {
    let mut recipe = CorrectionRecipe::parse("T");
    recipe.drop_token(CorrectionToken::ThermalLag, "whatever");
    assert!(recipe.removals().is_empty());
    assert_eq!(recipe.tokens().len(), 1);
}
