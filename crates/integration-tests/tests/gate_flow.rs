//! Verification gate behavior across the gate, preview and route layers.

#![allow(clippy::unwrap_used)]

use storecraft_core::VerificationType;
use storecraft_integration_tests::storefront;
use storecraft_server::routes::storefronts::{ForcedState, preview_state};
use storecraft_server::services::catalog::CatalogQuery;
use storecraft_server::services::gate::{
    Argon2Check, Gate, GateError, GateState, Submission, hash_password,
};
use storecraft_server::services::preview::{PageBody, PreviewPage, ViewOptions};

fn submission(age: bool, password: Option<&str>) -> Submission {
    Submission {
        age_confirmed: age,
        password: password.map(str::to_owned),
    }
}

// =============================================================================
// No verification
// =============================================================================

#[test]
fn test_ungated_storefront_never_renders_prompt() {
    let sf = storefront(VerificationType::None, true);
    let mut gate = Gate::new(VerificationType::None, true);
    assert_eq!(gate.state(), GateState::Unlocked);
    assert_eq!(gate.restart(), GateState::Unlocked);

    let page = PreviewPage::derive(
        &sf,
        gate.state(),
        &[],
        &CatalogQuery::default(),
        ViewOptions::default(),
    );
    assert!(matches!(page.body, PageBody::Content { .. }));
    assert_eq!(preview_state(&sf, None), GateState::Unlocked);
}

// =============================================================================
// Age + password
// =============================================================================

#[test]
fn test_both_requires_age_and_password() {
    let hash = hash_password("letmein").unwrap();
    let check = Argon2Check::new(Some(&hash));
    let mut gate = Gate::new(VerificationType::Both, true);

    // Age error wins when both are wrong
    assert_eq!(
        gate.submit(&submission(false, Some("nope")), &check),
        Err(GateError::AgeNotConfirmed)
    );
    assert_eq!(
        gate.submit(&submission(false, Some("letmein")), &check),
        Err(GateError::AgeNotConfirmed)
    );
    assert_eq!(
        gate.submit(&submission(true, Some("nope")), &check),
        Err(GateError::IncorrectPassword)
    );
    assert_eq!(
        gate.submit(&submission(true, None), &check),
        Err(GateError::IncorrectPassword)
    );
    assert_eq!(gate.state(), GateState::Locked(VerificationType::Both));

    assert_eq!(
        gate.submit(&submission(true, Some("letmein")), &check),
        Ok(GateState::ShowingInstructions)
    );
    assert_eq!(gate.continue_to_content(), GateState::Unlocked);
    assert_eq!(gate.restart(), GateState::Locked(VerificationType::Both));
}

#[test]
fn test_password_match_is_exact() {
    let hash = hash_password("letmein").unwrap();
    let check = Argon2Check::new(Some(&hash));
    let mut gate = Gate::new(VerificationType::Password, false);

    for wrong in ["LETMEIN", "letmein ", " letmein", ""] {
        assert_eq!(
            gate.submit(&submission(false, Some(wrong)), &check),
            Err(GateError::IncorrectPassword),
            "{wrong:?} must not unlock"
        );
    }
    assert_eq!(
        gate.submit(&submission(false, Some("letmein")), &check),
        Ok(GateState::Unlocked)
    );
}

#[test]
fn test_missing_hash_accepts_nothing() {
    let mut gate = Gate::new(VerificationType::Password, false);
    assert_eq!(
        gate.submit(&submission(false, Some("anything")), &Argon2Check::new(None)),
        Err(GateError::IncorrectPassword)
    );
}

#[test]
fn test_html_checkbox_value_confirms_age() {
    let form: Submission = serde_json::from_str(r#"{"age_confirmed":"on"}"#).unwrap();
    let mut gate = Gate::new(VerificationType::Age, false);
    assert_eq!(
        gate.submit(&form, &Argon2Check::new(None)),
        Ok(GateState::Unlocked)
    );
}

// =============================================================================
// Session resume
// =============================================================================

#[test]
fn test_progress_is_dropped_when_gate_type_changes() {
    let hash = hash_password("letmein").unwrap();
    let mut gate = Gate::new(VerificationType::Password, false);
    gate.submit(&submission(false, Some("letmein")), &Argon2Check::new(Some(&hash)))
        .unwrap();
    let stored = gate.to_stored();

    let same = Gate::resume(VerificationType::Password, false, Some(stored));
    assert_eq!(same.state(), GateState::Unlocked);

    let changed = Gate::resume(VerificationType::Both, false, Some(stored));
    assert_eq!(changed.state(), GateState::Locked(VerificationType::Both));
}

#[test]
fn test_builder_can_force_preview_states() {
    let sf = storefront(VerificationType::Age, true);
    assert_eq!(
        preview_state(&sf, None),
        GateState::Locked(VerificationType::Age)
    );
    assert_eq!(
        preview_state(&sf, Some(ForcedState::Instructions)),
        GateState::ShowingInstructions
    );
    assert_eq!(
        preview_state(&sf, Some(ForcedState::Unlocked)),
        GateState::Unlocked
    );
}
