//! Verification gate state machine.
//!
//! ```text
//! Locked(type) --submit ok--> ShowingInstructions --continue--> Unlocked
//!      |                                                           ^
//!      +---------------- submit ok (no instructions) --------------+
//! ```
//!
//! `restart` returns to the initial state from anywhere. A storefront whose
//! verification type is `none` starts (and restarts) `Unlocked`.
//!
//! The stored password never leaves the server: submissions are checked
//! through [`PasswordCheck`] against an argon2 hash.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storecraft_core::VerificationType;

/// Button label while instructions are still to come.
pub const NEXT_LABEL: &str = "Next";
/// Button label when passing the gate shows the content directly.
pub const ENTER_LABEL: &str = "Enter Site";

/// Why a gate submission was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Please confirm your age")]
    AgeNotConfirmed,
    #[error("Incorrect password")]
    IncorrectPassword,
}

/// Where a visitor is in the gate flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "verification_type", rename_all = "snake_case")]
pub enum GateState {
    Locked(VerificationType),
    ShowingInstructions,
    Unlocked,
}

/// What the visitor entered on the gate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    #[serde(default, deserialize_with = "checkbox")]
    pub age_confirmed: bool,
    #[serde(default)]
    pub password: Option<String>,
}

/// HTML checkboxes post `on` (or nothing); JSON clients post booleans.
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Checkbox {
        Bool(bool),
        Text(String),
    }

    Ok(match Checkbox::deserialize(deserializer)? {
        Checkbox::Bool(b) => b,
        Checkbox::Text(s) => matches!(s.as_str(), "on" | "true" | "1" | "yes"),
    })
}

/// Compares a submitted password with the stored secret.
pub trait PasswordCheck {
    /// Whether `candidate` is the storefront password.
    fn matches(&self, candidate: &str) -> bool;
}

impl<F> PasswordCheck for F
where
    F: Fn(&str) -> bool,
{
    fn matches(&self, candidate: &str) -> bool {
        self(candidate)
    }
}

/// Checks against an argon2 PHC hash. A storefront with no stored hash
/// accepts no password.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Check<'a> {
    hash: Option<&'a str>,
}

impl<'a> Argon2Check<'a> {
    #[must_use]
    pub const fn new(hash: Option<&'a str>) -> Self {
        Self { hash }
    }
}

impl PasswordCheck for Argon2Check<'_> {
    fn matches(&self, candidate: &str) -> bool {
        let Some(hash) = self.hash else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::error!("Stored gate password hash is malformed");
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Hash a gate password using Argon2id.
///
/// # Errors
///
/// Returns the underlying hashing error.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

/// Gate for one visitor on one storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    verification_type: VerificationType,
    instructions_enabled: bool,
    state: GateState,
}

impl Gate {
    /// A fresh gate in its initial state.
    #[must_use]
    pub const fn new(verification_type: VerificationType, instructions_enabled: bool) -> Self {
        Self {
            verification_type,
            instructions_enabled,
            state: Self::initial_state(verification_type),
        }
    }

    /// Rebuild a gate from session state.
    ///
    /// Stored state that no longer fits the storefront (its verification type
    /// changed, or instructions were switched off) is discarded.
    #[must_use]
    pub fn resume(
        verification_type: VerificationType,
        instructions_enabled: bool,
        stored: Option<StoredGate>,
    ) -> Self {
        let mut gate = Self::new(verification_type, instructions_enabled);
        let Some(stored) = stored else {
            return gate;
        };
        if stored.verification_type != verification_type || !verification_type.is_gated() {
            return gate;
        }
        gate.state = match stored.state {
            GateState::ShowingInstructions if !instructions_enabled => GateState::Unlocked,
            GateState::Locked(_) => gate.state,
            other => other,
        };
        gate
    }

    const fn initial_state(verification_type: VerificationType) -> GateState {
        if verification_type.is_gated() {
            GateState::Locked(verification_type)
        } else {
            GateState::Unlocked
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }

    /// Session representation of this gate.
    #[must_use]
    pub const fn to_stored(&self) -> StoredGate {
        StoredGate {
            verification_type: self.verification_type,
            state: self.state,
        }
    }

    /// Check a submission from the locked state.
    ///
    /// Age is checked before the password. On success the gate moves to the
    /// instructions when they are enabled, otherwise straight to the content.
    /// Submitting when not locked changes nothing.
    ///
    /// # Errors
    ///
    /// Returns the first failed requirement; the gate stays locked.
    pub fn submit(
        &mut self,
        submission: &Submission,
        password_check: &impl PasswordCheck,
    ) -> Result<GateState, GateError> {
        let GateState::Locked(kind) = self.state else {
            return Ok(self.state);
        };

        if kind.requires_age() && !submission.age_confirmed {
            return Err(GateError::AgeNotConfirmed);
        }
        if kind.requires_password() {
            let candidate = submission.password.as_deref().unwrap_or_default();
            if !password_check.matches(candidate) {
                return Err(GateError::IncorrectPassword);
            }
        }

        self.state = if self.instructions_enabled {
            GateState::ShowingInstructions
        } else {
            GateState::Unlocked
        };
        Ok(self.state)
    }

    /// Dismiss the instructions overlay.
    pub const fn continue_to_content(&mut self) -> GateState {
        if matches!(self.state, GateState::ShowingInstructions) {
            self.state = GateState::Unlocked;
        }
        self.state
    }

    /// Start the verification over.
    pub const fn restart(&mut self) -> GateState {
        self.state = Self::initial_state(self.verification_type);
        self.state
    }

    /// Label of the gate's submit button.
    #[must_use]
    pub const fn submit_label(&self) -> &'static str {
        if self.instructions_enabled {
            NEXT_LABEL
        } else {
            ENTER_LABEL
        }
    }
}

/// Gate progress as kept in the visitor's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGate {
    pub verification_type: VerificationType,
    pub state: GateState,
}
