//! User profile domain models
//!
//! This module defines the per-user profile document cached by the auth
//! coordinator and stored in the hosted document database. Timestamps are
//! provider-specific on the wire and always `DateTime<Utc>` in memory; the
//! conversion happens in the infrastructure layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::ProviderIdentity;

/// Tracking goal selected during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Goal {
    TrackCycle,
    GetPregnant,
    TrackPregnancy,
    TrackPerimenopause,
}

impl Goal {
    /// Wire representation, matching the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::TrackCycle => "track-cycle",
            Goal::GetPregnant => "get-pregnant",
            Goal::TrackPregnancy => "track-pregnancy",
            Goal::TrackPerimenopause => "track-perimenopause",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "track-cycle" => Some(Goal::TrackCycle),
            "get-pregnant" => Some(Goal::GetPregnant),
            "track-pregnancy" => Some(Goal::TrackPregnancy),
            "track-perimenopause" => Some(Goal::TrackPerimenopause),
            _ => None,
        }
    }
}

/// Health conditions collected in the last onboarding step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthConditions {
    pub predefined: Vec<String>,
    pub custom: Vec<String>,
}

/// Per-user profile document.
///
/// `cycle_length` distinguishes "never answered" (`None`) from an explicit
/// "not sure" (`Some(None)`); `onboarding_step` is `-1` for the intro step,
/// `0..=4` for the data-collection steps, and `None` once onboarding is done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_period_start: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub cycle_length: Option<Option<u16>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_conditions: Option<HealthConditions>,
    #[serde(default)]
    pub completed_onboarding: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_step: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Default document created on the first successful authentication of an
    /// identity. The name falls back to the email local-part when the
    /// provider has no display name.
    pub fn bootstrap(identity: &ProviderIdentity) -> Self {
        let name = identity
            .display_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                identity
                    .email
                    .split('@')
                    .next()
                    .filter(|local| !local.is_empty())
                    .unwrap_or("User")
                    .to_string()
            });

        Self {
            id: identity.uid.clone(),
            email: identity.email.clone(),
            name,
            display_name: identity.display_name.clone(),
            photo_url: identity.photo_url.clone(),
            birthdate: None,
            last_period_start: None,
            cycle_length: None,
            goal: None,
            health_conditions: None,
            completed_onboarding: false,
            onboarding_step: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Merge a partial update into this profile. Unspecified fields are left
    /// untouched; this mirrors the store's merge-write semantics.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(display_name) = &update.display_name {
            self.display_name = Some(display_name.clone());
        }
        if let Some(birthdate) = update.birthdate {
            self.birthdate = Some(birthdate);
        }
        if let Some(last_period_start) = update.last_period_start {
            self.last_period_start = Some(last_period_start);
        }
        if let Some(cycle_length) = update.cycle_length {
            self.cycle_length = Some(cycle_length);
        }
        if let Some(goal) = update.goal {
            self.goal = Some(goal);
        }
        if let Some(health_conditions) = &update.health_conditions {
            self.health_conditions = Some(health_conditions.clone());
        }
        if let Some(step) = update.onboarding_step {
            self.onboarding_step = Some(step);
        }
    }
}

/// Partial profile update with merge semantics: `None` fields are untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub birthdate: Option<DateTime<Utc>>,
    pub last_period_start: Option<DateTime<Utc>>,
    pub cycle_length: Option<Option<u16>>,
    pub goal: Option<Goal>,
    pub health_conditions: Option<HealthConditions>,
    pub onboarding_step: Option<i8>,
}

impl ProfileUpdate {
    /// An empty update. Writing it only refreshes the server-side
    /// `updated_at` stamp (the last-seen touch on repeat logins).
    pub fn touch() -> Self {
        Self::default()
    }

    pub fn onboarding_step(step: i8) -> Self {
        Self {
            onboarding_step: Some(step),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Serde helper distinguishing an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            // Skipped by skip_serializing_if; serialize as null if it gets here.
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
