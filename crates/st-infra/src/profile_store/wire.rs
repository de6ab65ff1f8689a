//! Document store wire format.
//!
//! The hosted document database types every field explicitly on the wire
//! (`{"stringValue": ...}`, `{"timestampValue": ...}`, ...). This module
//! holds the typed value codec and the mapping between wire documents and
//! the in-memory profile types. Timestamp conversion is symmetric: a date
//! written through [`WireValue::timestamp`] reads back as the same instant.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use st_core::profile::{Goal, HealthConditions, ProfileUpdate, UserProfile};

/// One typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WireValue {
    StringValue(String),
    /// Integers travel as strings on the wire.
    IntegerValue(String),
    DoubleValue(f64),
    BooleanValue(bool),
    TimestampValue(DateTime<Utc>),
    NullValue(Option<()>),
    ArrayValue(ArrayPayload),
    MapValue(MapPayload),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayPayload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<WireValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapPayload {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, WireValue>,
}

impl WireValue {
    pub fn string(value: impl Into<String>) -> Self {
        WireValue::StringValue(value.into())
    }

    pub fn integer(value: i64) -> Self {
        WireValue::IntegerValue(value.to_string())
    }

    pub fn boolean(value: bool) -> Self {
        WireValue::BooleanValue(value)
    }

    pub fn timestamp(value: DateTime<Utc>) -> Self {
        WireValue::TimestampValue(value)
    }

    pub fn null() -> Self {
        WireValue::NullValue(None)
    }

    pub fn string_array<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        WireValue::ArrayValue(ArrayPayload {
            values: values.into_iter().map(WireValue::string).collect(),
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::StringValue(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            WireValue::IntegerValue(value) => value.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WireValue::BooleanValue(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            WireValue::TimestampValue(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::NullValue(_))
    }

    fn as_string_array(&self) -> Vec<String> {
        match self {
            WireValue::ArrayValue(payload) => payload
                .values
                .iter()
                .filter_map(|value| value.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A stored document: its resource name plus typed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, WireValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

// Wire field names follow the document schema, not Rust casing.
const F_ID: &str = "id";
const F_EMAIL: &str = "email";
const F_NAME: &str = "name";
const F_DISPLAY_NAME: &str = "displayName";
const F_PHOTO_URL: &str = "photoURL";
const F_BIRTHDATE: &str = "birthdate";
const F_LAST_PERIOD_START: &str = "lastPeriodStart";
const F_CYCLE_LENGTH: &str = "cycleLength";
const F_GOAL: &str = "goal";
const F_HEALTH_CONDITIONS: &str = "healthConditions";
const F_PREDEFINED: &str = "predefined";
const F_CUSTOM: &str = "custom";
const F_COMPLETED_ONBOARDING: &str = "completedOnboarding";
const F_ONBOARDING_STEP: &str = "onboardingStep";
const F_CREATED_AT: &str = "createdAt";
const F_UPDATED_AT: &str = "updatedAt";

/// Server-stamped field, written as a transform on every commit.
pub const UPDATED_AT_FIELD: &str = F_UPDATED_AT;
pub const CREATED_AT_FIELD: &str = F_CREATED_AT;

fn health_conditions_value(conditions: &HealthConditions) -> WireValue {
    let mut fields = BTreeMap::new();
    fields.insert(
        F_PREDEFINED.to_string(),
        WireValue::string_array(conditions.predefined.iter().cloned()),
    );
    fields.insert(
        F_CUSTOM.to_string(),
        WireValue::string_array(conditions.custom.iter().cloned()),
    );
    WireValue::MapValue(MapPayload { fields })
}

fn health_conditions_from(value: &WireValue) -> Option<HealthConditions> {
    match value {
        WireValue::MapValue(payload) => Some(HealthConditions {
            predefined: payload
                .fields
                .get(F_PREDEFINED)
                .map(WireValue::as_string_array)
                .unwrap_or_default(),
            custom: payload
                .fields
                .get(F_CUSTOM)
                .map(WireValue::as_string_array)
                .unwrap_or_default(),
        }),
        _ => None,
    }
}

/// Full document fields for a profile, used when creating it.
pub fn profile_to_fields(profile: &UserProfile) -> BTreeMap<String, WireValue> {
    let mut fields = BTreeMap::new();
    fields.insert(F_ID.to_string(), WireValue::string(&profile.id));
    fields.insert(F_EMAIL.to_string(), WireValue::string(&profile.email));
    fields.insert(F_NAME.to_string(), WireValue::string(&profile.name));
    if let Some(display_name) = &profile.display_name {
        fields.insert(
            F_DISPLAY_NAME.to_string(),
            WireValue::string(display_name),
        );
    }
    if let Some(photo_url) = &profile.photo_url {
        fields.insert(F_PHOTO_URL.to_string(), WireValue::string(photo_url));
    }
    if let Some(birthdate) = profile.birthdate {
        fields.insert(F_BIRTHDATE.to_string(), WireValue::timestamp(birthdate));
    }
    if let Some(last_period_start) = profile.last_period_start {
        fields.insert(
            F_LAST_PERIOD_START.to_string(),
            WireValue::timestamp(last_period_start),
        );
    }
    if let Some(cycle_length) = profile.cycle_length {
        fields.insert(F_CYCLE_LENGTH.to_string(), cycle_length_value(cycle_length));
    }
    if let Some(goal) = profile.goal {
        fields.insert(F_GOAL.to_string(), WireValue::string(goal.as_str()));
    }
    if let Some(conditions) = &profile.health_conditions {
        fields.insert(
            F_HEALTH_CONDITIONS.to_string(),
            health_conditions_value(conditions),
        );
    }
    fields.insert(
        F_COMPLETED_ONBOARDING.to_string(),
        WireValue::boolean(profile.completed_onboarding),
    );
    if let Some(step) = profile.onboarding_step {
        fields.insert(
            F_ONBOARDING_STEP.to_string(),
            WireValue::integer(i64::from(step)),
        );
    }
    if let Some(created_at) = profile.created_at {
        fields.insert(F_CREATED_AT.to_string(), WireValue::timestamp(created_at));
    }
    if let Some(updated_at) = profile.updated_at {
        fields.insert(F_UPDATED_AT.to_string(), WireValue::timestamp(updated_at));
    }
    fields
}

fn cycle_length_value(cycle_length: Option<u16>) -> WireValue {
    match cycle_length {
        Some(days) => WireValue::integer(i64::from(days)),
        // Explicit null records "not sure".
        None => WireValue::null(),
    }
}

/// Decode a stored document. Unknown fields are ignored; missing fields get
/// defaults, so partially-written documents still load.
pub fn fields_to_profile(uid: &str, fields: &BTreeMap<String, WireValue>) -> UserProfile {
    let get = |name: &str| fields.get(name);

    UserProfile {
        id: get(F_ID)
            .and_then(WireValue::as_str)
            .unwrap_or(uid)
            .to_string(),
        email: get(F_EMAIL)
            .and_then(WireValue::as_str)
            .unwrap_or_default()
            .to_string(),
        name: get(F_NAME)
            .and_then(WireValue::as_str)
            .unwrap_or_default()
            .to_string(),
        display_name: get(F_DISPLAY_NAME)
            .and_then(WireValue::as_str)
            .map(str::to_string),
        photo_url: get(F_PHOTO_URL)
            .and_then(WireValue::as_str)
            .map(str::to_string),
        birthdate: get(F_BIRTHDATE).and_then(WireValue::as_timestamp),
        last_period_start: get(F_LAST_PERIOD_START).and_then(WireValue::as_timestamp),
        cycle_length: get(F_CYCLE_LENGTH).map(|value| {
            if value.is_null() {
                None
            } else {
                value.as_i64().and_then(|days| u16::try_from(days).ok())
            }
        }),
        goal: get(F_GOAL)
            .and_then(WireValue::as_str)
            .and_then(Goal::parse),
        health_conditions: get(F_HEALTH_CONDITIONS).and_then(health_conditions_from),
        completed_onboarding: get(F_COMPLETED_ONBOARDING)
            .and_then(WireValue::as_bool)
            .unwrap_or(false),
        onboarding_step: get(F_ONBOARDING_STEP).and_then(|value| {
            if value.is_null() {
                None
            } else {
                value.as_i64().and_then(|step| i8::try_from(step).ok())
            }
        }),
        created_at: get(F_CREATED_AT).and_then(WireValue::as_timestamp),
        updated_at: get(F_UPDATED_AT).and_then(WireValue::as_timestamp),
    }
}

/// Merge-write fields plus the field mask listing exactly what changed.
pub fn update_to_fields(update: &ProfileUpdate) -> (BTreeMap<String, WireValue>, Vec<String>) {
    let mut fields = BTreeMap::new();
    let mut mask = Vec::new();

    if let Some(name) = &update.name {
        fields.insert(F_NAME.to_string(), WireValue::string(name));
        mask.push(F_NAME.to_string());
    }
    if let Some(display_name) = &update.display_name {
        fields.insert(
            F_DISPLAY_NAME.to_string(),
            WireValue::string(display_name),
        );
        mask.push(F_DISPLAY_NAME.to_string());
    }
    if let Some(birthdate) = update.birthdate {
        fields.insert(F_BIRTHDATE.to_string(), WireValue::timestamp(birthdate));
        mask.push(F_BIRTHDATE.to_string());
    }
    if let Some(last_period_start) = update.last_period_start {
        fields.insert(
            F_LAST_PERIOD_START.to_string(),
            WireValue::timestamp(last_period_start),
        );
        mask.push(F_LAST_PERIOD_START.to_string());
    }
    if let Some(cycle_length) = update.cycle_length {
        fields.insert(F_CYCLE_LENGTH.to_string(), cycle_length_value(cycle_length));
        mask.push(F_CYCLE_LENGTH.to_string());
    }
    if let Some(goal) = update.goal {
        fields.insert(F_GOAL.to_string(), WireValue::string(goal.as_str()));
        mask.push(F_GOAL.to_string());
    }
    if let Some(conditions) = &update.health_conditions {
        fields.insert(
            F_HEALTH_CONDITIONS.to_string(),
            health_conditions_value(conditions),
        );
        mask.push(F_HEALTH_CONDITIONS.to_string());
    }
    if let Some(step) = update.onboarding_step {
        fields.insert(
            F_ONBOARDING_STEP.to_string(),
            WireValue::integer(i64::from(step)),
        );
        mask.push(F_ONBOARDING_STEP.to_string());
    }

    (fields, mask)
}

/// Fields for the atomic completion write: flag set, step cleared.
pub fn completion_fields() -> (BTreeMap<String, WireValue>, Vec<String>) {
    let mut fields = BTreeMap::new();
    fields.insert(F_COMPLETED_ONBOARDING.to_string(), WireValue::boolean(true));
    fields.insert(F_ONBOARDING_STEP.to_string(), WireValue::null());
    (
        fields,
        vec![
            F_COMPLETED_ONBOARDING.to_string(),
            F_ONBOARDING_STEP.to_string(),
        ],
    )
}
