//! Models for the JSON payloads returned by the Sector Alarm portal.
//!
//! Scope: types only, no client code.
//!
//! Notes
//! - Every field is optional; the portal omits or nulls fields depending on panel type. Absent
//!   fields stay absent when re-encoded.
//! - Loosely typed vendor fields (locks, cameras, photos, consumption, scenarios, ...) are kept as
//!   `serde_json::Value` since nothing here consumes their schema. An explicit `null` there decodes
//!   to `Some(Value::Null)` and is written back as `null`.
//! - A `null` on a typed field (bool, string, number) reads as absent.
//! - Keys that are not modeled land in `extra`, so decoding and re-encoding a record is lossless.
//! - Some vendor keys are misspelled (`Temprature`, `PartialAvalible`); field names use the correct
//!   spelling and rename to the wire key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// =====================
// Scalar newtype wrappers
// =====================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(pub String);

impl core::fmt::Display for PanelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque cache-busting marker scraped from the portal's landing page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(pub String);

impl VersionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Missing keys fall back to `None` via `default`; a present `null` becomes `Some(Value::Null)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// =====================
// Panel
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Wifi {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi_exist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Panel {
    #[serde(rename = "PartialAvalible", skip_serializing_if = "Option::is_none")]
    pub partial_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_quick_arm: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_code_length: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_language: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_app: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_interview_services: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_panel_users: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_temporary_panel_users: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_register_devices: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_add_door_lock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_add_smart_plug: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_video: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi: Option<Wifi>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_id: Option<PanelId>,
    /// Arm state as reported by the portal (e.g. "armed", "disarmed", "partialarmed").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub armed_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_annex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_time: Option<String>,
    #[serde(rename = "AnnexAvalible", skip_serializing_if = "Option::is_none")]
    pub annex_available: Option<bool>,
    #[serde(rename = "IVDisplayStatus", skip_serializing_if = "Option::is_none")]
    pub iv_display_status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_wizard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_status: Option<i32>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub installation_address: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wizard_step: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_group: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_expires: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// =====================
// Devices
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Smartplug {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub consumption: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_scenarios: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    // Sent as a string, a number or null depending on the panel.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub panel_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_active: Option<bool>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub timer_events: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub timer_events_schedule: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Temperature {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    /// Reading as the portal formats it, e.g. "21.5".
    #[serde(rename = "Temprature", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Temperature {
    /// Reading in degrees Celsius. Accepts both `.` and `,` as decimal separator.
    pub fn celsius(&self) -> Option<f64> {
        let raw = self.temperature.as_deref()?.trim();
        raw.replace(',', ".").parse().ok()
    }
}

// =====================
// Overview
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Overview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel: Option<Panel>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub locks: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smartplugs: Option<Vec<Smartplug>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperatures: Option<Vec<Temperature>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub cameras: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub photos: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
