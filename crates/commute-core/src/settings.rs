//! The persisted settings aggregate.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geo::GeoPoint;
use crate::serde_helpers::{lenient_kinds, null_as_default};
use crate::station::{Station, TransportKind};

/// Default departure time for the work direction.
pub const DEFAULT_WORK_TIME: &str = "09:00";

/// Default departure time for the home direction.
pub const DEFAULT_HOME_TIME: &str = "18:00";

/// A configured final destination and the transport kinds allowed to reach it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastMileTarget {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "trans", deserialize_with = "lenient_kinds")]
    pub kinds: Vec<TransportKind>,
    pub coords: Option<GeoPoint>,
}

impl LastMileTarget {
    /// Build a target from its display name, inferring kinds from the name suffix.
    pub fn from_name(name: impl Into<String>, coords: Option<GeoPoint>) -> Self {
        let name = name.into();
        let kinds = infer_kinds(&name);
        Self {
            name,
            kinds,
            coords,
        }
    }

    pub fn is_named(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Read a stored target field by field; see [`Settings::from_stored`].
    fn from_stored(value: &Value, path: &str, dropped: &mut Vec<String>) -> Self {
        let mut target = Self::default();
        let Some(fields) = as_fields(value, path, dropped) else {
            return target;
        };
        read_field(fields, "name", path, dropped, &mut target.name, plain_or_null);
        read_field(fields, "trans", path, dropped, &mut target.kinds, |v| lenient_kinds(v));
        read_field(fields, "coords", path, dropped, &mut target.coords, |v| {
            Option::<GeoPoint>::deserialize(v)
        });
        target
    }
}

/// Infer transport kinds from a `"Name (Kind)"` suffix.
///
/// Blank names yield no kinds; names without a recognised suffix allow all four.
pub fn infer_kinds(name: &str) -> Vec<TransportKind> {
    if name.trim().is_empty() {
        return Vec::new();
    }

    TransportKind::ALL
        .into_iter()
        .find(|kind| {
            name.contains(&format!("({})", kind.local_label()))
                || name.contains(&format!("({})", kind.label()))
        })
        .map(|kind| vec![kind])
        .unwrap_or_else(|| TransportKind::ALL.to_vec())
}

/// Destination name for a saved station, suffixed with its kind label.
///
/// The suffix is what [`infer_kinds`] reads back when the form is saved.
pub fn suffixed_name(name: &str, kind: TransportKind) -> String {
    format!("{} ({})", name.trim(), kind.local_label())
}

/// Parse an `HH:MM` time of day into minutes after midnight.
pub fn parse_time_of_day(value: &str) -> Option<u32> {
    let (hour, minute) = value.trim().split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    (hour < 24 && minute < 60).then_some(hour * 60 + minute)
}

/// Holiday-context destinations and en-route kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HolidaySettings {
    #[serde(deserialize_with = "null_as_default")]
    pub old_home_last_mile: LastMileTarget,
    #[serde(deserialize_with = "null_as_default")]
    pub home_last_mile: LastMileTarget,
    #[serde(deserialize_with = "lenient_kinds")]
    pub old_home_trans: Vec<TransportKind>,
    #[serde(deserialize_with = "lenient_kinds")]
    pub home_trans: Vec<TransportKind>,
}

impl HolidaySettings {
    fn from_stored(value: &Value, path: &str, dropped: &mut Vec<String>) -> Self {
        let mut holiday = Self::default();
        let Some(fields) = as_fields(value, path, dropped) else {
            return holiday;
        };
        holiday.old_home_last_mile = target_field(fields, "oldHomeLastMile", path, dropped);
        holiday.home_last_mile = target_field(fields, "homeLastMile", path, dropped);
        read_field(
            fields,
            "oldHomeTrans",
            path,
            dropped,
            &mut holiday.old_home_trans,
            |v| lenient_kinds(v),
        );
        read_field(
            fields,
            "homeTrans",
            path,
            dropped,
            &mut holiday.home_trans,
            |v| lenient_kinds(v),
        );
        holiday
    }
}

impl Default for HolidaySettings {
    fn default() -> Self {
        Self {
            old_home_last_mile: LastMileTarget::default(),
            home_last_mile: LastMileTarget::default(),
            old_home_trans: TransportKind::ALL.to_vec(),
            home_trans: TransportKind::ALL.to_vec(),
        }
    }
}

/// User settings: credential, departure times, destinations and enabled kinds.
///
/// Every [`LastMileTarget`] slot is always present; missing or `null` slots in
/// stored JSON deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(deserialize_with = "null_as_default")]
    pub api_key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub work_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub home_time: String,
    #[serde(deserialize_with = "lenient_kinds")]
    pub work_trans: Vec<TransportKind>,
    #[serde(deserialize_with = "lenient_kinds")]
    pub home_trans: Vec<TransportKind>,
    #[serde(deserialize_with = "null_as_default")]
    pub work_last_mile: LastMileTarget,
    #[serde(deserialize_with = "null_as_default")]
    pub home_last_mile: LastMileTarget,
    #[serde(deserialize_with = "null_as_default")]
    pub holiday: HolidaySettings,
    /// Generic destination written by older versions; read once and dropped.
    #[serde(rename = "lastMile", skip_serializing)]
    legacy_last_mile: Option<LastMileTarget>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            work_time: DEFAULT_WORK_TIME.to_string(),
            home_time: DEFAULT_HOME_TIME.to_string(),
            work_trans: TransportKind::ALL.to_vec(),
            home_trans: TransportKind::ALL.to_vec(),
            work_last_mile: LastMileTarget::default(),
            home_last_mile: LastMileTarget::default(),
            holiday: HolidaySettings::default(),
            legacy_last_mile: None,
        }
    }
}

impl Settings {
    /// Read stored settings over the defaults, one field at a time.
    ///
    /// A field that cannot be read keeps its default without disturbing its
    /// siblings; an unreadable last-mile coordinate only clears that
    /// coordinate. Returns the settings plus the paths of dropped fields.
    pub fn from_stored(value: &Value) -> (Self, Vec<String>) {
        let mut dropped = Vec::new();
        let mut settings = Self::default();
        let Some(fields) = as_fields(value, "", &mut dropped) else {
            return (settings, dropped);
        };

        read_field(fields, "apiKey", "", &mut dropped, &mut settings.api_key, plain_or_null);
        read_field(fields, "workTime", "", &mut dropped, &mut settings.work_time, plain_or_null);
        read_field(fields, "homeTime", "", &mut dropped, &mut settings.home_time, plain_or_null);
        read_field(
            fields,
            "workTrans",
            "",
            &mut dropped,
            &mut settings.work_trans,
            |v| lenient_kinds(v),
        );
        read_field(
            fields,
            "homeTrans",
            "",
            &mut dropped,
            &mut settings.home_trans,
            |v| lenient_kinds(v),
        );
        settings.work_last_mile = target_field(fields, "workLastMile", "", &mut dropped);
        settings.home_last_mile = target_field(fields, "homeLastMile", "", &mut dropped);
        if let Some(holiday) = fields.get("holiday") {
            settings.holiday = HolidaySettings::from_stored(holiday, "holiday", &mut dropped);
        }
        if let Some(legacy) = fields.get("lastMile").filter(|v| !v.is_null()) {
            settings.legacy_last_mile =
                Some(LastMileTarget::from_stored(legacy, "lastMile", &mut dropped));
        }

        (settings, dropped)
    }

    /// Fold the legacy generic `lastMile` into the home slot.
    ///
    /// The legacy value only wins when the home slot is still blank. Either
    /// way it is discarded. Returns `true` if a legacy value was present.
    pub fn migrate_legacy(&mut self) -> bool {
        let Some(legacy) = self.legacy_last_mile.take() else {
            return false;
        };
        if !self.home_last_mile.is_named() {
            self.home_last_mile = legacy;
        }
        true
    }

    /// Whether a model credential is configured.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Configured work time in minutes after midnight, if valid.
    pub fn work_minutes(&self) -> Option<u32> {
        parse_time_of_day(&self.work_time)
    }

    /// Overwrite everything a settings form controls.
    ///
    /// Destination kinds are inferred from their names, and holiday en-route
    /// kinds are reset to all four.
    pub fn apply(&mut self, form: SettingsForm) {
        self.api_key = form.api_key;
        self.work_time = form.work_time;
        self.home_time = form.home_time;
        self.work_trans = form.work_trans;
        self.home_trans = form.home_trans;
        self.work_last_mile = form.work_destination.into_target();
        self.home_last_mile = form.home_destination.into_target();
        self.holiday = HolidaySettings {
            old_home_last_mile: form.holiday_old_home_destination.into_target(),
            home_last_mile: form.holiday_home_destination.into_target(),
            old_home_trans: TransportKind::ALL.to_vec(),
            home_trans: TransportKind::ALL.to_vec(),
        };
    }

    /// Snapshot of the current values as an editable form.
    pub fn to_form(&self) -> SettingsForm {
        SettingsForm {
            api_key: self.api_key.clone(),
            work_time: self.work_time.clone(),
            home_time: self.home_time.clone(),
            work_trans: self.work_trans.clone(),
            home_trans: self.home_trans.clone(),
            work_destination: Destination::from(&self.work_last_mile),
            home_destination: Destination::from(&self.home_last_mile),
            holiday_old_home_destination: Destination::from(&self.holiday.old_home_last_mile),
            holiday_home_destination: Destination::from(&self.holiday.home_last_mile),
        }
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// The object behind `value`; `null` reads as empty, anything else is dropped.
fn as_fields<'a>(
    value: &'a Value,
    path: &str,
    dropped: &mut Vec<String>,
) -> Option<&'a Map<String, Value>> {
    match value {
        Value::Object(fields) => Some(fields),
        Value::Null => None,
        _ => {
            dropped.push(if path.is_empty() { "settings".to_string() } else { path.to_string() });
            None
        }
    }
}

/// Overwrite `slot` with the parsed field when present and readable.
fn read_field<T>(
    fields: &Map<String, Value>,
    key: &str,
    path: &str,
    dropped: &mut Vec<String>,
    slot: &mut T,
    parse: impl FnOnce(&Value) -> Result<T, serde_json::Error>,
) {
    let Some(value) = fields.get(key) else {
        return;
    };
    match parse(value) {
        Ok(parsed) => *slot = parsed,
        Err(_) => dropped.push(join_path(path, key)),
    }
}

fn target_field(
    fields: &Map<String, Value>,
    key: &str,
    path: &str,
    dropped: &mut Vec<String>,
) -> LastMileTarget {
    fields
        .get(key)
        .map(|value| LastMileTarget::from_stored(value, &join_path(path, key), dropped))
        .unwrap_or_default()
}

fn plain_or_null<T: Default + DeserializeOwned>(value: &Value) -> Result<T, serde_json::Error> {
    null_as_default(value)
}

/// A destination as entered in a settings form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Destination {
    pub name: String,
    pub coords: Option<GeoPoint>,
}

impl Destination {
    pub fn new(name: impl Into<String>, coords: Option<GeoPoint>) -> Self {
        Self {
            name: name.into(),
            coords,
        }
    }

    /// A saved station picked as a destination: its kind-suffixed name and
    /// coordinates, so the kind is inferred back when the form is saved.
    pub fn from_station(station: &Station, kind: TransportKind) -> Self {
        Self {
            name: suffixed_name(&station.name, kind),
            coords: station.coords(),
        }
    }

    fn into_target(self) -> LastMileTarget {
        LastMileTarget::from_name(self.name, self.coords)
    }
}

impl From<&LastMileTarget> for Destination {
    fn from(target: &LastMileTarget) -> Self {
        Self {
            name: target.name.clone(),
            coords: target.coords,
        }
    }
}

/// Everything the settings screen saves in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    pub api_key: String,
    pub work_time: String,
    pub home_time: String,
    pub work_trans: Vec<TransportKind>,
    pub home_trans: Vec<TransportKind>,
    pub work_destination: Destination,
    pub home_destination: Destination,
    pub holiday_old_home_destination: Destination,
    pub holiday_home_destination: Destination,
}
