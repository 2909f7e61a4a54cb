//! The station repository: saved collections plus settings.

use std::collections::HashSet;
use std::sync::Arc;

use commute_core::{Settings, SettingsForm, Station, StationCollections, TransportKind};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::kv::KeyValueStore;
use crate::Result;

/// Storage key of the settings aggregate.
pub const SETTINGS_KEY: &str = "user_settings";

/// Storage key of the credential written by older versions.
pub const LEGACY_API_KEY_KEY: &str = "user_gemini_key";

/// Result of toggling a station in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Owner of the four station collections and the settings aggregate.
///
/// All mutation goes through this type; every mutating call persists the full
/// state before returning.
pub struct StationRepository {
    store: Arc<dyn KeyValueStore>,
    collections: StationCollections,
    settings: Settings,
}

impl std::fmt::Debug for StationRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationRepository")
            .field("collections", &self.collections)
            .field("has_api_key", &self.settings.has_api_key())
            .finish()
    }
}

impl StationRepository {
    /// Load and normalize persisted state.
    ///
    /// Corrupt values are replaced by defaults and logged. Legacy data
    /// (bare-string stations, the generic `lastMile` target and the standalone
    /// credential key) is migrated and written back.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let mut collections = StationCollections::default();
        for kind in TransportKind::ALL {
            let raw = store.get(kind.storage_key()).await?;
            *collections.get_mut(kind) = match raw {
                Some(raw) => parse_collection(kind, &raw),
                None => Vec::new(),
            };
        }

        let mut settings = match store.get(SETTINGS_KEY).await? {
            Some(raw) => parse_settings(&raw),
            None => Settings::default(),
        };

        let mut migrated = settings.migrate_legacy();
        if migrated {
            info!("Migrated legacy lastMile into homeLastMile");
        }

        let legacy_key = store.get(LEGACY_API_KEY_KEY).await?;
        if let Some(key) = legacy_key.as_deref() {
            let key = key.trim().trim_matches('"');
            if !key.is_empty() && !settings.has_api_key() {
                info!("Migrated legacy API key into settings");
                settings.api_key = key.to_string();
            }
            migrated = true;
        }

        let repo = Self {
            store,
            collections,
            settings,
        };

        if migrated {
            repo.save().await?;
            if legacy_key.is_some() {
                repo.store.delete(LEGACY_API_KEY_KEY).await?;
            }
        }

        debug!(
            "Loaded stations: rail={} metro={} bus={} bike={}",
            repo.collections.rail.len(),
            repo.collections.metro.len(),
            repo.collections.bus.len(),
            repo.collections.bikeshare.len()
        );

        Ok(repo)
    }

    /// Persist all four collections and the settings in one write.
    pub async fn save(&self) -> Result<()> {
        let mut entries = Vec::with_capacity(TransportKind::ALL.len() + 1);
        for (kind, stations) in self.collections.iter() {
            entries.push((kind.storage_key(), serde_json::to_string(stations)?));
        }
        entries.push((SETTINGS_KEY, serde_json::to_string(&self.settings)?));

        self.store.put_all(&entries).await
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn collections(&self) -> &StationCollections {
        &self.collections
    }

    pub fn stations(&self, kind: TransportKind) -> &[Station] {
        self.collections.get(kind)
    }

    pub fn contains(&self, kind: TransportKind, name: &str) -> bool {
        self.collections.contains(kind, name)
    }

    /// Remove the station if a same-named one exists, otherwise append it.
    pub async fn toggle(&mut self, kind: TransportKind, station: Station) -> Result<ToggleOutcome> {
        let list = self.collections.get_mut(kind);
        let outcome = match list.iter().position(|s| s.name == station.name) {
            Some(index) => {
                list.remove(index);
                ToggleOutcome::Removed
            }
            None => {
                list.push(station);
                ToggleOutcome::Added
            }
        };

        self.save().await?;
        debug!("Toggled {} station: {:?}", kind, outcome);
        Ok(outcome)
    }

    /// Append the station unless a same-named one is already saved.
    ///
    /// Returns `true` when the station was added.
    pub async fn ensure(&mut self, kind: TransportKind, station: Station) -> Result<bool> {
        if self.contains(kind, &station.name) {
            return Ok(false);
        }
        self.collections.get_mut(kind).push(station);
        self.save().await?;
        Ok(true)
    }

    /// Delete by position. Out-of-range indices are a no-op.
    pub async fn remove(&mut self, kind: TransportKind, index: usize) -> Result<Option<Station>> {
        let list = self.collections.get_mut(kind);
        if index >= list.len() {
            return Ok(None);
        }
        let removed = list.remove(index);
        self.save().await?;
        Ok(Some(removed))
    }

    /// Apply a settings form wholesale and persist.
    pub async fn save_settings(&mut self, form: SettingsForm) -> Result<()> {
        self.settings.apply(form);
        self.save().await?;
        info!("Settings saved");
        Ok(())
    }

    /// Seed the credential when none is configured. Not persisted.
    pub fn seed_api_key(&mut self, api_key: &str) {
        if !self.settings.has_api_key() && !api_key.trim().is_empty() {
            self.settings.api_key = api_key.trim().to_string();
        }
    }
}

/// Parse stored settings over the defaults, keeping every readable field.
fn parse_settings(raw: &str) -> Settings {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Discarding unreadable settings: {}", e);
            return Settings::default();
        }
    };

    let (settings, dropped) = Settings::from_stored(&value);
    for field in dropped {
        warn!("Reset unreadable settings field {}", field);
    }
    settings
}

/// Parse one stored collection, coercing bare names and dropping duplicates.
fn parse_collection(kind: TransportKind, raw: &str) -> Vec<Station> {
    let items = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Null) => return Vec::new(),
        Ok(other) => {
            warn!("Discarding {} collection: expected array, got {}", kind, other);
            return Vec::new();
        }
        Err(e) => {
            warn!("Discarding unreadable {} collection: {}", kind, e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut stations = Vec::with_capacity(items.len());
    for item in items {
        let station = match item {
            Value::String(name) => Station::named(name),
            Value::Object(_) => match serde_json::from_value::<Station>(item) {
                Ok(station) => station,
                Err(e) => {
                    warn!("Skipping unreadable {} station: {}", kind, e);
                    continue;
                }
            },
            _ => continue,
        };
        if seen.insert(station.name.clone()) {
            stations.push(station);
        }
    }
    stations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, MemoryStore};
    use commute_core::{Destination, GeoPoint};

    async fn memory_repo(entries: Vec<(&str, &str)>) -> (Arc<MemoryStore>, StationRepository) {
        let store = Arc::new(MemoryStore::with_entries(entries));
        let repo = StationRepository::load(store.clone()).await.unwrap();
        (store, repo)
    }

    #[tokio::test]
    async fn test_empty_store_loads_defaults() {
        let (store, repo) = memory_repo(vec![]).await;
        assert!(repo.collections().is_empty());
        assert_eq!(repo.settings(), &Settings::default());
        // Nothing migrated, nothing written.
        assert_eq!(store.get(SETTINGS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bare_strings_and_duplicates_normalized() {
        let (_, repo) = memory_repo(vec![(
            "user_stations_train",
            r#"["中壢", {"name":"桃園","lat":24.99,"lng":121.31}, "中壢", 42]"#,
        )])
        .await;

        let rail = repo.stations(TransportKind::Rail);
        assert_eq!(rail.len(), 2);
        assert_eq!(rail[0], Station::named("中壢"));
        assert_eq!(rail[1].coords(), Some(GeoPoint::new(24.99, 121.31)));
    }

    #[tokio::test]
    async fn test_one_bad_settings_field_keeps_the_rest() {
        let (_, repo) = memory_repo(vec![(
            SETTINGS_KEY,
            r#"{"apiKey":"secret","workTime":"08:00","workLastMile":{"name":"Office","coords":{"lat":null,"lng":121.5}}}"#,
        )])
        .await;

        let settings = repo.settings();
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.work_time, "08:00");
        assert_eq!(settings.work_last_mile.name, "Office");
        assert_eq!(settings.work_last_mile.coords, None);
        assert_eq!(settings.home_time, commute_core::DEFAULT_HOME_TIME);
    }

    #[tokio::test]
    async fn test_corrupt_values_become_defaults() {
        let (_, repo) = memory_repo(vec![
            ("user_stations_bus", "{not json"),
            ("user_stations_mrt", r#"{"name":"x"}"#),
            (SETTINGS_KEY, "[[["),
        ])
        .await;

        assert!(repo.stations(TransportKind::Bus).is_empty());
        assert!(repo.stations(TransportKind::Metro).is_empty());
        assert_eq!(repo.settings().work_time, "09:00");
    }

    #[tokio::test]
    async fn test_legacy_last_mile_migrated_and_persisted() {
        let (store, repo) = memory_repo(vec![(
            SETTINGS_KEY,
            r#"{"apiKey":"k","lastMile":{"name":"Old (Bus)","trans":["bus"]}}"#,
        )])
        .await;

        assert_eq!(repo.settings().home_last_mile.name, "Old (Bus)");
        let saved = store.get(SETTINGS_KEY).await.unwrap().unwrap();
        assert!(!saved.contains("lastMile\""));
        assert!(saved.contains("homeLastMile"));
    }

    #[tokio::test]
    async fn test_legacy_api_key_migrated_and_deleted() {
        let (store, repo) = memory_repo(vec![(LEGACY_API_KEY_KEY, "legacy-secret")]).await;

        assert_eq!(repo.settings().api_key, "legacy-secret");
        assert_eq!(store.get(LEGACY_API_KEY_KEY).await.unwrap(), None);

        let reloaded = StationRepository::load(store.clone()).await.unwrap();
        assert_eq!(reloaded.settings().api_key, "legacy-secret");
    }

    #[tokio::test]
    async fn test_legacy_api_key_does_not_override_current() {
        let (store, repo) = memory_repo(vec![
            (LEGACY_API_KEY_KEY, "old"),
            (SETTINGS_KEY, r#"{"apiKey":"new"}"#),
        ])
        .await;

        assert_eq!(repo.settings().api_key, "new");
        assert_eq!(store.get(LEGACY_API_KEY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_collection() {
        let (store, mut repo) = memory_repo(vec![]).await;
        let station = Station::at("市府", GeoPoint::new(25.04, 121.56));

        let first = repo.toggle(TransportKind::Metro, station.clone()).await.unwrap();
        assert_eq!(first, ToggleOutcome::Added);
        let saved = store.get("user_stations_mrt").await.unwrap().unwrap();
        assert!(saved.contains("市府"));

        let second = repo.toggle(TransportKind::Metro, station).await.unwrap();
        assert_eq!(second, ToggleOutcome::Removed);
        assert!(repo.stations(TransportKind::Metro).is_empty());
    }

    #[tokio::test]
    async fn test_remove_out_of_range_is_noop() {
        let (_, mut repo) = memory_repo(vec![("user_stations_bike", r#"["A","B"]"#)]).await;

        assert_eq!(repo.remove(TransportKind::Bikeshare, 5).await.unwrap(), None);
        let removed = repo.remove(TransportKind::Bikeshare, 0).await.unwrap();
        assert_eq!(removed.map(|s| s.name), Some("A".to_string()));
        assert_eq!(repo.stations(TransportKind::Bikeshare).len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_adds_once() {
        let (_, mut repo) = memory_repo(vec![]).await;
        assert!(repo.ensure(TransportKind::Bus, Station::named("X")).await.unwrap());
        assert!(!repo.ensure(TransportKind::Bus, Station::named("X")).await.unwrap());
        assert_eq!(repo.stations(TransportKind::Bus).len(), 1);
    }

    #[tokio::test]
    async fn test_save_settings_round_trip_through_sqlite() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let store: Arc<dyn KeyValueStore> = Arc::new(db);

        let mut repo = StationRepository::load(store.clone()).await.unwrap();
        let mut form = repo.settings().to_form();
        form.api_key = "abc".to_string();
        form.work_destination = Destination::new("Office (火車)", Some(GeoPoint::new(25.0, 121.5)));
        repo.save_settings(form).await.unwrap();
        repo.toggle(TransportKind::Rail, Station::named("台北")).await.unwrap();

        let reloaded = StationRepository::load(store).await.unwrap();
        assert_eq!(reloaded.settings().api_key, "abc");
        assert_eq!(reloaded.settings().work_last_mile.kinds, vec![TransportKind::Rail]);
        assert!(reloaded.contains(TransportKind::Rail, "台北"));
    }
}
