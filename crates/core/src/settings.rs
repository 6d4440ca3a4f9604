//! The persisted settings the wiki page and options surface share.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{cache::PersistedCache, era::Era, resolver::GoodSelections, store::KeyValueStore};

/// Era currently displayed.
pub const ERA_KEY: &str = "era";
/// Per-era good choices.
pub const BUILDING_SELECTIONS_KEY: &str = "buildingSelections";
/// Buildings saved from wiki tables.
pub const SAVED_BUILDINGS_KEY: &str = "savedBuildings";
/// Technos saved from the research tree.
pub const SAVED_TECHNOS_KEY: &str = "savedTechnos";

/// Qualify `name` with the configured namespace.
pub fn namespaced_key(namespace: &str, name: &str) -> String {
    format!("{namespace}:{name}")
}

/// A saved building or techno as written by the page scripts.
///
/// Only `id` and `costs` are interpreted; every other field is carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEntity {
    /// Compound identifier of the entity.
    pub id: String,
    /// Resource key to amount.
    #[serde(default)]
    pub costs: BTreeMap<String, u64>,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl SavedEntity {
    /// Entity with the given id and costs and no extra fields.
    pub fn new(id: impl Into<String>, costs: impl IntoIterator<Item = (String, u64)>) -> Self {
        Self {
            id: id.into(),
            costs: costs.into_iter().collect(),
            extra: serde_json::Map::new(),
        }
    }
}

/// One cache per persisted setting, all backed by the same store.
#[derive(Clone)]
pub struct Settings {
    /// Selected era.
    pub era: PersistedCache<Era>,
    /// Per-era good choices.
    pub selections: PersistedCache<GoodSelections>,
    /// Saved buildings.
    pub saved_buildings: PersistedCache<Vec<SavedEntity>>,
    /// Saved technos.
    pub saved_technos: PersistedCache<Vec<SavedEntity>>,
}

impl Settings {
    /// Build the caches for `namespace` on top of `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: &str) -> Self {
        Self {
            era: PersistedCache::new(
                store.clone(),
                namespaced_key(namespace, ERA_KEY),
                Era::BronzeAge,
            ),
            selections: PersistedCache::new(
                store.clone(),
                namespaced_key(namespace, BUILDING_SELECTIONS_KEY),
                GoodSelections::default(),
            ),
            saved_buildings: PersistedCache::new(
                store.clone(),
                namespaced_key(namespace, SAVED_BUILDINGS_KEY),
                Vec::new(),
            ),
            saved_technos: PersistedCache::new(
                store,
                namespaced_key(namespace, SAVED_TECHNOS_KEY),
                Vec::new(),
            ),
        }
    }

    /// Load every setting, sharing in-flight loads with other callers.
    pub async fn ensure_loaded(&self) {
        tokio::join!(
            self.era.ensure_loaded(),
            self.selections.ensure_loaded(),
            self.saved_buildings.ensure_loaded(),
            self.saved_technos.ensure_loaded(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{era::Priority, store::MemoryStore};

    #[tokio::test]
    async fn settings_load_from_namespaced_keys() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::with_items([
            ("roc:era", r#""CG""#),
            ("roc:buildingSelections", r#"[["wool","",""],["","papyrus",""]]"#),
            (
                "roc:savedBuildings",
                r#"[{"id":"/wiki/Home/Production/Wool_Farm|construction|BA|1","costs":{"coins":50},"quantity":2}]"#,
            ),
            ("other:era", r#""HM""#),
        ]));
        let settings = Settings::new(store.clone(), "roc");
        settings.ensure_loaded().await;

        assert_eq!(settings.era.read(), Era::ClassicalGreece);
        let selections = settings.selections.read();
        assert_eq!(selections.get(Era::MinoanEra, Priority::Secondary), Some("papyrus"));

        let saved = settings.saved_buildings.read();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].costs.get("coins"), Some(&50));
        assert_eq!(saved[0].extra.get("quantity"), Some(&Value::from(2)));
        assert!(settings.saved_technos.read().is_empty());

        settings
            .selections
            .update(|rows| {
                rows.set(Era::BronzeAge, Priority::Tertiary, "bronze");
            })
            .await?;
        assert_eq!(
            store.peek("roc:buildingSelections").as_deref(),
            Some(r#"[["wool","","bronze"],["","papyrus",""]]"#)
        );
        Ok(())
    }

    #[test]
    fn saved_entities_keep_unknown_fields() -> anyhow::Result<()> {
        let raw = r#"{"id":"techno_a_b_c_BA_1","costs":{"Primary_BA":10},"label":"Wool"}"#;
        let entity: SavedEntity = serde_json::from_str(raw)?;
        assert_eq!(entity.extra.get("label"), Some(&Value::from("Wool")));
        let round: Value = serde_json::to_value(&entity)?;
        assert_eq!(round, serde_json::from_str::<Value>(raw)?);
        Ok(())
    }
}
