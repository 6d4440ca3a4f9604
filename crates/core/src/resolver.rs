//! Maps raw resource keys to the good names a player actually produces.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::era::{Era, Priority};

/// Resources that exist independently of any era.
const UNIVERSAL_RESOURCES: &[&str] = &["coins", "food", "gems", "research_points"];

static PRIORITY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Primary|Secondary|Tertiary)_([A-Z]{2})$").expect("invalid priority key regex")
});

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Per-era good choices, one row of three priority slots per goods era.
///
/// Rows are indexed by [`Era::goods_index`]; an empty string marks an unset slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoodSelections {
    rows: Vec<[String; 3]>,
}

impl GoodSelections {
    /// Build a table from raw rows.
    pub fn from_rows(rows: Vec<[String; 3]>) -> Self {
        Self { rows }
    }

    /// Borrow the raw rows.
    pub fn rows(&self) -> &[[String; 3]] {
        &self.rows
    }

    /// Selected good for an era and priority, if one is set.
    pub fn get(&self, era: Era, priority: Priority) -> Option<&str> {
        let row = self.rows.get(era.goods_index()?)?;
        Some(row[priority.slot()].as_str()).filter(|good| !good.is_empty())
    }

    /// Record a choice, padding the table with blank rows when needed.
    ///
    /// Returns `false` when the era produces no goods.
    pub fn set(&mut self, era: Era, priority: Priority, good: impl Into<String>) -> bool {
        let Some(index) = era.goods_index() else {
            return false;
        };
        if self.rows.len() <= index {
            self.rows.resize_with(index + 1, Default::default);
        }
        self.rows[index][priority.slot()] = good.into();
        true
    }
}

/// Translate a resource key into a display-usable good name.
///
/// Universal resources come back in canonical form, `<Priority>_<EraCode>` keys
/// resolve through `selections`, and everything else is lower-cased with
/// whitespace runs collapsed to `_`.
pub fn normalize_resource_key(key: &str, selections: &GoodSelections) -> String {
    let fallback = WHITESPACE_RE.replace_all(&key.to_lowercase(), "_").into_owned();

    if let Some(universal) = UNIVERSAL_RESOURCES
        .iter()
        .find(|candidate| **candidate == fallback)
    {
        return universal.to_string();
    }

    if let Some(good) = resolve_priority_key(key, selections) {
        return good.to_string();
    }

    fallback
}

fn resolve_priority_key<'a>(key: &str, selections: &'a GoodSelections) -> Option<&'a str> {
    let caps = PRIORITY_KEY_RE.captures(key)?;
    let priority = Priority::from_label(caps.get(1)?.as_str())?;
    let era = Era::from_code(caps.get(2)?.as_str())?;
    selections.get(era, priority)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bronze_age_wool() -> GoodSelections {
        GoodSelections::from_rows(vec![["wool".to_string(), String::new(), String::new()]])
    }

    #[test]
    fn universal_resources_are_era_independent() {
        let selections = bronze_age_wool();
        assert_eq!(normalize_resource_key("coins", &selections), "coins");
        assert_eq!(normalize_resource_key("Coins", &GoodSelections::default()), "coins");
        assert_eq!(
            normalize_resource_key("Research Points", &selections),
            "research_points"
        );
    }

    #[test]
    fn priority_keys_follow_selections() {
        let selections = bronze_age_wool();
        assert_eq!(normalize_resource_key("Primary_BA", &selections), "wool");
    }

    #[test]
    fn missing_selection_falls_back() {
        let selections = bronze_age_wool();
        assert_eq!(normalize_resource_key("Secondary_BA", &selections), "secondary_ba");
        assert_eq!(normalize_resource_key("Primary_ME", &selections), "primary_me");
        assert_eq!(normalize_resource_key("Primary_SA", &selections), "primary_sa");
        assert_eq!(normalize_resource_key("Primary_ZZ", &selections), "primary_zz");
        assert_eq!(
            normalize_resource_key("Some Odd Key", &GoodSelections::default()),
            "some_odd_key"
        );
        assert_eq!(
            normalize_resource_key("Two  \tSpaces", &GoodSelections::default()),
            "two_spaces"
        );
    }

    #[test]
    fn set_pads_rows_and_rejects_stone_age() {
        let mut selections = GoodSelections::default();
        assert!(selections.set(Era::ClassicalGreece, Priority::Tertiary, "marble"));
        assert_eq!(selections.rows().len(), 3);
        assert_eq!(selections.get(Era::ClassicalGreece, Priority::Tertiary), Some("marble"));
        assert_eq!(selections.get(Era::BronzeAge, Priority::Primary), None);
        assert!(!selections.set(Era::StoneAge, Priority::Primary, "stone"));
    }

    #[test]
    fn persists_as_nested_arrays() -> anyhow::Result<()> {
        let encoded = serde_json::to_string(&bronze_age_wool())?;
        assert_eq!(encoded, r#"[["wool","",""]]"#);
        assert!(serde_json::from_str::<GoodSelections>(r#"[["a","b"]]"#).is_err());
        Ok(())
    }
}
