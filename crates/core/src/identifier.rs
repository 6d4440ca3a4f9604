//! Parsers for compound building and techno identifiers.
//!
//! Building identifiers look like `/wiki/Home/Production/Wool_Farm|construction|BA|1`:
//! a slash-separated path whose first segment is a discarded root, followed by
//! the table type, era code and level. Techno identifiers look like
//! `techno_main_sub_third_era_index`, where the era may itself contain
//! underscores.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{era::Era, error::IdentifierError};

/// Which wiki table a building row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    /// Initial construction costs.
    Construction,
    /// Level upgrade costs.
    Upgrade,
}

impl TableType {
    /// Label used inside identifiers.
    pub fn as_str(self) -> &'static str {
        match self {
            TableType::Construction => "construction",
            TableType::Upgrade => "upgrade",
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decomposed building identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingIdentifier {
    /// Identifier exactly as received.
    pub id: String,
    /// Top section, sub-section and leaf name.
    pub path_segments: [String; 3],
    /// Source table.
    pub table_type: TableType,
    /// Era code as written in the identifier.
    pub era: String,
    /// Level rank as text.
    pub level: String,
}

impl BuildingIdentifier {
    /// Top-level wiki section.
    pub fn section(&self) -> &str {
        &self.path_segments[0]
    }

    /// Sub-section beneath [`section`](Self::section).
    pub fn sub_section(&self) -> &str {
        &self.path_segments[1]
    }

    /// Display name derived from the leaf segment.
    pub fn building_name(&self) -> String {
        self.path_segments[2].replace('_', " ")
    }

    /// Era record when the code is a known one.
    pub fn era_record(&self) -> Option<Era> {
        Era::from_code(&self.era)
    }
}

impl fmt::Display for BuildingIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Decompose `path|tableType|era|level` into its fields.
pub fn parse_building_identifier(raw: &str) -> Result<BuildingIdentifier, IdentifierError> {
    let mut parts = raw.splitn(4, '|');
    let path = parts.next().unwrap_or_default();
    let table_type = required_field(raw, parts.next(), "table type")?;
    let era = required_field(raw, parts.next(), "era")?;
    let level = required_field(raw, parts.next(), "level")?;

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let meaningful = segments.len().saturating_sub(1);
    if meaningful < 3 {
        return Err(IdentifierError::MissingPathSegments {
            raw: raw.to_string(),
            found: meaningful,
        });
    }
    if segments[1..4].iter().any(|segment| segment.is_empty()) {
        return Err(IdentifierError::EmptyPathSegment {
            raw: raw.to_string(),
        });
    }

    let table_type = match table_type {
        "construction" => TableType::Construction,
        "upgrade" => TableType::Upgrade,
        other => {
            return Err(IdentifierError::UnknownTableType {
                raw: raw.to_string(),
                table_type: other.to_string(),
            })
        }
    };

    Ok(BuildingIdentifier {
        id: raw.to_string(),
        path_segments: [
            segments[1].to_string(),
            segments[2].to_string(),
            segments[3].to_string(),
        ],
        table_type,
        era: era.to_string(),
        level: level.to_string(),
    })
}

fn required_field<'a>(
    raw: &str,
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, IdentifierError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| IdentifierError::MissingField {
            raw: raw.to_string(),
            field,
        })
}

/// A decomposed techno (research) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnoIdentifier {
    /// Identifier exactly as received.
    pub id: String,
    /// First section token.
    pub main_section: String,
    /// Second section token.
    pub sub_section: String,
    /// Third section token.
    pub third_section: String,
    /// Era tokens rejoined with `_`; empty when the identifier has none.
    pub era: String,
    /// Trailing index token.
    pub index: String,
}

impl fmt::Display for TechnoIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Decompose `techno_<main>_<sub>_<third>_<era...>_<index>` into its fields.
pub fn parse_techno_identifier(raw: &str) -> Result<TechnoIdentifier, IdentifierError> {
    let tokens: Vec<&str> = raw.split('_').collect();
    if tokens.len() < 5 {
        return Err(IdentifierError::TooFewTokens {
            raw: raw.to_string(),
            found: tokens.len(),
        });
    }

    let last = tokens.len() - 1;
    Ok(TechnoIdentifier {
        id: raw.to_string(),
        main_section: tokens[1].to_string(),
        sub_section: tokens[2].to_string(),
        third_section: tokens[3].to_string(),
        era: tokens[4..last].join("_"),
        index: tokens[last].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_building_fields() -> anyhow::Result<()> {
        let raw = "/wiki/Home/Production/Wool_Farm|construction|BA|12";
        let parsed = parse_building_identifier(raw)?;
        assert_eq!(parsed.id, raw);
        assert_eq!(parsed.section(), "Home");
        assert_eq!(parsed.sub_section(), "Production");
        assert_eq!(parsed.building_name(), "Wool Farm");
        assert_eq!(parsed.table_type, TableType::Construction);
        assert_eq!(parsed.era, "BA");
        assert_eq!(parsed.era_record(), Some(Era::BronzeAge));
        assert_eq!(parsed.level, "12");
        assert_eq!(parsed.to_string(), raw);
        Ok(())
    }

    #[test]
    fn strips_repeated_leading_separators() -> anyhow::Result<()> {
        let parsed = parse_building_identifier("///root/A/B/Big_Old_Temple|upgrade|ME|3")?;
        assert_eq!(parsed.path_segments, ["A", "B", "Big_Old_Temple"]);
        assert_eq!(parsed.building_name(), "Big Old Temple");
        assert_eq!(parsed.table_type, TableType::Upgrade);
        Ok(())
    }

    #[test]
    fn rejects_short_paths_without_partial_records() {
        for raw in [
            "/wiki/Home/Farm|construction|BA|1",
            "/wiki|construction|BA|1",
            "|construction|BA|1",
        ] {
            assert!(
                matches!(
                    parse_building_identifier(raw),
                    Err(IdentifierError::MissingPathSegments { .. })
                ),
                "{raw} should fail"
            );
        }
        assert!(matches!(
            parse_building_identifier("/wiki/Home//Farm|construction|BA|1"),
            Err(IdentifierError::EmptyPathSegment { .. })
        ));
    }

    #[test]
    fn rejects_missing_fields_and_unknown_tables() {
        assert_eq!(
            parse_building_identifier("/wiki/a/b/c|construction|BA"),
            Err(IdentifierError::MissingField {
                raw: "/wiki/a/b/c|construction|BA".to_string(),
                field: "level",
            })
        );
        assert!(matches!(
            parse_building_identifier("/wiki/a/b/c|demolish|BA|1"),
            Err(IdentifierError::UnknownTableType { .. })
        ));
    }

    #[test]
    fn parses_techno_with_multi_token_era() -> anyhow::Result<()> {
        let parsed = parse_techno_identifier("techno_eco_farm_wool_early_rome_7")?;
        assert_eq!(parsed.main_section, "eco");
        assert_eq!(parsed.sub_section, "farm");
        assert_eq!(parsed.third_section, "wool");
        assert_eq!(parsed.era, "early_rome");
        assert_eq!(parsed.index, "7");

        let short = parse_techno_identifier("techno_a_b_c_4")?;
        assert_eq!(short.era, "");
        assert_eq!(short.index, "4");
        Ok(())
    }

    #[test]
    fn rejects_techno_with_too_few_tokens() {
        assert_eq!(
            parse_techno_identifier("techno_a_b_c"),
            Err(IdentifierError::TooFewTokens {
                raw: "techno_a_b_c".to_string(),
                found: 4,
            })
        );
    }
}
