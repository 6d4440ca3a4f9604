//! Era chronology and good priority slots.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A chronological stage of the game, identified by a two-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Era {
    /// `SA`
    StoneAge,
    /// `BA`
    #[default]
    BronzeAge,
    /// `ME`
    MinoanEra,
    /// `CG`
    ClassicalGreece,
    /// `ER`
    EarlyRome,
    /// `RE`
    RomanEmpire,
    /// `BE`
    ByzantineEra,
    /// `AF`
    AgeOfTheFranks,
    /// `FA`
    FeudalAge,
    /// `IE`
    IberianEra,
    /// `KS`
    KingdomOfSicily,
    /// `HM`
    HighMiddleAges,
}

impl Era {
    /// Every era in chronological order.
    pub const ALL: [Era; 12] = [
        Era::StoneAge,
        Era::BronzeAge,
        Era::MinoanEra,
        Era::ClassicalGreece,
        Era::EarlyRome,
        Era::RomanEmpire,
        Era::ByzantineEra,
        Era::AgeOfTheFranks,
        Era::FeudalAge,
        Era::IberianEra,
        Era::KingdomOfSicily,
        Era::HighMiddleAges,
    ];

    /// Two-letter abbreviation used in identifiers and persisted settings.
    pub fn code(self) -> &'static str {
        match self {
            Era::StoneAge => "SA",
            Era::BronzeAge => "BA",
            Era::MinoanEra => "ME",
            Era::ClassicalGreece => "CG",
            Era::EarlyRome => "ER",
            Era::RomanEmpire => "RE",
            Era::ByzantineEra => "BE",
            Era::AgeOfTheFranks => "AF",
            Era::FeudalAge => "FA",
            Era::IberianEra => "IE",
            Era::KingdomOfSicily => "KS",
            Era::HighMiddleAges => "HM",
        }
    }

    /// Human-readable era title.
    pub fn name(self) -> &'static str {
        match self {
            Era::StoneAge => "Stone Age",
            Era::BronzeAge => "Bronze Age",
            Era::MinoanEra => "Minoan Era",
            Era::ClassicalGreece => "Classical Greece",
            Era::EarlyRome => "Early Rome",
            Era::RomanEmpire => "Roman Empire",
            Era::ByzantineEra => "Byzantine Era",
            Era::AgeOfTheFranks => "Age of the Franks",
            Era::FeudalAge => "Feudal Age",
            Era::IberianEra => "Iberian Era",
            Era::KingdomOfSicily => "Kingdom of Sicily",
            Era::HighMiddleAges => "High Middle Ages",
        }
    }

    /// Look up an era by its two-letter code.
    pub fn from_code(code: &str) -> Option<Era> {
        Era::ALL.into_iter().find(|era| era.code() == code)
    }

    /// Row of this era in a good selection table.
    ///
    /// Goods start with the Bronze Age, so the Stone Age has no row.
    pub fn goods_index(self) -> Option<usize> {
        (self as usize).checked_sub(Era::BronzeAge as usize)
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Era {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Era {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Era::from_code(&code).ok_or_else(|| de::Error::custom(format!("unknown era code '{code}'")))
    }
}

/// One of the three good slots a player fills per era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// First slot.
    Primary,
    /// Second slot.
    Secondary,
    /// Third slot.
    Tertiary,
}

impl Priority {
    /// Column of this priority within a selection row.
    pub fn slot(self) -> usize {
        match self {
            Priority::Primary => 0,
            Priority::Secondary => 1,
            Priority::Tertiary => 2,
        }
    }

    /// Parse the capitalised label used in resource keys (`Primary`, ...).
    pub fn from_label(label: &str) -> Option<Priority> {
        match label {
            "Primary" => Some(Priority::Primary),
            "Secondary" => Some(Priority::Secondary),
            "Tertiary" => Some(Priority::Tertiary),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_lookup() {
        for era in Era::ALL {
            assert_eq!(Era::from_code(era.code()), Some(era));
        }
        assert_eq!(Era::from_code("ZZ"), None);
    }

    #[test]
    fn goods_rows_start_at_bronze_age() {
        assert_eq!(Era::StoneAge.goods_index(), None);
        assert_eq!(Era::BronzeAge.goods_index(), Some(0));
        assert_eq!(Era::ClassicalGreece.goods_index(), Some(2));
    }

    #[test]
    fn persists_as_quoted_code() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&Era::MinoanEra)?, "\"ME\"");
        let era: Era = serde_json::from_str("\"CG\"")?;
        assert_eq!(era, Era::ClassicalGreece);
        assert!(serde_json::from_str::<Era>("\"XX\"").is_err());
        Ok(())
    }
}
