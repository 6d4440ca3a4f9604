//! Batch helpers over saved entities: identifier parsing, grouping and totals.

use std::collections::BTreeMap;

use tracing::warn;

use crate::{
    identifier::{
        parse_building_identifier, parse_techno_identifier, BuildingIdentifier, TechnoIdentifier,
    },
    resolver::{normalize_resource_key, GoodSelections},
    settings::SavedEntity,
};

/// Parse every building id, skipping and logging the malformed ones.
pub fn parse_buildings<'a>(
    ids: impl IntoIterator<Item = &'a str>,
) -> Vec<BuildingIdentifier> {
    ids.into_iter()
        .filter_map(|id| match parse_building_identifier(id) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!("Skipping building: {err}");
                None
            }
        })
        .collect()
}

/// Parse every techno id, skipping and logging the malformed ones.
pub fn parse_technos<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<TechnoIdentifier> {
    ids.into_iter()
        .filter_map(|id| match parse_techno_identifier(id) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!("Skipping techno: {err}");
                None
            }
        })
        .collect()
}

/// Group buildings by era code, preserving input order within each era.
pub fn group_by_era(
    buildings: impl IntoIterator<Item = BuildingIdentifier>,
) -> BTreeMap<String, Vec<BuildingIdentifier>> {
    let mut grouped: BTreeMap<String, Vec<BuildingIdentifier>> = BTreeMap::new();
    for building in buildings {
        grouped
            .entry(building.era.clone())
            .or_default()
            .push(building);
    }
    grouped
}

/// Sum the costs of `entities` per resolved good name.
pub fn resource_totals(
    entities: &[SavedEntity],
    selections: &GoodSelections,
) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for entity in entities {
        for (key, amount) in &entity.costs {
            let total = totals
                .entry(normalize_resource_key(key, selections))
                .or_insert(0u64);
            *total = total.saturating_add(*amount);
        }
    }
    totals
}
