#![warn(clippy::all, missing_docs)]

//! Core logic for the Rise of Cultures wiki companion.
//!
//! This crate hosts the persisted-settings cache, the key-value stores it
//! sits on, the identifier parsers and the resource resolver used by the
//! options surface and any page integration.

pub mod cache;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod era;
pub mod error;
pub mod identifier;
pub mod resolver;
pub mod settings;
pub mod store;

pub use cache::PersistedCache;
pub use config::AppConfig;
pub use era::{Era, Priority};
pub use error::{IdentifierError, StoreError};
pub use identifier::{
    parse_building_identifier, parse_techno_identifier, BuildingIdentifier, TableType,
    TechnoIdentifier,
};
pub use resolver::{normalize_resource_key, GoodSelections};
pub use settings::{SavedEntity, Settings};
pub use store::{FileStore, KeyValueStore, MemoryStore, Subscription};
