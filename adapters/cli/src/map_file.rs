//! Map descriptions loaded from TOML.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use battle_prepare_core::{ActorId, MapLayout, MetadataError, PrepareConfig, RawSlot};
use battle_prepare_world::World;
use serde::Deserialize;
use thiserror::Error;

/// Battle map with its party and deployment slots.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct MapFile {
    /// Party members in party order.
    #[serde(default)]
    pub(crate) party: Vec<u32>,
    /// Preparation tunables for the map.
    #[serde(default)]
    pub(crate) config: PrepareConfig,
    /// Authored slots.
    #[serde(default)]
    pub(crate) slots: Vec<RawSlot>,
}

/// Errors raised while turning map text into a world.
#[derive(Debug, Error)]
pub(crate) enum MapError {
    /// The text is not a valid map description.
    #[error("could not parse map description")]
    Parse(#[from] toml::de::Error),
    /// A slot carries malformed metadata.
    #[error("invalid slot metadata")]
    Layout(#[from] MetadataError),
}

impl MapFile {
    /// Parses a map description.
    pub(crate) fn from_toml(text: &str) -> Result<Self, MapError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a map description from disk.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read map {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("failed to load map {}", path.display()))
    }

    /// Party as actor identifiers.
    pub(crate) fn party(&self) -> Vec<ActorId> {
        self.party.iter().copied().map(ActorId::new).collect()
    }

    /// Validates the slots and builds a world waiting for preparation.
    pub(crate) fn world(&self) -> Result<World, MapError> {
        let layout = MapLayout::from_raw(&self.slots)?;
        Ok(World::new(&layout, self.config))
    }
}
