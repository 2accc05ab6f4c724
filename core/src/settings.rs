//! Save-persisted preparation toggles.

use serde::{Deserialize, Serialize};

/// One-shot headcount overrides for the next preparation phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RosterOverrides {
    /// Replaces the default maximum headcount.
    pub max_actor: Option<usize>,
    /// Replaces the default minimum headcount.
    pub min_actor: Option<usize>,
}

impl RosterOverrides {
    /// Reports whether neither bound is overridden.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.max_actor.is_none() && self.min_actor.is_none()
    }
}

/// Preparation settings stored with the save payload.
///
/// Only the enable flag is persisted; headcount overrides are cleared after
/// every battle and never written out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareSettings {
    enabled: bool,
    #[serde(skip)]
    overrides: RosterOverrides,
}

impl Default for PrepareSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            overrides: RosterOverrides::default(),
        }
    }
}

impl PrepareSettings {
    /// Reports whether the next battle starts with a preparation phase.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables preparation for the next battle. Idempotent.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disables preparation for the next battle. Idempotent.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Overrides the maximum headcount for the next battle.
    pub fn override_max_actor(&mut self, count: usize) {
        self.overrides.max_actor = Some(count);
    }

    /// Overrides the minimum headcount for the next battle.
    pub fn override_min_actor(&mut self, count: usize) {
        self.overrides.min_actor = Some(count);
    }

    /// Pending overrides, without consuming them.
    #[must_use]
    pub const fn overrides(&self) -> RosterOverrides {
        self.overrides
    }

    /// Hands the pending overrides to a starting phase, clearing them.
    pub fn take_overrides(&mut self) -> RosterOverrides {
        std::mem::take(&mut self.overrides)
    }

    /// Resets the per-battle state once a battle ends.
    pub fn end_battle(&mut self) {
        self.enabled = true;
        self.overrides = RosterOverrides::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_are_idempotent() {
        let mut settings = PrepareSettings::default();
        settings.disable();
        settings.disable();
        assert!(!settings.is_enabled());
        settings.enable();
        settings.enable();
        assert!(settings.is_enabled());
    }

    #[test]
    fn overrides_are_consumed_once() {
        let mut settings = PrepareSettings::default();
        settings.override_max_actor(3);
        settings.override_min_actor(2);

        let taken = settings.take_overrides();
        assert_eq!(taken.max_actor, Some(3));
        assert_eq!(taken.min_actor, Some(2));
        assert!(settings.overrides().is_empty());
    }

    #[test]
    fn overrides_are_not_persisted() {
        let mut settings = PrepareSettings::default();
        settings.disable();
        settings.override_max_actor(5);

        let bytes = bincode::serialize(&settings).expect("serialize");
        let restored: PrepareSettings = bincode::deserialize(&bytes).expect("deserialize");

        assert!(!restored.is_enabled());
        assert!(restored.overrides().is_empty());
    }

    #[test]
    fn ending_a_battle_restores_defaults() {
        let mut settings = PrepareSettings::default();
        settings.disable();
        settings.override_min_actor(2);
        settings.end_battle();
        assert_eq!(settings, PrepareSettings::default());
    }
}
