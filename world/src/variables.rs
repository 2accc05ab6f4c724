//! Numeric game variables shared with the surrounding engine.

use std::collections::BTreeMap;

use battle_prepare_core::VariableId;

#[derive(Clone, Debug, Default)]
pub(crate) struct Variables {
    values: BTreeMap<VariableId, i64>,
}

impl Variables {
    pub(crate) fn get(&self, id: VariableId) -> i64 {
        self.values.get(&id).copied().unwrap_or(0)
    }

    pub(crate) fn set(&mut self, id: VariableId, value: i64) {
        let _ = self.values.insert(id, value);
    }

    pub(crate) fn add(&mut self, id: VariableId, delta: i64) {
        let value = self.get(id).saturating_add(delta);
        self.set(id, value);
    }
}
