//! Per-player visibility on the web map.

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;

pub struct PlayerVisibility {
    default_visible: bool,
    overrides: RwLock<HashMap<String, bool>>,
}

impl PlayerVisibility {
    pub fn new(default_visible: bool) -> Self {
        Self {
            default_visible,
            overrides: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, player: &str) -> bool {
        self.overrides
            .read()
            .get(player)
            .copied()
            .unwrap_or(self.default_visible)
    }

    pub fn set(&self, player: &str, visible: bool) {
        debug!("Player '{}' visibility set to {}", player, visible);
        let mut overrides = self.overrides.write();
        if visible == self.default_visible {
            overrides.remove(player);
        } else {
            overrides.insert(player.to_string(), visible);
        }
    }

    /// Players explicitly hidden, sorted.
    ///
    /// When players are hidden by default this is always empty.
    pub fn hidden_players(&self) -> Vec<String> {
        let mut hidden: Vec<_> = self
            .overrides
            .read()
            .iter()
            .filter(|(_, visible)| !**visible)
            .map(|(id, _)| id.clone())
            .collect();
        hidden.sort();
        hidden
    }
}

impl Default for PlayerVisibility {
    fn default() -> Self {
        Self::new(true)
    }
}
