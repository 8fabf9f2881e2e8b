//! Mission catalog: the ordered campaign a fresh game starts from.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Mission, MissionKind};

/// Mission entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct MissionCfg {
  pub id: u32,
  pub kind: MissionKind,
  pub title: String,
}

/// Immutable campaign definition. `missions()` always hands out fresh,
/// uncompleted copies.
#[derive(Clone, Debug)]
pub struct MissionCatalog {
  entries: Vec<MissionCfg>,
}

impl Default for MissionCatalog {
  fn default() -> Self {
    let entry = |id, kind, title: &str| MissionCfg { id, kind, title: title.into() };
    Self {
      entries: vec![
        entry(1, MissionKind::Riddle, "First Stop"),
        entry(2, MissionKind::Story, "Moon Base"),
        entry(3, MissionKind::Riddle, "Number Planet"),
        entry(4, MissionKind::Story, "Mars Expedition"),
        entry(5, MissionKind::Boss, "Star Gate"),
      ],
    }
  }
}

impl MissionCatalog {
  /// Ids must run `1..=n` in order, otherwise level pointers make no sense.
  pub fn from_entries(entries: Vec<MissionCfg>) -> Result<Self, String> {
    if entries.is_empty() {
      return Err("mission catalog is empty".into());
    }
    for (idx, m) in entries.iter().enumerate() {
      let expected = idx as u32 + 1;
      if m.id != expected {
        return Err(format!("mission at position {expected} has id {} (ids must be 1..=n in order)", m.id));
      }
      if m.title.trim().is_empty() {
        return Err(format!("mission {} has an empty title", m.id));
      }
    }
    Ok(Self { entries })
  }

  /// Configured catalog if valid, default campaign otherwise.
  pub fn from_config(entries: Option<&[MissionCfg]>) -> Self {
    match entries {
      Some(list) if !list.is_empty() => match Self::from_entries(list.to_vec()) {
        Ok(cat) => {
          info!(target: "game", missions = cat.len(), "Using configured mission catalog");
          cat
        }
        Err(e) => {
          error!(target: "game", error = %e, "Rejected configured mission catalog; using default");
          Self::default()
        }
      },
      _ => Self::default(),
    }
  }

  pub fn len(&self) -> usize { self.entries.len() }

  /// Always false for a validated catalog.
  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn missions(&self) -> Vec<Mission> {
    self
      .entries
      .iter()
      .map(|e| Mission { id: e.id, kind: e.kind, title: e.title.clone(), completed: false })
      .collect()
  }
}
