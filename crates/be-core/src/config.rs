use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartyLayout {
    pub origin: (f32, f32),
    pub spacing: f32,
}

impl Default for PartyLayout {
    fn default() -> Self {
        Self {
            origin: (0.0, -4.0),
            spacing: 1.5,
        }
    }
}

impl PartyLayout {
    /// Positions of `count` party members, centered on the origin.
    pub fn positions(&self, count: usize) -> Vec<(f32, f32)> {
        let half_width = self.spacing * count.saturating_sub(1) as f32 / 2.0;
        (0..count)
            .map(|index| {
                (
                    self.origin.0 - half_width + self.spacing * index as f32,
                    self.origin.1,
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BattleConfig {
    pub party_capacity: usize,
    pub party_floor: usize,
    pub monster_capacity: usize,
    pub opacity_ramp_frames: u32,
    pub party_layout: PartyLayout,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            party_capacity: 4,
            party_floor: 2,
            monster_capacity: 8,
            opacity_ramp_frames: 30,
            party_layout: PartyLayout::default(),
        }
    }
}
