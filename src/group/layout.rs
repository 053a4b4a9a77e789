//! Tile layout groups.

use serde::{Deserialize, Serialize};

use crate::storage::{StorageError, TemporaryStorage};

/// One sprite of a tile layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayoutSprite {
    pub sprite: u32,
    #[serde(default)]
    pub palette: u32,
    /// Sprite number is relative to the resolved sprite set
    #[serde(default)]
    pub custom: bool,
    /// Position offset (x, y, z) inside the tile
    #[serde(default)]
    pub offset: [i8; 3],
    /// Bounding box size; `None` draws the sprite as a child of the previous one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<[u8; 3]>,
    /// Register that must be non-zero for the sprite to be drawn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_register: Option<u32>,
}

impl LayoutSprite {
    pub fn new(sprite: u32) -> Self {
        Self { sprite, ..Self::default() }
    }

    pub fn custom(sprite: u32) -> Self {
        Self { sprite, custom: true, ..Self::default() }
    }
}

/// Ground sprite plus the building sprites drawn on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpriteLayout {
    pub ground: LayoutSprite,
    #[serde(default)]
    pub sprites: Vec<LayoutSprite>,
}

/// Terminal group describing how to draw a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayoutGroup {
    pub layout: SpriteLayout,
    /// Number of sprites per custom sprite set, used for construction stages
    pub num_sprites: u8,
}

impl TileLayoutGroup {
    pub fn new(layout: SpriteLayout, num_sprites: u8) -> Self {
        Self { layout, num_sprites }
    }

    /// Offset into a sprite set for a construction stage (0..=3).
    ///
    /// Sets with up to four sprites map stages onto the available sprites;
    /// longer sets only use the first four.
    pub fn construction_stage_offset(&self, stage: u8) -> u32 {
        let n = self.num_sprites.clamp(1, 4) as u32;
        match stage {
            0 => 0,
            1 => {
                if n > 2 {
                    1
                } else {
                    0
                }
            }
            2 => {
                if n > 2 {
                    n - 2
                } else {
                    0
                }
            }
            _ => n - 1,
        }
    }

    /// Concrete sprites to draw for a resolved sprite set.
    ///
    /// Custom sprites are rebased onto `base_sprite` and shifted by the
    /// construction stage. Sprites whose draw register reads zero are
    /// skipped; the ground sprite is always drawn.
    pub fn process(
        &self,
        temp: &TemporaryStorage,
        base_sprite: u32,
        stage: u8,
    ) -> Result<Vec<LayoutSprite>, StorageError> {
        let stage_offset = self.construction_stage_offset(stage);
        let place = |sprite: &LayoutSprite| {
            let mut placed = *sprite;
            if placed.custom {
                placed.sprite = base_sprite.wrapping_add(placed.sprite).wrapping_add(stage_offset);
                placed.custom = false;
            }
            placed
        };

        let mut drawn = Vec::with_capacity(self.layout.sprites.len() + 1);
        drawn.push(place(&self.layout.ground));
        for sprite in &self.layout.sprites {
            if let Some(register) = sprite.draw_register {
                if temp.try_get(register)? == 0 {
                    continue;
                }
            }
            drawn.push(place(sprite));
        }
        Ok(drawn)
    }
}
