//! Tuning values for a chase.
//!
//! Defaults reproduce the shipped game. A `bigfoot.json` next to the page may
//! override any subset of fields (camelCase keys), at any depth; missing
//! fields keep their default.
use crate::engine::Size;
use crate::error::GameError;
use crate::fetch;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CONFIG_PATH: &str = "bigfoot.json";

fn invalid(reason: impl Into<String>) -> Result<()> {
    Err(GameError::InvalidArgument(reason.into()).into())
}

/// Recursive object merge; anything that is not an object on both sides
/// (numbers, strings, arrays) is replaced wholesale
fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

/// Every field is required. Partial sprite overrides are merged over the
/// shipped sprite by [`GameConfig::with_overrides`] before deserializing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteConfig {
    pub sheet: String,
    pub frame_width: f64,
    pub frame_height: f64,
    /// updates per animation frame
    pub frame_speed: u32,
    pub start_frame: u32,
    pub end_frame: u32,
}

impl SpriteConfig {
    fn validate(&self, name: &str) -> Result<()> {
        if self.sheet.is_empty() {
            return invalid(format!("{} sprite has no sheet", name));
        }
        if !(self.frame_width > 0.0 && self.frame_height > 0.0) {
            return invalid(format!(
                "{} frame size must be positive, got {}x{}",
                name, self.frame_width, self.frame_height
            ));
        }
        if self.frame_speed == 0 {
            return invalid(format!("{} frame speed must be at least 1", name));
        }
        if self.start_frame > self.end_frame {
            return Err(GameError::InvalidAnimationRange {
                start: self.start_frame,
                end: self.end_frame,
            }
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    pub sprite: SpriteConfig,
    pub start_distance: f64,
    pub y: f64,
    /// ground scroll per tick
    pub speed: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            sprite: SpriteConfig {
                sheet: "img/bigfoot/snake-running.png".to_string(),
                frame_width: 52.0,
                frame_height: 81.0,
                frame_speed: 8,
                start_frame: 0,
                end_frame: 5,
            },
            start_distance: 600.0,
            y: 275.0,
            speed: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PursuerConfig {
    pub sprite: SpriteConfig,
    pub x: f64,
    pub y: f64,
}

impl Default for PursuerConfig {
    fn default() -> Self {
        PursuerConfig {
            sprite: SpriteConfig {
                sheet: "img/bigfoot/bigfoot-sheet.png".to_string(),
                frame_width: 172.0,
                frame_height: 138.0,
                frame_speed: 4,
                start_frame: 0,
                end_frame: 6,
            },
            x: 60.0,
            y: 230.0,
        }
    }
}

/// Step sizes used while `score < below`; `below: None` closes the table
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyTier {
    pub below: Option<f64>,
    pub forward: f64,
    pub backward: f64,
}

impl DifficultyTier {
    pub const fn new(below: Option<f64>, forward: f64, backward: f64) -> Self {
        DifficultyTier {
            below,
            forward,
            backward,
        }
    }
}

pub const DEFAULT_TIERS: [DifficultyTier; 6] = [
    DifficultyTier::new(Some(15.0), 2.0, 2.0),
    DifficultyTier::new(Some(30.0), 1.75, 3.0),
    DifficultyTier::new(Some(40.0), 1.5, 3.5),
    DifficultyTier::new(Some(50.0), 1.25, 4.0),
    DifficultyTier::new(Some(60.0), 1.0, 4.5),
    DifficultyTier::new(None, 0.75, 5.0),
];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub canvas: Size,
    pub platform_width: f64,
    pub score_per_tick: f64,
    /// `KeyboardEvent.code` of the run key
    pub tracked_key: String,
    pub player: PlayerConfig,
    pub pursuer: PursuerConfig,
    /// pressing stops pushing forward past this distance
    pub forward_cap: f64,
    /// releasing stops falling back below this distance
    pub retreat_floor: f64,
    pub loss_threshold: f64,
    pub difficulty: Vec<DifficultyTier>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            canvas: Size::new(800.0, 480.0),
            platform_width: 32.0,
            score_per_tick: 1.0 / 60.0,
            tracked_key: "Space".to_string(),
            player: PlayerConfig::default(),
            pursuer: PursuerConfig::default(),
            forward_cap: 750.0,
            retreat_floor: 80.0,
            loss_threshold: 155.0,
            difficulty: DEFAULT_TIERS.to_vec(),
        }
    }
}

impl GameConfig {
    /// Catches values the chase cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            return invalid(format!("canvas must have a positive size, got {:?}", self.canvas));
        }
        if !(self.platform_width > 0.0) {
            return invalid(format!(
                "platform width must be positive, got {}",
                self.platform_width
            ));
        }
        if !(self.score_per_tick > 0.0) {
            return invalid(format!(
                "score per tick must be positive, got {}",
                self.score_per_tick
            ));
        }
        if self.tracked_key.is_empty() {
            return invalid("tracked key is empty");
        }
        self.player.sprite.validate("player")?;
        self.pursuer.sprite.validate("pursuer")?;

        let Some((last, bounded)) = self.difficulty.split_last() else {
            return invalid("difficulty table is empty");
        };
        if last.below.is_some() {
            return invalid("last difficulty tier must have no upper bound");
        }
        if bounded.iter().any(|tier| tier.below.is_none()) {
            return invalid("only the last difficulty tier may be unbounded");
        }
        for pair in self.difficulty.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if let (Some(lower_bound), Some(upper_bound)) = (lower.below, upper.below) {
                if lower_bound >= upper_bound {
                    return invalid("difficulty bounds must be strictly ascending");
                }
            }
            if upper.forward > lower.forward || upper.backward < lower.backward {
                return invalid("difficulty must not get easier as the score rises");
            }
        }
        Ok(())
    }

    /// The defaults with `overrides` (a JSON object in file form) laid over them
    pub fn with_overrides(overrides: Value) -> Result<GameConfig> {
        let mut merged = serde_json::to_value(GameConfig::default())?;
        merge(&mut merged, overrides);
        Ok(serde_json::from_value(merged)?)
    }

    /// Fetches [`CONFIG_PATH`], falling back to the defaults on any failure
    pub async fn load() -> GameConfig {
        let overrides = match fetch::fetch_json::<Value>(CONFIG_PATH).await {
            Ok(overrides) => overrides,
            Err(err) => {
                log::info!("no usable {} ({:#}), using defaults", CONFIG_PATH, err);
                return GameConfig::default();
            }
        };
        match GameConfig::with_overrides(overrides).and_then(|config| {
            config.validate()?;
            Ok(config)
        }) {
            Ok(config) => {
                log::info!("using tuning from {}", CONFIG_PATH);
                config
            }
            Err(err) => {
                log::warn!("ignoring {} : {:#}", CONFIG_PATH, err);
                GameConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = GameConfig::with_overrides(
            serde_json::from_str(r#"{ "lossThreshold": 120, "player": { "startDistance": 500 } }"#)
                .unwrap(),
        )
        .unwrap();

        assert_eq!(config.loss_threshold, 120.0);
        assert_eq!(config.player.start_distance, 500.0);
        assert_eq!(config.player.y, 275.0);
        assert_eq!(config.player.sprite.frame_speed, 8);
        assert_eq!(config.difficulty, DEFAULT_TIERS.to_vec());
        config.validate().unwrap();
    }

    #[test]
    fn difficulty_must_close_with_an_unbounded_tier() {
        let mut config = GameConfig::default();
        config.difficulty.pop();
        assert!(config.validate().is_err());

        config.difficulty = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn difficulty_must_not_ease_off() {
        let mut config = GameConfig::default();
        config.difficulty[3].forward = 3.0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.difficulty[2].below = Some(10.0);
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.difficulty[1].below = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_geometry_is_rejected() {
        let mut config = GameConfig::default();
        config.platform_width = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_sprite_override_keeps_the_shipped_sprite() {
        let config =
            GameConfig::with_overrides(json!({ "player": { "sprite": { "frameSpeed": 4 } } }))
                .unwrap();

        let sprite = &config.player.sprite;
        assert_eq!(sprite.frame_speed, 4);
        assert_eq!(sprite.sheet, "img/bigfoot/snake-running.png");
        assert_eq!((sprite.frame_width, sprite.frame_height), (52.0, 81.0));
        assert_eq!((sprite.start_frame, sprite.end_frame), (0, 5));
        assert_eq!(config.pursuer, PursuerConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn arrays_replace_instead_of_merging() {
        let config = GameConfig::with_overrides(json!({
            "difficulty": [ { "below": null, "forward": 1.0, "backward": 1.0 } ]
        }))
        .unwrap();
        assert_eq!(config.difficulty, vec![DifficultyTier::new(None, 1.0, 1.0)]);
    }

    #[test]
    fn mistyped_overrides_are_errors() {
        let mistyped = json!({ "player": { "sprite": { "frameSpeed": "fast" } } });
        assert!(GameConfig::with_overrides(mistyped).is_err());
        assert!(GameConfig::with_overrides(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn zero_frame_speed_is_rejected() {
        let mut config = GameConfig::default();
        config.player.sprite.frame_speed = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn reversed_frame_range_is_rejected() {
        let mut config = GameConfig::default();
        config.pursuer.sprite.start_frame = 7;
        config.pursuer.sprite.end_frame = 2;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.downcast_ref::<GameError>(),
            Some(&GameError::InvalidAnimationRange { start: 7, end: 2 })
        );
    }

    #[test]
    fn non_positive_frame_size_is_rejected() {
        let mut config = GameConfig::default();
        config.player.sprite.frame_width = 0.0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.pursuer.sprite.frame_height = -138.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_sheet_is_rejected() {
        let config = GameConfig::with_overrides(json!({ "pursuer": { "sprite": { "sheet": "" } } }))
            .unwrap();
        assert!(config.validate().is_err());
    }
}
