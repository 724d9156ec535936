use crate::config::{PlayerConfig, PursuerConfig, SpriteConfig};
use crate::engine::{Point, Renderer};
use crate::sprite::{Animation, SpriteSheet};
use anyhow::Result;
use std::rc::Rc;

pub fn animation(sheet: &Rc<SpriteSheet>, sprite: &SpriteConfig) -> Result<Animation> {
    Animation::new(
        sheet.clone(),
        sprite.frame_speed,
        sprite.start_frame,
        sprite.end_frame,
    )
}

/// The runner. `distance` is both the horizontal draw position and how far
/// ahead of bigfoot it is.
#[derive(Debug, Clone)]
pub struct Player {
    distance: f64,
    y: f64,
    animation: Animation,
}

impl Player {
    pub fn new(config: &PlayerConfig, sheet: &Rc<SpriteSheet>) -> Result<Self> {
        Ok(Player {
            distance: config.start_distance,
            y: config.y,
            animation: animation(sheet, &config.sprite)?,
        })
    }

    pub fn reset(&mut self, config: &PlayerConfig) {
        self.distance = config.start_distance;
        self.y = config.y;
        self.animation.reset();
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn position(&self) -> Point {
        Point::new(self.distance, self.y)
    }

    pub fn update(&mut self) {
        self.animation.update();
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) -> Result<()> {
        self.animation.draw(renderer, self.position())
    }

    /// One extra animation step plus a move of `step` (negative to fall back)
    pub fn run(&mut self, step: f64, renderer: &mut dyn Renderer) -> Result<()> {
        self.animation.update();
        self.distance += step;
        self.draw(renderer)
    }
}

/// Bigfoot never moves, only its animation plays
#[derive(Debug, Clone)]
pub struct Pursuer {
    position: Point,
    animation: Animation,
}

impl Pursuer {
    pub fn new(config: &PursuerConfig, sheet: &Rc<SpriteSheet>) -> Result<Self> {
        Ok(Pursuer {
            position: Point::new(config.x, config.y),
            animation: animation(sheet, &config.sprite)?,
        })
    }

    pub fn reset(&mut self) {
        self.animation.reset();
    }

    pub fn update_and_draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        self.animation.update();
        self.animation.draw(renderer, self.position)
    }
}
