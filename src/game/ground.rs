use crate::engine::{Point, Renderer};
use anyhow::Result;
use std::collections::VecDeque;

pub const GRASS: &str = "grass";

/// Scrolling floor made of equally wide tiles.
///
/// Tiles are always contiguous and there are always
/// `ceil(canvas_width / platform_width) + 2` of them; tiles leaving on the
/// left are recycled to the right.
#[derive(Debug, Clone)]
pub struct Ground {
    tiles: VecDeque<Point>,
    platform_width: f64,
}

impl Ground {
    pub fn new(canvas_width: f64, platform_width: f64, y: f64) -> Self {
        let count = (canvas_width / platform_width).ceil() as usize + 2;
        let tiles = (0..count)
            .map(|i| Point::new(i as f64 * platform_width, y))
            .collect();
        Ground {
            tiles,
            platform_width,
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Point> {
        self.tiles.iter()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Moves every tile left by `speed`, then recycles tiles that went fully off screen
    pub fn scroll(&mut self, speed: f64) {
        for tile in self.tiles.iter_mut() {
            tile.x -= speed;
        }
        self.recycle();
    }

    fn recycle(&mut self) {
        while self
            .tiles
            .front()
            .is_some_and(|first| first.x <= -self.platform_width)
        {
            let Some(mut tile) = self.tiles.pop_front() else {
                return;
            };
            if let Some(last) = self.tiles.back() {
                tile.x = last.x + self.platform_width;
            }
            self.tiles.push_back(tile);
        }
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) -> Result<()> {
        self.tiles
            .iter()
            .try_for_each(|tile| renderer.draw_image(GRASS, *tile))
    }
}
