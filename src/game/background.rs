use crate::engine::assets::AssetLoader;
use crate::engine::{Point, Renderer};
use anyhow::{Context, Result};

/// Static image painted under every layer
pub const BACKDROP: &str = "bg";

/// Far to near. Nearer layers pan faster, which is what sells the depth.
pub const LAYERS: [(&str, f64); 5] = [
    ("sky", 0.2),
    ("backdrop", 0.4),
    ("backdrop2", 0.6),
    ("backdrop3", 0.9),
    ("backdrop4", 1.2),
];

#[derive(Debug, Clone)]
pub struct BackgroundLayer {
    image: String,
    position: Point,
    speed: f64,
    width: f64,
}

impl BackgroundLayer {
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    fn draw(&mut self, renderer: &mut dyn Renderer, canvas_width: f64) -> Result<()> {
        self.position.x -= self.speed;

        // two copies side by side make the loop seamless
        renderer.draw_image(&self.image, self.position)?;
        renderer.draw_image(
            &self.image,
            Point::new(self.position.x + canvas_width, self.position.y),
        )?;

        if self.position.x + self.width <= 0.0 {
            self.position.x = 0.0;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ParallaxBackground {
    layers: Vec<BackgroundLayer>,
    canvas_width: f64,
}

impl ParallaxBackground {
    /// Needs the widths of the loaded layer images from `catalog`
    pub fn new(catalog: &AssetLoader, canvas_width: f64) -> Result<Self> {
        let layers = LAYERS
            .iter()
            .map(|&(image, speed)| {
                let size = catalog
                    .image_size(image)
                    .with_context(|| format!("background layer '{}' not loaded", image))?;
                Ok(BackgroundLayer {
                    image: image.to_string(),
                    position: Point::default(),
                    speed,
                    width: size.width,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut background = ParallaxBackground {
            layers,
            canvas_width,
        };
        background.reset();
        Ok(background)
    }

    pub fn reset(&mut self) {
        for (layer, &(_, speed)) in self.layers.iter_mut().zip(LAYERS.iter()) {
            layer.position = Point::default();
            layer.speed = speed;
        }
    }

    /// Pans every layer one step and paints the frame
    pub fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        renderer.draw_image(BACKDROP, Point::default())?;
        for layer in self.layers.iter_mut() {
            layer.draw(renderer, self.canvas_width)?;
        }
        Ok(())
    }

    pub fn layers(&self) -> &[BackgroundLayer] {
        &self.layers
    }
}
