//! Test doubles for the output seams
use crate::engine::assets::{AssetKind, AssetLoader};
use crate::engine::{Audio, Devices, Hud, Point, Rect, Renderer, Size};
use anyhow::Result;

/// Size reported for every image by [`complete_loading`], wide enough for
/// every sprite sheet in the manifest
pub const IMAGE_SIZE: Size = Size {
    width: 1204.0,
    height: 480.0,
};

/// Starts `loader` and answers every request as the browser would
pub fn complete_loading(mut loader: AssetLoader) -> AssetLoader {
    for request in loader.load_all(|| {}).unwrap() {
        match request.kind {
            AssetKind::Image => assert!(loader.image_loaded(&request.key, IMAGE_SIZE)),
            AssetKind::Sound => assert!(loader.asset_loaded(request.kind, &request.key)),
        }
    }
    assert!(loader.is_complete());
    loader
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub clears: usize,
    pub images: Vec<(String, Point)>,
    pub sprites: Vec<(String, Rect, Rect)>,
    pub texts: Vec<(String, String, Point)>,
}

impl RecordingRenderer {
    pub fn images_named(&self, key: &str) -> Vec<Point> {
        self.images
            .iter()
            .filter(|(image, _)| image == key)
            .map(|(_, position)| *position)
            .collect()
    }

    pub fn sprites_named(&self, key: &str) -> Vec<Point> {
        self.sprites
            .iter()
            .filter(|(image, _, _)| image == key)
            .map(|(_, _, destination)| destination.position)
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.images.len() + self.sprites.len() + self.texts.len()
    }
}

impl Renderer for RecordingRenderer {
    fn clear(&mut self, _rect: &Rect) {
        self.clears += 1;
    }

    fn draw_image(&mut self, image: &str, position: Point) -> Result<()> {
        self.images.push((image.to_string(), position));
        Ok(())
    }

    fn draw_sprite(&mut self, image: &str, frame: &Rect, destination: &Rect) -> Result<()> {
        self.sprites.push((image.to_string(), *frame, *destination));
        Ok(())
    }

    fn draw_text(&mut self, text: &str, font: &str, position: Point) -> Result<()> {
        self.texts
            .push((text.to_string(), font.to_string(), position));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundCall {
    Play(String, bool),
    Pause(String),
    Rewind(String),
}

#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub calls: Vec<SoundCall>,
}

impl Audio for RecordingAudio {
    fn play(&mut self, sound: &str, looping: bool) {
        self.calls.push(SoundCall::Play(sound.to_string(), looping));
    }

    fn pause(&mut self, sound: &str) {
        self.calls.push(SoundCall::Pause(sound.to_string()));
    }

    fn rewind(&mut self, sound: &str) {
        self.calls.push(SoundCall::Rewind(sound.to_string()));
    }
}

#[derive(Debug, Default)]
pub struct RecordingHud {
    pub final_scores: Vec<u64>,
}

impl Hud for RecordingHud {
    fn show_final_score(&mut self, score: u64) {
        self.final_scores.push(score);
    }
}

/// Owns one of each double and lends them out as [`Devices`]
#[derive(Debug, Default)]
pub struct Recorder {
    pub renderer: RecordingRenderer,
    pub audio: RecordingAudio,
    pub hud: RecordingHud,
}

impl Recorder {
    pub fn devices(&mut self) -> Devices<'_> {
        Devices {
            renderer: &mut self.renderer,
            audio: &mut self.audio,
            hud: &mut self.hud,
        }
    }

    pub fn reset(&mut self) {
        *self = Recorder::default();
    }
}
