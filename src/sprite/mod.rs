// ┌──────────────────────────────────────────────────────────────────────────┐
// │                  Sprite sheet layout (row-major frames)                  │
// ├──────────────────────────────────────────────────────────────────────────┤
// │   frame_width                                                            │
// │   ◄──►                                                                   │
// │  ┌────┬────┬────┬────┐ ▲                                                 │
// │  │ 0  │ 1  │ 2  │ 3  │ │ frame_height    frames_per_row = 4              │
// │  ├────┼────┼────┼────┤ ▼                 frame 6 -> row 1, col 2         │
// │  │ 4  │ 5  │ 6  │    │                                                   │
// │  └────┴────┴────┴────┘                                                   │
// └──────────────────────────────────────────────────────────────────────────┘
use crate::engine::{Point, Rect, Renderer, Size};
use crate::error::GameError;
use anyhow::Result;
use std::cell::Cell;
use std::rc::Rc;

/// One image cut into equally sized frames.
///
/// The column count depends on the image width, so it stays unknown until the
/// image has loaded. Sheets are shared between animations through `Rc`, hence
/// the `Cell` for the late-bound column count.
#[derive(Debug)]
pub struct SpriteSheet {
    image: String,
    frame_size: Size,
    frames_per_row: Cell<Option<u32>>,
}

impl SpriteSheet {
    pub fn new(image: &str, frame_width: f64, frame_height: f64) -> Result<Self> {
        if !(frame_width > 0.0 && frame_height > 0.0) {
            return Err(GameError::InvalidArgument(format!(
                "frame size of '{}' must be positive, got {}x{}",
                image, frame_width, frame_height
            ))
            .into());
        }
        Ok(SpriteSheet {
            image: image.to_string(),
            frame_size: Size::new(frame_width, frame_height),
            frames_per_row: Cell::new(None),
        })
    }

    /// Resolves the column count from the loaded image width
    pub fn image_loaded(&self, image_width: f64) -> Result<u32> {
        let frames_per_row = (image_width / self.frame_size.width).floor();
        if frames_per_row < 1.0 {
            return Err(GameError::InvalidArgument(format!(
                "image '{}' ({}px) is narrower than one frame ({}px)",
                self.image, image_width, self.frame_size.width
            ))
            .into());
        }
        let frames_per_row = frames_per_row as u32;
        self.frames_per_row.set(Some(frames_per_row));
        Ok(frames_per_row)
    }

    pub fn frames_per_row(&self) -> Option<u32> {
        self.frames_per_row.get()
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn frame_size(&self) -> Size {
        self.frame_size
    }

    /// Source rectangle of `frame` inside the sheet image
    pub fn frame_rect(&self, frame: u32) -> Result<Rect> {
        let frames_per_row = self.frames_per_row().ok_or_else(|| GameError::PrematureDraw {
            image: self.image.clone(),
        })?;
        let row = frame / frames_per_row;
        let col = frame % frames_per_row;
        Ok(Rect::new(
            Point::new(
                f64::from(col) * self.frame_size.width,
                f64::from(row) * self.frame_size.height,
            ),
            self.frame_size,
        ))
    }
}

/// Endless cycle over `start_frame..=end_frame` of a sheet, moving one frame
/// every `frame_speed` updates.
#[derive(Debug, Clone)]
pub struct Animation {
    sheet: Rc<SpriteSheet>,
    sequence: Vec<u32>,
    current_frame: usize,
    frame_speed: u32,
    counter: u32,
}

impl Animation {
    pub fn new(
        sheet: Rc<SpriteSheet>,
        frame_speed: u32,
        start_frame: u32,
        end_frame: u32,
    ) -> Result<Self> {
        if start_frame > end_frame {
            return Err(GameError::InvalidAnimationRange {
                start: start_frame,
                end: end_frame,
            }
            .into());
        }
        if frame_speed == 0 {
            return Err(GameError::InvalidArgument(format!(
                "frame speed of '{}' must be at least 1",
                sheet.image()
            ))
            .into());
        }
        Ok(Animation {
            sheet,
            sequence: (start_frame..=end_frame).collect(),
            current_frame: 0,
            frame_speed,
            counter: 0,
        })
    }

    pub fn update(&mut self) {
        if self.counter == self.frame_speed - 1 {
            self.current_frame = (self.current_frame + 1) % self.sequence.len();
        }
        self.counter = (self.counter + 1) % self.frame_speed;
    }

    /// Back to the first frame of the sequence
    pub fn reset(&mut self) {
        self.current_frame = 0;
        self.counter = 0;
    }

    /// Position inside the sequence, not the sheet frame number
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frame_index(&self) -> u32 {
        self.sequence[self.current_frame]
    }

    /// Fails with `PrematureDraw` when the sheet image is not loaded yet
    pub fn draw(&self, renderer: &mut dyn Renderer, position: Point) -> Result<()> {
        let frame = self.sheet.frame_rect(self.frame_index())?;
        renderer.draw_sprite(
            self.sheet.image(),
            &frame,
            &Rect::new(position, self.sheet.frame_size()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRenderer;

    fn loaded_sheet(frames_per_row: u32) -> Rc<SpriteSheet> {
        let sheet = SpriteSheet::new("player", 52.0, 81.0).unwrap();
        sheet.image_loaded(52.0 * f64::from(frames_per_row)).unwrap();
        Rc::new(sheet)
    }

    #[test]
    fn frames_per_row_is_unknown_until_load() {
        let sheet = SpriteSheet::new("player", 52.0, 81.0).unwrap();
        assert_eq!(sheet.frames_per_row(), None);

        // partial trailing frame is not counted
        assert_eq!(sheet.image_loaded(330.0).unwrap(), 6);
        assert_eq!(sheet.frames_per_row(), Some(6));
    }

    #[test]
    fn image_narrower_than_a_frame_is_rejected() {
        let sheet = SpriteSheet::new("player", 52.0, 81.0).unwrap();
        assert!(sheet.image_loaded(40.0).is_err());
        assert_eq!(sheet.frames_per_row(), None);
    }

    #[test]
    fn zero_sized_frames_are_rejected() {
        assert!(SpriteSheet::new("player", 0.0, 81.0).is_err());
    }

    #[test]
    fn invalid_ranges_fail_fast() {
        let sheet = loaded_sheet(6);
        let err = Animation::new(sheet.clone(), 8, 5, 0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GameError>(),
            Some(&GameError::InvalidAnimationRange { start: 5, end: 0 })
        );
        assert!(Animation::new(sheet, 0, 0, 5).is_err());
    }

    #[test]
    fn one_full_cycle_returns_to_first_frame() {
        let mut animation = Animation::new(loaded_sheet(6), 8, 0, 5).unwrap();
        for _ in 0..48 {
            animation.update();
        }
        assert_eq!(animation.current_frame(), 0);
    }

    #[test]
    fn frame_speed_times_n_updates_advance_n_frames() {
        for frame_speed in 1..=9 {
            for n in 0..15 {
                let mut animation = Animation::new(loaded_sheet(4), frame_speed, 2, 8).unwrap();
                for _ in 0..frame_speed * n {
                    animation.update();
                }
                assert_eq!(animation.current_frame(), n as usize % 7);
                assert!(animation.current_frame() < 7);
            }
        }
    }

    #[test]
    fn frame_only_changes_on_the_last_tick_of_a_step() {
        let mut animation = Animation::new(loaded_sheet(6), 4, 0, 6).unwrap();
        for _ in 0..3 {
            animation.update();
            assert_eq!(animation.current_frame(), 0);
        }
        animation.update();
        assert_eq!(animation.current_frame(), 1);
    }

    #[test]
    fn draw_cuts_the_frame_out_of_its_row() {
        let mut animation = Animation::new(loaded_sheet(4), 1, 0, 6).unwrap();
        for _ in 0..6 {
            animation.update();
        }
        assert_eq!(animation.frame_index(), 6);

        let mut renderer = RecordingRenderer::default();
        animation
            .draw(&mut renderer, Point::new(600.0, 275.0))
            .unwrap();

        let (image, frame, destination) = &renderer.sprites[0];
        assert_eq!(image, "player");
        assert_eq!(frame.position, Point::new(2.0 * 52.0, 81.0));
        assert_eq!(frame.size, Size::new(52.0, 81.0));
        assert_eq!(destination.position, Point::new(600.0, 275.0));
    }

    #[test]
    fn drawing_before_load_is_refused() {
        let sheet = Rc::new(SpriteSheet::new("bigfoot", 172.0, 138.0).unwrap());
        let animation = Animation::new(sheet.clone(), 4, 0, 6).unwrap();
        let mut renderer = RecordingRenderer::default();

        let err = animation
            .draw(&mut renderer, Point::new(60.0, 230.0))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<GameError>(),
            Some(&GameError::PrematureDraw {
                image: "bigfoot".into()
            })
        );
        assert!(renderer.sprites.is_empty());

        // the shared sheet resolves for every animation using it
        sheet.image_loaded(172.0 * 4.0).unwrap();
        assert!(animation.draw(&mut renderer, Point::new(60.0, 230.0)).is_ok());
    }
}
