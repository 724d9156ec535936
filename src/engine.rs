use crate::browser;
use anyhow::{anyhow, Error, Result};
// web assembly is single threaded, so Rc<RefCell> over Arc<Mutex>
use futures::channel::oneshot::channel;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlAudioElement, HtmlImageElement};

pub mod assets;
pub mod input;

use self::assets::{AssetKind, AssetLoader};
use self::input::InputTracker;

// ==================== Geometry ====================
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }
}

// ==================== Output seams ====================
/// Everything the game draws goes through here. Images are addressed by their
/// asset key; the implementation owns the decoded resources.
pub trait Renderer {
    fn clear(&mut self, rect: &Rect);
    fn draw_image(&mut self, image: &str, position: Point) -> Result<()>;
    fn draw_sprite(&mut self, image: &str, frame: &Rect, destination: &Rect) -> Result<()>;
    fn draw_text(&mut self, text: &str, font: &str, position: Point) -> Result<()>;
}

/// Fire-and-forget sound control. Failures are logged by the implementation.
pub trait Audio {
    fn play(&mut self, sound: &str, looping: bool);
    fn pause(&mut self, sound: &str);
    fn rewind(&mut self, sound: &str);
}

/// Page elements outside the canvas
pub trait Hud {
    fn show_final_score(&mut self, score: u64);
}

/// The outputs one tick may touch
pub struct Devices<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub audio: &'a mut dyn Audio,
    pub hud: &'a mut dyn Hud,
}

// ==================== Game ====================
pub trait Game {
    /// Assets to preload, in order
    fn manifest(&self) -> Result<AssetLoader>;
    /// Called once every manifest asset reported in
    fn initialize(&self, catalog: &AssetLoader) -> Result<Box<dyn Game>>;
    fn canvas_size(&self) -> Size;
    fn tracked_key(&self) -> &str;
    fn start(&mut self, devices: &mut Devices) -> Result<()>;
    fn update(&mut self, keystate: &InputTracker, devices: &mut Devices) -> Result<()>;
    fn is_running(&self) -> bool;
}

// length of a frame in milliseconds
const FRAME_SIZE: f64 = 1.0 / 60.0 * 1000.0;
// longest gap one frame may catch up on, a hidden tab pauses the chase
const MAX_FRAME_DELTA: f64 = FRAME_SIZE * 4.0;
// how long preloading may take before we start complaining in the console
const STALL_WARNING_MS: i32 = 10_000;

#[derive(Debug)]
pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f64,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub fn new(now: f64) -> Self {
        GameLoop {
            last_frame: now,
            accumulated_delta: 0.0,
        }
    }

    /// Banks the time since the previous frame and returns how many fixed
    /// ticks are due. Gaps longer than four frames count as four frames.
    pub fn advance(&mut self, perf: f64) -> u32 {
        self.accumulated_delta += (perf - self.last_frame).clamp(0.0, MAX_FRAME_DELTA);
        self.last_frame = perf;

        let mut ticks = 0;
        while self.accumulated_delta > FRAME_SIZE {
            self.accumulated_delta -= FRAME_SIZE;
            ticks += 1;
        }
        ticks
    }

    /// ```text
    /// preload ─► initialize ─► wait for .play ─► start ─► rAF ticks ─► game over
    /// ```
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let loaded = load_assets(game.manifest()?).await?;
        let mut game = game.initialize(&loaded.catalog.borrow())?;

        let canvas = browser::canvas()?;
        let size = game.canvas_size();
        canvas.set_width(size.width as u32);
        canvas.set_height(size.height as u32);

        let mut keyevent_receiver = input::prepare_input(game.tracked_key())?;
        let mut keystate = InputTracker::new(game.tracked_key());

        let mut renderer = CanvasRenderer {
            context: browser::context()?,
            images: loaded.images,
        };
        let mut audio = WebAudio {
            sounds: loaded.sounds,
        };
        let mut hud = DomHud;

        browser::on_click(".restart", || {
            if let Err(err) = browser::reload() {
                log::error!("{:#}", err);
            }
        })?;
        browser::clicked(".play").await?;
        browser::hide("#menu")?;
        browser::show("#canvas")?;

        game.start(&mut Devices {
            renderer: &mut renderer,
            audio: &mut audio,
            hud: &mut hud,
        })?;

        let mut game_loop = GameLoop::new(browser::now()?);
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            // stop flag is only honored between ticks
            if !game.is_running() {
                return;
            }
            // timer fallback calls back without a timestamp
            let perf = if perf.is_nan() {
                browser::now().unwrap_or(game_loop.last_frame + FRAME_SIZE)
            } else {
                perf
            };

            input::drain_input(&mut keyevent_receiver, &mut keystate);
            let ticks = game_loop.advance(perf);

            let mut devices = Devices {
                renderer: &mut renderer,
                audio: &mut audio,
                hud: &mut hud,
            };
            for _ in 0..ticks {
                if !game.is_running() {
                    break;
                }
                if let Err(err) = game.update(&keystate, &mut devices) {
                    log::error!("game loop halted : {:#}", err);
                    return;
                }
            }

            if !game.is_running() {
                log::info!("game loop stopped");
                return;
            }
            if let Some(next) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(next) {
                    log::error!("{:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

// ==================== Browser implementations ====================
pub struct CanvasRenderer {
    context: CanvasRenderingContext2d,
    images: HashMap<String, HtmlImageElement>,
}

impl CanvasRenderer {
    fn image(&self, key: &str) -> Result<&HtmlImageElement> {
        self.images
            .get(key)
            .ok_or_else(|| anyhow!("No image loaded for '{}'", key))
    }
}

impl Renderer for CanvasRenderer {
    fn clear(&mut self, rect: &Rect) {
        self.context.clear_rect(
            rect.position.x,
            rect.position.y,
            rect.size.width,
            rect.size.height,
        );
    }

    fn draw_image(&mut self, image: &str, position: Point) -> Result<()> {
        self.context
            .draw_image_with_html_image_element(self.image(image)?, position.x, position.y)
            .map_err(|err| anyhow!("Drawing '{}' failed : {:#?}", image, err))
    }

    fn draw_sprite(&mut self, image: &str, frame: &Rect, destination: &Rect) -> Result<()> {
        self.context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                self.image(image)?,
                frame.position.x,
                frame.position.y,
                frame.size.width,
                frame.size.height,
                destination.position.x,
                destination.position.y,
                destination.size.width,
                destination.size.height,
            )
            .map_err(|err| anyhow!("Drawing sprite '{}' failed : {:#?}", image, err))
    }

    fn draw_text(&mut self, text: &str, font: &str, position: Point) -> Result<()> {
        self.context.set_font(font);
        self.context
            .fill_text(text, position.x, position.y)
            .map_err(|err| anyhow!("Drawing text failed : {:#?}", err))
    }
}

pub struct WebAudio {
    sounds: HashMap<String, HtmlAudioElement>,
}

impl Audio for WebAudio {
    fn play(&mut self, sound: &str, looping: bool) {
        let Some(element) = self.sounds.get(sound) else {
            log::warn!("No sound loaded for '{}'", sound);
            return;
        };
        element.set_loop(looping);
        // the returned promise is dropped, autoplay rejections only get logged
        // by the browser itself
        if let Err(err) = element.play() {
            log::warn!("Cannot play '{}' : {:?}", sound, err);
        }
    }

    fn pause(&mut self, sound: &str) {
        match self.sounds.get(sound) {
            Some(element) => {
                if let Err(err) = element.pause() {
                    log::warn!("Cannot pause '{}' : {:?}", sound, err);
                }
            }
            None => log::warn!("No sound loaded for '{}'", sound),
        }
    }

    fn rewind(&mut self, sound: &str) {
        match self.sounds.get(sound) {
            Some(element) => element.set_current_time(0.0),
            None => log::warn!("No sound loaded for '{}'", sound),
        }
    }
}

pub struct DomHud;

impl Hud for DomHud {
    fn show_final_score(&mut self, score: u64) {
        let shown = browser::set_text("#score", &score.to_string())
            .and_then(|_| browser::show("#gameOver"));
        if let Err(err) = shown {
            log::warn!("Cannot show final score : {:#}", err);
        }
    }
}

// ==================== Preloading ====================
pub struct LoadedAssets {
    // shared with the stall timer
    pub catalog: Rc<RefCell<AssetLoader>>,
    pub images: HashMap<String, HtmlImageElement>,
    pub sounds: HashMap<String, HtmlAudioElement>,
}

/// Issues every request of `loader` and resolves once all of them reported in.
///
/// An image `error` event fails the whole load. Sounds have no error path: a
/// sound that never becomes playable stalls the load, which is reported to the
/// console after a while but never aborted.
pub async fn load_assets(loader: AssetLoader) -> Result<LoadedAssets> {
    let loader = Rc::new(RefCell::new(loader));
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let requests = loader.borrow_mut().load_all(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    })?;

    let mut images = HashMap::new();
    let mut sounds = HashMap::new();
    for request in requests {
        match request.kind {
            AssetKind::Image => {
                let image = browser::new_image()?;
                let on_load = {
                    let loader = loader.clone();
                    let image = image.clone();
                    let key = request.key.clone();
                    browser::closure_once(move || {
                        let size = Size::new(
                            image.natural_width().into(),
                            image.natural_height().into(),
                        );
                        loader.borrow_mut().image_loaded(&key, size);
                    })
                };
                let on_error = {
                    let error_tx = error_tx.clone();
                    let source = request.source.clone();
                    browser::closure_once(move |err: wasm_bindgen::JsValue| {
                        if let Some(tx) = error_tx.borrow_mut().take() {
                            let _ = tx.send(Err(anyhow!(
                                "Error loading image '{}' : {:#?}",
                                source,
                                err
                            )));
                        }
                    })
                };
                image.set_onload(Some(on_load.as_ref().unchecked_ref()));
                image.set_onerror(Some(on_error.as_ref().unchecked_ref()));
                image.set_src(&request.source);
                // keep callbacks alive until the image loads or errors
                on_load.forget();
                on_error.forget();
                images.insert(request.key, image);
            }
            AssetKind::Sound => {
                let sound = browser::new_audio()?;
                // may fire more than once, duplicates are dropped by the loader
                let on_playable = {
                    let loader = loader.clone();
                    let key = request.key.clone();
                    browser::closure_wrap(Box::new(move || {
                        loader.borrow_mut().asset_loaded(AssetKind::Sound, &key);
                    }) as Box<dyn FnMut()>)
                };
                sound
                    .add_event_listener_with_callback(
                        "canplaythrough",
                        on_playable.as_ref().unchecked_ref(),
                    )
                    .map_err(|err| anyhow!("Cannot listen on '{}' : {:#?}", request.source, err))?;
                on_playable.forget();
                sound.set_preload("auto");
                sound.set_src(&request.source);
                sound.load();
                sounds.insert(request.key, sound);
            }
        }
    }

    {
        let loader = loader.clone();
        browser::set_timeout(
            move || {
                if let Some(stall) = loader.borrow().stall_report() {
                    log::warn!("{}", stall);
                }
            },
            STALL_WARNING_MS,
        )?;
    }

    // Result<Result<(), Error>, oneshot::Canceled>
    // - outer : channel result, inner : load result
    rx.await??;

    Ok(LoadedAssets {
        catalog: loader,
        images,
        sounds,
    })
}
