pub mod actors;
pub mod background;
pub mod difficulty;
pub mod ground;
pub mod state;

use self::state::{Event, GameSession, SessionMachine};
use crate::config::GameConfig;
use crate::engine::assets::AssetLoader;
use crate::engine::input::InputTracker;
use crate::engine::{Devices, Game, Size};
use anyhow::{anyhow, Result};

pub const PLAYER_SHEET: &str = "player";
pub const PURSUER_SHEET: &str = "bigfoot";

pub const BG_MUSIC: &str = "bg";
pub const GAME_OVER: &str = "gameOver";
pub const GAME_OVER_2: &str = "gameOver2";

const IMAGES: [(&str, &str); 7] = [
    (background::BACKDROP, "img/bigfoot/bg.png"),
    ("sky", "img/bigfoot/sky.png"),
    ("backdrop", "img/bigfoot/mtns-mid.png"),
    ("backdrop2", "img/bigfoot/mtns-foreground.png"),
    ("backdrop3", "img/bigfoot/trees.png"),
    ("backdrop4", "img/bigfoot/brush.png"),
    (ground::GRASS, "img/bigfoot/grass.png"),
];

const SOUNDS: [(&str, &str); 3] = [
    (BG_MUSIC, "sounds/bg.mp3"),
    (GAME_OVER, "sounds/gameOver.mp3"),
    (GAME_OVER_2, "sounds/gameOver2.mp3"),
];

/// ```text
/// ┌──────────────────── Chase Lifecycle ─────────────────────┐
/// │                                                          │
/// │  Loading(config) ── manifest() ──► AssetLoader           │
/// │        │                               │ all loaded      │
/// │        └──────── initialize(catalog) ◄─┘                 │
/// │                         │                                │
/// │                         ▼                                │
/// │  Loaded(Chase) ── start() ──► update() per tick ──► over │
/// │                                                          │
/// └──────────────────────────────────────────────────────────┘
/// ```
pub enum BigfootChase {
    /// Assets are still on their way
    Loading(GameConfig),
    Loaded(Chase),
}

pub struct Chase {
    // None once a tick failed, the session cannot be recovered
    machine: Option<SessionMachine>,
    tracked_key: String,
    canvas: Size,
}

impl Chase {
    fn transition(&mut self, event: Event, devices: &mut Devices) -> Result<()> {
        let machine = self
            .machine
            .take()
            .ok_or_else(|| anyhow!("Chase: session halted after an earlier error"))?;
        self.machine = Some(machine.transition(event, devices)?);
        Ok(())
    }

    pub fn machine(&self) -> Option<&SessionMachine> {
        self.machine.as_ref()
    }
}

impl BigfootChase {
    pub fn new(config: GameConfig) -> Self {
        BigfootChase::Loading(config)
    }

    pub fn chase(&self) -> Option<&Chase> {
        match self {
            BigfootChase::Loading(_) => None,
            BigfootChase::Loaded(chase) => Some(chase),
        }
    }
}

impl Game for BigfootChase {
    fn manifest(&self) -> Result<AssetLoader> {
        let BigfootChase::Loading(config) = self else {
            return Err(anyhow!("Game is already initialized"));
        };
        let mut loader = AssetLoader::new();
        for (key, source) in IMAGES {
            loader.register_image(key, source)?;
        }
        loader.register_image(PLAYER_SHEET, &config.player.sprite.sheet)?;
        loader.register_image(PURSUER_SHEET, &config.pursuer.sprite.sheet)?;
        for (key, source) in SOUNDS {
            loader.register_sound(key, source)?;
        }
        Ok(loader)
    }

    fn initialize(&self, catalog: &AssetLoader) -> Result<Box<dyn Game>> {
        match self {
            BigfootChase::Loading(config) => {
                let session = GameSession::new(config.clone(), catalog)?;
                Ok(Box::new(BigfootChase::Loaded(Chase {
                    machine: Some(SessionMachine::new(session)),
                    tracked_key: config.tracked_key.clone(),
                    canvas: config.canvas,
                })))
            }
            BigfootChase::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn canvas_size(&self) -> Size {
        match self {
            BigfootChase::Loading(config) => config.canvas,
            BigfootChase::Loaded(chase) => chase.canvas,
        }
    }

    fn tracked_key(&self) -> &str {
        match self {
            BigfootChase::Loading(config) => &config.tracked_key,
            BigfootChase::Loaded(chase) => &chase.tracked_key,
        }
    }

    fn start(&mut self, devices: &mut Devices) -> Result<()> {
        match self {
            BigfootChase::Loaded(chase) => chase.transition(Event::Start, devices),
            BigfootChase::Loading(_) => Err(anyhow!("Game started before initialize")),
        }
    }

    fn update(&mut self, keystate: &InputTracker, devices: &mut Devices) -> Result<()> {
        if let BigfootChase::Loaded(chase) = self {
            let pressed = keystate.is_pressed();
            chase.transition(Event::Tick { pressed }, devices)?;
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.chase()
            .and_then(Chase::machine)
            .is_some_and(SessionMachine::is_running)
    }
}
