//! Session phases as types.
//!
//! A phase can only be left through the methods of its own `SessionState<S>`,
//! so a finished chase cannot be ticked back to life and an idle one cannot
//! score. `SessionMachine` erases the phase for storage.
use super::actors::{Player, Pursuer};
use super::background::ParallaxBackground;
use super::difficulty::DifficultyTable;
use super::ground::Ground;
use super::{BG_MUSIC, GAME_OVER, GAME_OVER_2, PLAYER_SHEET, PURSUER_SHEET};
use crate::config::{GameConfig, SpriteConfig};
use crate::engine::assets::AssetLoader;
use crate::engine::{Audio, Devices, Point, Rect};
use crate::sprite::SpriteSheet;
use anyhow::{Context, Result};
use std::rc::Rc;

pub const SCORE_FONT: &str = "20px Impact";

#[derive(Debug, Copy, Clone)]
pub struct Idle;
#[derive(Debug, Copy, Clone)]
pub struct Running;
#[derive(Debug, Copy, Clone)]
pub struct GameOver;

/// Everything a chase needs between ticks
#[derive(Debug, Clone)]
pub struct GameSession {
    score: f64,
    player: Player,
    pursuer: Pursuer,
    ground: Ground,
    background: ParallaxBackground,
    difficulty: DifficultyTable,
    config: GameConfig,
}

fn sheet(catalog: &AssetLoader, key: &str, sprite: &SpriteConfig) -> Result<Rc<SpriteSheet>> {
    let sheet = SpriteSheet::new(key, sprite.frame_width, sprite.frame_height)?;
    let size = catalog
        .image_size(key)
        .with_context(|| format!("sprite sheet '{}' not loaded", key))?;
    sheet.image_loaded(size.width)?;
    Ok(Rc::new(sheet))
}

impl GameSession {
    /// Builds the world from the loaded images in `catalog`
    pub fn new(config: GameConfig, catalog: &AssetLoader) -> Result<Self> {
        let player_sheet = sheet(catalog, PLAYER_SHEET, &config.player.sprite)?;
        let pursuer_sheet = sheet(catalog, PURSUER_SHEET, &config.pursuer.sprite)?;

        Ok(GameSession {
            score: 0.0,
            player: Player::new(&config.player, &player_sheet)?,
            pursuer: Pursuer::new(&config.pursuer, &pursuer_sheet)?,
            ground: Self::new_ground(&config),
            background: ParallaxBackground::new(catalog, config.canvas.width)?,
            difficulty: DifficultyTable::new(config.difficulty.clone())?,
            config,
        })
    }

    // grass sits four tiles above the bottom edge
    fn new_ground(config: &GameConfig) -> Ground {
        Ground::new(
            config.canvas.width,
            config.platform_width,
            config.canvas.height - 4.0 * config.platform_width,
        )
    }

    fn reset(&mut self) {
        self.score = 0.0;
        self.player.reset(&self.config.player);
        self.pursuer.reset();
        self.ground = Self::new_ground(&self.config);
        self.background.reset();
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Whole seconds survived, as shown to the player
    pub fn final_score(&self) -> u64 {
        self.score.floor() as u64
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ground(&self) -> &Ground {
        &self.ground
    }
}

#[derive(Debug, Clone)]
pub struct SessionState<S> {
    session: GameSession,
    _state: S,
}

impl<S> SessionState<S> {
    pub fn session(&self) -> &GameSession {
        &self.session
    }
}

/// What a running tick turned into
pub enum TickOutcome {
    Running(SessionState<Running>),
    Caught(SessionState<GameOver>),
}

impl SessionState<Idle> {
    pub fn new(session: GameSession) -> Self {
        SessionState {
            session,
            _state: Idle,
        }
    }

    /// Restarts the music and zeroes the world
    pub fn start(mut self, audio: &mut dyn Audio) -> SessionState<Running> {
        audio.pause(GAME_OVER);
        audio.rewind(BG_MUSIC);
        audio.play(BG_MUSIC, true);
        self.session.reset();
        log::info!("chase started");

        SessionState {
            session: self.session,
            _state: Running,
        }
    }
}

impl SessionState<Running> {
    /// One fixed step: score, paint the scene, move the runner, check the catch.
    ///
    /// `pressed` is the debounced run key; holding it only counts once.
    pub fn tick(mut self, pressed: bool, devices: &mut Devices) -> Result<TickOutcome> {
        let session = &mut self.session;
        let config = &session.config;
        session.score += config.score_per_tick;

        devices
            .renderer
            .clear(&Rect::new(Point::default(), config.canvas));
        session.background.draw(devices.renderer)?;
        devices.renderer.draw_text(
            &format!("Score: {} sec", session.final_score()),
            SCORE_FONT,
            Point::new(config.canvas.width - 150.0, 30.0),
        )?;

        session.ground.scroll(config.player.speed);
        session.ground.draw(devices.renderer)?;

        session.player.update();
        session.player.draw(devices.renderer)?;

        let tier = *session.difficulty.select(session.score);
        if pressed && session.player.distance() <= config.forward_cap {
            session.player.run(tier.forward, devices.renderer)?;
        } else if session.player.distance() >= config.retreat_floor {
            session.player.run(-tier.backward, devices.renderer)?;
        }

        let caught = session.player.distance() <= config.loss_threshold;
        if caught {
            devices.audio.pause(BG_MUSIC);
            devices.audio.rewind(GAME_OVER);
            devices.audio.rewind(GAME_OVER_2);
            devices.audio.play(GAME_OVER, false);
            devices.audio.play(GAME_OVER_2, false);
            devices.hud.show_final_score(session.final_score());
            log::info!(
                "caught at distance {:.1} after {} sec",
                session.player.distance(),
                session.final_score()
            );
        }

        // bigfoot is painted last so it overlaps the runner
        session.pursuer.update_and_draw(devices.renderer)?;

        Ok(if caught {
            TickOutcome::Caught(SessionState {
                session: self.session,
                _state: GameOver,
            })
        } else {
            TickOutcome::Running(self)
        })
    }
}

/// ```text
/// ┌───────────── Session Transitions ─────────────┐
/// │  From      →  Event  →  To                     │
/// ├────────────────────────────────────────────────┤
/// │  Idle      →  Start  →  Running                │
/// │  Running   →  Tick   →  Running | GameOver     │
/// │  anything else       →  unchanged              │
/// └────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    Start,
    Tick { pressed: bool },
}

#[derive(Debug, Clone)]
pub enum SessionMachine {
    Idle(SessionState<Idle>),
    Running(SessionState<Running>),
    GameOver(SessionState<GameOver>),
}

impl From<SessionState<Idle>> for SessionMachine {
    fn from(state: SessionState<Idle>) -> Self {
        SessionMachine::Idle(state)
    }
}

impl From<SessionState<Running>> for SessionMachine {
    fn from(state: SessionState<Running>) -> Self {
        SessionMachine::Running(state)
    }
}

impl From<SessionState<GameOver>> for SessionMachine {
    fn from(state: SessionState<GameOver>) -> Self {
        SessionMachine::GameOver(state)
    }
}

impl From<TickOutcome> for SessionMachine {
    fn from(outcome: TickOutcome) -> Self {
        match outcome {
            TickOutcome::Running(running) => running.into(),
            TickOutcome::Caught(game_over) => game_over.into(),
        }
    }
}

impl SessionMachine {
    pub fn new(session: GameSession) -> Self {
        SessionState::new(session).into()
    }

    pub fn transition(self, event: Event, devices: &mut Devices) -> Result<Self> {
        use SessionMachine::*;
        Ok(match (self, event) {
            (Idle(state), Event::Start) => state.start(devices.audio).into(),
            (Running(state), Event::Tick { pressed }) => state.tick(pressed, devices)?.into(),
            (machine, _) => machine,
        })
    }

    pub fn session(&self) -> &GameSession {
        use SessionMachine::*;
        match self {
            Idle(state) => state.session(),
            Running(state) => state.session(),
            GameOver(state) => state.session(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionMachine::Running(_))
    }

    pub fn is_over(&self) -> bool {
        matches!(self, SessionMachine::GameOver(_))
    }
}
