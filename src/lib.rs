// ==================== Imports ====================
use wasm_bindgen::prelude::*;

pub mod browser;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod game;
pub mod sprite;

#[cfg(test)]
mod testing;

use config::GameConfig;
use engine::GameLoop;
use game::BigfootChase;

// debug builds log every asset, release builds only milestones
#[cfg(debug_assertions)]
const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Debug;
#[cfg(not(debug_assertions))]
const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs panic hook and console logger
/// - loads tuning, preloads assets, then waits for the play button
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();
    browser::init_logging(LOG_LEVEL).map_err(|err| JsValue::from_str(&format!("{:#}", err)))?;

    browser::spawn_local(async move {
        let config = GameConfig::load().await;
        if let Err(err) = GameLoop::start(BigfootChase::new(config)).await {
            log::error!("Could not start game : {:#}", err);
        }
    });

    Ok(())
}
