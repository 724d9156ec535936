//! Browser-only checks, run with `wasm-pack test --headless --firefox`
#![cfg(target_arch = "wasm32")]

use bigfoot_chase::browser;
use bigfoot_chase::engine::assets::{AssetKind, AssetLoader};
use bigfoot_chase::engine::load_assets;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn creates_media_elements() {
    assert!(browser::new_image().is_ok());
    assert!(browser::new_audio().is_ok());
}

#[wasm_bindgen_test]
fn clock_moves_forward() {
    let first = browser::now().unwrap();
    let second = browser::now().unwrap();
    assert!(second >= first);
}

#[wasm_bindgen_test]
fn missing_elements_are_errors() {
    assert!(browser::show("#no-such-element").is_err());
    assert!(browser::set_text("#no-such-element", "0").is_err());
}

#[wasm_bindgen_test]
async fn empty_manifest_loads_immediately() {
    let loaded = load_assets(AssetLoader::new()).await.unwrap();
    assert!(loaded.catalog.borrow().is_complete());
    assert!(loaded.images.is_empty());
}

#[wasm_bindgen_test]
async fn broken_image_fails_the_load() {
    let mut loader = AssetLoader::new();
    loader
        .register_image("missing", "does/not/exist.png")
        .unwrap();
    assert!(load_assets(loader).await.is_err());
}

#[wasm_bindgen_test]
fn loader_kinds_are_independent() {
    let mut loader = AssetLoader::new();
    loader.register_image("bg", "bg.png").unwrap();
    loader.register_sound("bg", "bg.mp3").unwrap();
    assert!(loader.get(AssetKind::Sound, "bg").is_some());
    assert_eq!(loader.total(), 2);
}
