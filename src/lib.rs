//! Cursed Corridors core crate.
//!
//! A timed escape game: find the key, reach the exit, survive ten levels.
//! Game logic lives in [`game::GameSession`] and only talks to the page
//! through the capability traits ([`audio::AudioEngine`],
//! [`jumpscare::DrawSurface`], [`timer::Scheduler`], [`game::Stage`]), so the
//! whole state machine runs headless in native tests.

use wasm_bindgen::prelude::*;

pub mod audio;
pub mod config;
pub mod error;
pub mod game;
pub mod jumpscare;
// Headless fakes: native builds (unit and integration tests) or opt-in on wasm.
#[cfg(any(test, feature = "testing", not(target_arch = "wasm32")))]
#[doc(hidden)]
pub mod testing;
pub mod timer;

pub use config::GameConfig;
pub use error::GameError;
pub use game::{GameSession, GameState, LevelSpec, Phase, UiState};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // a second init (e.g. a test harness that already installed a logger) is fine
    let _ = console_log::init_with_level(log::Level::Info);
}

// -----------------------------------------------------------------------------
// Page entrypoints
// -----------------------------------------------------------------------------

/// Attach to the page and wire the buttons. Called implicitly by `start_game`.
#[wasm_bindgen]
pub fn boot() -> Result<(), JsValue> {
    game::web::boot().map_err(Into::into)
}

/// Override defaults with a JSON config. Only accepted before the first boot.
#[wasm_bindgen]
pub fn configure(json: &str) -> Result<(), JsValue> {
    game::web::configure(json).map_err(Into::into)
}

#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    boot()?;
    game::web::with_session(GameSession::start);
    Ok(())
}

#[wasm_bindgen]
pub fn collect_key() {
    game::web::with_session(GameSession::collect_key);
}

#[wasm_bindgen]
pub fn attempt_exit() {
    game::web::with_session(GameSession::attempt_exit);
}

#[wasm_bindgen]
pub fn skip_level() {
    game::web::with_session(GameSession::skip);
}

#[wasm_bindgen]
pub fn restart_game() {
    game::web::with_session(GameSession::restart);
}

#[wasm_bindgen]
pub fn toggle_mute() {
    game::web::with_session(GameSession::toggle_mute);
}

/// Current HUD snapshot as JSON, or `undefined` before boot.
#[wasm_bindgen]
pub fn ui_state_json() -> Option<String> {
    game::web::with_session(|s| serde_json::to_string(&s.ui_state()))
        .and_then(|r| r.map_err(|e| log::warn!("ui state encode failed: {e}")).ok())
}
