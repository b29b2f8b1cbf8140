//! Room and HUD capability the session pushes visible state into.

use super::{Phase, UiState};

/// The visible play area: where the key, door and ghost live and where the
/// HUD labels are shown.
pub trait Stage {
    /// Play area size in CSS pixels.
    fn room_size(&self) -> (f64, f64);
    fn place_key(&mut self, x: f64, y: f64);
    fn set_key_visible(&mut self, visible: bool);
    fn set_door_visible(&mut self, visible: bool);
    fn place_ghost(&mut self, x: f64, y: f64);
    fn set_ghost_visible(&mut self, visible: bool);
    /// Splash / overlay switching for the new phase.
    fn on_phase_change(&mut self, phase: Phase);
    fn render_hud(&mut self, ui: &UiState);
}
