//! Translates raw window input into the engine's input actions.

use crate::graph_data::GraphError;
use crate::scene::Scene;
use glam::Vec2;
use winit::dpi::PhysicalPosition;
use winit::event::{MouseButton, MouseScrollDelta};
use winit::keyboard::KeyCode;

/// Cursor travel below which a press/release pair counts as a click.
const CLICK_DISTANCE: f32 = 3.0;
const ZOOM_SENSITIVITY: f32 = 0.025;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InputAction {
    /// Select the node under a screen position; clears on empty space.
    Select(Vec2),
    /// Pan by a screen-space delta.
    Pan(Vec2),
    /// Zoom by `factor` keeping the screen point `anchor` fixed.
    Zoom { factor: f32, anchor: Vec2 },
    Fit,
    ClearSelection,
}

impl InputAction {
    pub fn apply(self, scene: &mut Scene) -> Result<(), GraphError> {
        match self {
            Self::Select(screen) => {
                scene.select_at_screen(screen)?;
            }
            Self::Pan(delta) => scene.pan(delta),
            Self::Zoom { factor, anchor } => scene.zoom(factor, anchor),
            Self::Fit => scene.fit()?,
            Self::ClearSelection => scene.clear_selection(),
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InputState {
    cursor_position: Option<Vec2>,
    click_start_pos: Option<Vec2>,
    pan_active: bool,
    last_pan_position: Option<Vec2>,
}

impl InputState {
    pub fn handle_key(&mut self, code: KeyCode, is_pressed: bool) -> Option<InputAction> {
        match (code, is_pressed) {
            (KeyCode::KeyF, true) => Some(InputAction::Fit),
            (KeyCode::Space | KeyCode::Escape, true) => Some(InputAction::ClearSelection),
            _ => None,
        }
    }

    pub fn handle_mouse_key(&mut self, button: MouseButton, is_pressed: bool) -> Option<InputAction> {
        match (button, is_pressed) {
            (MouseButton::Left, true) => {
                // Mouse Down: a drag pans, a click selects on release
                let pos = self.cursor_position?;
                self.click_start_pos = Some(pos);
                self.pan_active = true;
                self.last_pan_position = Some(pos);
                None
            }
            (MouseButton::Left, false) => {
                self.pan_active = false;
                self.last_pan_position = None;

                let (start, end) = (self.click_start_pos.take()?, self.cursor_position?);
                (start.distance(end) < CLICK_DISTANCE).then_some(InputAction::Select(end))
            }
            (MouseButton::Right, true) => {
                // Start panning
                if let Some(pos) = self.cursor_position {
                    self.pan_active = true;
                    self.last_pan_position = Some(pos);
                }
                None
            }
            (MouseButton::Right, false) => {
                // Stop panning
                self.pan_active = false;
                self.last_pan_position = None;
                None
            }
            _ => None,
        }
    }

    pub fn handle_cursor(&mut self, position: PhysicalPosition<f64>) -> Option<InputAction> {
        // (x,y) coords in pixels relative to the top-left corner of the window
        let pos_screen = Vec2::new(position.x as f32, position.y as f32);
        self.cursor_position = Some(pos_screen);

        if !self.pan_active {
            return None;
        }
        let last = self.last_pan_position.replace(pos_screen)?;
        Some(InputAction::Pan(pos_screen - last))
    }

    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) -> Option<InputAction> {
        let scroll_amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => (y / 10.0) as f32,
        };
        if scroll_amount == 0.0 {
            return None;
        }
        let anchor = self.cursor_position?;

        let factor = if scroll_amount > 0.0 {
            1.0 + scroll_amount * ZOOM_SENSITIVITY
        } else {
            1.0 / (-scroll_amount).mul_add(ZOOM_SENSITIVITY, 1.0)
        };
        Some(InputAction::Zoom { factor, anchor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64) -> PhysicalPosition<f64> {
        PhysicalPosition { x, y }
    }

    #[test]
    fn click_selects_and_drag_pans() {
        let mut input = InputState::default();
        input.handle_cursor(at(100.0, 100.0));
        assert_eq!(input.handle_mouse_key(MouseButton::Left, true), None);
        assert_eq!(
            input.handle_mouse_key(MouseButton::Left, false),
            Some(InputAction::Select(Vec2::new(100.0, 100.0)))
        );

        input.handle_mouse_key(MouseButton::Left, true);
        assert_eq!(
            input.handle_cursor(at(130.0, 90.0)),
            Some(InputAction::Pan(Vec2::new(30.0, -10.0)))
        );
        assert_eq!(input.handle_mouse_key(MouseButton::Left, false), None);
        assert_eq!(input.handle_cursor(at(150.0, 90.0)), None);
    }

    #[test]
    fn scroll_zooms_at_the_cursor() {
        let mut input = InputState::default();
        assert_eq!(input.handle_scroll(MouseScrollDelta::LineDelta(0.0, 2.0)), None);

        input.handle_cursor(at(10.0, 20.0));
        let Some(InputAction::Zoom { factor, anchor }) =
            input.handle_scroll(MouseScrollDelta::LineDelta(0.0, 2.0))
        else {
            panic!("expected a zoom");
        };
        assert!((factor - 1.05).abs() < 1e-6);
        assert_eq!(anchor, Vec2::new(10.0, 20.0));

        let Some(InputAction::Zoom { factor, .. }) =
            input.handle_scroll(MouseScrollDelta::LineDelta(0.0, -2.0))
        else {
            panic!("expected a zoom");
        };
        assert!(factor < 1.0);
    }

    #[test]
    fn keys_map_to_actions() {
        let mut input = InputState::default();
        assert_eq!(input.handle_key(KeyCode::KeyF, true), Some(InputAction::Fit));
        assert_eq!(input.handle_key(KeyCode::KeyF, false), None);
        assert_eq!(
            input.handle_key(KeyCode::Space, true),
            Some(InputAction::ClearSelection)
        );
    }
}
