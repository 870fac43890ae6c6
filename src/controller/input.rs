//! Keyboard mapping: discrete actions fire once per press, controls act while held
use std::collections::{HashMap, HashSet};

use winit::keyboard::KeyCode;

use crate::model::CameraMode;

/// One-shot commands, applied when the key goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SetCamera(CameraMode),
    ToggleFog,
    ToggleShading,
    ToggleDayNight,
    FogDensityUp,
    FogDensityDown,
    TessellationUp,
    TessellationDown,
    WindUp,
    WindDown,
    Exit,
}

/// Continuous controls, scaled by frame time while the key is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    MoveForward,
    MoveBackward,
    TurnLeft,
    TurnRight,
    AimLeft,
    AimRight,
    AimUp,
    AimDown,
    Brighten,
    Darken,
}

/// Order held controls are applied in each frame: movement, then turning, then
/// the headlight, then the day/night ramp.
pub const HELD_ORDER: [Control; 10] = [
    Control::MoveForward,
    Control::MoveBackward,
    Control::TurnLeft,
    Control::TurnRight,
    Control::AimLeft,
    Control::AimRight,
    Control::AimUp,
    Control::AimDown,
    Control::Brighten,
    Control::Darken,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Action(Action),
    Control(Control),
}

/// Printed once at startup.
pub const CONTROL_HELP: &[&str] = &[
    "1 / 2 / 3        camera: static / tracking / third person",
    "W / S, A / D     move the object, turn it",
    "arrow keys       aim the headlight",
    "F                fog on / off",
    "+ / -            fog density",
    "B                Phong / Blinn-Phong",
    "N                day / night",
    "P / O            brighten / darken gradually",
    "T / G            flag tessellation up / down",
    "Y / H            wind stronger / weaker",
    "Esc              quit",
];

#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<KeyCode, Binding>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use Action::*;
        use Control::*;

        let map = [
            (KeyCode::Digit1, Binding::Action(SetCamera(CameraMode::Static))),
            (KeyCode::Digit2, Binding::Action(SetCamera(CameraMode::Tracking))),
            (KeyCode::Digit3, Binding::Action(SetCamera(CameraMode::ThirdPerson))),
            (KeyCode::KeyF, Binding::Action(ToggleFog)),
            (KeyCode::KeyB, Binding::Action(ToggleShading)),
            (KeyCode::KeyN, Binding::Action(ToggleDayNight)),
            (KeyCode::Equal, Binding::Action(FogDensityUp)),
            (KeyCode::NumpadAdd, Binding::Action(FogDensityUp)),
            (KeyCode::Minus, Binding::Action(FogDensityDown)),
            (KeyCode::NumpadSubtract, Binding::Action(FogDensityDown)),
            (KeyCode::KeyT, Binding::Action(TessellationUp)),
            (KeyCode::KeyG, Binding::Action(TessellationDown)),
            (KeyCode::KeyY, Binding::Action(WindUp)),
            (KeyCode::KeyH, Binding::Action(WindDown)),
            (KeyCode::Escape, Binding::Action(Exit)),
            (KeyCode::KeyW, Binding::Control(MoveForward)),
            (KeyCode::KeyS, Binding::Control(MoveBackward)),
            (KeyCode::KeyA, Binding::Control(TurnLeft)),
            (KeyCode::KeyD, Binding::Control(TurnRight)),
            (KeyCode::ArrowLeft, Binding::Control(AimLeft)),
            (KeyCode::ArrowRight, Binding::Control(AimRight)),
            (KeyCode::ArrowUp, Binding::Control(AimUp)),
            (KeyCode::ArrowDown, Binding::Control(AimDown)),
            (KeyCode::KeyP, Binding::Control(Brighten)),
            (KeyCode::KeyO, Binding::Control(Darken)),
        ]
        .into_iter()
        .collect();

        Self { map }
    }
}

impl KeyBindings {
    pub fn lookup(&self, code: KeyCode) -> Option<Binding> {
        self.map.get(&code).copied()
    }

    #[cfg(test)]
    pub fn bind(&mut self, code: KeyCode, binding: Binding) {
        self.map.insert(code, binding);
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    bindings: KeyBindings,
    held: HashSet<Control>,
}

impl InputState {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            held: HashSet::new(),
        }
    }

    /// Updates held controls and returns the action a fresh press triggers.
    /// Auto-repeat presses never trigger actions.
    pub fn handle_key(&mut self, code: KeyCode, pressed: bool, repeat: bool) -> Option<Action> {
        match self.bindings.lookup(code)? {
            Binding::Control(control) => {
                if pressed {
                    self.held.insert(control);
                } else {
                    self.held.remove(&control);
                }
                None
            }
            Binding::Action(action) => (pressed && !repeat).then_some(action),
        }
    }

    pub fn held_controls(&self) -> &HashSet<Control> {
        &self.held
    }

    pub fn is_held(&self, control: Control) -> bool {
        self.held.contains(&control)
    }

    /// Drops every held control, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_fires_once_per_press() {
        let mut input = InputState::default();
        assert_eq!(input.handle_key(KeyCode::KeyF, true, false), Some(Action::ToggleFog));
        assert_eq!(input.handle_key(KeyCode::KeyF, true, true), None);
        assert_eq!(input.handle_key(KeyCode::KeyF, false, false), None);
    }

    #[test]
    fn fog_density_has_two_keys_each_way() {
        let mut input = InputState::default();
        assert_eq!(input.handle_key(KeyCode::Equal, true, false), Some(Action::FogDensityUp));
        assert_eq!(input.handle_key(KeyCode::NumpadAdd, true, false), Some(Action::FogDensityUp));
        assert_eq!(input.handle_key(KeyCode::Minus, true, false), Some(Action::FogDensityDown));
        assert_eq!(
            input.handle_key(KeyCode::NumpadSubtract, true, false),
            Some(Action::FogDensityDown)
        );
    }

    #[test]
    fn controls_are_held_until_release() {
        let mut input = InputState::default();
        assert_eq!(input.handle_key(KeyCode::KeyW, true, false), None);
        assert_eq!(input.handle_key(KeyCode::KeyW, true, true), None);
        assert!(input.is_held(Control::MoveForward));
        input.handle_key(KeyCode::KeyW, false, false);
        assert!(!input.is_held(Control::MoveForward));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut input = InputState::default();
        input.handle_key(KeyCode::KeyA, true, false);
        input.handle_key(KeyCode::ArrowUp, true, false);
        assert_eq!(input.held_controls().len(), 2);
        input.clear();
        assert!(input.held_controls().is_empty());
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut input = InputState::default();
        assert_eq!(input.handle_key(KeyCode::KeyZ, true, false), None);
        assert!(input.held_controls().is_empty());
    }

    #[test]
    fn held_order_covers_every_control_once() {
        let unique: HashSet<Control> = HELD_ORDER.iter().copied().collect();
        assert_eq!(unique.len(), HELD_ORDER.len());
        assert_eq!(HELD_ORDER[0], Control::MoveForward);
        assert_eq!(HELD_ORDER[2], Control::TurnLeft);
    }

    #[test]
    fn bindings_can_be_remapped() {
        let mut bindings = KeyBindings::default();
        bindings.bind(KeyCode::KeyQ, Binding::Action(Action::Exit));
        let mut input = InputState::new(bindings);
        assert_eq!(input.handle_key(KeyCode::KeyQ, true, false), Some(Action::Exit));
        assert_eq!(input.handle_key(KeyCode::Escape, true, false), Some(Action::Exit));
    }
}
