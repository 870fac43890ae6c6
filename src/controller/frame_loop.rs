use std::time::Instant;

use winit::keyboard::KeyCode;

use crate::config::{AppConfig, ControlConfig};
use crate::view::{GraphicsBackend, Renderer};

use super::input::{Action, InputState};
use super::state::{AppState, FrameTime};

/// Wall-clock source for [`FrameTime`].
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now }
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        FrameTime {
            elapsed: now.duration_since(self.start).as_secs_f32(),
            delta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Owns the scene state and the renderer, and turns window events into state
/// changes and frames.
pub struct FrameLoop<B: GraphicsBackend> {
    state: AppState,
    input: InputState,
    renderer: Renderer<B>,
    controls: ControlConfig,
}

impl<B: GraphicsBackend> FrameLoop<B> {
    pub fn new(renderer: Renderer<B>, config: &AppConfig) -> Self {
        Self {
            state: AppState::new(&config.scene),
            input: InputState::default(),
            renderer,
            controls: config.controls,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn renderer(&self) -> &Renderer<B> {
        &self.renderer
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn handle_key(&mut self, code: KeyCode, pressed: bool, repeat: bool) -> LoopControl {
        match self.input.handle_key(code, pressed, repeat) {
            Some(Action::Exit) => {
                tracing::info!("exit requested");
                LoopControl::Exit
            }
            Some(action) => {
                self.state.apply_action(action, &self.controls);
                LoopControl::Continue
            }
            None => LoopControl::Continue,
        }
    }

    /// Keys released while unfocused never arrive, so nothing stays held.
    pub fn focus_lost(&mut self) {
        self.input.clear();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.set_aspect(width, height);
    }

    pub fn update(&mut self, time: FrameTime) {
        self.state
            .update(time, self.input.held_controls(), &self.controls);
    }

    /// Advances the state by `time` and draws it.
    pub fn frame(&mut self, backend: &mut B, time: FrameTime) -> Result<(), B::Error> {
        self.update(time);
        self.renderer.render(backend, &self.state)
    }
}
