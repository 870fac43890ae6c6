// CONTROLLER: keyboard input, scene state updates and the frame loop
pub mod frame_loop;
pub mod input;
pub mod state;

pub use frame_loop::{FrameClock, FrameLoop, LoopControl};
pub use input::{Action, Control, InputState, KeyBindings, CONTROL_HELP, HELD_ORDER};
pub use state::{AppState, FrameTime};
