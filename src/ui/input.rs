use crate::io::config::InputStepConfig;
use std::collections::VecDeque;

/// One frame of player input, independent of any windowing library.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub jump: bool,
    /// Switch between fly and walk mode this frame.
    pub toggle_mode: bool,
    /// Cursor movement since the previous frame, in pixels.
    pub mouse_dx: f32,
    pub mouse_dy: f32,
}

impl From<&InputStepConfig> for InputState {
    fn from(step: &InputStepConfig) -> Self {
        Self {
            forward: step.forward,
            backward: step.backward,
            left: step.left,
            right: step.right,
            up: step.up,
            down: step.down,
            jump: step.jump,
            toggle_mode: step.toggle_mode,
            mouse_dx: step.mouse_dx,
            mouse_dy: step.mouse_dy,
        }
    }
}

/// Anything that can be polled once per frame for input.
pub trait InputSource {
    fn poll(&mut self) -> InputState;
}

/// Replays a fixed list of input steps, then reports idle input forever.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputState>,
}

impl ScriptedInput {
    pub fn new(steps: &[InputStepConfig]) -> Self {
        let frames = steps
            .iter()
            .flat_map(|step| std::iter::repeat_n(InputState::from(step), step.frames))
            .collect();
        Self { frames }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputState {
        self.frames.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_repeat_for_their_frame_count() {
        let steps = [
            InputStepConfig {
                frames: 2,
                forward: true,
                ..InputStepConfig::default()
            },
            InputStepConfig {
                frames: 1,
                mouse_dx: 4.0,
                ..InputStepConfig::default()
            },
        ];
        let mut input = ScriptedInput::new(&steps);
        assert_eq!(input.remaining(), 3);

        assert!(input.poll().forward);
        assert!(input.poll().forward);
        let third = input.poll();
        assert!(!third.forward);
        assert_eq!(third.mouse_dx, 4.0);
        assert_eq!(input.poll(), InputState::default());
    }
}
