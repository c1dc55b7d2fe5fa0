//! Keyboard cell addressing and per-key color edits.

use std::fmt;

use log::debug;

use super::EngineState;
use super::registry::AnimationId;
use crate::animation::{Animation2D, AnyAnimation, Frame2D};
use crate::schema::{Color, Device2D};

/// A keyboard grid cell addressed by vendor key code.
///
/// The high byte of the code is the row, the low byte the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCell {
    pub row: u8,
    pub column: u8,
}

impl KeyCell {
    pub const ESC: KeyCell = KeyCell::from_code(0x0001);
    pub const F1: KeyCell = KeyCell::from_code(0x0003);
    pub const W: KeyCell = KeyCell::from_code(0x0303);
    pub const A: KeyCell = KeyCell::from_code(0x0402);
    pub const S: KeyCell = KeyCell::from_code(0x0403);
    pub const D: KeyCell = KeyCell::from_code(0x0404);
    pub const SPACE: KeyCell = KeyCell::from_code(0x0507);

    pub const fn from_code(code: u16) -> Self {
        Self {
            row: (code >> 8) as u8,
            column: (code & 0xff) as u8,
        }
    }

    pub const fn code(self) -> u16 {
        ((self.row as u16) << 8) | self.column as u16
    }

    fn read(self, frame: &Frame2D) -> Option<Color> {
        frame.get(self.row as usize, self.column as usize)
    }

    fn write(self, frame: &mut Frame2D, color: Color) -> bool {
        match frame.get_mut(self.row as usize, self.column as usize) {
            Some(cell) => {
                *cell = color;
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for KeyCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key 0x{:04x}", self.code())
    }
}

/// Which source cells a copy transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CopyMode {
    All,
    NonZero,
}

fn keyboard(animation: Option<&AnyAnimation>) -> Option<&Animation2D> {
    animation
        .and_then(|a| a.as_2d())
        .filter(|a| a.device_2d() == Device2D::Keyboard)
}

impl EngineState {
    fn keyboard_mut(&mut self, id: AnimationId) -> Option<&mut Animation2D> {
        self.registry
            .get_mut(id)
            .and_then(|a| a.as_2d_mut())
            .filter(|a| a.device_2d() == Device2D::Keyboard)
    }

    /// Packed color of `key` in frame `frame`, or 0.
    pub(super) fn get_key_color(&mut self, id: AnimationId, frame: usize, key: KeyCell) -> i32 {
        self.stop(id);
        keyboard(self.registry.get(id))
            .and_then(|a| a.frames().get(frame))
            .and_then(|f| key.read(f))
            .map_or(0, Color::to_packed)
    }

    pub(super) fn set_key_color(
        &mut self,
        id: AnimationId,
        frame: usize,
        key: KeyCell,
        packed: i32,
    ) -> bool {
        self.stop(id);
        let Some(animation) = self.keyboard_mut(id) else {
            debug!("SetKeyColor: {} is not a keyboard animation", id);
            return false;
        };
        animation
            .frame_mut(frame)
            .is_some_and(|f| key.write(f, Color::from_packed(packed)))
    }

    /// Copy `key` from the source frame `frame % source_len` into target
    /// frame `frame`.
    pub(super) fn copy_key_color(
        &mut self,
        source: AnimationId,
        target: AnimationId,
        frame: usize,
        key: KeyCell,
        mode: CopyMode,
    ) -> bool {
        self.stop(target);
        let Some(color) = keyboard(self.registry.get(source)).and_then(|a| {
            let frames = a.frames();
            if frames.is_empty() {
                return None;
            }
            key.read(&frames[frame % frames.len()])
        }) else {
            debug!("CopyKeyColor: nothing to copy from {}", source);
            return false;
        };
        if mode == CopyMode::NonZero && color.to_packed() == 0 {
            return false;
        }
        let Some(animation) = self.keyboard_mut(target) else {
            debug!("CopyKeyColor: {} is not a keyboard animation", target);
            return false;
        };
        animation.frame_mut(frame).is_some_and(|f| key.write(f, color))
    }
}
