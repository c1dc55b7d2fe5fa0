//! Frame types for strip and grid animations.

use crate::backend::CustomEffect;
use crate::schema::{Color, Device1D, Device2D};

/// Shortest duration a frame may have, in seconds.
pub const MIN_FRAME_DURATION: f32 = 0.1;

/// Clamp a frame duration to [`MIN_FRAME_DURATION`].
///
/// NaN durations clamp to the floor as well.
#[inline]
pub fn clamp_duration(duration: f32) -> f32 {
    if duration >= MIN_FRAME_DURATION {
        duration
    } else {
        MIN_FRAME_DURATION
    }
}

/// Behavior shared by frames of both device namespaces.
pub trait ColorFrame {
    /// How long this frame stays on the device, in seconds.
    fn duration(&self) -> f32;

    fn set_duration(&mut self, duration: f32);

    /// Packed color payload handed to the backend.
    fn to_effect(&self) -> CustomEffect;

    /// Overwrite every cell with `color`.
    fn fill(&mut self, color: Color);

    /// Visit every cell mutably.
    fn for_each_color(&mut self, f: &mut dyn FnMut(&mut Color));
}

/// One frame of a 1-D (strip) animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame1D {
    pub duration: f32,
    pub colors: Vec<Color>,
}

impl Frame1D {
    /// Black frame sized for `device`.
    pub fn new(device: Device1D) -> Self {
        Self {
            duration: MIN_FRAME_DURATION,
            colors: vec![Color::BLACK; device.max_leds()],
        }
    }
}

impl ColorFrame for Frame1D {
    fn duration(&self) -> f32 {
        self.duration
    }

    fn set_duration(&mut self, duration: f32) {
        self.duration = clamp_duration(duration);
    }

    fn to_effect(&self) -> CustomEffect {
        CustomEffect::Strip(self.colors.iter().map(|c| c.to_packed()).collect())
    }

    fn fill(&mut self, color: Color) {
        self.colors.fill(color);
    }

    fn for_each_color(&mut self, f: &mut dyn FnMut(&mut Color)) {
        self.colors.iter_mut().for_each(f);
    }
}

/// One frame of a 2-D (grid) animation, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame2D {
    pub duration: f32,
    pub colors: Vec<Vec<Color>>,
}

impl Frame2D {
    /// Black frame sized for `device`.
    pub fn new(device: Device2D) -> Self {
        let (rows, columns) = device.size();
        Self {
            duration: MIN_FRAME_DURATION,
            colors: vec![vec![Color::BLACK; columns]; rows],
        }
    }

    /// Color at `(row, column)`, if inside the grid.
    pub fn get(&self, row: usize, column: usize) -> Option<Color> {
        self.colors.get(row).and_then(|r| r.get(column)).copied()
    }

    /// Mutable cell at `(row, column)`, if inside the grid.
    pub fn get_mut(&mut self, row: usize, column: usize) -> Option<&mut Color> {
        self.colors.get_mut(row).and_then(|r| r.get_mut(column))
    }
}

impl ColorFrame for Frame2D {
    fn duration(&self) -> f32 {
        self.duration
    }

    fn set_duration(&mut self, duration: f32) {
        self.duration = clamp_duration(duration);
    }

    fn to_effect(&self) -> CustomEffect {
        CustomEffect::Grid(
            self.colors
                .iter()
                .map(|row| row.iter().map(|c| c.to_packed()).collect())
                .collect(),
        )
    }

    fn fill(&mut self, color: Color) {
        for row in &mut self.colors {
            row.fill(color);
        }
    }

    fn for_each_color(&mut self, f: &mut dyn FnMut(&mut Color)) {
        self.colors.iter_mut().flatten().for_each(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_duration() {
        assert_eq!(clamp_duration(0.05), MIN_FRAME_DURATION);
        assert_eq!(clamp_duration(-3.0), MIN_FRAME_DURATION);
        assert_eq!(clamp_duration(f32::NAN), MIN_FRAME_DURATION);
        assert_eq!(clamp_duration(0.1), 0.1);
        assert_eq!(clamp_duration(2.5), 2.5);
    }

    #[test]
    fn test_new_frames_match_device_geometry() {
        let strip = Frame1D::new(Device1D::Mousepad);
        assert_eq!(strip.colors.len(), 15);

        let grid = Frame2D::new(Device2D::Keyboard);
        assert_eq!(grid.colors.len(), 6);
        assert!(grid.colors.iter().all(|row| row.len() == 22));
    }

    #[test]
    fn test_grid_cell_access() {
        let mut grid = Frame2D::new(Device2D::Keypad);
        *grid.get_mut(3, 4).unwrap() = Color::WHITE;
        assert_eq!(grid.get(3, 4), Some(Color::WHITE));
        assert_eq!(grid.get(4, 0), None);
        assert!(grid.get_mut(0, 5).is_none());
    }

    #[test]
    fn test_effect_payload_is_packed() {
        let mut strip = Frame1D::new(Device1D::Headset);
        strip.fill(Color::from_rgb8(0x11, 0x22, 0x33));
        assert_eq!(strip.to_effect(), CustomEffect::Strip(vec![0x332211; 5]));

        let mut grid = Frame2D::new(Device2D::Keypad);
        grid.fill(Color::from_rgb8(0xFF, 0, 0));
        assert_eq!(grid.to_effect(), CustomEffect::Grid(vec![vec![0xFF; 5]; 4]));
    }
}
