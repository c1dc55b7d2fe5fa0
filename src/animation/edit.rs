//! Authoring operations on animation frames.
//!
//! These mirror the editor panel actions: fill, clear, randomize, copy a
//! frame, add/remove frames and override every frame duration. Every edit
//! marks loaded backend effects stale so the next play uploads fresh colors.

use rand::Rng;

use super::frame::{ColorFrame, Frame1D, Frame2D, clamp_duration};
use super::model::{Animation1D, Animation2D};
use crate::schema::Color;

/// Frame-level editing, implemented for both animation variants.
pub trait FrameEditor {
    type Frame: ColorFrame + Clone;

    /// Mutable frame list. Marks loaded effects stale.
    fn frames_mut(&mut self) -> &mut Vec<Self::Frame>;

    /// Black frame sized for the animation's device.
    fn blank_frame(&self) -> Self::Frame;

    /// Set every cell of frame `index` to `color`.
    fn fill_frame(&mut self, index: usize, color: Color) -> bool {
        match self.frames_mut().get_mut(index) {
            Some(frame) => {
                frame.fill(color);
                true
            }
            None => false,
        }
    }

    /// Set every cell of frame `index` to black.
    fn clear_frame(&mut self, index: usize) -> bool {
        self.fill_frame(index, Color::BLACK)
    }

    /// Give every cell of frame `index` a random opaque color.
    fn randomize_frame<R: Rng>(&mut self, index: usize, rng: &mut R) -> bool {
        match self.frames_mut().get_mut(index) {
            Some(frame) => {
                frame.for_each_color(&mut |c: &mut Color| {
                    *c = Color::from_rgb8(rng.r#gen(), rng.r#gen(), rng.r#gen());
                });
                true
            }
            None => false,
        }
    }

    /// Copy the colors and duration of frame `from` over frame `to`.
    fn copy_frame(&mut self, from: usize, to: usize) -> bool {
        let frames = self.frames_mut();
        if from >= frames.len() || to >= frames.len() {
            return false;
        }
        if from != to {
            frames[to] = frames[from].clone();
        }
        true
    }

    /// Insert a blank frame at `index` (clamped to the end). Returns its index.
    fn insert_frame(&mut self, index: usize) -> usize {
        let blank = self.blank_frame();
        let frames = self.frames_mut();
        let index = index.min(frames.len());
        frames.insert(index, blank);
        index
    }

    /// Remove frame `index`. The last remaining frame is never removed.
    fn remove_frame(&mut self, index: usize) -> bool {
        let frames = self.frames_mut();
        if frames.len() <= 1 || index >= frames.len() {
            return false;
        }
        frames.remove(index);
        true
    }

    /// Set every frame to the same duration (clamped to the floor).
    fn override_duration(&mut self, duration: f32) {
        let duration = clamp_duration(duration);
        for frame in self.frames_mut() {
            frame.set_duration(duration);
        }
    }
}

impl FrameEditor for Animation1D {
    type Frame = Frame1D;

    fn frames_mut(&mut self) -> &mut Vec<Frame1D> {
        self.track.mark_stale();
        &mut self.track.frames
    }

    fn blank_frame(&self) -> Frame1D {
        Frame1D::new(self.device_1d())
    }
}

impl FrameEditor for Animation2D {
    type Frame = Frame2D;

    fn frames_mut(&mut self) -> &mut Vec<Frame2D> {
        self.track.mark_stale();
        &mut self.track.frames
    }

    fn blank_frame(&self) -> Frame2D {
        Frame2D::new(self.device_2d())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Animation;
    use crate::schema::{Device1D, Device2D};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn strip(frames: usize) -> Animation1D {
        Animation1D::new(Device1D::ChromaLink, vec![Frame1D::new(Device1D::ChromaLink); frames])
    }

    #[test]
    fn test_fill_and_clear() {
        let mut anim = strip(2);
        assert!(anim.fill_frame(1, Color::WHITE));
        assert!(anim.frames()[1].colors.iter().all(|&c| c == Color::WHITE));
        assert!(anim.frames()[0].colors.iter().all(|&c| c == Color::BLACK));

        assert!(anim.clear_frame(1));
        assert!(anim.frames()[1].colors.iter().all(|c| c.is_black()));
        assert!(!anim.fill_frame(5, Color::WHITE));
    }

    #[test]
    fn test_randomize_is_seeded() {
        let mut a = Animation2D::new(Device2D::Mouse, vec![Frame2D::new(Device2D::Mouse)]);
        let mut b = Animation2D::new(Device2D::Mouse, vec![Frame2D::new(Device2D::Mouse)]);
        assert!(a.randomize_frame(0, &mut StdRng::seed_from_u64(7)));
        assert!(b.randomize_frame(0, &mut StdRng::seed_from_u64(7)));
        assert_eq!(a.frames(), b.frames());
        assert!(a.frames()[0].colors.iter().flatten().all(|c| c.a == 1.0));
        assert!(!a.randomize_frame(1, &mut StdRng::seed_from_u64(7)));
    }

    #[test]
    fn test_copy_frame() {
        let mut anim = strip(3);
        anim.fill_frame(0, Color::WHITE);
        anim.frames_mut()[0].duration = 0.5;
        assert!(anim.copy_frame(0, 2));
        assert_eq!(anim.frames()[2], anim.frames()[0]);
        assert!(!anim.copy_frame(0, 3));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut anim = strip(1);
        anim.fill_frame(0, Color::WHITE);

        assert_eq!(anim.insert_frame(0), 0);
        assert_eq!(anim.frame_count(), 2);
        assert!(anim.frames()[0].colors.iter().all(|c| c.is_black()));
        assert_eq!(anim.insert_frame(99), 2);

        assert!(anim.remove_frame(0));
        assert!(anim.remove_frame(1));
        assert!(!anim.remove_frame(0));
        assert_eq!(anim.frame_count(), 1);
        assert!(anim.frames()[0].colors.iter().all(|&c| c == Color::WHITE));
    }

    #[test]
    fn test_override_duration_clamps() {
        let mut anim = strip(3);
        anim.override_duration(0.25);
        assert!(anim.frames().iter().all(|f| f.duration == 0.25));
        anim.override_duration(0.0);
        assert!(anim.frames().iter().all(|f| f.duration == 0.1));
    }
}
