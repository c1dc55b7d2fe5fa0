//! Strip and grid animations with their playback bookkeeping.

use log::{debug, warn};

use super::frame::{ColorFrame, Frame1D, Frame2D, clamp_duration};
use crate::backend::{BackendError, EffectId, LightingBackend, create_device_effect};
use crate::schema::{Device, Device1D, Device2D, DeviceType};

/// Capabilities shared by every animation variant.
pub trait Animation: Send {
    /// Display name, the path the animation was opened from.
    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    fn device(&self) -> Device;

    fn device_type(&self) -> DeviceType {
        self.device().device_type()
    }

    /// Raw device byte within the device namespace.
    fn device_id(&self) -> u8 {
        self.device().id()
    }

    fn frame_count(&self) -> usize;

    /// Whether backend effects currently exist for the frames.
    fn is_loaded(&self) -> bool;

    /// Create backend effects for every frame. No-op when already loaded.
    fn load(&mut self, backend: &mut dyn LightingBackend) -> Result<(), BackendError>;

    /// Stop, then release backend effects. No-op when not loaded.
    fn unload(&mut self, backend: &mut dyn LightingBackend);

    /// Start from the first frame, restarting if already playing.
    fn play(&mut self, looping: bool, backend: &mut dyn LightingBackend);

    /// Stop and rewind. No-op when already stopped.
    fn stop(&mut self);

    fn is_playing(&self) -> bool;

    fn is_looping(&self) -> bool;

    /// Index of the frame on display.
    fn current_frame(&self) -> usize;

    /// Seconds spent in the current frame.
    fn elapsed(&self) -> f32;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PlayState {
    playing: bool,
    looping: bool,
    frame: usize,
    elapsed: f32,
}

/// Frames plus the play state and backend effects that go with them.
#[derive(Debug)]
pub(crate) struct Track<F> {
    pub(crate) frames: Vec<F>,
    state: PlayState,
    effects: Vec<EffectId>,
    loaded: bool,
    /// Frames changed since the effects were created.
    stale: bool,
}

impl<F: ColorFrame> Track<F> {
    fn new(frames: Vec<F>) -> Self {
        Self {
            frames,
            state: PlayState::default(),
            effects: Vec::new(),
            loaded: false,
            stale: false,
        }
    }

    pub(crate) fn mark_stale(&mut self) {
        if self.loaded {
            self.stale = true;
        }
    }

    fn load(
        &mut self,
        device: Device,
        backend: &mut dyn LightingBackend,
    ) -> Result<(), BackendError> {
        if self.loaded {
            return Ok(());
        }
        let mut effects = Vec::with_capacity(self.frames.len());
        for frame in &self.frames {
            match create_device_effect(backend, device, &frame.to_effect()) {
                Ok(id) => effects.push(id),
                Err(e) => {
                    for id in effects {
                        let _ = backend.delete_effect(id);
                    }
                    return Err(e);
                }
            }
        }
        self.effects = effects;
        self.loaded = true;
        self.stale = false;
        Ok(())
    }

    fn release(&mut self, backend: &mut dyn LightingBackend) {
        for id in self.effects.drain(..) {
            if let Err(e) = backend.delete_effect(id) {
                warn!("Failed to delete effect {}: {}", id.0, e);
            }
        }
        self.loaded = false;
        self.stale = false;
    }

    fn unload(&mut self, backend: &mut dyn LightingBackend) {
        self.stop();
        if self.loaded {
            self.release(backend);
        }
    }

    fn play(&mut self, looping: bool, device: Device, backend: &mut dyn LightingBackend) {
        if self.frames.is_empty() {
            debug!("Nothing to play on {}: animation has no frames", device);
            self.stop();
            return;
        }
        if self.stale {
            self.release(backend);
        }
        if let Err(e) = self.load(device, backend) {
            warn!("Failed to load effects for {}: {}", device, e);
            return;
        }
        self.state = PlayState {
            playing: true,
            looping,
            frame: 0,
            elapsed: 0.0,
        };
        self.show(0, backend);
    }

    fn stop(&mut self) {
        self.state = PlayState::default();
    }

    fn show(&self, frame: usize, backend: &mut dyn LightingBackend) {
        if let Some(&id) = self.effects.get(frame) {
            if let Err(e) = backend.set_effect(id) {
                warn!("Failed to set effect {}: {}", id.0, e);
            }
        }
    }

    /// Cycle length with every frame held for at least the duration floor.
    fn cycle_duration(&self) -> f32 {
        self.frames.iter().map(|f| clamp_duration(f.duration())).sum()
    }

    fn advance(&mut self, dt: f32, backend: &mut dyn LightingBackend) {
        if !self.state.playing || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        if self.frames.is_empty() {
            self.state.playing = false;
            return;
        }
        self.state.elapsed += dt;
        if self.state.looping {
            // Whole cycles land back on the same frame; skip them.
            let cycle = self.cycle_duration();
            if self.state.elapsed >= cycle {
                self.state.elapsed %= cycle;
            }
        }
        // At most one full pass over the frames per tick.
        for _ in 0..self.frames.len() {
            let Some(frame) = self.frames.get(self.state.frame) else {
                self.state.playing = false;
                return;
            };
            let duration = clamp_duration(frame.duration());
            if self.state.elapsed < duration {
                return;
            }
            self.state.elapsed -= duration;
            let next = self.state.frame + 1;
            if next < self.frames.len() {
                self.state.frame = next;
                self.show(next, backend);
            } else if self.state.looping {
                self.state.frame = 0;
                self.show(0, backend);
            } else {
                // Ended: keep the last frame on the device.
                self.state.playing = false;
                self.state.elapsed = 0.0;
                return;
            }
        }
    }
}

/// Animation for strip devices.
#[derive(Debug)]
pub struct Animation1D {
    name: String,
    device: Device1D,
    pub(crate) track: Track<Frame1D>,
}

impl Animation1D {
    pub fn new(device: Device1D, frames: Vec<Frame1D>) -> Self {
        Self {
            name: String::new(),
            device,
            track: Track::new(frames),
        }
    }

    pub fn device_1d(&self) -> Device1D {
        self.device
    }

    pub fn frames(&self) -> &[Frame1D] {
        &self.track.frames
    }

    /// Mutable frame by index. Marks loaded effects stale.
    pub fn frame_mut(&mut self, index: usize) -> Option<&mut Frame1D> {
        self.track.mark_stale();
        self.track.frames.get_mut(index)
    }

    pub(crate) fn advance(&mut self, dt: f32, backend: &mut dyn LightingBackend) {
        self.track.advance(dt, backend);
    }
}

/// Animation for grid devices.
#[derive(Debug)]
pub struct Animation2D {
    name: String,
    device: Device2D,
    pub(crate) track: Track<Frame2D>,
}

impl Animation2D {
    pub fn new(device: Device2D, frames: Vec<Frame2D>) -> Self {
        Self {
            name: String::new(),
            device,
            track: Track::new(frames),
        }
    }

    pub fn device_2d(&self) -> Device2D {
        self.device
    }

    pub fn frames(&self) -> &[Frame2D] {
        &self.track.frames
    }

    /// Mutable frame by index. Marks loaded effects stale.
    pub fn frame_mut(&mut self, index: usize) -> Option<&mut Frame2D> {
        self.track.mark_stale();
        self.track.frames.get_mut(index)
    }

    pub(crate) fn advance(&mut self, dt: f32, backend: &mut dyn LightingBackend) {
        self.track.advance(dt, backend);
    }
}

impl Animation for Animation1D {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn device(&self) -> Device {
        Device::OneD(self.device)
    }

    fn frame_count(&self) -> usize {
        self.track.frames.len()
    }

    fn is_loaded(&self) -> bool {
        self.track.loaded
    }

    fn load(&mut self, backend: &mut dyn LightingBackend) -> Result<(), BackendError> {
        self.track.load(Device::OneD(self.device), backend)
    }

    fn unload(&mut self, backend: &mut dyn LightingBackend) {
        self.track.unload(backend);
    }

    fn play(&mut self, looping: bool, backend: &mut dyn LightingBackend) {
        self.track.play(looping, Device::OneD(self.device), backend);
    }

    fn stop(&mut self) {
        self.track.stop();
    }

    fn is_playing(&self) -> bool {
        self.track.state.playing
    }

    fn is_looping(&self) -> bool {
        self.track.state.looping
    }

    fn current_frame(&self) -> usize {
        self.track.state.frame
    }

    fn elapsed(&self) -> f32 {
        self.track.state.elapsed
    }
}

impl Animation for Animation2D {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn device(&self) -> Device {
        Device::TwoD(self.device)
    }

    fn frame_count(&self) -> usize {
        self.track.frames.len()
    }

    fn is_loaded(&self) -> bool {
        self.track.loaded
    }

    fn load(&mut self, backend: &mut dyn LightingBackend) -> Result<(), BackendError> {
        self.track.load(Device::TwoD(self.device), backend)
    }

    fn unload(&mut self, backend: &mut dyn LightingBackend) {
        self.track.unload(backend);
    }

    fn play(&mut self, looping: bool, backend: &mut dyn LightingBackend) {
        self.track.play(looping, Device::TwoD(self.device), backend);
    }

    fn stop(&mut self) {
        self.track.stop();
    }

    fn is_playing(&self) -> bool {
        self.track.state.playing
    }

    fn is_looping(&self) -> bool {
        self.track.state.looping
    }

    fn current_frame(&self) -> usize {
        self.track.state.frame
    }

    fn elapsed(&self) -> f32 {
        self.track.state.elapsed
    }
}

/// An animation of either namespace, as stored by the registry.
#[derive(Debug)]
pub enum AnyAnimation {
    OneD(Animation1D),
    TwoD(Animation2D),
}

impl AnyAnimation {
    pub fn as_dyn(&self) -> &dyn Animation {
        match self {
            AnyAnimation::OneD(a) => a,
            AnyAnimation::TwoD(a) => a,
        }
    }

    pub fn as_dyn_mut(&mut self) -> &mut dyn Animation {
        match self {
            AnyAnimation::OneD(a) => a,
            AnyAnimation::TwoD(a) => a,
        }
    }

    pub fn as_1d(&self) -> Option<&Animation1D> {
        match self {
            AnyAnimation::OneD(a) => Some(a),
            AnyAnimation::TwoD(_) => None,
        }
    }

    pub fn as_2d(&self) -> Option<&Animation2D> {
        match self {
            AnyAnimation::TwoD(a) => Some(a),
            AnyAnimation::OneD(_) => None,
        }
    }

    pub fn as_1d_mut(&mut self) -> Option<&mut Animation1D> {
        match self {
            AnyAnimation::OneD(a) => Some(a),
            AnyAnimation::TwoD(_) => None,
        }
    }

    pub fn as_2d_mut(&mut self) -> Option<&mut Animation2D> {
        match self {
            AnyAnimation::TwoD(a) => Some(a),
            AnyAnimation::OneD(_) => None,
        }
    }

    /// Same device and frame data, ignoring name and play state.
    pub fn same_frames(&self, other: &AnyAnimation) -> bool {
        match (self, other) {
            (AnyAnimation::OneD(a), AnyAnimation::OneD(b)) => {
                a.device == b.device && a.frames() == b.frames()
            }
            (AnyAnimation::TwoD(a), AnyAnimation::TwoD(b)) => {
                a.device == b.device && a.frames() == b.frames()
            }
            _ => false,
        }
    }

    pub(crate) fn advance(&mut self, dt: f32, backend: &mut dyn LightingBackend) {
        match self {
            AnyAnimation::OneD(a) => a.advance(dt, backend),
            AnyAnimation::TwoD(a) => a.advance(dt, backend),
        }
    }
}

impl From<Animation1D> for AnyAnimation {
    fn from(a: Animation1D) -> Self {
        AnyAnimation::OneD(a)
    }
}

impl From<Animation2D> for AnyAnimation {
    fn from(a: Animation2D) -> Self {
        AnyAnimation::TwoD(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, MemoryBackend};
    use crate::schema::Color;

    fn keypad_frames(durations: &[f32]) -> Vec<Frame2D> {
        durations
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let mut frame = Frame2D::new(Device2D::Keypad);
                frame.fill(Color::from_rgb8(i as u8 + 1, 0, 0));
                frame.duration = d;
                frame
            })
            .collect()
    }

    fn last_set_red(backend_log: &crate::backend::CallLog) -> Option<i32> {
        match backend_log.last_set_payload()? {
            crate::backend::CustomEffect::Grid(rows) => Some(rows[0][0] & 0xFF),
            crate::backend::CustomEffect::Strip(colors) => Some(colors[0] & 0xFF),
        }
    }

    #[test]
    fn test_load_is_idempotent() {
        let mut backend = MemoryBackend::new();
        let log = backend.calls();
        let mut anim = Animation2D::new(Device2D::Keypad, keypad_frames(&[0.1, 0.2]));

        anim.load(&mut backend).unwrap();
        anim.load(&mut backend).unwrap();
        assert!(anim.is_loaded());
        assert_eq!(log.live_effects(), 2);

        anim.unload(&mut backend);
        anim.unload(&mut backend);
        assert!(!anim.is_loaded());
        assert_eq!(log.live_effects(), 0);
    }

    #[test]
    fn test_play_shows_first_frame() {
        let mut backend = MemoryBackend::new();
        let log = backend.calls();
        let mut anim = Animation2D::new(Device2D::Keypad, keypad_frames(&[0.1, 0.2]));

        anim.play(false, &mut backend);
        assert!(anim.is_playing());
        assert_eq!(anim.current_frame(), 0);
        assert_eq!(last_set_red(&log), Some(1));
    }

    #[test]
    fn test_advance_crosses_boundary() {
        let mut backend = MemoryBackend::new();
        let mut anim = Animation2D::new(
            Device2D::Keyboard,
            vec![
                Frame2D {
                    duration: 0.1,
                    ..Frame2D::new(Device2D::Keyboard)
                },
                Frame2D {
                    duration: 0.2,
                    ..Frame2D::new(Device2D::Keyboard)
                },
            ],
        );

        anim.play(false, &mut backend);
        anim.advance(0.15, &mut backend);
        assert_eq!(anim.current_frame(), 1);
        assert!((anim.elapsed() - 0.05).abs() < 1e-5);
        assert!(anim.is_playing());
    }

    #[test]
    fn test_looping_wraps_to_first_frame() {
        let mut backend = MemoryBackend::new();
        let log = backend.calls();
        let mut anim = Animation2D::new(Device2D::Keypad, keypad_frames(&[0.1, 0.1, 0.1]));

        anim.play(true, &mut backend);
        for _ in 0..3 {
            anim.advance(0.11, &mut backend);
        }
        assert!(anim.is_playing());
        assert_eq!(anim.current_frame(), 0);
        assert_eq!(last_set_red(&log), Some(1));
    }

    #[test]
    fn test_huge_step_skips_whole_cycles() {
        let mut backend = MemoryBackend::new();
        let log = backend.calls();
        let mut anim = Animation2D::new(Device2D::Keypad, keypad_frames(&[0.1, 0.2, 0.3]));

        anim.play(true, &mut backend);
        let sets = log.set_count();
        anim.advance(2.0e7, &mut backend);

        assert!(anim.is_playing());
        assert!(anim.current_frame() < 3);
        assert!(anim.elapsed() >= 0.0 && anim.elapsed() < 0.6);
        assert!(log.set_count() - sets <= 3);
    }

    #[test]
    fn test_advance_ignores_bad_steps_and_short_frames() {
        let mut backend = MemoryBackend::new();
        let mut anim = Animation2D::new(Device2D::Keypad, keypad_frames(&[0.0, 0.0]));

        anim.play(true, &mut backend);
        anim.advance(f32::NAN, &mut backend);
        anim.advance(-1.0, &mut backend);
        assert_eq!(anim.current_frame(), 0);
        assert_eq!(anim.elapsed(), 0.0);

        // Frames built in memory below the floor still hold for 0.1s.
        anim.advance(0.15, &mut backend);
        assert_eq!(anim.current_frame(), 1);
        assert!(anim.is_playing());
    }

    #[test]
    fn test_non_looping_stops_on_last_frame() {
        let mut backend = MemoryBackend::new();
        let log = backend.calls();
        let mut anim = Animation2D::new(Device2D::Keypad, keypad_frames(&[0.1, 0.1, 0.1]));

        anim.play(false, &mut backend);
        anim.advance(0.35, &mut backend);
        assert!(!anim.is_playing());
        assert_eq!(anim.current_frame(), 2);
        assert_eq!(last_set_red(&log), Some(3));
        // No further effects once ended.
        let sets = log.set_count();
        anim.advance(1.0, &mut backend);
        assert_eq!(log.set_count(), sets);
    }

    #[test]
    fn test_play_restarts() {
        let mut backend = MemoryBackend::new();
        let mut anim = Animation2D::new(Device2D::Keypad, keypad_frames(&[0.1, 0.1]));

        anim.play(false, &mut backend);
        anim.advance(0.12, &mut backend);
        assert_eq!(anim.current_frame(), 1);

        anim.play(true, &mut backend);
        assert_eq!(anim.current_frame(), 0);
        assert_eq!(anim.elapsed(), 0.0);
        assert!(anim.is_looping());
    }

    #[test]
    fn test_stop_rewinds() {
        let mut backend = MemoryBackend::new();
        let mut anim = Animation2D::new(Device2D::Keypad, keypad_frames(&[0.1, 0.1]));

        anim.play(true, &mut backend);
        anim.advance(0.15, &mut backend);
        anim.stop();
        assert!(!anim.is_playing());
        assert_eq!(anim.current_frame(), 0);
        assert_eq!(anim.elapsed(), 0.0);
        anim.stop();
        assert!(!anim.is_playing());
    }

    #[test]
    fn test_empty_animation_never_plays() {
        let mut backend = MemoryBackend::new();
        let log = backend.calls();
        let mut anim = Animation1D::new(Device1D::Headset, Vec::new());

        anim.play(true, &mut backend);
        assert!(!anim.is_playing());
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn test_unload_stops_playback() {
        let mut backend = MemoryBackend::new();
        let mut anim = Animation1D::new(Device1D::Headset, vec![Frame1D::new(Device1D::Headset)]);

        anim.play(true, &mut backend);
        anim.unload(&mut backend);
        assert!(!anim.is_playing());
        assert!(!anim.is_loaded());
    }

    #[test]
    fn test_edit_while_loaded_recreates_effects() {
        let mut backend = MemoryBackend::new();
        let log = backend.calls();
        let mut anim = Animation1D::new(Device1D::Headset, vec![Frame1D::new(Device1D::Headset)]);

        anim.play(false, &mut backend);
        anim.stop();
        anim.frame_mut(0).unwrap().fill(Color::WHITE);
        anim.play(false, &mut backend);

        let deletes = log
            .snapshot()
            .iter()
            .filter(|c| matches!(c, BackendCall::Delete(_)))
            .count();
        assert_eq!(deletes, 1);
        assert_eq!(
            log.last_set_payload(),
            Some(crate::backend::CustomEffect::Strip(vec![0xFFFFFF; 5]))
        );
    }

    #[test]
    fn test_any_animation_accessors() {
        let any: AnyAnimation = Animation1D::new(Device1D::Mousepad, Vec::new()).into();
        assert!(any.as_1d().is_some());
        assert!(any.as_2d().is_none());
        assert_eq!(any.as_dyn().device_type(), DeviceType::OneD);
        assert_eq!(any.as_dyn().device_id(), 2);
    }
}
