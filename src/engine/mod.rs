//! Engine module - Registry, play slots and playback scheduling.
//!
//! [`ChromaEngine`] is the context object an application creates at startup.
//! It owns the backend, the animation registry and the per-device play slots
//! behind one mutex shared with the playback worker, so a caller closing an
//! animation can never race the worker advancing it.
//!
//! Failures never escape as errors: unknown ids or paths yield `None`,
//! `false` or a zero color, with a log line describing what went wrong.

mod keys;
mod registry;
mod scheduler;
mod slots;

pub use keys::KeyCell;

use keys::CopyMode;
pub use registry::{AnimationId, AnimationRegistry, RegistryError};
pub use scheduler::{Scheduler, Tick};
pub use slots::PlaySlots;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, warn};

use crate::animation::{AnyAnimation, write_animation};
use crate::backend::{BackendError, LightingBackend, UnavailableBackend};
use crate::schema::{ConfigError, Device, EngineConfig};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything the caller and the playback worker share.
pub(crate) struct EngineState {
    backend: Box<dyn LightingBackend>,
    available: bool,
    initialized: bool,
    registry: AnimationRegistry,
    slots: PlaySlots,
}

impl EngineState {
    fn new(backend: Box<dyn LightingBackend>, available: bool) -> Self {
        Self {
            backend,
            available,
            initialized: false,
            registry: AnimationRegistry::new(),
            slots: PlaySlots::new(),
        }
    }

    fn init(&mut self) -> Result<(), BackendError> {
        if !self.available {
            return Err(BackendError::Unavailable);
        }
        if self.initialized {
            return Ok(());
        }
        self.backend.init()?;
        self.initialized = true;
        debug!("Lighting backend initialized");
        Ok(())
    }

    fn ensure_init(&mut self) {
        if self.available && !self.initialized {
            if let Err(e) = self.init() {
                error!("Failed to initialize lighting backend: {}", e);
            }
        }
    }

    /// Stop and close every animation, then shut the backend down.
    fn uninit(&mut self) -> Result<(), BackendError> {
        self.slots.clear();
        self.registry.close_all(self.backend.as_mut());
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;
        self.backend.uninit()
    }

    fn open(&mut self, path: &str) -> Option<AnimationId> {
        self.registry.open(path).ok()
    }

    fn resolve(&mut self, path: &str) -> Option<AnimationId> {
        match self.registry.resolve(path) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!("Animation not found: {}", e);
                None
            }
        }
    }

    fn close(&mut self, id: AnimationId) -> Option<AnimationId> {
        self.slots.release(id);
        self.registry.close(id, self.backend.as_mut())
    }

    fn play(&mut self, id: AnimationId, looping: bool) -> bool {
        self.ensure_init();
        let Some(device) = self.registry.get(id).map(|a| a.as_dyn().device()) else {
            warn!("Play: no animation {}", id);
            return false;
        };
        if !self.available {
            debug!("Play {}: lighting backend unavailable", id);
            return false;
        }
        self.stop_device(device);
        self.slots.install(device, id);
        let Some(animation) = self.registry.get_mut(id) else {
            return false;
        };
        animation.as_dyn_mut().play(looping, self.backend.as_mut());
        animation.as_dyn().is_playing()
    }

    fn stop(&mut self, id: AnimationId) -> bool {
        self.ensure_init();
        match self.registry.get_mut(id) {
            Some(animation) => {
                animation.as_dyn_mut().stop();
                true
            }
            None => {
                debug!("Stop: no animation {}", id);
                false
            }
        }
    }

    /// Stop whatever occupies the slot for `device` and empty the slot.
    fn stop_device(&mut self, device: Device) -> Option<AnimationId> {
        let previous = self.slots.vacate(device)?;
        if let Some(animation) = self.registry.get_mut(previous) {
            animation.as_dyn_mut().stop();
        }
        Some(previous)
    }

    fn is_playing(&mut self, id: AnimationId) -> bool {
        self.ensure_init();
        self.registry
            .get(id)
            .is_some_and(|a| a.as_dyn().is_playing())
    }

    fn playing_on(&self, device: Device) -> Option<AnimationId> {
        let id = self.slots.occupant(device)?;
        self.registry
            .get(id)
            .is_some_and(|a| a.as_dyn().is_playing())
            .then_some(id)
    }

    fn playing_ids(&self) -> impl Iterator<Item = AnimationId> + '_ {
        self.registry
            .iter()
            .filter(|(_, a)| a.as_dyn().is_playing())
            .map(|(id, _)| id)
    }

    fn load(&mut self, id: AnimationId) -> bool {
        if !self.available {
            debug!("Load {}: lighting backend unavailable", id);
            return false;
        }
        self.ensure_init();
        let Some(animation) = self.registry.get_mut(id) else {
            return false;
        };
        match animation.as_dyn_mut().load(self.backend.as_mut()) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to load animation {}: {}", id, e);
                false
            }
        }
    }

    fn unload(&mut self, id: AnimationId) -> bool {
        let Some(animation) = self.registry.get_mut(id) else {
            return false;
        };
        animation.as_dyn_mut().unload(self.backend.as_mut());
        true
    }
}

impl Tick for EngineState {
    fn tick(&mut self, dt: f32) {
        if !self.available {
            return;
        }
        let backend = self.backend.as_mut();
        for (_, animation) in self.registry.iter_mut() {
            if animation.as_dyn().is_playing() {
                animation.advance(dt, backend);
            }
        }
    }
}

/// Animation engine context.
///
/// Usage:
/// ```ignore
/// let engine = ChromaEngine::new(EngineConfig::default(), Box::new(backend))?;
/// engine.play_by_path("animations/wave_keyboard.chroma", true);
/// // ... the playback worker pushes frames to the keyboard ...
/// engine.shutdown();
/// ```
pub struct ChromaEngine {
    config: EngineConfig,
    state: Arc<Mutex<EngineState>>,
    scheduler: Mutex<Scheduler>,
}

impl ChromaEngine {
    /// Create an engine driving `backend`.
    ///
    /// Starts the playback worker unless the configuration says otherwise.
    pub fn new(
        config: EngineConfig,
        backend: Box<dyn LightingBackend>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, backend, true)
    }

    /// Create an engine from the outcome of loading the vendor library.
    ///
    /// A failed load is logged once here; afterwards every backend-dependent
    /// call short-circuits while registry and editing calls keep working.
    pub fn from_loaded(
        config: EngineConfig,
        loaded: Result<Box<dyn LightingBackend>, BackendError>,
    ) -> Result<Self, ConfigError> {
        match loaded {
            Ok(backend) => Self::build(config, backend, true),
            Err(e) => {
                error!("Lighting backend failed to load: {}", e);
                Self::build(config, Box::new(UnavailableBackend), false)
            }
        }
    }

    fn build(
        config: EngineConfig,
        backend: Box<dyn LightingBackend>,
        available: bool,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let engine = Self {
            state: Arc::new(Mutex::new(EngineState::new(backend, available))),
            scheduler: Mutex::new(Scheduler::new(config.tick_interval())),
            config,
        };
        if !engine.config.lazy_init && available {
            if let Err(e) = engine.init() {
                error!("Failed to initialize lighting backend: {}", e);
            }
        }
        if engine.config.auto_start_scheduler {
            engine.start_scheduler();
        }
        Ok(engine)
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        lock(&self.state)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether the vendor library loaded.
    pub fn is_available(&self) -> bool {
        self.state().available
    }

    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    /// Initialize the backend now instead of on first use.
    pub fn init(&self) -> Result<(), BackendError> {
        self.state().init()
    }

    /// Stop and close every animation, then uninitialize the backend.
    pub fn uninit(&self) -> Result<(), BackendError> {
        self.state().uninit()
    }

    /// Stop the playback worker and tear everything down. Idempotent.
    pub fn shutdown(&self) {
        self.stop_scheduler();
        if let Err(e) = self.uninit() {
            warn!("Lighting backend shutdown failed: {}", e);
        }
    }

    // Scheduler ------------------------------------------------------------

    /// Start the playback worker. Returns false if the thread failed to spawn.
    pub fn start_scheduler(&self) -> bool {
        let mut scheduler = lock(&self.scheduler);
        match scheduler.start(Arc::clone(&self.state)) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to start playback scheduler: {}", e);
                false
            }
        }
    }

    /// Stop the playback worker. Animations keep their state.
    pub fn stop_scheduler(&self) {
        lock(&self.scheduler).stop();
    }

    pub fn is_scheduler_running(&self) -> bool {
        lock(&self.scheduler).is_running()
    }

    /// Advance every playing animation by `dt`, as one scheduler tick would.
    ///
    /// For hosts that drive their own clock with the worker stopped.
    pub fn tick(&self, dt: Duration) {
        self.state().tick(dt.as_secs_f32());
    }

    // Registry -------------------------------------------------------------

    /// Open an animation file. `None` when the file cannot be decoded.
    pub fn open(&self, path: &str) -> Option<AnimationId> {
        self.state().open(path)
    }

    /// Id for `path`, loading the file on first use.
    pub fn resolve(&self, path: &str) -> Option<AnimationId> {
        self.state().resolve(path)
    }

    /// Register an animation built in memory under `path`.
    pub fn insert(&self, path: &str, animation: AnyAnimation) -> Option<AnimationId> {
        match self.state().registry.insert(path, animation) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Stop, unload and drop an animation. Returns `id` when it existed.
    pub fn close(&self, id: AnimationId) -> Option<AnimationId> {
        self.state().close(id)
    }

    /// Close the animation registered under `path`.
    ///
    /// Only registered paths are closed: a file that was never opened is not
    /// decoded just to be dropped again, and the call returns `None`.
    pub fn close_by_path(&self, path: &str) -> Option<AnimationId> {
        let mut state = self.state();
        let Some(id) = state.registry.lookup(path) else {
            warn!("Close: animation not found: {}", path);
            return None;
        };
        state.close(id)
    }

    pub fn animation_count(&self) -> usize {
        self.state().registry.count()
    }

    /// Id at `index` in load order.
    pub fn animation_id(&self, index: usize) -> Option<AnimationId> {
        self.state().registry.id_at(index)
    }

    pub fn animation_name(&self, id: AnimationId) -> Option<String> {
        self.state().registry.name(id).map(str::to_string)
    }

    pub fn frame_count(&self, id: AnimationId) -> Option<usize> {
        self.state()
            .registry
            .get(id)
            .map(|a| a.as_dyn().frame_count())
    }

    pub fn frame_count_by_path(&self, path: &str) -> Option<usize> {
        let id = self.resolve(path)?;
        self.frame_count(id)
    }

    /// Create backend effects ahead of the first play.
    pub fn load(&self, id: AnimationId) -> bool {
        self.state().load(id)
    }

    pub fn load_by_path(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|id| self.load(id))
    }

    /// Stop and release backend effects. The animation stays registered.
    pub fn unload(&self, id: AnimationId) -> bool {
        self.state().unload(id)
    }

    pub fn unload_by_path(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|id| self.unload(id))
    }

    /// Run `f` on an animation.
    pub fn with_animation<R>(
        &self,
        id: AnimationId,
        f: impl FnOnce(&AnyAnimation) -> R,
    ) -> Option<R> {
        self.state().registry.get(id).map(f)
    }

    /// Run `f` on a mutable animation, for frame editing.
    pub fn with_animation_mut<R>(
        &self,
        id: AnimationId,
        f: impl FnOnce(&mut AnyAnimation) -> R,
    ) -> Option<R> {
        self.state().registry.get_mut(id).map(f)
    }

    /// Write an animation back to disk.
    pub fn save<P: AsRef<Path>>(&self, id: AnimationId, path: P) -> bool {
        let state = self.state();
        let Some(animation) = state.registry.get(id) else {
            warn!("Save: no animation {}", id);
            return false;
        };
        match write_animation(path.as_ref(), animation) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save animation {} to {}: {}", id, path.as_ref().display(), e);
                false
            }
        }
    }

    // Playback -------------------------------------------------------------

    /// Play an animation on its device, stopping whatever played there.
    ///
    /// Returns whether the animation is playing afterwards.
    pub fn play(&self, id: AnimationId, looping: bool) -> bool {
        self.state().play(id, looping)
    }

    pub fn play_by_path(&self, path: &str, looping: bool) -> bool {
        let mut state = self.state();
        state.ensure_init();
        match state.resolve(path) {
            Some(id) => state.play(id, looping),
            None => {
                warn!("Play: animation not found: {}", path);
                false
            }
        }
    }

    pub fn stop(&self, id: AnimationId) -> bool {
        self.state().stop(id)
    }

    pub fn stop_by_path(&self, path: &str) -> bool {
        let mut state = self.state();
        state.ensure_init();
        match state.resolve(path) {
            Some(id) => state.stop(id),
            None => {
                warn!("Stop: animation not found: {}", path);
                false
            }
        }
    }

    /// Stop the animation occupying `device`, returning its id.
    pub fn stop_device(&self, device: Device) -> Option<AnimationId> {
        self.state().stop_device(device)
    }

    pub fn is_playing(&self, id: AnimationId) -> bool {
        self.state().is_playing(id)
    }

    pub fn is_playing_by_path(&self, path: &str) -> bool {
        let mut state = self.state();
        state.ensure_init();
        match state.resolve(path) {
            Some(id) => state.is_playing(id),
            None => {
                warn!("IsPlaying: animation not found: {}", path);
                false
            }
        }
    }

    /// Animation currently playing on `device`.
    pub fn playing_on(&self, device: Device) -> Option<AnimationId> {
        self.state().playing_on(device)
    }

    pub fn is_device_playing(&self, device: Device) -> bool {
        self.playing_on(device).is_some()
    }

    /// Number of animations currently playing.
    pub fn playing_count(&self) -> usize {
        self.state().playing_ids().count()
    }

    /// Id of the `index`-th playing animation, in load order.
    pub fn playing_id(&self, index: usize) -> Option<AnimationId> {
        self.state().playing_ids().nth(index)
    }

    // Key cells ------------------------------------------------------------
    //
    // Keyboard animations only; other devices read as 0 and ignore writes.
    // Every call stops the target animation first.

    /// Packed `0x00BBGGRR` color of `key` in frame `frame`, or 0.
    pub fn get_key_color(&self, id: AnimationId, frame: usize, key: KeyCell) -> i32 {
        self.state().get_key_color(id, frame, key)
    }

    pub fn get_key_color_by_path(&self, path: &str, frame: usize, key: KeyCell) -> i32 {
        let mut state = self.state();
        match state.resolve(path) {
            Some(id) => state.get_key_color(id, frame, key),
            None => {
                error!("GetKeyColor: animation not found: {}", path);
                0
            }
        }
    }

    pub fn set_key_color(&self, id: AnimationId, frame: usize, key: KeyCell, packed: i32) -> bool {
        self.state().set_key_color(id, frame, key, packed)
    }

    pub fn set_key_color_by_path(
        &self,
        path: &str,
        frame: usize,
        key: KeyCell,
        packed: i32,
    ) -> bool {
        let mut state = self.state();
        match state.resolve(path) {
            Some(id) => state.set_key_color(id, frame, key, packed),
            None => {
                error!("SetKeyColor: animation not found: {}", path);
                false
            }
        }
    }

    /// Copy `key` from `source` into frame `frame` of `target`. The source
    /// frame wraps around when `source` is shorter.
    pub fn copy_key_color(
        &self,
        source: AnimationId,
        target: AnimationId,
        frame: usize,
        key: KeyCell,
    ) -> bool {
        self.state()
            .copy_key_color(source, target, frame, key, CopyMode::All)
    }

    /// Like [`copy_key_color`](Self::copy_key_color), skipping black sources.
    pub fn copy_nonzero_key_color(
        &self,
        source: AnimationId,
        target: AnimationId,
        frame: usize,
        key: KeyCell,
    ) -> bool {
        self.state()
            .copy_key_color(source, target, frame, key, CopyMode::NonZero)
    }

    pub fn copy_key_color_by_path(
        &self,
        source: &str,
        target: &str,
        frame: usize,
        key: KeyCell,
    ) -> bool {
        self.copy_by_path(source, target, frame, key, CopyMode::All)
    }

    pub fn copy_nonzero_key_color_by_path(
        &self,
        source: &str,
        target: &str,
        frame: usize,
        key: KeyCell,
    ) -> bool {
        self.copy_by_path(source, target, frame, key, CopyMode::NonZero)
    }

    fn copy_by_path(
        &self,
        source: &str,
        target: &str,
        frame: usize,
        key: KeyCell,
        mode: CopyMode,
    ) -> bool {
        let mut state = self.state();
        let Some(source_id) = state.resolve(source) else {
            error!("CopyKeyColor: source animation not found: {}", source);
            return false;
        };
        let Some(target_id) = state.resolve(target) else {
            error!("CopyKeyColor: target animation not found: {}", target);
            return false;
        };
        state.copy_key_color(source_id, target_id, frame, key, mode)
    }
}

impl Drop for ChromaEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
