//! Registry of loaded animations keyed by id and by path.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::{debug, error};

use crate::animation::{AnyAnimation, DecodeError, read_animation};
use crate::backend::LightingBackend;

/// Identifier handed out by the registry. Never reused by one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(pub u32);

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to load animation {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: DecodeError,
    },
    #[error("Animation path {0} is already registered")]
    Duplicate(String),
}

/// Owns every loaded animation.
///
/// Ids are assigned in load order and iteration follows that order.
#[derive(Debug, Default)]
pub struct AnimationRegistry {
    next_id: u32,
    animations: BTreeMap<AnimationId, AnyAnimation>,
    ids_by_path: HashMap<String, AnimationId>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of an already registered path.
    pub fn lookup(&self, path: &str) -> Option<AnimationId> {
        self.ids_by_path.get(path).copied()
    }

    /// Open the animation at `path`.
    ///
    /// A path that is already registered returns its id without decoding
    /// the file again. Nothing is registered when decoding fails.
    pub fn open(&mut self, path: &str) -> Result<AnimationId, RegistryError> {
        if let Some(id) = self.lookup(path) {
            return Ok(id);
        }
        let animation = read_animation(path).map_err(|source| {
            error!("Failed to open animation {}: {}", path, source);
            RegistryError::Load {
                path: path.to_string(),
                source,
            }
        })?;
        let id = self.register(path, animation);
        debug!("Opened animation {} as {}", path, id);
        Ok(id)
    }

    /// Existing id for `path`, opening the file on first use.
    pub fn resolve(&mut self, path: &str) -> Result<AnimationId, RegistryError> {
        match self.lookup(path) {
            Some(id) => Ok(id),
            None => self.open(path),
        }
    }

    /// Register an animation built in memory under `path`.
    pub fn insert(
        &mut self,
        path: &str,
        animation: AnyAnimation,
    ) -> Result<AnimationId, RegistryError> {
        if self.ids_by_path.contains_key(path) {
            return Err(RegistryError::Duplicate(path.to_string()));
        }
        Ok(self.register(path, animation))
    }

    fn register(&mut self, path: &str, mut animation: AnyAnimation) -> AnimationId {
        animation.as_dyn_mut().set_name(path.to_string());
        let id = AnimationId(self.next_id);
        self.next_id += 1;
        self.animations.insert(id, animation);
        self.ids_by_path.insert(path.to_string(), id);
        id
    }

    /// Stop, unload and drop the animation. Returns `id` when it existed.
    pub fn close(
        &mut self,
        id: AnimationId,
        backend: &mut dyn LightingBackend,
    ) -> Option<AnimationId> {
        let Some(mut animation) = self.animations.remove(&id) else {
            debug!("Close: no animation {}", id);
            return None;
        };
        let anim = animation.as_dyn_mut();
        anim.stop();
        anim.unload(backend);
        // Keyed by id: the display name may have been changed since open.
        self.ids_by_path.retain(|_, registered| *registered != id);
        debug!("Closed animation {} ({})", anim.name(), id);
        Some(id)
    }

    /// Close the animation registered under `path`.
    pub fn close_by_path(
        &mut self,
        path: &str,
        backend: &mut dyn LightingBackend,
    ) -> Option<AnimationId> {
        let id = self.lookup(path)?;
        self.close(id, backend)
    }

    /// Close every animation, oldest first.
    pub fn close_all(&mut self, backend: &mut dyn LightingBackend) {
        while let Some(&id) = self.animations.keys().next() {
            self.close(id, backend);
        }
    }

    pub fn count(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Id at `index` in load order. Indices shift when animations close.
    pub fn id_at(&self, index: usize) -> Option<AnimationId> {
        self.animations.keys().nth(index).copied()
    }

    pub fn name(&self, id: AnimationId) -> Option<&str> {
        self.animations.get(&id).map(|a| a.as_dyn().name())
    }

    pub fn get(&self, id: AnimationId) -> Option<&AnyAnimation> {
        self.animations.get(&id)
    }

    pub fn get_mut(&mut self, id: AnimationId) -> Option<&mut AnyAnimation> {
        self.animations.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnimationId, &AnyAnimation)> {
        self.animations.iter().map(|(&id, a)| (id, a))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (AnimationId, &mut AnyAnimation)> {
        self.animations.iter_mut().map(|(&id, a)| (id, a))
    }
}
