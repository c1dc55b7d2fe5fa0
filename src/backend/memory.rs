//! In-memory backend that records every call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{BackendError, CustomEffect, EffectId, LightingBackend};
use crate::schema::Device;

/// A single recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Init,
    UnInit,
    Create {
        effect: EffectId,
        device: Device,
        payload: CustomEffect,
    },
    Set(EffectId),
    Delete(EffectId),
}

/// Shared handle to the call history of a [`MemoryBackend`].
///
/// Stays readable after the backend has been moved into an engine.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    inner: Arc<Mutex<LogState>>,
}

#[derive(Debug, Default)]
struct LogState {
    calls: Vec<BackendCall>,
    live: HashMap<EffectId, CustomEffect>,
}

impl CallLog {
    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of every call recorded so far.
    pub fn snapshot(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Effects that were created and not yet deleted.
    pub fn live_effects(&self) -> usize {
        self.lock().live.len()
    }

    /// Payload of the most recently activated effect.
    pub fn last_set_payload(&self) -> Option<CustomEffect> {
        let state = self.lock();
        state.calls.iter().rev().find_map(|call| match call {
            BackendCall::Set(id) => state.live.get(id).cloned(),
            _ => None,
        })
    }

    /// Number of `set_effect` calls.
    pub fn set_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Set(_)))
            .count()
    }

    /// Forget recorded calls. Live effects are kept.
    pub fn clear(&self) {
        self.lock().calls.clear();
    }
}

/// Backend that keeps effects in memory and logs each call.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    log: CallLog,
    next_effect: u64,
    init_status: Option<i32>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `init` always fails with `code`.
    pub fn failing_init(code: i32) -> Self {
        Self {
            init_status: Some(code),
            ..Self::default()
        }
    }

    /// Handle to the call history.
    pub fn calls(&self) -> CallLog {
        self.log.clone()
    }
}

impl LightingBackend for MemoryBackend {
    fn init(&mut self) -> Result<(), BackendError> {
        self.log.lock().calls.push(BackendCall::Init);
        match self.init_status {
            Some(code) => Err(BackendError::Status { call: "Init", code }),
            None => Ok(()),
        }
    }

    fn uninit(&mut self) -> Result<(), BackendError> {
        self.log.lock().calls.push(BackendCall::UnInit);
        Ok(())
    }

    fn create_effect(
        &mut self,
        device: Device,
        effect: &CustomEffect,
    ) -> Result<EffectId, BackendError> {
        let id = EffectId(self.next_effect);
        self.next_effect += 1;
        let mut state = self.log.lock();
        state.live.insert(id, effect.clone());
        state.calls.push(BackendCall::Create {
            effect: id,
            device,
            payload: effect.clone(),
        });
        Ok(id)
    }

    fn set_effect(&mut self, effect: EffectId) -> Result<(), BackendError> {
        let mut state = self.log.lock();
        if !state.live.contains_key(&effect) {
            return Err(BackendError::Status {
                call: "SetEffect",
                code: 87,
            });
        }
        state.calls.push(BackendCall::Set(effect));
        Ok(())
    }

    fn delete_effect(&mut self, effect: EffectId) -> Result<(), BackendError> {
        let mut state = self.log.lock();
        if state.live.remove(&effect).is_none() {
            return Err(BackendError::Status {
                call: "DeleteEffect",
                code: 87,
            });
        }
        state.calls.push(BackendCall::Delete(effect));
        Ok(())
    }
}
