//! Lighting backend abstraction.
//!
//! The vendor SDK is an opaque capability: effects are created from frame
//! colors, activated with [`LightingBackend::set_effect`] and released with
//! [`LightingBackend::delete_effect`]. Colors cross this boundary packed as
//! `0x00BBGGRR`.

mod log_backend;
mod memory;

pub use log_backend::LogBackend;
pub use memory::{BackendCall, CallLog, MemoryBackend};

use crate::schema::{Device, Device1D, Device2D};

/// Opaque handle for an effect created by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub u64);

/// Custom color payload for one effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomEffect {
    /// One packed color per LED.
    Strip(Vec<i32>),
    /// Rows of packed colors.
    Grid(Vec<Vec<i32>>),
}

impl CustomEffect {
    /// Number of packed colors in the payload.
    pub fn len(&self) -> usize {
        match self {
            CustomEffect::Strip(colors) => colors.len(),
            CustomEffect::Grid(rows) => rows.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Backend errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Lighting backend is unavailable")]
    Unavailable,
    #[error("{call} failed with status {code}")]
    Status { call: &'static str, code: i32 },
}

/// Capability set of the vendor lighting SDK.
///
/// The per-family creation calls mirror the SDK entry points and forward to
/// [`create_effect`](LightingBackend::create_effect) unless overridden.
pub trait LightingBackend: Send {
    fn init(&mut self) -> Result<(), BackendError>;

    fn uninit(&mut self) -> Result<(), BackendError>;

    fn create_effect(
        &mut self,
        device: Device,
        effect: &CustomEffect,
    ) -> Result<EffectId, BackendError>;

    fn set_effect(&mut self, effect: EffectId) -> Result<(), BackendError>;

    fn delete_effect(&mut self, effect: EffectId) -> Result<(), BackendError>;

    fn create_chroma_link_effect(
        &mut self,
        effect: &CustomEffect,
    ) -> Result<EffectId, BackendError> {
        self.create_effect(Device::OneD(Device1D::ChromaLink), effect)
    }

    fn create_headset_effect(&mut self, effect: &CustomEffect) -> Result<EffectId, BackendError> {
        self.create_effect(Device::OneD(Device1D::Headset), effect)
    }

    fn create_mousepad_effect(&mut self, effect: &CustomEffect) -> Result<EffectId, BackendError> {
        self.create_effect(Device::OneD(Device1D::Mousepad), effect)
    }

    fn create_keyboard_effect(&mut self, effect: &CustomEffect) -> Result<EffectId, BackendError> {
        self.create_effect(Device::TwoD(Device2D::Keyboard), effect)
    }

    fn create_keypad_effect(&mut self, effect: &CustomEffect) -> Result<EffectId, BackendError> {
        self.create_effect(Device::TwoD(Device2D::Keypad), effect)
    }

    fn create_mouse_effect(&mut self, effect: &CustomEffect) -> Result<EffectId, BackendError> {
        self.create_effect(Device::TwoD(Device2D::Mouse), effect)
    }
}

/// Stand-in used when the vendor library could not be loaded. Every call
/// fails with [`BackendError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

impl LightingBackend for UnavailableBackend {
    fn init(&mut self) -> Result<(), BackendError> {
        Err(BackendError::Unavailable)
    }

    fn uninit(&mut self) -> Result<(), BackendError> {
        Err(BackendError::Unavailable)
    }

    fn create_effect(&mut self, _: Device, _: &CustomEffect) -> Result<EffectId, BackendError> {
        Err(BackendError::Unavailable)
    }

    fn set_effect(&mut self, _: EffectId) -> Result<(), BackendError> {
        Err(BackendError::Unavailable)
    }

    fn delete_effect(&mut self, _: EffectId) -> Result<(), BackendError> {
        Err(BackendError::Unavailable)
    }
}

/// Create an effect through the family-specific entry point for `device`.
pub fn create_device_effect(
    backend: &mut dyn LightingBackend,
    device: Device,
    effect: &CustomEffect,
) -> Result<EffectId, BackendError> {
    match device {
        Device::OneD(Device1D::ChromaLink) => backend.create_chroma_link_effect(effect),
        Device::OneD(Device1D::Headset) => backend.create_headset_effect(effect),
        Device::OneD(Device1D::Mousepad) => backend.create_mousepad_effect(effect),
        Device::TwoD(Device2D::Keyboard) => backend.create_keyboard_effect(effect),
        Device::TwoD(Device2D::Keypad) => backend.create_keypad_effect(effect),
        Device::TwoD(Device2D::Mouse) => backend.create_mouse_effect(effect),
        Device::OneD(Device1D::Other(_)) | Device::TwoD(Device2D::Other(_)) => {
            backend.create_effect(device, effect)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_dispatch_reaches_create_effect() {
        let mut backend = MemoryBackend::new();
        let log = backend.calls();
        let effect = CustomEffect::Strip(vec![0; 15]);

        create_device_effect(&mut backend, Device::OneD(Device1D::Mousepad), &effect).unwrap();
        create_device_effect(&mut backend, Device::OneD(Device1D::Other(9)), &effect).unwrap();

        let devices: Vec<_> = log
            .snapshot()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Create { device, .. } => Some(device),
                _ => None,
            })
            .collect();
        assert_eq!(
            devices,
            vec![Device::OneD(Device1D::Mousepad), Device::OneD(Device1D::Other(9))]
        );
    }

    #[test]
    fn test_unavailable_backend_refuses_everything() {
        let mut backend = UnavailableBackend;
        let effect = CustomEffect::Grid(vec![vec![0; 22]; 6]);
        assert_eq!(backend.init(), Err(BackendError::Unavailable));
        assert_eq!(
            create_device_effect(&mut backend, Device::TwoD(Device2D::Keyboard), &effect),
            Err(BackendError::Unavailable)
        );
        assert_eq!(backend.set_effect(EffectId(0)), Err(BackendError::Unavailable));
    }

    #[test]
    fn test_custom_effect_len() {
        assert_eq!(CustomEffect::Strip(vec![1, 2, 3]).len(), 3);
        assert_eq!(CustomEffect::Grid(vec![vec![0; 5]; 4]).len(), 20);
        assert!(CustomEffect::Grid(vec![]).is_empty());
    }
}
