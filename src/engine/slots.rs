//! Per-device play slots.

use std::collections::HashMap;

use super::registry::AnimationId;
use crate::schema::{Device, Device1D, Device2D};

/// Which animation is active on each device. One slot per device, with the
/// strip and grid namespaces kept apart.
#[derive(Debug, Default)]
pub struct PlaySlots {
    strips: HashMap<Device1D, AnimationId>,
    grids: HashMap<Device2D, AnimationId>,
}

impl PlaySlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupant(&self, device: Device) -> Option<AnimationId> {
        match device {
            Device::OneD(d) => self.strips.get(&d).copied(),
            Device::TwoD(d) => self.grids.get(&d).copied(),
        }
    }

    /// Put `id` in the slot for `device`, returning the previous occupant.
    pub fn install(&mut self, device: Device, id: AnimationId) -> Option<AnimationId> {
        match device {
            Device::OneD(d) => self.strips.insert(d, id),
            Device::TwoD(d) => self.grids.insert(d, id),
        }
    }

    /// Empty the slot for `device`, returning its occupant.
    pub fn vacate(&mut self, device: Device) -> Option<AnimationId> {
        match device {
            Device::OneD(d) => self.strips.remove(&d),
            Device::TwoD(d) => self.grids.remove(&d),
        }
    }

    /// Empty whichever slot holds `id`.
    pub fn release(&mut self, id: AnimationId) {
        self.strips.retain(|_, occupant| *occupant != id);
        self.grids.retain(|_, occupant| *occupant != id);
    }

    pub fn clear(&mut self) {
        self.strips.clear();
        self.grids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_returns_previous() {
        let mut slots = PlaySlots::new();
        let keyboard = Device::TwoD(Device2D::Keyboard);
        assert_eq!(slots.install(keyboard, AnimationId(1)), None);
        assert_eq!(slots.install(keyboard, AnimationId(2)), Some(AnimationId(1)));
        assert_eq!(slots.occupant(keyboard), Some(AnimationId(2)));
    }

    #[test]
    fn test_namespaces_are_separate() {
        let mut slots = PlaySlots::new();
        slots.install(Device::OneD(Device1D::ChromaLink), AnimationId(1));
        slots.install(Device::TwoD(Device2D::Keyboard), AnimationId(2));
        assert_eq!(slots.occupant(Device::OneD(Device1D::ChromaLink)), Some(AnimationId(1)));
        assert_eq!(slots.occupant(Device::TwoD(Device2D::Keyboard)), Some(AnimationId(2)));
    }

    #[test]
    fn test_release_and_vacate() {
        let mut slots = PlaySlots::new();
        let mouse = Device::TwoD(Device2D::Mouse);
        slots.install(mouse, AnimationId(4));
        slots.release(AnimationId(4));
        assert_eq!(slots.occupant(mouse), None);

        slots.install(mouse, AnimationId(5));
        assert_eq!(slots.vacate(mouse), Some(AnimationId(5)));
        assert_eq!(slots.vacate(mouse), None);
    }
}
