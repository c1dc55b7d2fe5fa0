//! Backend that reports effects through the `log` facade.

use std::collections::HashMap;

use log::{debug, info};

use super::{BackendError, CustomEffect, EffectId, LightingBackend};
use crate::schema::{Color, Device};

/// Dry-run backend: every activated effect is logged at `info` level with a
/// short color summary.
#[derive(Debug, Default)]
pub struct LogBackend {
    effects: HashMap<EffectId, (Device, CustomEffect)>,
    next_effect: u64,
}

impl LogBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Average color of a payload as `#rrggbb`.
fn summarize(effect: &CustomEffect) -> String {
    let packed: Vec<i32> = match effect {
        CustomEffect::Strip(colors) => colors.clone(),
        CustomEffect::Grid(rows) => rows.iter().flatten().copied().collect(),
    };
    if packed.is_empty() {
        return "empty".to_string();
    }
    let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);
    for &p in &packed {
        let (cr, cg, cb) = Color::from_packed(p).to_rgb8();
        r += u32::from(cr);
        g += u32::from(cg);
        b += u32::from(cb);
    }
    let n = packed.len() as u32;
    format!("#{:02x}{:02x}{:02x}", r / n, g / n, b / n)
}

impl LightingBackend for LogBackend {
    fn init(&mut self) -> Result<(), BackendError> {
        info!("Lighting backend initialized");
        Ok(())
    }

    fn uninit(&mut self) -> Result<(), BackendError> {
        info!("Lighting backend shut down ({} effects left)", self.effects.len());
        self.effects.clear();
        Ok(())
    }

    fn create_effect(
        &mut self,
        device: Device,
        effect: &CustomEffect,
    ) -> Result<EffectId, BackendError> {
        let id = EffectId(self.next_effect);
        self.next_effect += 1;
        debug!("Created effect {} for {} ({} colors)", id.0, device, effect.len());
        self.effects.insert(id, (device, effect.clone()));
        Ok(id)
    }

    fn set_effect(&mut self, effect: EffectId) -> Result<(), BackendError> {
        let (device, payload) = self.effects.get(&effect).ok_or(BackendError::Status {
            call: "SetEffect",
            code: 87,
        })?;
        info!("{}: effect {} avg {}", device, effect.0, summarize(payload));
        Ok(())
    }

    fn delete_effect(&mut self, effect: EffectId) -> Result<(), BackendError> {
        self.effects.remove(&effect).ok_or(BackendError::Status {
            call: "DeleteEffect",
            code: 87,
        })?;
        debug!("Deleted effect {}", effect.0);
        Ok(())
    }
}
