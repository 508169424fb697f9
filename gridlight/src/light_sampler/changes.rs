use crate::{gpu, BufferFlushOutcome};

/// Describes how the sampler changed during an update, i.e. what consumers
/// of the grid have to refresh on their side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LightSamplerChanges {
    /// Variant changed in a way consumer shaders have to be specialized for.
    pub needs_recompile: bool,

    /// Buffers got reallocated, so bind groups referring to them have to be
    /// recreated.
    pub needs_rebind: bool,

    /// Grid got rebuilt with different options or lights.
    pub light_settings_updated: bool,
}

impl LightSamplerChanges {
    pub fn all() -> Self {
        Self {
            needs_recompile: true,
            needs_rebind: true,
            light_settings_updated: true,
        }
    }

    pub fn lights_flushed(&mut self, outcome: BufferFlushOutcome) {
        if outcome != BufferFlushOutcome::Unchanged {
            self.light_settings_updated = true;
        }

        if outcome.is_reallocated() {
            self.needs_rebind = true;
        }
    }

    pub fn variant_changed(
        &mut self,
        prev: Option<gpu::GridVariant>,
        curr: gpu::GridVariant,
    ) {
        if prev.map_or(true, |prev| prev.query_key() != curr.query_key()) {
            self.needs_recompile = true;
        }
    }

    pub fn buffers_reallocated(&mut self) {
        self.needs_rebind = true;
    }
}
