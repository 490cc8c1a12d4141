//! EQ Processor
//!
//! Host-facing wrapper around the DSP chain. The host calls
//! [`AudioProcessor::prepare`] with its stream settings, then
//! [`AudioProcessor::process_block`] once per block from the audio thread.
//! Parameters are read from a shared [`ParameterStore`] exactly once at the
//! start of every block, so a knob moved mid-block takes effect on the next.
//!
//! # Audio Thread Rules
//!
//! `process_block` never allocates, locks or logs. All logging happens in
//! `prepare` and `release`, which hosts call from a control thread.

use std::sync::Arc;

use tracing::{debug, info, warn};

use merj_dsp::{Band, ChainState, DenormalGuard, FilterChain, SaturationStage};

use crate::config::StreamConfig;
use crate::error::{ProcessorError, ProcessorResult};
use crate::params::{ParameterSnapshot, ParameterStore};

/// Lifecycle contract between a host and an audio effect
pub trait AudioProcessor: Send {
    /// Display name
    fn name(&self) -> &str;

    /// Configure for a stream. Clears all filter state.
    fn prepare(&mut self, config: &StreamConfig) -> ProcessorResult<()>;

    /// Playback stopped; drop any audio history
    fn release(&mut self);

    /// Process planar audio in place
    ///
    /// `buffer` holds one slice per output channel. Channels at or beyond
    /// `input_channels` carry no input and are cleared.
    fn process_block(&mut self, buffer: &mut [&mut [f32]], input_channels: usize)
        -> ProcessorResult<()>;

    /// Clear audio history without touching parameters
    fn reset(&mut self);

    /// Seconds of output after input stops. IIR tails decay below audibility
    /// within a few milliseconds, so hosts may treat this as zero.
    fn tail_length_seconds(&self) -> f64 {
        0.0
    }

    fn accepts_midi(&self) -> bool {
        false
    }
}

/// Three-band EQ with optional soft saturation
pub struct EqProcessor {
    params: Arc<ParameterStore>,
    chain: FilterChain,
    saturation: SaturationStage,
    config: Option<StreamConfig>,
}

impl EqProcessor {
    pub fn new() -> Self {
        Self::with_parameters(Arc::new(ParameterStore::new()))
    }

    /// Create a processor reading from an existing parameter store
    pub fn with_parameters(params: Arc<ParameterStore>) -> Self {
        Self {
            params,
            chain: FilterChain::new(0),
            saturation: SaturationStage::default(),
            config: None,
        }
    }

    /// Shared handle for control threads to write parameters through
    pub fn parameters(&self) -> Arc<ParameterStore> {
        Arc::clone(&self.params)
    }

    pub fn config(&self) -> Option<&StreamConfig> {
        self.config.as_ref()
    }

    pub fn lifecycle(&self) -> ChainState {
        self.chain.lifecycle()
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    pub fn saturation(&self) -> &SaturationStage {
        &self.saturation
    }

    /// Bring bands and saturation in line with a parameter snapshot
    ///
    /// Unchanged bands cost one comparison each.
    fn apply_snapshot(&mut self, snapshot: &ParameterSnapshot) -> ProcessorResult<()> {
        if self.chain.lifecycle() == ChainState::Uninitialized {
            return Err(ProcessorError::Uninitialized);
        }
        for band in Band::ALL {
            self.chain.update_band(band, snapshot.band(band))?;
        }
        self.saturation.set_enabled(snapshot.saturation_enabled);
        Ok(())
    }

    /// Process a planar block against explicit parameter values
    ///
    /// [`AudioProcessor::process_block`] calls this with a fresh snapshot of
    /// the shared store. Used directly it makes parameter timing
    /// deterministic, which offline rendering and tests rely on.
    ///
    /// # Real-time Safety
    /// No allocations, no locks, no logging. Before `prepare` every channel
    /// is silenced and [`ProcessorError::Uninitialized`] is returned.
    pub fn process_block_with(
        &mut self,
        buffer: &mut [&mut [f32]],
        input_channels: usize,
        snapshot: &ParameterSnapshot,
    ) -> ProcessorResult<()> {
        if let Err(e) = self.apply_snapshot(snapshot) {
            for channel in buffer.iter_mut() {
                channel.fill(0.0);
            }
            return Err(e);
        }

        let _guard = DenormalGuard::new();
        let active_channels = input_channels.min(self.chain.channels());

        for (index, channel) in buffer.iter_mut().enumerate() {
            if index >= active_channels {
                channel.fill(0.0);
                continue;
            }
            self.chain.process_channel(index, channel);
            self.saturation.process_buffer(channel);
        }
        Ok(())
    }

    /// Process interleaved audio in place (`channels` samples per frame)
    ///
    /// Same semantics as the planar path: channels beyond the prepared
    /// count are cleared.
    pub fn process_interleaved(&mut self, data: &mut [f32], channels: usize) -> ProcessorResult<()> {
        let snapshot = self.params.snapshot();
        if let Err(e) = self.apply_snapshot(&snapshot) {
            data.fill(0.0);
            return Err(e);
        }
        if channels == 0 {
            return Ok(());
        }

        let _guard = DenormalGuard::new();
        let active_channels = channels.min(self.chain.channels());

        for frame in data.chunks_mut(channels) {
            for (index, sample) in frame.iter_mut().enumerate() {
                *sample = if index < active_channels {
                    let filtered = self.chain.process_channel_sample(index, *sample);
                    self.saturation.process(filtered)
                } else {
                    0.0
                };
            }
        }
        Ok(())
    }
}

impl Default for EqProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioProcessor for EqProcessor {
    fn name(&self) -> &str {
        "MerjEQ"
    }

    fn prepare(&mut self, config: &StreamConfig) -> ProcessorResult<()> {
        if let Err(e) = config.validate() {
            warn!("Rejected stream configuration: {}", e);
            return Err(e);
        }

        let channels = usize::from(config.channels);
        if self.chain.channels() != channels {
            self.chain = FilterChain::new(channels);
        }
        self.chain
            .prepare(config.sample_rate as f32, config.max_block_size as usize)?;
        self.config = Some(*config);

        info!(
            "Prepared {} Hz, {} channel(s), max block {} ({:.1}ms)",
            config.sample_rate,
            config.channels,
            config.max_block_size,
            config.latency_ms()
        );
        Ok(())
    }

    fn release(&mut self) {
        // Re-preparing clears state and forces every band to redesign
        if let Some(config) = self.config {
            if let Err(e) = self
                .chain
                .prepare(config.sample_rate as f32, config.max_block_size as usize)
            {
                warn!("Failed to reset chain on release: {}", e);
            }
        }
        debug!("Released processor resources");
    }

    fn process_block(
        &mut self,
        buffer: &mut [&mut [f32]],
        input_channels: usize,
    ) -> ProcessorResult<()> {
        let snapshot = self.params.snapshot();
        self.process_block_with(buffer, input_channels, &snapshot)
    }

    fn reset(&mut self) {
        self.chain.reset();
    }
}
