//! Three-Band Filter Chain
//!
//! Low shelf (200 Hz) → peak/bell (4 kHz) → high shelf (12 kHz), in that
//! order, for any number of channels.
//!
//! Each band owns one coefficient design, plus the parameters it was last
//! designed from. Each channel owns its own filter for every band. A
//! parameter update retunes that band's filters on every channel but never
//! clears their delay state.

use crate::coeffs::{db_to_gain, BiquadCoefficients, CoefficientDesigner, Cookbook, ShelfKind, SHELF_SLOPE};
use crate::error::DspError;
use crate::filter::Biquad;

/// Gain range accepted by every band (dB)
pub const MIN_GAIN_DB: f32 = -12.0;
pub const MAX_GAIN_DB: f32 = 12.0;

/// Q range of the peak band
pub const MIN_Q: f32 = 0.1;
pub const MAX_Q: f32 = 5.0;
pub const DEFAULT_Q: f32 = 1.0;

/// Fixed band frequencies are pulled below this fraction of the sample rate,
/// so the 12 kHz shelf stays designable at low sample rates
const MAX_FREQUENCY_RATIO: f32 = 0.49;

/// One of the three EQ bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    LowShelf,
    PeakBell,
    HighShelf,
}

impl Band {
    /// All bands in processing order
    pub const ALL: [Band; 3] = [Band::LowShelf, Band::PeakBell, Band::HighShelf];

    /// Corner (shelves) or center (peak) frequency in Hz
    pub const fn frequency(self) -> f32 {
        match self {
            Band::LowShelf => 200.0,
            Band::PeakBell => 4000.0,
            Band::HighShelf => 12000.0,
        }
    }

    /// Position in the chain
    pub const fn index(self) -> usize {
        match self {
            Band::LowShelf => 0,
            Band::PeakBell => 1,
            Band::HighShelf => 2,
        }
    }

    /// Only the peak band exposes Q; the shelves use [`SHELF_SLOPE`]
    pub const fn has_variable_q(self) -> bool {
        matches!(self, Band::PeakBell)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Band::LowShelf => "Low Shelf",
            Band::PeakBell => "Mid Peak",
            Band::HighShelf => "High Shelf",
        }
    }
}

/// Gain and Q for one band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandParameters {
    pub gain_db: f32,
    pub q: f32,
}

impl BandParameters {
    pub fn new(gain_db: f32, q: f32) -> Self {
        Self { gain_db, q }
    }

    /// 0 dB at the default Q
    pub fn flat() -> Self {
        Self::new(0.0, DEFAULT_Q)
    }

    /// Clamp into the valid ranges; non-finite values fall back to defaults
    pub fn clamped(self) -> Self {
        let gain_db = if self.gain_db.is_finite() {
            self.gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
        } else {
            0.0
        };
        let q = if self.q.is_finite() {
            self.q.clamp(MIN_Q, MAX_Q)
        } else {
            DEFAULT_Q
        };
        Self { gain_db, q }
    }

    /// The fields that actually shape `band`: shelves ignore Q
    fn relevant_to(self, band: Band) -> Self {
        if band.has_variable_q() {
            self
        } else {
            Self {
                gain_db: self.gain_db,
                q: SHELF_SLOPE,
            }
        }
    }
}

impl Default for BandParameters {
    fn default() -> Self {
        Self::flat()
    }
}

/// Lifecycle of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// Constructed, no sample rate yet; processing passes audio through
    Uninitialized,
    /// Sample rate known, state cleared, at least one band still pending
    Prepared,
    /// Every band has coefficients for the current sample rate
    Active,
}

#[derive(Debug, Clone, Copy)]
struct BandSlot {
    band: Band,
    coeffs: BiquadCoefficients,
    last_applied: Option<BandParameters>,
}

impl BandSlot {
    fn pending(band: Band) -> Self {
        Self {
            band,
            coeffs: BiquadCoefficients::IDENTITY,
            last_applied: None,
        }
    }
}

/// Low shelf → peak → high shelf cascade with per-channel state
pub struct FilterChain<D = Cookbook> {
    designer: D,
    bands: [BandSlot; 3],
    /// One filter per (channel, band), allocated up front
    filters: Vec<[Biquad; 3]>,
    sample_rate: f32,
    max_block_size: usize,
    lifecycle: ChainState,
}

impl FilterChain<Cookbook> {
    /// Create a chain for `channels` channels using the cookbook designs
    pub fn new(channels: usize) -> Self {
        Self::with_designer(channels, Cookbook)
    }
}

impl<D: CoefficientDesigner> FilterChain<D> {
    pub fn with_designer(channels: usize, designer: D) -> Self {
        Self {
            designer,
            bands: Band::ALL.map(BandSlot::pending),
            filters: (0..channels).map(|_| Band::ALL.map(|_| Biquad::default())).collect(),
            sample_rate: 0.0,
            max_block_size: 0,
            lifecycle: ChainState::Uninitialized,
        }
    }

    /// Set up for a sample rate and block size
    ///
    /// Clears every channel's state and invalidates the parameters each band
    /// was designed from, so the next [`update_band`](Self::update_band)
    /// recomputes unconditionally. Until then each band passes audio through.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<(), DspError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(DspError::invalid(
                "sample_rate",
                f64::from(sample_rate),
                "must be positive and finite",
            ));
        }
        if max_block_size == 0 {
            return Err(DspError::invalid("max_block_size", 0.0, "must be at least one sample"));
        }

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.bands = Band::ALL.map(BandSlot::pending);
        for filters in self.filters.iter_mut() {
            for filter in filters.iter_mut() {
                filter.replace_coefficients(BiquadCoefficients::IDENTITY);
                filter.reset();
            }
        }
        self.lifecycle = ChainState::Prepared;
        Ok(())
    }

    /// Apply new parameters to a band
    ///
    /// Coefficients are recomputed only when the relevant parameters differ
    /// from the last applied ones (gain for the shelves, gain and Q for the
    /// peak). Returns whether a recomputation happened. Parameters are
    /// clamped into range before comparison.
    pub fn update_band(&mut self, band: Band, params: BandParameters) -> Result<bool, DspError> {
        if self.lifecycle == ChainState::Uninitialized {
            return Err(DspError::invalid("sample_rate", 0.0, "chain has not been prepared"));
        }

        let params = params.clamped().relevant_to(band);
        let slot = &self.bands[band.index()];
        if slot.last_applied == Some(params) {
            return Ok(false);
        }

        let frequency = band.frequency().min(self.sample_rate * MAX_FREQUENCY_RATIO);
        let gain = db_to_gain(params.gain_db);
        let coeffs = match slot.band {
            Band::LowShelf => {
                self.designer
                    .shelf(ShelfKind::Low, self.sample_rate, frequency, SHELF_SLOPE, gain)?
            }
            Band::PeakBell => self.designer.peak(self.sample_rate, frequency, params.q, gain)?,
            Band::HighShelf => {
                self.designer
                    .shelf(ShelfKind::High, self.sample_rate, frequency, SHELF_SLOPE, gain)?
            }
        };

        let slot = &mut self.bands[band.index()];
        slot.coeffs = coeffs;
        slot.last_applied = Some(params);
        for filters in self.filters.iter_mut() {
            filters[band.index()].replace_coefficients(coeffs);
        }

        if self.bands.iter().all(|slot| slot.last_applied.is_some()) {
            self.lifecycle = ChainState::Active;
        }
        Ok(true)
    }

    /// Pipe one sample of `channel` through all three bands in order
    ///
    /// # Real-time Safety
    /// No allocations, O(1) time. An out-of-range channel passes through.
    #[inline]
    pub fn process_channel_sample(&mut self, channel: usize, input: f32) -> f32 {
        let Some(filters) = self.filters.get_mut(channel) else {
            return input;
        };

        filters
            .iter_mut()
            .fold(input, |sample, filter| filter.process_sample(sample))
    }

    /// Process a whole channel buffer in-place, samples in temporal order
    #[inline]
    pub fn process_channel(&mut self, channel: usize, buffer: &mut [f32]) {
        let Some(filters) = self.filters.get_mut(channel) else {
            return;
        };

        for sample in buffer.iter_mut() {
            *sample = filters
                .iter_mut()
                .fold(*sample, |value, filter| filter.process_sample(value));
        }
    }

    /// Clear every channel's delay state, keeping the coefficients
    pub fn reset(&mut self) {
        for filters in self.filters.iter_mut() {
            for filter in filters.iter_mut() {
                filter.reset();
            }
        }
    }

    /// Combined analytic magnitude response of the three bands (dB)
    pub fn magnitude_db(&self, frequency: f32) -> f32 {
        if self.lifecycle == ChainState::Uninitialized {
            return 0.0;
        }
        self.bands
            .iter()
            .map(|slot| slot.coeffs.magnitude_db(frequency, self.sample_rate))
            .sum()
    }

    pub fn band_coefficients(&self, band: Band) -> &BiquadCoefficients {
        &self.bands[band.index()].coeffs
    }

    /// Parameters the band's coefficients were designed from, if any
    pub fn last_applied(&self, band: Band) -> Option<BandParameters> {
        self.bands[band.index()].last_applied
    }

    /// Filter of one (channel, band) pair
    pub fn channel_filter(&self, channel: usize, band: Band) -> Option<&Biquad> {
        self.filters.get(channel).map(|filters| &filters[band.index()])
    }

    pub fn channels(&self) -> usize {
        self.filters.len()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn lifecycle(&self) -> ChainState {
        self.lifecycle
    }

    pub fn designer(&self) -> &D {
        &self.designer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tone_gain_db;
    use std::cell::Cell;

    const FS: f32 = 44100.0;

    /// Cookbook designer that counts how often it is asked for coefficients
    #[derive(Default)]
    struct CountingDesigner {
        calls: Cell<usize>,
    }

    impl CoefficientDesigner for CountingDesigner {
        fn shelf(
            &self,
            kind: ShelfKind,
            sample_rate: f32,
            corner_frequency: f32,
            slope: f32,
            linear_gain: f32,
        ) -> Result<BiquadCoefficients, DspError> {
            self.calls.set(self.calls.get() + 1);
            Cookbook.shelf(kind, sample_rate, corner_frequency, slope, linear_gain)
        }

        fn peak(
            &self,
            sample_rate: f32,
            center_frequency: f32,
            q: f32,
            linear_gain: f32,
        ) -> Result<BiquadCoefficients, DspError> {
            self.calls.set(self.calls.get() + 1);
            Cookbook.peak(sample_rate, center_frequency, q, linear_gain)
        }
    }

    fn prepared_chain(gains: [f32; 3], q: f32) -> FilterChain {
        let mut chain = FilterChain::new(2);
        chain.prepare(FS, 512).unwrap();
        for (band, gain_db) in Band::ALL.into_iter().zip(gains) {
            chain.update_band(band, BandParameters::new(gain_db, q)).unwrap();
        }
        chain
    }

    #[test]
    fn test_band_layout() {
        assert_eq!(Band::ALL.map(Band::frequency), [200.0, 4000.0, 12000.0]);
        for (i, band) in Band::ALL.into_iter().enumerate() {
            assert_eq!(band.index(), i);
        }
        assert!(Band::PeakBell.has_variable_q());
        assert!(!Band::LowShelf.has_variable_q());
        assert!(!Band::HighShelf.has_variable_q());
    }

    #[test]
    fn test_parameter_clamping() {
        let clamped = BandParameters::new(40.0, 0.0).clamped();
        assert_eq!(clamped, BandParameters::new(MAX_GAIN_DB, MIN_Q));

        let clamped = BandParameters::new(-40.0, 50.0).clamped();
        assert_eq!(clamped, BandParameters::new(MIN_GAIN_DB, MAX_Q));

        let clamped = BandParameters::new(f32::NAN, f32::INFINITY).clamped();
        assert_eq!(clamped, BandParameters::flat());
    }

    #[test]
    fn test_lifecycle() {
        let mut chain = FilterChain::new(2);
        assert_eq!(chain.lifecycle(), ChainState::Uninitialized);
        assert!(chain.update_band(Band::LowShelf, BandParameters::flat()).is_err());

        chain.prepare(FS, 256).unwrap();
        assert_eq!(chain.lifecycle(), ChainState::Prepared);
        assert_eq!(chain.sample_rate(), FS);
        assert_eq!(chain.max_block_size(), 256);

        chain.update_band(Band::LowShelf, BandParameters::flat()).unwrap();
        chain.update_band(Band::PeakBell, BandParameters::flat()).unwrap();
        assert_eq!(chain.lifecycle(), ChainState::Prepared);
        chain.update_band(Band::HighShelf, BandParameters::flat()).unwrap();
        assert_eq!(chain.lifecycle(), ChainState::Active);

        chain.prepare(48000.0, 256).unwrap();
        assert_eq!(chain.lifecycle(), ChainState::Prepared);
    }

    #[test]
    fn test_prepare_rejects_bad_setup() {
        let mut chain = FilterChain::new(2);
        assert!(chain.prepare(0.0, 512).is_err());
        assert!(chain.prepare(f32::NAN, 512).is_err());
        assert!(chain.prepare(FS, 0).is_err());
        assert_eq!(chain.lifecycle(), ChainState::Uninitialized);
    }

    #[test]
    fn test_update_band_is_idempotent() {
        let mut chain = FilterChain::with_designer(2, CountingDesigner::default());
        chain.prepare(FS, 512).unwrap();

        let params = BandParameters::new(6.0, 1.0);
        assert!(chain.update_band(Band::PeakBell, params).unwrap());
        assert!(!chain.update_band(Band::PeakBell, params).unwrap());
        assert_eq!(chain.designer().calls.get(), 1);

        // A real change triggers exactly one more design
        assert!(chain.update_band(Band::PeakBell, BandParameters::new(6.0, 2.0)).unwrap());
        assert_eq!(chain.designer().calls.get(), 2);
    }

    #[test]
    fn test_shelves_ignore_q_changes() {
        let mut chain = FilterChain::with_designer(2, CountingDesigner::default());
        chain.prepare(FS, 512).unwrap();

        chain.update_band(Band::LowShelf, BandParameters::new(3.0, 1.0)).unwrap();
        assert!(!chain.update_band(Band::LowShelf, BandParameters::new(3.0, 4.0)).unwrap());
        chain.update_band(Band::HighShelf, BandParameters::new(-3.0, 0.2)).unwrap();
        assert!(!chain.update_band(Band::HighShelf, BandParameters::new(-3.0, 2.0)).unwrap());
        assert_eq!(chain.designer().calls.get(), 2);
    }

    #[test]
    fn test_out_of_range_values_compare_after_clamping() {
        let mut chain = FilterChain::with_designer(1, CountingDesigner::default());
        chain.prepare(FS, 512).unwrap();

        chain.update_band(Band::PeakBell, BandParameters::new(12.0, 5.0)).unwrap();
        assert!(!chain.update_band(Band::PeakBell, BandParameters::new(30.0, 9.0)).unwrap());
        assert_eq!(chain.designer().calls.get(), 1);
    }

    #[test]
    fn test_prepare_forces_recomputation() {
        let mut chain = FilterChain::with_designer(2, CountingDesigner::default());
        chain.prepare(FS, 512).unwrap();
        let params = BandParameters::new(-4.0, 1.0);
        for band in Band::ALL {
            chain.update_band(band, params).unwrap();
        }
        assert_eq!(chain.designer().calls.get(), 3);

        chain.prepare(48000.0, 512).unwrap();
        for band in Band::ALL {
            assert_eq!(chain.last_applied(band), None);
            assert_eq!(*chain.band_coefficients(band), BiquadCoefficients::IDENTITY);
            assert!(chain.update_band(band, params).unwrap());
        }
        assert_eq!(chain.designer().calls.get(), 6);
    }

    #[test]
    fn test_update_retunes_every_channel_without_clearing_history() {
        let mut chain = prepared_chain([6.0, 6.0, 6.0], 1.0);
        let mut cascades: Vec<Vec<Biquad>> = (0..2)
            .map(|_| {
                Band::ALL
                    .iter()
                    .map(|&band| Biquad::new(*chain.band_coefficients(band)))
                    .collect()
            })
            .collect();

        fn run(chain: &mut FilterChain, cascades: &mut [Vec<Biquad>], samples: std::ops::Range<usize>) {
            for i in samples {
                for (channel, cascade) in cascades.iter_mut().enumerate() {
                    let x = ((i + 7 * channel) as f32 * 0.3).sin() * 0.5;
                    let expected = cascade.iter_mut().fold(x, |acc, filter| filter.process_sample(acc));
                    assert_eq!(chain.process_channel_sample(channel, x), expected, "sample {i}");
                }
            }
        }

        run(&mut chain, &mut cascades, 0..64);

        chain.update_band(Band::PeakBell, BandParameters::new(-6.0, 3.0)).unwrap();
        let retuned = *chain.band_coefficients(Band::PeakBell);
        for channel in 0..2 {
            assert_eq!(*chain.channel_filter(channel, Band::PeakBell).unwrap().coefficients(), retuned);
            cascades[channel][Band::PeakBell.index()].replace_coefficients(retuned);
        }

        run(&mut chain, &mut cascades, 64..512);
    }

    #[test]
    fn test_channel_independence() {
        let mut chain = prepared_chain([12.0, -12.0, 12.0], 0.5);

        for i in 0..1024 {
            let impulse = if i == 0 { 1.0 } else { 0.0 };
            let left = chain.process_channel_sample(0, impulse);
            let right = chain.process_channel_sample(1, 0.0);
            if i == 0 {
                assert!(left != 0.0);
            }
            assert_eq!(right, 0.0, "silent channel leaked at sample {i}");
        }
    }

    #[test]
    fn test_processing_order_matches_cascade() {
        let gains = [5.0, -7.0, 9.0];
        let mut chain = prepared_chain(gains, 2.0);

        let mut cascade: Vec<Biquad> = Band::ALL
            .iter()
            .map(|&band| Biquad::new(*chain.band_coefficients(band)))
            .collect();

        for i in 0..512 {
            let x = (i as f32 * 0.05).sin() * 0.5;
            let expected = cascade.iter_mut().fold(x, |acc, filter| filter.process_sample(acc));
            assert_eq!(chain.process_channel_sample(0, x), expected);
        }
    }

    #[test]
    fn test_process_channel_matches_per_sample() {
        let mut per_sample = prepared_chain([3.0, 6.0, -3.0], 1.5);
        let mut per_block = prepared_chain([3.0, 6.0, -3.0], 1.5);

        let mut block: Vec<f32> = (0..128).map(|i| (i as f32 * 0.11).sin()).collect();
        let expected: Vec<f32> = block
            .iter()
            .map(|&x| per_sample.process_channel_sample(1, x))
            .collect();
        per_block.process_channel(1, &mut block);

        assert_eq!(block, expected);
    }

    #[test]
    fn test_flat_chain_is_transparent() {
        let mut chain = prepared_chain([0.0, 0.0, 0.0], 1.0);
        for freq in [50.0, 200.0, 1000.0, 4000.0, 12000.0, 18000.0] {
            let gain = tone_gain_db(|x| chain.process_channel_sample(0, x), freq, FS);
            assert!(gain.abs() < 0.01, "{freq}Hz: {gain}dB");
            chain.reset();
        }
    }

    #[test]
    fn test_measured_band_gains() {
        for gain_db in [-12.0, -6.0, 6.0, 12.0] {
            // Peak band: full gain at its center
            let mut chain = prepared_chain([0.0, gain_db, 0.0], 1.0);
            let measured = tone_gain_db(|x| chain.process_channel_sample(0, x), 4000.0, FS);
            assert!((measured - gain_db).abs() < 0.1, "peak {gain_db}dB measured {measured}dB");

            // Shelves: half the gain at the corner, full gain on the plateau
            let mut chain = prepared_chain([gain_db, 0.0, 0.0], 1.0);
            let corner = tone_gain_db(|x| chain.process_channel_sample(0, x), 200.0, FS);
            assert!((corner - gain_db / 2.0).abs() < 0.1, "low corner {corner}dB");
            chain.reset();
            let plateau = tone_gain_db(|x| chain.process_channel_sample(0, x), 20.0, FS);
            assert!((plateau - gain_db).abs() < 0.1, "low plateau {plateau}dB");

            let mut chain = prepared_chain([0.0, 0.0, gain_db], 1.0);
            let corner = tone_gain_db(|x| chain.process_channel_sample(0, x), 12000.0, FS);
            assert!((corner - gain_db / 2.0).abs() < 0.1, "high corner {corner}dB");
            chain.reset();
            let plateau = tone_gain_db(|x| chain.process_channel_sample(0, x), 21000.0, FS);
            assert!((plateau - gain_db).abs() < 0.1, "high plateau {plateau}dB");
        }
    }

    #[test]
    fn test_magnitude_matches_measurement() {
        let mut chain = prepared_chain([6.0, 0.0, -6.0], 1.0);
        for freq in [100.0, 1000.0, 8000.0] {
            let analytic = chain.magnitude_db(freq);
            chain.reset();
            let measured = tone_gain_db(|x| chain.process_channel_sample(0, x), freq, FS);
            assert!((analytic - measured).abs() < 0.05, "{freq}Hz: {analytic} vs {measured}");
        }
    }

    #[test]
    fn test_low_sample_rate_keeps_high_shelf_designable() {
        let mut chain = FilterChain::new(2);
        chain.prepare(22050.0, 512).unwrap();
        assert!(chain.update_band(Band::HighShelf, BandParameters::new(6.0, 1.0)).unwrap());
        assert!(chain.band_coefficients(Band::HighShelf).is_stable());
    }

    #[test]
    fn test_unprepared_chain_passes_through() {
        let mut chain = FilterChain::new(2);
        assert_eq!(chain.process_channel_sample(0, 0.25), 0.25);
        assert_eq!(chain.process_channel_sample(5, 0.5), 0.5);
        assert_eq!(chain.magnitude_db(1000.0), 0.0);
    }
}
