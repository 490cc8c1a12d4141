//! Performance benchmarks for the DSP module
//!
//! Run with: cargo bench -p merj_dsp

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use merj_dsp::{Band, BandParameters, FilterChain, SaturationStage};

fn prepared_chain() -> FilterChain {
    let mut chain = FilterChain::new(2);
    chain.prepare(48000.0, 2048).unwrap();
    chain.update_band(Band::LowShelf, BandParameters::new(6.0, 1.0)).unwrap();
    chain.update_band(Band::PeakBell, BandParameters::new(-3.0, 2.0)).unwrap();
    chain.update_band(Band::HighShelf, BandParameters::new(4.0, 1.0)).unwrap();
    chain
}

fn benchmark_chain_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_chain");

    // Common buffer sizes in audio applications
    let buffer_sizes = [64, 128, 256, 512, 1024, 2048];

    for size in buffer_sizes {
        group.throughput(Throughput::Elements(size as u64 * 2));

        group.bench_function(format!("process_stereo_{}_frames", size), |b| {
            let mut chain = prepared_chain();
            let saturation = SaturationStage::new(true);
            let mut left: Vec<f32> = (0..size).map(|i| (i as f32 * 0.001).sin()).collect();
            let mut right: Vec<f32> = (0..size).map(|i| (i as f32 * 0.002).sin()).collect();

            b.iter(|| {
                chain.process_channel(0, black_box(&mut left));
                chain.process_channel(1, black_box(&mut right));
                saturation.process_buffer(&mut left);
                saturation.process_buffer(&mut right);
            });
        });
    }

    group.finish();
}

fn benchmark_band_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("band_update");

    group.bench_function("changed_parameters", |b| {
        let mut chain = prepared_chain();
        let mut gain = 0.0_f32;

        b.iter(|| {
            // Simulate a knob being dragged
            gain = (gain + 0.5) % 12.0;
            chain
                .update_band(Band::PeakBell, black_box(BandParameters::new(gain, 1.0)))
                .unwrap();
        });
    });

    group.bench_function("unchanged_parameters", |b| {
        let mut chain = prepared_chain();
        let params = BandParameters::new(-3.0, 2.0);

        b.iter(|| {
            chain.update_band(Band::PeakBell, black_box(params)).unwrap();
        });
    });

    group.finish();
}

fn benchmark_single_sample(c: &mut Criterion) {
    c.bench_function("chain_process_single_sample", |b| {
        let mut chain = prepared_chain();

        b.iter(|| black_box(chain.process_channel_sample(0, black_box(0.5))));
    });
}

criterion_group!(
    benches,
    benchmark_chain_processing,
    benchmark_band_update,
    benchmark_single_sample
);

criterion_main!(benches);
