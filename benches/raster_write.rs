use std::sync::Arc;

use criterion::{
    criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion, PlotConfiguration,
    Throughput,
};
use rasterstore::{
    array::{Array, Context, Mode, Subarray},
    raster::{store_raster_array_with, PIXEL_ATTRIBUTE},
    storage::store::MemoryStore,
};

fn raster_write(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("raster_write");
    group.plot_config(plot_config);

    for size in [256i64, 512, 1024] {
        let num_pixels = usize::try_from(size * size).unwrap();
        let pixels: Vec<u8> = (0..num_pixels).map(|i| (i % 251) as u8).collect();
        group.throughput(Throughput::Bytes(num_pixels as u64));
        group.bench_function(BenchmarkId::new("memory", size * size), |b| {
            b.iter(|| {
                let context = Context::new(Arc::new(MemoryStore::new()));
                store_raster_array_with(&context, "/", size, size, &pixels).unwrap();
            });
        });
    }
    group.finish();
}

fn raster_read(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("raster_read");
    group.plot_config(plot_config);

    for size in [256i64, 512, 1024] {
        let num_pixels = usize::try_from(size * size).unwrap();
        let pixels = vec![1u8; num_pixels];
        let context = Context::new(Arc::new(MemoryStore::new()));
        store_raster_array_with(&context, "/", size, size, &pixels).unwrap();
        let array = Array::open(&context, "/", Mode::Read).unwrap();

        group.throughput(Throughput::Bytes(num_pixels as u64));
        group.bench_function(BenchmarkId::new("memory", size * size), |b| {
            b.iter(|| {
                array
                    .retrieve_subarray(PIXEL_ATTRIBUTE, &Subarray::new())
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, raster_write, raster_read);
criterion_main!(benches);
