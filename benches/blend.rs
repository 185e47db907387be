use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use poster_layers::blend::blend;
use poster_layers::{BlendMode, Compositor, Layer, LayerData, RenderResult, Rgba8, Surface};

const SIZE: u32 = 512;

fn gradient(seed: u32) -> poster_layers::Raster {
    image::RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        image::Rgba([
            ((x + seed) & 255) as u8,
            ((y * 3 + seed) & 255) as u8,
            ((x ^ y) & 255) as u8,
            ((x + y) & 255) as u8,
        ])
    })
}

fn stripes(s: &mut Surface, _: &mut LayerData) -> RenderResult {
    let w = s.width() as f64;
    let mut y = 0.0;
    while y < s.height() as f64 {
        s.fill_rect(0.0, y, w, 3.5, Rgba8::new(30, 60, 200, 180));
        y += 8.0;
    }
    Ok(())
}

fn criterion_benchmark(c: &mut Criterion) {
    {
        let base = gradient(0);
        let overlay = gradient(77);
        let mut group = c.benchmark_group("blend");
        group.throughput(Throughput::Elements((SIZE * SIZE) as u64));
        for mode in BlendMode::ALL {
            group.bench_with_input(BenchmarkId::from_parameter(mode), &mode, |b, &mode| {
                b.iter(|| blend(black_box(&base), black_box(&overlay), mode))
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("composite");
        group.bench_function("cached_stack", |b| {
            let mut poster = Compositor::new(SIZE, SIZE);
            for (i, mode) in [BlendMode::Normal, BlendMode::Multiply, BlendMode::Screen]
                .into_iter()
                .enumerate()
            {
                let layer = Layer::new(format!("layer_{}", i), "city")
                    .with_renderer(stripes)
                    .with_blend_mode(mode)
                    .with_opacity(0.8);
                poster.add_layer(layer).unwrap();
            }
            b.iter(|| poster.composite().unwrap())
        });
        group.finish();
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
