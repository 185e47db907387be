//! End-to-end compositing scenarios.

use std::cell::Cell;
use std::rc::Rc;

use poster_layers::blend::blend_pixel;
use poster_layers::raster;
use poster_layers::{
    compose_layers, BlendMode, Compositor, ExportFormat, Layer, LayerConfig, LayerData,
    RenderResult, Rgb8, Rgba8, Surface,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fills the whole canvas and counts how often it was asked to.
fn counted_fill(
    color: Rgba8,
    calls: Rc<Cell<usize>>,
) -> impl Fn(&mut Surface, &mut LayerData) -> RenderResult {
    move |s: &mut Surface, _: &mut LayerData| -> RenderResult {
        calls.set(calls.get() + 1);
        let (w, h) = (s.width() as f64, s.height() as f64);
        s.fill_rect(0.0, 0.0, w, h, color);
        Ok(())
    }
}

fn solid(name: &str, color: Rgba8) -> Layer {
    Layer::new(name, "city").with_renderer(counted_fill(color, Rc::new(Cell::new(0))))
}

fn close(a: [u8; 4], b: [u8; 4], tol: u8) -> bool {
    a.iter().zip(&b).all(|(x, y)| x.abs_diff(*y) <= tol)
}

#[test]
fn test_opacity_is_clamped() {
    let mut c = Compositor::new(4, 4);
    c.add_layer(Layer::new("a", "city").with_opacity(1.7)).unwrap();
    assert_eq!(c.get_layer("a").unwrap().opacity(), 1.0);
    assert!(c.set_layer_opacity("a", -0.3));
    assert_eq!(c.get_layer("a").unwrap().opacity(), 0.0);
    assert!(!c.set_layer_opacity("missing", 0.5));
}

#[test]
fn test_normal_opaque_overlay_replaces_base() {
    let base = [12, 34, 56, 255];
    let over = [200, 100, 50, 255];
    assert_eq!(blend_pixel(base, over, BlendMode::Normal), over);
}

#[test]
fn test_transparent_overlay_passes_base_for_every_mode() {
    let base = [90, 160, 30, 200];
    for mode in BlendMode::ALL {
        assert_eq!(blend_pixel(base, [255, 0, 255, 0], mode), base, "{}", mode);
    }
}

#[test]
fn test_multiply_and_screen_boundaries() {
    let base = [180, 70, 20, 255];
    assert_eq!(
        blend_pixel(base, [255, 255, 255, 255], BlendMode::Multiply),
        base
    );
    assert_eq!(
        blend_pixel(base, [0, 0, 0, 255], BlendMode::Multiply),
        [0, 0, 0, 255]
    );
    assert_eq!(blend_pixel(base, [0, 0, 0, 255], BlendMode::Screen), base);
    assert_eq!(
        blend_pixel(base, [255, 255, 255, 255], BlendMode::Screen),
        [255, 255, 255, 255]
    );
}

#[test]
fn test_darken_and_lighten_split_channels() {
    let a = [200, 40, 128, 255];
    let b = [100, 90, 128, 255];
    let dark = blend_pixel(a, b, BlendMode::Darken);
    let light = blend_pixel(a, b, BlendMode::Lighten);
    assert_eq!(dark, [100, 40, 128, 255]);
    assert_eq!(light, [200, 90, 128, 255]);
    for i in 0..3 {
        assert_eq!(dark[i] as u16 + light[i] as u16, a[i] as u16 + b[i] as u16);
    }
}

#[test]
fn test_second_composite_uses_cache() {
    init_logging();
    let calls = Rc::new(Cell::new(0));
    let mut c = Compositor::new(16, 16);
    let fill = counted_fill(Rgba8::opaque(9, 9, 9), calls.clone());
    c.add_layer(Layer::new("base", "city").with_renderer(fill))
        .unwrap();

    let first = c.composite().unwrap();
    let second = c.composite().unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(first, second);
    assert!(c.is_cached("base"));
}

#[test]
fn test_opacity_change_rerenders_only_that_layer() {
    let base_calls = Rc::new(Cell::new(0));
    let top_calls = Rc::new(Cell::new(0));
    let mut c = Compositor::new(8, 8);
    let red = counted_fill(Rgba8::opaque(255, 0, 0), base_calls.clone());
    let blue = counted_fill(Rgba8::opaque(0, 0, 255), top_calls.clone());
    c.add_layer(Layer::new("base", "city").with_renderer(red))
        .unwrap();
    c.add_layer(Layer::new("top", "railway").with_renderer(blue))
        .unwrap();
    c.composite().unwrap();

    c.set_layer_opacity("top", 0.25);
    assert!(c.is_cached("base"));
    assert!(!c.is_cached("top"));
    c.composite().unwrap();
    assert_eq!(base_calls.get(), 1);
    assert_eq!(top_calls.get(), 2);
}

#[test]
fn test_z_order_is_deterministic() {
    let mut c = Compositor::new(4, 4);
    c.add_layer(solid("red", Rgba8::opaque(255, 0, 0)).with_z_index(1)).unwrap();
    c.add_layer(solid("green", Rgba8::opaque(0, 255, 0)).with_z_index(1)).unwrap();
    c.add_layer(solid("blue", Rgba8::opaque(0, 0, 255)).with_z_index(0)).unwrap();
    // Equal z-indices keep insertion order.
    assert_eq!(c.layer_names(), vec!["blue", "red", "green"]);
    let out = c.composite().unwrap();
    assert_eq!(out.get_pixel(2, 2).0, [0, 255, 0, 255]);

    assert!(c.move_layer("blue", 5));
    assert_eq!(c.layer_names(), vec!["red", "green", "blue"]);
    let out = c.composite().unwrap();
    assert_eq!(out.get_pixel(2, 2).0, [0, 0, 255, 255]);
}

#[test]
fn test_half_blue_over_red() {
    let mut c = Compositor::new(100, 100);
    c.add_layer(solid("red", Rgba8::opaque(255, 0, 0))).unwrap();
    c.add_layer(solid("blue", Rgba8::opaque(0, 0, 255)).with_opacity(0.5))
        .unwrap();
    let out = c.composite().unwrap();
    for (x, y) in [(0, 0), (50, 50), (99, 99)] {
        let px = out.get_pixel(x, y).0;
        assert!(close(px, [127, 0, 127, 255], 1), "({}, {}): {:?}", x, y, px);
    }
}

#[test]
fn test_hidden_layer_is_skipped() {
    let mut c = Compositor::new(4, 4).with_background(Rgb8::new(1, 2, 3));
    c.add_layer(solid("red", Rgba8::opaque(255, 0, 0))).unwrap();
    assert_eq!(c.toggle_layer_visibility("red"), Some(false));
    let out = c.composite().unwrap();
    assert_eq!(out.get_pixel(0, 0).0, [1, 2, 3, 255]);
}

#[test]
fn test_config_json_round_trip() {
    let mut c = Compositor::new(300, 400).with_dpi(96);
    c.add_layer(Layer::new("city_base", "city")).unwrap();
    c.add_layer(
        Layer::new("railway_overlay", "railway")
            .with_opacity(0.9)
            .with_blend_mode(BlendMode::Multiply),
    )
    .unwrap();
    c.add_layer(Layer::new("stars", "starmap").with_visible(false))
        .unwrap();

    let json = c.to_json().unwrap();
    let back = Compositor::from_json(&json).unwrap();
    assert_eq!(back.to_config(), c.to_config());
    assert_eq!(back.dpi(), 96);
    let rail = back.get_layer("railway_overlay").unwrap();
    assert_eq!(rail.blend_mode(), BlendMode::Multiply);
    assert_eq!(rail.opacity(), 0.9);
    assert!(!back.get_layer("stars").unwrap().is_visible());
}

#[test]
fn test_export_png_and_compose_layers() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();

    let mut c = Compositor::new(20, 10);
    c.add_layer(solid("red", Rgba8::opaque(255, 0, 0))).unwrap();
    let png = dir.path().join("poster.png");
    c.export(&png, ExportFormat::Png, 95).unwrap();
    let back = image::open(&png).unwrap().to_rgba8();
    assert_eq!(back.dimensions(), (20, 10));
    assert_eq!(back.get_pixel(5, 5).0, [255, 0, 0, 255]);

    let jpg = dir.path().join("placeholders.jpg");
    let configs = vec![
        LayerConfig::new("city_base", "city"),
        LayerConfig::new("transit_overlay", "transit").with_blend_mode(BlendMode::Multiply),
    ];
    let out = compose_layers(&configs, 120, 80, Some(&jpg)).unwrap();
    assert_eq!(out.dimensions(), (120, 80));
    assert!(jpg.exists());
    // Placeholder labels only touch the middle of the canvas.
    assert_eq!(raster::pixel(&out, 0, 0), Rgba8::WHITE);
}
