use super::*;
use crate::foundation::core::Transform;

fn solid_image(rgba: [u8; 4], w: u32, h: u32) -> PreparedImage {
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(rgba.repeat((w * h) as usize)),
    }
}

fn is_red(px: [u8; 4]) -> bool {
    px[0] > 250 && px[1] < 5 && px[2] < 5 && px[3] == 255
}

fn is_blue(px: [u8; 4]) -> bool {
    px[0] < 5 && px[1] < 5 && px[2] > 250 && px[3] == 255
}

#[test]
fn text_size_follows_box_height_within_bounds() {
    assert_eq!(text_size_for_height(50.0), 20.0);
    assert_eq!(text_size_for_height(10.0), 12.0);
    assert_eq!(text_size_for_height(500.0), 48.0);
}

#[test]
fn rejects_oversized_canvas() {
    assert!(
        CpuSurface::new(Canvas {
            width: 70_000,
            height: 10
        })
        .is_err()
    );
}

#[test]
fn clear_fills_background() {
    let mut s = CpuSurface::new(Canvas {
        width: 8,
        height: 4,
    })
    .unwrap();
    s.clear(Color::rgb(0, 0, 255)).unwrap();
    let f = s.finish().unwrap();
    assert_eq!((f.width, f.height), (8, 4));
    assert!(f.premultiplied);
    assert!(is_blue(f.pixel(0, 0).unwrap()));
    assert!(is_blue(f.pixel(7, 3).unwrap()));
}

#[test]
fn image_is_stretched_to_box() {
    let mut s = CpuSurface::new(Canvas {
        width: 100,
        height: 100,
    })
    .unwrap();
    s.clear(Color::rgb(0, 0, 255)).unwrap();
    let img = solid_image([255, 0, 0, 255], 2, 2);
    let geom = AssetGeometry::from_transform(&Transform::new(10.0, 10.0, 40.0, 40.0, 0.0));
    s.draw_asset(&geom, DrawPayload::Image(&img)).unwrap();
    let f = s.finish().unwrap();

    assert!(is_red(f.pixel(30, 30).unwrap()));
    assert!(is_red(f.pixel(45, 45).unwrap()));
    assert!(is_blue(f.pixel(5, 5).unwrap()));
    assert!(is_blue(f.pixel(60, 30).unwrap()));
}

#[test]
fn rotated_image_turns_about_its_centre() {
    let mut s = CpuSurface::new(Canvas {
        width: 100,
        height: 100,
    })
    .unwrap();
    s.clear(Color::rgb(0, 0, 255)).unwrap();
    let img = solid_image([255, 0, 0, 255], 4, 1);
    let geom = AssetGeometry::from_transform(&Transform::new(0.0, 40.0, 100.0, 20.0, 90.0));
    s.draw_asset(&geom, DrawPayload::Image(&img)).unwrap();
    let f = s.finish().unwrap();

    assert!(is_red(f.pixel(50, 5).unwrap()));
    assert!(is_red(f.pixel(50, 95).unwrap()));
    assert!(is_blue(f.pixel(5, 50).unwrap()));
    assert!(is_blue(f.pixel(95, 50).unwrap()));
}

#[test]
fn finish_resets_for_next_frame() {
    let mut s = CpuSurface::new(Canvas {
        width: 20,
        height: 20,
    })
    .unwrap();
    s.clear(Color::rgb(0, 0, 255)).unwrap();
    let img = solid_image([255, 0, 0, 255], 1, 1);
    let geom = AssetGeometry::from_transform(&Transform::new(0.0, 0.0, 20.0, 20.0, 0.0));
    s.draw_asset(&geom, DrawPayload::Image(&img)).unwrap();
    assert!(is_red(s.finish().unwrap().pixel(10, 10).unwrap()));

    s.clear(Color::rgb(0, 0, 255)).unwrap();
    assert!(is_blue(s.finish().unwrap().pixel(10, 10).unwrap()));
}

/// Regular and bold faces of the system sans-serif, when the machine has distinct ones.
fn sans_faces() -> Option<(PreparedText, PreparedText)> {
    let book = crate::assets::fonts::FontBook::load(std::path::Path::new("."));
    let regular = book.resolve("sans-serif", false).ok()?;
    let bold = book.resolve("sans-serif", true).ok()?;
    if regular.weight == bold.weight {
        return None;
    }
    let white = Color::rgb(255, 255, 255);
    Some((
        PreparedText {
            font: regular,
            color: white,
        },
        PreparedText {
            font: bold,
            color: white,
        },
    ))
}

fn draw_label(s: &mut CpuSurface, prepared: &PreparedText) -> FrameRGBA {
    s.clear(Color::rgb(0, 0, 0)).unwrap();
    let geom = AssetGeometry::from_transform(&Transform::new(40.0, 20.0, 240.0, 60.0, 0.0));
    s.draw_asset(
        &geom,
        DrawPayload::Text {
            text: "Hello World",
            prepared,
        },
    )
    .unwrap();
    s.finish().unwrap()
}

fn text_surface() -> CpuSurface {
    CpuSurface::new(Canvas {
        width: 320,
        height: 100,
    })
    .unwrap()
}

fn lit_pixels(f: &FrameRGBA) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    for y in 0..f.height {
        for x in 0..f.width {
            if f.pixel(x, y).unwrap()[0] > 64 {
                out.push((x, y));
            }
        }
    }
    out
}

#[test]
fn text_is_centred_in_its_box() {
    let Some((regular, _)) = sans_faces() else {
        eprintln!("no distinct regular/bold sans-serif faces; skipping");
        return;
    };
    let f = draw_label(&mut text_surface(), &regular);
    let lit = lit_pixels(&f);
    assert!(!lit.is_empty());

    for &(x, y) in &lit {
        assert!((40..280).contains(&x) && (20..80).contains(&y), "({x}, {y})");
    }
    let n = lit.len() as f64;
    let cx = lit.iter().map(|p| f64::from(p.0)).sum::<f64>() / n;
    let cy = lit.iter().map(|p| f64::from(p.1)).sum::<f64>() / n;
    assert!((cx - 160.0).abs() < 12.0, "centroid x {cx}");
    assert!((cy - 50.0).abs() < 12.0, "centroid y {cy}");
}

#[test]
fn bold_text_differs_from_regular() {
    let Some((regular, bold)) = sans_faces() else {
        eprintln!("no distinct regular/bold sans-serif faces; skipping");
        return;
    };
    let thin = lit_pixels(&draw_label(&mut text_surface(), &regular)).len();
    let thick = lit_pixels(&draw_label(&mut text_surface(), &bold)).len();
    assert!(thick > thin, "bold {thick} vs regular {thin}");
}

#[test]
fn bold_text_does_not_depend_on_earlier_draws() {
    let Some((regular, bold)) = sans_faces() else {
        eprintln!("no distinct regular/bold sans-serif faces; skipping");
        return;
    };
    let fresh = draw_label(&mut text_surface(), &bold);

    let mut reused = text_surface();
    draw_label(&mut reused, &regular);
    let after_regular = draw_label(&mut reused, &bold);

    assert!(fresh.data == after_regular.data);
}
