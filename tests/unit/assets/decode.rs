use std::io::Cursor;

use super::*;

#[test]
fn decode_png_dimensions_and_premul() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let prepared = decode_image(&buf).unwrap();
    assert_eq!((prepared.width, prepared.height), (1, 1));
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_image(b"definitely not an image").is_err());
}

#[test]
fn decode_rejects_images_wider_than_the_raster_surface() {
    let img = image::RgbaImage::from_pixel(MAX_RASTER_EDGE + 1, 1, image::Rgba([0, 0, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let err = decode_image(&buf).unwrap_err();
    assert!(matches!(err, EasyAnimError::Validation(_)));
    assert!(check_raster_size(MAX_RASTER_EDGE, MAX_RASTER_EDGE).is_ok());
    assert!(check_raster_size(1, MAX_RASTER_EDGE + 1).is_err());
}

#[test]
fn extreme_svg_aspect_stays_within_raster_limit() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="100000">
        <rect width="1" height="100000" fill="#00ff00"/></svg>"##;
    let db = Arc::new(usvg::fontdb::Database::new());
    let prepared = rasterize_svg(svg, db).unwrap();
    assert!(prepared.width <= MAX_RASTER_EDGE && prepared.height <= MAX_RASTER_EDGE);
}

#[test]
fn svg_is_rasterized_at_least_min_edge() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20">
        <rect width="10" height="20" fill="#ff0000"/></svg>"##;
    let db = Arc::new(usvg::fontdb::Database::new());
    let prepared = rasterize_svg(svg, db).unwrap();
    assert_eq!(prepared.width, 512);
    assert_eq!(prepared.height, 1024);
    assert_eq!(
        prepared.rgba8_premul.len(),
        (prepared.width * prepared.height * 4) as usize
    );
    assert_eq!(&prepared.rgba8_premul[0..4], &[255, 0, 0, 255]);
}

#[test]
fn svg_parse_error_is_reported() {
    let db = Arc::new(usvg::fontdb::Database::new());
    assert!(rasterize_svg(b"<svg", db).is_err());
}

#[test]
fn svg_extension_check_is_case_insensitive() {
    assert!(is_svg_path("art/Logo.SVG"));
    assert!(!is_svg_path("photo.png"));
    assert!(!is_svg_path("svg"));
}
