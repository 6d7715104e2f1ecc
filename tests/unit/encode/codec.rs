use std::io::Cursor;

use super::*;

fn checker(width: u32, height: u32) -> CanonicalImage {
    image::RgbImage::from_fn(width, height, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            image::Rgb([240, 30, 30])
        } else {
            image::Rgb([20, 20, 200])
        }
    })
}

fn encode_to_vec(img: &CanonicalImage, format: ImageFormat, quality: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_image(img, format, quality, &mut buf).unwrap();
    buf
}

#[test]
fn extensions_match_formats() {
    assert_eq!(ImageFormat::Webp.extension(), "webp");
    assert_eq!(ImageFormat::Png.extension(), "png");
    assert_eq!(ImageFormat::Jpeg.extension(), "jpeg");
    assert_eq!(ImageFormat::default(), ImageFormat::Webp);
    assert_eq!(ImageFormat::Jpeg.to_string(), "jpeg");
}

#[test]
fn decode_keeps_dimensions_for_every_format() {
    let img = checker(37, 21);
    for (format, codec) in [
        (ImageFormat::Webp, image::ImageFormat::WebP),
        (ImageFormat::Png, image::ImageFormat::Png),
        (ImageFormat::Jpeg, image::ImageFormat::Jpeg),
    ] {
        let bytes = encode_to_vec(&img, format, 90);
        let decoded = image::load(Cursor::new(&bytes), codec).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (37, 21), "{format}");
    }
}

#[test]
fn lossless_formats_preserve_pixels() {
    let img = checker(16, 16);
    for (format, codec) in [
        (ImageFormat::Webp, image::ImageFormat::WebP),
        (ImageFormat::Png, image::ImageFormat::Png),
    ] {
        let bytes = encode_to_vec(&img, format, 1);
        let decoded = image::load(Cursor::new(&bytes), codec).unwrap().to_rgb8();
        assert_eq!(decoded.as_raw(), img.as_raw(), "{format}");
    }
}

#[test]
fn jpeg_quality_changes_output_size() {
    let img = image::RgbImage::from_fn(64, 64, |x, y| {
        image::Rgb([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8])
    });
    let low = encode_to_vec(&img, ImageFormat::Jpeg, 10);
    let high = encode_to_vec(&img, ImageFormat::Jpeg, 100);
    assert!(low.len() < high.len());
    assert!(ImageFormat::Jpeg.honors_quality());
    assert!(!ImageFormat::Png.honors_quality());
}

#[test]
fn serde_uses_lowercase_names() {
    let f: ImageFormat = serde_json::from_str("\"png\"").unwrap();
    assert_eq!(f, ImageFormat::Png);
    assert_eq!(serde_json::to_string(&ImageFormat::Jpeg).unwrap(), "\"jpeg\"");
    assert!(serde_json::from_str::<ImageFormat>("\"gif\"").is_err());
}

#[test]
fn write_image_creates_complete_file() {
    let dir = std::path::PathBuf::from("target").join("unit_codec_write");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("out.png");
    let _ = std::fs::remove_file(&path);

    write_image(&checker(10, 6), ImageFormat::Png, 99, &path).unwrap();
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (10, 6));
}

#[test]
fn write_image_into_missing_directory_fails() {
    let path = std::path::PathBuf::from("target")
        .join("unit_codec_missing_dir")
        .join("nope")
        .join("out.png");
    let err = write_image(&checker(4, 4), ImageFormat::Png, 99, &path).unwrap_err();
    assert!(matches!(err, TpdneError::Other(_)));
}
