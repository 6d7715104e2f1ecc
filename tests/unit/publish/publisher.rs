use super::*;
use crate::publish::config::FaviconConfig;

fn scratch(name: &str) -> (PathBuf, PathBuf) {
    let root = PathBuf::from("target").join(name);
    let _ = std::fs::remove_dir_all(&root);
    let tmp = root.join("tmp");
    std::fs::create_dir_all(&tmp).unwrap();
    (tmp, root.join("www").join("random"))
}

fn rgb_frame(h: usize, w: usize) -> Frame {
    Frame::from_u8([h, w, 3], vec![90u8; h * w * 3]).unwrap()
}

#[test]
fn remaining_time_is_interval_minus_elapsed() {
    let interval = Duration::from_millis(250);
    assert_eq!(
        remaining(interval, Duration::from_millis(50)),
        Some(Duration::from_millis(200))
    );
    assert_eq!(remaining(interval, Duration::from_millis(250)), None);
    assert_eq!(remaining(interval, Duration::from_millis(400)), None);
    assert_eq!(remaining(Duration::ZERO, Duration::ZERO), None);
}

#[test]
fn new_rejects_invalid_config_before_creating_output_dir() {
    let (tmp, output) = scratch("unit_publisher_invalid");
    let cfg = PublishConfig {
        output_path: output.clone(),
        tmp_dir: tmp,
        quality: 150,
        ..PublishConfig::default()
    };
    assert!(Publisher::new(cfg).is_err());
    assert!(!output.parent().unwrap().exists());
}

#[test]
fn resize_applies_before_encoding() {
    let (tmp, output) = scratch("unit_publisher_resize");
    let mut publisher = Publisher::new(PublishConfig {
        output_path: output,
        tmp_dir: tmp,
        format: ImageFormat::Png,
        resize_to: Some([20, 10]),
        favicon: FaviconConfig {
            enabled: false,
            size: 32,
        },
        ..PublishConfig::default()
    })
    .unwrap();

    let report = publisher.publish_once(&rgb_frame(40, 40)).unwrap();
    assert_eq!(report.index, 1);
    assert!(report.favicon_slot.is_none());
    assert!(publisher.favicon_path().is_none());

    let decoded = image::open(publisher.public_path()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (20, 10));
    assert_eq!(publisher.published(), 1);
}

#[test]
fn favicon_is_square_png_next_to_output() {
    let (tmp, output) = scratch("unit_publisher_favicon");
    let mut publisher = Publisher::new(PublishConfig {
        output_path: output.clone(),
        tmp_dir: tmp,
        format: ImageFormat::Jpeg,
        favicon: FaviconConfig {
            enabled: true,
            size: 16,
        },
        ..PublishConfig::default()
    })
    .unwrap();

    let report = publisher.publish_once(&rgb_frame(48, 64)).unwrap();
    let icon_slot = report.favicon_slot.unwrap();
    assert!(icon_slot.ends_with("favicon_1.png"));

    let favicon = publisher.favicon_path().unwrap().to_path_buf();
    assert_eq!(favicon, output.parent().unwrap().join("favicon.png"));
    let decoded = image::open(&favicon).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 16));
}

#[test]
fn shape_errors_stop_publishing_without_touching_slots() {
    let (tmp, output) = scratch("unit_publisher_shape_error");
    let mut publisher = Publisher::new(PublishConfig {
        output_path: output,
        tmp_dir: tmp.clone(),
        ..PublishConfig::default()
    })
    .unwrap();

    let bad = Frame::from_u8([8, 8, 4], vec![0u8; 256]).unwrap();
    let err = publisher.publish_once(&bad).unwrap_err();
    assert!(matches!(err, crate::TpdneError::Shape(_)));
    assert_eq!(std::fs::read_dir(&tmp).unwrap().count(), 0);
    assert!(!publisher.public_path().exists());
}

#[test]
fn run_stops_after_max_iterations() {
    let (tmp, output) = scratch("unit_publisher_run_bounded");
    let mut publisher = Publisher::new(PublishConfig {
        output_path: output,
        tmp_dir: tmp,
        format: ImageFormat::Png,
        min_interval_ms: 0,
        max_iterations: Some(3),
        ..PublishConfig::default()
    })
    .unwrap();

    let mut calls = 0u32;
    let mut sampler = || -> anyhow::Result<Frame> {
        calls += 1;
        Ok(rgb_frame(8, 8))
    };
    publisher.run(&mut sampler).unwrap();
    drop(sampler);
    assert_eq!(calls, 3);
    assert_eq!(publisher.published(), 3);
}

#[test]
fn sampler_errors_end_the_run() {
    let (tmp, output) = scratch("unit_publisher_sampler_error");
    let mut publisher = Publisher::new(PublishConfig {
        output_path: output,
        tmp_dir: tmp,
        min_interval_ms: 0,
        ..PublishConfig::default()
    })
    .unwrap();

    let mut sampler = || -> anyhow::Result<Frame> { anyhow::bail!("model crashed") };
    let err = publisher.run(&mut sampler).unwrap_err();
    assert!(err.to_string().contains("model crashed"));
    assert_eq!(publisher.published(), 0);
}
