//! End-to-end controller tests over a real temporary store.

use std::io::Write;
use std::sync::Arc;

use aquaguard::classify::{QualityClassifier, SafetyStatus};
use aquaguard::db::models::NewUser;
use aquaguard::db::Database;
use aquaguard::vision::RecognitionTier;
use aquaguard::{AnalysisController, Error, MeterOutcome, MeterPhotoContext, QualitySampleContext};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tempfile::TempDir;

fn sample_png() -> Vec<u8> {
    let img = RgbImage::from_pixel(64, 64, Rgb([90, 140, 210]));
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn blank_png() -> Vec<u8> {
    let img = RgbImage::from_pixel(120, 60, Rgb([255, 255, 255]));
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

async fn degraded_controller(dir: &TempDir) -> (AnalysisController, i64) {
    let _ = env_logger::builder().is_test(true).try_init();
    let db = Database::new(dir.path().join("aquaguard.sqlite3")).unwrap();
    let user_id = db
        .create_user(NewUser {
            username: "demo".into(),
            email: "demo@example.com".into(),
            password: "secret".into(),
            full_name: Some("Demo User".into()),
        })
        .await
        .unwrap()
        .unwrap();

    let controller = AnalysisController::new(db, Arc::new(QualityClassifier::degraded()));
    (controller, user_id)
}

#[tokio::test]
async fn degraded_quality_analysis_reports_moderate_safe() {
    let dir = TempDir::new().unwrap();
    let (controller, user_id) = degraded_controller(&dir).await;
    assert!(controller.is_degraded());

    let report = controller
        .analyze_quality(user_id, sample_png(), QualitySampleContext::default())
        .await
        .unwrap();

    assert_eq!(report.safety_status, SafetyStatus::Safe);
    assert_eq!(report.safety_score, 50);
    assert_eq!(report.score_display, "50/100");
    assert!(report.degraded);

    let snapshot = controller.metrics_snapshot().await;
    assert_eq!(snapshot.quality_analyses, 1);
    assert_eq!(snapshot.degraded_classifications, 1);
}

#[tokio::test]
async fn loaded_artifact_flags_unsafe_water_and_alerts() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let db = Database::new(dir.path().join("aquaguard.sqlite3")).unwrap();
    let user_id = db
        .create_user(NewUser {
            username: "demo".into(),
            email: "demo@example.com".into(),
            password: "secret".into(),
            full_name: None,
        })
        .await
        .unwrap()
        .unwrap();

    // Artifact that calls bright smooth images safe and everything else
    // unsafe. A checkerboard scores a high texture variance.
    let mut artifact = tempfile::NamedTempFile::new().unwrap();
    artifact
        .write_all(
            br#"{"trees": [{"feature": 3, "threshold": 500.0,
                "left": {"counts": [9.0, 1.0]},
                "right": {"counts": [1.0, 9.0]}}]}"#,
        )
        .unwrap();
    let classifier = QualityClassifier::load(artifact.path()).unwrap();
    let controller = AnalysisController::new(db, Arc::new(classifier));
    assert!(!controller.is_degraded());

    let mut checkerboard = RgbImage::new(64, 64);
    for (x, y, pixel) in checkerboard.enumerate_pixels_mut() {
        let shade = if (x + y) % 2 == 0 { 255 } else { 0 };
        *pixel = Rgb([shade, shade, shade]);
    }
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(checkerboard)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();

    let report = controller
        .analyze_quality(user_id, buffer.into_inner(), QualitySampleContext::default())
        .await
        .unwrap();
    assert_eq!(report.safety_status, SafetyStatus::Unsafe);
    assert_eq!(report.safety_score, 100 - 90);
    assert!(!report.degraded);

    let alerts = controller.unread_alerts(user_id).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].related_reading_id, Some(report.reading_id));
}

#[tokio::test]
async fn corrupt_image_fails_quality_analysis_with_decode_error() {
    let dir = TempDir::new().unwrap();
    let (controller, user_id) = degraded_controller(&dir).await;

    let result = controller
        .analyze_quality(user_id, b"not an image".to_vec(), QualitySampleContext::default())
        .await;
    assert!(matches!(result, Err(Error::ImageDecode(_))));

    // Nothing was persisted for the failed request.
    assert_eq!(
        controller.statistics(user_id).await.unwrap().quality.total,
        0
    );
}

#[tokio::test]
async fn filename_tier_reading_flows_to_store_and_metrics() {
    let dir = TempDir::new().unwrap();
    let (controller, user_id) = degraded_controller(&dir).await;

    let outcome = controller
        .read_meter(
            user_id,
            sample_png(),
            "id_93_value_105_535.jpg".into(),
            MeterPhotoContext {
                location: Some("kitchen".into()),
                meter_id: Some("M-17".into()),
            },
        )
        .await
        .unwrap();

    let MeterOutcome::Report(report) = outcome else {
        panic!("expected a report");
    };
    assert_eq!(report.usage_liters, 105_535);
    assert_eq!(report.usage_display, "105535 Liters");
    assert_eq!(report.limit_display, "Eco Limit: 14500 L/Month");
    assert!(report.is_high);
    assert_eq!(report.recognized_by, RecognitionTier::Filename);

    let readings = controller.recent_meter(user_id, 10).await.unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].reading_value, 105_535);
    assert_eq!(readings[0].recognized_by, RecognitionTier::Filename);
    assert_eq!(readings[0].location.as_deref(), Some("kitchen"));

    // Over-limit reading raised exactly one alert.
    assert_eq!(controller.unread_alerts(user_id).await.unwrap().len(), 1);

    let snapshot = controller.metrics_snapshot().await;
    assert_eq!(snapshot.meter_reads, 1);
    assert_eq!(snapshot.filename_tier_hits, 1);
}

#[tokio::test]
async fn eco_limit_from_settings_controls_high_usage() {
    let dir = TempDir::new().unwrap();
    let (controller, user_id) = degraded_controller(&dir).await;

    let mut settings = controller.get_settings(user_id).await.unwrap();
    settings.eco_limit = 200_000;
    controller
        .update_settings(user_id, settings)
        .await
        .unwrap();

    let outcome = controller
        .read_meter(
            user_id,
            sample_png(),
            "value_105_535.jpg".into(),
            MeterPhotoContext::default(),
        )
        .await
        .unwrap();

    let MeterOutcome::Report(report) = outcome else {
        panic!("expected a report");
    };
    assert!(!report.is_high);
    assert_eq!(report.limit_display, "Eco Limit: 200000 L/Month");
    assert!(controller.unread_alerts(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unreadable_photo_is_a_retake_outcome_not_an_error() {
    let dir = TempDir::new().unwrap();
    let (controller, user_id) = degraded_controller(&dir).await;

    let outcome = controller
        .read_meter(
            user_id,
            blank_png(),
            "IMG_2041.png".into(),
            MeterPhotoContext::default(),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, MeterOutcome::RetakePhoto));

    // Rejections are observable but persist nothing.
    let snapshot = controller.metrics_snapshot().await;
    assert_eq!(snapshot.rejected_recognitions, 1);
    assert_eq!(snapshot.meter_reads, 0);
    assert!(controller.recent_meter(user_id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_meter_image_is_a_decode_error_not_a_rejection() {
    let dir = TempDir::new().unwrap();
    let (controller, user_id) = degraded_controller(&dir).await;

    let result = controller
        .read_meter(
            user_id,
            b"garbage bytes".to_vec(),
            "IMG_2041.jpg".into(),
            MeterPhotoContext::default(),
        )
        .await;
    assert!(matches!(result, Err(Error::ImageDecode(_))));
}

#[tokio::test]
async fn export_report_bundles_both_sheets() {
    let dir = TempDir::new().unwrap();
    let (controller, user_id) = degraded_controller(&dir).await;

    controller
        .analyze_quality(user_id, sample_png(), QualitySampleContext::default())
        .await
        .unwrap();
    controller
        .read_meter(
            user_id,
            sample_png(),
            "value_588.png".into(),
            MeterPhotoContext::default(),
        )
        .await
        .unwrap();

    let workbook = controller.export_report(user_id).await.unwrap();
    assert_eq!(&workbook[..2], b"PK");
}
