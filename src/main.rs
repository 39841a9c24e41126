// Demo runner for the `motion_sentry` library. A real deployment feeds
// camera frames into a `LiveDetector`; here a synthetic scene (a static
// background, then a bright block drifting through the watched region)
// stands in for the camera so the whole engine can be exercised end to end
// from the command line.
//
// Usage: motion_sentry [config.json]

use anyhow::{Context, Result, bail};
use motion_sentry::async_pipeline::LiveDetector;
use motion_sentry::config::SentryConfig;
use motion_sentry::core_modules::alert::ConsoleSink;
use motion_sentry::core_modules::frame::FrameBuffer;
use motion_sentry::core_modules::utils::image_helper::image_helper;
use motion_sentry::pipeline::{Blob, FrameReport, Point, Region, SentryPipeline};
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const FRAME_WIDTH: u32 = 320;
const FRAME_HEIGHT: u32 = 240;
const FRAME_COUNT: u32 = 150;
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// First frame on which the synthetic block appears.
const MOTION_STARTS_AT: u32 = 30;
const BLOCK_SIZE: u32 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = SentryConfig::load(Path::new(&config_path))
        .with_context(|| format!("cannot start without a configuration file at '{config_path}'"))?;

    // Hard expiry gate, checked once before anything opens.
    if let Some(expires) = config.expires {
        if chrono::Local::now().date_naive() > expires {
            bail!("this program expired on {expires}; please contact the developer");
        }
    }

    // Watch the center quarter of the frame unless the config says otherwise.
    let [x0, y0, x1, y1] = config.region.unwrap_or([
        FRAME_WIDTH as i32 / 4,
        FRAME_HEIGHT as i32 / 4,
        FRAME_WIDTH as i32 * 3 / 4,
        FRAME_HEIGHT as i32 * 3 / 4,
    ]);

    let sink = Arc::new(ConsoleSink {
        minimize_windows: config.minimize_windows,
    });
    let snapshot_path = config.snapshot_path.clone();

    let mut pipeline = SentryPipeline::new(config);
    pipeline
        .set_region(Point::new(x0, y0), Point::new(x1, y1))
        .context("configured region is invalid")?;

    let detector = LiveDetector::spawn(pipeline, sink);
    let mut reports = detector.reports();

    info!(
        width = FRAME_WIDTH,
        height = FRAME_HEIGHT,
        frames = FRAME_COUNT,
        "starting synthetic capture loop"
    );

    let mut last_frame = None;
    for index in 0..FRAME_COUNT {
        let frame = synthetic_frame(index);
        last_frame = Some(frame.clone());
        detector.feed(frame, FRAME_INTERVAL * index);
        tokio::time::sleep(FRAME_INTERVAL).await;
    }

    let dropped = detector.dropped_frames();
    let pipeline = detector.shutdown().await.map_err(anyhow::Error::msg)?;

    if let (Some(path), Some(frame)) = (snapshot_path, last_frame) {
        if let FrameReport::Analyzed(analysis) = &*reports.borrow_and_update() {
            save_snapshot(
                &path.to_string_lossy(),
                &frame,
                pipeline.region(),
                &analysis.blobs,
            )?;
            info!(path = %path.display(), "wrote detection snapshot");
        }
    }

    info!(
        final_state = ?pipeline.motion_state(),
        dropped,
        "capture loop finished"
    );
    Ok(())
}

/// A flat mid-gray scene; after the first second a bright block sweeps left
/// to right across the middle of the frame.
fn synthetic_frame(index: u32) -> FrameBuffer {
    let mut data = vec![96u8; (FRAME_WIDTH * FRAME_HEIGHT * 3) as usize];

    if index >= MOTION_STARTS_AT {
        let x0 = (index - MOTION_STARTS_AT) * 2;
        let y0 = (FRAME_HEIGHT - BLOCK_SIZE) / 2;
        for y in y0..y0 + BLOCK_SIZE {
            for x in x0..(x0 + BLOCK_SIZE).min(FRAME_WIDTH) {
                let pixel = ((y * FRAME_WIDTH + x) * 3) as usize;
                data[pixel..pixel + 3].copy_from_slice(&[250, 250, 250]);
            }
        }
    }

    FrameBuffer::new(FRAME_WIDTH, FRAME_HEIGHT, data)
}

/// Renders the last frame with the watched region and any blobs outlined,
/// the way a UI collaborator would draw them.
fn save_snapshot(
    path: &str,
    frame: &FrameBuffer,
    region: Option<Region>,
    blobs: &[Blob],
) -> Result<()> {
    let mut buffer = frame.data().to_vec();

    if let Some(region) = region {
        outline(
            &mut buffer,
            region.top_left(),
            region.bottom_right(),
            [0, 255, 0],
        );
        for blob in blobs {
            // Blob boxes are ROI-local; shift them back into frame space.
            let offset = region.top_left();
            let top_left = Point::new(
                blob.bounding_box.top_left().x + offset.x,
                blob.bounding_box.top_left().y + offset.y,
            );
            let bottom_right = Point::new(
                blob.bounding_box.bottom_right().x + offset.x,
                blob.bounding_box.bottom_right().y + offset.y,
            );
            outline(&mut buffer, top_left, bottom_right, [255, 64, 64]);
        }
    }

    image_helper::save_rgb(path, FRAME_WIDTH, FRAME_HEIGHT, &buffer)?;
    Ok(())
}

/// Draws a one-pixel rectangle outline, clipped to the frame.
fn outline(buffer: &mut [u8], top_left: Point, bottom_right: Point, color: [u8; 3]) {
    let x0 = top_left.x.clamp(0, FRAME_WIDTH as i32 - 1);
    let y0 = top_left.y.clamp(0, FRAME_HEIGHT as i32 - 1);
    let x1 = (bottom_right.x - 1).clamp(0, FRAME_WIDTH as i32 - 1);
    let y1 = (bottom_right.y - 1).clamp(0, FRAME_HEIGHT as i32 - 1);

    let mut paint = |x: i32, y: i32| {
        let pixel = ((y as u32 * FRAME_WIDTH + x as u32) * 3) as usize;
        buffer[pixel..pixel + 3].copy_from_slice(&color);
    };

    for x in x0..=x1 {
        paint(x, y0);
        paint(x, y1);
    }
    for y in y0..=y1 {
        paint(x0, y);
        paint(x1, y);
    }
}
