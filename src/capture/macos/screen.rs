//! macOS screen capture
//!
//! Enumerates displays and on-screen windows via CoreGraphics and
//! captures BGRA frames that are piped into the VP9 encoder. Window
//! metadata comes from the CGWindowList; frames from CGDisplayCreateImage
//! and CGWindowListCreateImage.

use crate::capture::encoder::VideoEncoder;
use crate::capture::thumbnail::encode_thumbnail;
use crate::capture::traits::{CaptureSourceInfo, DisplayInfo, SourceKind, WindowInfo};
use crate::capture::CaptureTarget;
use crate::recorder::channel::{ChannelKind, RecordingChannel, RecordingError, RecordingResult};
use async_trait::async_trait;
use core_foundation::base::{CFType, TCFType};
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::display::{
    kCGWindowImageBoundsIgnoreFraming, kCGWindowListExcludeDesktopElements,
    kCGWindowListOptionIncludingWindow, kCGWindowListOptionOnScreenOnly, CGDisplay,
};
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_graphics::image::CGImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Frame rate used for screen capture
const CAPTURE_FPS: u32 = 15;

/// Get list of available displays
pub fn get_displays() -> Vec<DisplayInfo> {
    let display_ids = CGDisplay::active_displays().unwrap_or_default();

    display_ids
        .iter()
        .enumerate()
        .map(|(index, &id)| {
            let display = CGDisplay::new(id);
            let bounds = display.bounds();
            let is_main = display.is_main();

            let refresh_rate = display
                .display_mode()
                .map(|mode| mode.refresh_rate() as u32)
                .filter(|&rate| rate > 0);

            DisplayInfo {
                id,
                name: if is_main {
                    "Main Display".to_string()
                } else {
                    format!("Display {}", index + 1)
                },
                width: bounds.size.width as u32,
                height: bounds.size.height as u32,
                scale_factor: display.pixels_high() as f64 / bounds.size.height,
                is_primary: is_main,
                refresh_rate,
            }
        })
        .collect()
}

/// Get list of on-screen windows (normal layer, titled)
pub fn get_windows() -> Vec<WindowInfo> {
    let Some(list) = CGDisplay::window_list_info(
        kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements,
        None,
    ) else {
        return Vec::new();
    };

    let mut windows = Vec::new();

    for item in list.iter() {
        let dict: CFDictionary<CFString, CFType> =
            unsafe { CFDictionary::wrap_under_get_rule(*item as *const _) };

        let layer = dict_number(&dict, "kCGWindowLayer").unwrap_or(-1);
        if layer != 0 {
            continue;
        }

        let Some(id) = dict_number(&dict, "kCGWindowNumber") else {
            continue;
        };

        let title = dict_string(&dict, "kCGWindowName").unwrap_or_default();
        let app_name = dict_string(&dict, "kCGWindowOwnerName").unwrap_or_default();

        if title.is_empty() && app_name.is_empty() {
            continue;
        }

        windows.push(WindowInfo {
            id: id as u32,
            title,
            app_name,
        });
    }

    windows
}

fn dict_string(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<String> {
    dict.find(CFString::new(key))
        .and_then(|v| v.downcast::<CFString>())
        .map(|s| s.to_string())
}

fn dict_number(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<i64> {
    dict.find(CFString::new(key))
        .and_then(|v| v.downcast::<CFNumber>())
        .and_then(|n| n.to_i64())
}

/// Enumerate screens and windows as capture sources with thumbnails
pub fn get_capture_sources() -> Vec<CaptureSourceInfo> {
    let mut sources = Vec::new();

    for display in get_displays() {
        let thumbnail = capture_display_frame(display.id)
            .and_then(|(data, w, h)| encode_thumbnail(&data, w, h));

        sources.push(CaptureSourceInfo {
            id: CaptureTarget::Screen(display.id).source_id(),
            name: display.name,
            kind: SourceKind::Screen,
            thumbnail,
        });
    }

    for window in get_windows() {
        let thumbnail = capture_window_frame(window.id)
            .and_then(|(data, w, h)| encode_thumbnail(&data, w, h));

        let name = if window.title.is_empty() {
            window.app_name.clone()
        } else {
            format!("{} - {}", window.app_name, window.title)
        };

        sources.push(CaptureSourceInfo {
            id: CaptureTarget::Window(window.id).source_id(),
            name,
            kind: SourceKind::Window,
            thumbnail,
        });
    }

    sources
}

/// Copy a CGImage into a tightly-packed BGRA buffer
fn image_to_bgra(image: &CGImage) -> Option<(Vec<u8>, u32, u32)> {
    let width = image.width();
    let height = image.height();
    let bytes_per_row = image.bytes_per_row();

    let data = image.data();
    let bytes = data.bytes();

    if bytes.len() < bytes_per_row * height {
        return None;
    }

    let row_bytes = width * 4;
    let mut out = Vec::with_capacity(row_bytes * height);
    for y in 0..height {
        let start = y * bytes_per_row;
        out.extend_from_slice(&bytes[start..start + row_bytes]);
    }

    Some((out, width as u32, height as u32))
}

/// Capture a single BGRA frame of a display
pub fn capture_display_frame(display_id: u32) -> Option<(Vec<u8>, u32, u32)> {
    let image = CGDisplay::new(display_id).image()?;
    image_to_bgra(&image)
}

/// Capture a single BGRA frame of a window
pub fn capture_window_frame(window_id: u32) -> Option<(Vec<u8>, u32, u32)> {
    // CGRectNull asks the system for the window's own bounds
    let null_rect = CGRect::new(
        &CGPoint::new(f64::INFINITY, f64::INFINITY),
        &CGSize::new(0.0, 0.0),
    );

    let image = CGDisplay::screenshot(
        null_rect,
        kCGWindowListOptionIncludingWindow,
        window_id,
        kCGWindowImageBoundsIgnoreFraming,
    )?;
    image_to_bgra(&image)
}

/// Capture a frame of either target kind
fn capture_target_frame(target: CaptureTarget) -> Option<(Vec<u8>, u32, u32)> {
    match target {
        CaptureTarget::Screen(id) => capture_display_frame(id),
        CaptureTarget::Window(id) => capture_window_frame(id),
    }
}

/// Screen capture channel for macOS
///
/// Grabs frames at a fixed cadence and pipes them into the ffmpeg VP9
/// encoder.
pub struct ScreenCaptureChannel {
    id: String,
    target: CaptureTarget,
    is_recording: Arc<AtomicBool>,
    artifact_dir: Option<PathBuf>,
    encoder: Arc<parking_lot::Mutex<Option<Arc<VideoEncoder>>>>,
    capture_task: Option<tokio::task::JoinHandle<()>>,
}

impl ScreenCaptureChannel {
    /// Create a new screen capture channel for the given target
    pub fn new(target: CaptureTarget) -> Self {
        Self {
            id: target.source_id(),
            target,
            is_recording: Arc::new(AtomicBool::new(false)),
            artifact_dir: None,
            encoder: Arc::new(parking_lot::Mutex::new(None)),
            capture_task: None,
        }
    }
}

#[async_trait]
impl RecordingChannel for ScreenCaptureChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Screen
    }

    async fn initialize(&mut self, artifact_dir: &Path) -> RecordingResult<()> {
        if !super::permissions::has_screen_recording_permission() {
            super::permissions::request_screen_recording_permission();
            return Err(RecordingError::PermissionDenied(
                "Screen recording permission not granted. Please allow in System Preferences."
                    .to_string(),
            ));
        }

        self.artifact_dir = Some(artifact_dir.to_path_buf());

        tracing::info!("Screen capture channel initialized for {:?}", self.target);
        Ok(())
    }

    async fn start(&mut self) -> RecordingResult<()> {
        if self.is_recording.load(Ordering::SeqCst) {
            return Err(RecordingError::AlreadyRecording);
        }

        let artifact_dir = self
            .artifact_dir
            .clone()
            .ok_or_else(|| RecordingError::Configuration("Artifact dir not set".to_string()))?;

        // Size the encoder from the first frame
        let (first_frame, width, height) = capture_target_frame(self.target).ok_or_else(|| {
            RecordingError::Configuration(format!("Failed to capture {:?}", self.target))
        })?;

        let encoder = Arc::new(
            VideoEncoder::new(width, height, CAPTURE_FPS, &artifact_dir)
                .map_err(RecordingError::Io)?,
        );
        encoder.write_frame(&first_frame);
        *self.encoder.lock() = Some(encoder.clone());

        self.is_recording.store(true, Ordering::SeqCst);

        let is_recording = self.is_recording.clone();
        let target = self.target;
        let frame_interval = Duration::from_millis(1000 / CAPTURE_FPS as u64);

        let handle = tokio::spawn(async move {
            while is_recording.load(Ordering::SeqCst) {
                if let Some((frame, w, h)) = capture_target_frame(target) {
                    if w == width && h == height {
                        encoder.write_frame(&frame);
                    } else {
                        // Window resized; keep the encoder geometry stable
                        tracing::debug!(
                            "Dropping {}x{} frame (encoder is {}x{})",
                            w,
                            h,
                            width,
                            height
                        );
                    }
                }
                tokio::time::sleep(frame_interval).await;
            }

            tracing::info!(
                "Screen capture stopped after {} frames",
                encoder.frame_count()
            );
        });

        self.capture_task = Some(handle);

        tracing::info!("Screen capture started for {:?}", self.target);
        Ok(())
    }

    async fn stop(&mut self) -> RecordingResult<()> {
        if !self.is_recording.load(Ordering::SeqCst) {
            return Err(RecordingError::NotRecording);
        }

        self.is_recording.store(false, Ordering::SeqCst);

        if let Some(handle) = self.capture_task.take() {
            let _ = handle.await;
        }

        let encoder = self.encoder.lock().take();
        if let Some(encoder) = encoder {
            tokio::task::spawn_blocking(move || encoder.finish())
                .await
                .map_err(|e| RecordingError::Configuration(format!("Encoder task failed: {e}")))?
                .map_err(RecordingError::Io)?;
        }

        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    fn output_files(&self) -> Vec<PathBuf> {
        self.artifact_dir
            .as_ref()
            .map(|dir| vec![dir.join("video.webm")])
            .unwrap_or_default()
    }
}
