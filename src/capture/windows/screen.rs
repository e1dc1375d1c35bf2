//! Windows screen capture using GDI BitBlt
//!
//! Enumerates monitors and top-level windows and captures BGRA frames
//! with the GDI API; frames are piped into the VP9 encoder.

use crate::capture::encoder::VideoEncoder;
use crate::capture::thumbnail::encode_thumbnail;
use crate::capture::traits::{CaptureSourceInfo, DisplayInfo, SourceKind, WindowInfo};
use crate::capture::CaptureTarget;
use crate::recorder::channel::{ChannelKind, RecordingChannel, RecordingError, RecordingResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[cfg(target_os = "windows")]
use windows::{
    Win32::Foundation::{BOOL, HWND, LPARAM, RECT},
    Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject,
        EnumDisplayMonitors, GetDC, GetDIBits, GetMonitorInfoW, GetWindowDC, ReleaseDC,
        SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HDC, HMONITOR,
        MONITORINFOEXW, SRCCOPY,
    },
    Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetDesktopWindow, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
        IsWindowVisible,
    },
};

/// Frame rate used for screen capture
const CAPTURE_FPS: u32 = 15;

/// Get list of available displays on Windows
#[cfg(target_os = "windows")]
pub fn get_displays() -> Vec<DisplayInfo> {
    use std::mem::zeroed;

    let mut displays = Vec::new();
    let displays_ptr = &mut displays as *mut Vec<DisplayInfo>;

    unsafe extern "system" fn enum_monitors_callback(
        hmonitor: HMONITOR,
        _hdc: HDC,
        _rect: *mut RECT,
        lparam: LPARAM,
    ) -> BOOL {
        let displays = &mut *(lparam.0 as *mut Vec<DisplayInfo>);

        let mut monitor_info: MONITORINFOEXW = unsafe { zeroed() };
        monitor_info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

        if unsafe { GetMonitorInfoW(hmonitor, &mut monitor_info.monitorInfo) }.as_bool() {
            let rect = monitor_info.monitorInfo.rcMonitor;
            let width = (rect.right - rect.left) as u32;
            let height = (rect.bottom - rect.top) as u32;
            let is_primary = (monitor_info.monitorInfo.dwFlags & 1) != 0; // MONITORINFOF_PRIMARY

            let name_len = monitor_info
                .szDevice
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(monitor_info.szDevice.len());
            let name = String::from_utf16_lossy(&monitor_info.szDevice[..name_len]);

            displays.push(DisplayInfo {
                id: displays.len() as u32,
                name: if is_primary {
                    "Primary Display".to_string()
                } else {
                    name
                },
                width,
                height,
                scale_factor: 1.0,
                is_primary,
                refresh_rate: Some(60),
            });
        }

        BOOL::from(true)
    }

    unsafe {
        let _ = EnumDisplayMonitors(
            HDC::default(),
            None,
            Some(enum_monitors_callback),
            LPARAM(displays_ptr as isize),
        );
    }

    if displays.is_empty() {
        displays.push(DisplayInfo {
            id: 0,
            name: "Primary Display".to_string(),
            width: 1920,
            height: 1080,
            scale_factor: 1.0,
            is_primary: true,
            refresh_rate: Some(60),
        });
    }

    displays
}

#[cfg(not(target_os = "windows"))]
pub fn get_displays() -> Vec<DisplayInfo> {
    Vec::new()
}

/// Get list of visible, titled top-level windows
#[cfg(target_os = "windows")]
pub fn get_windows() -> Vec<WindowInfo> {
    let mut windows_list: Vec<WindowInfo> = Vec::new();
    let list_ptr = &mut windows_list as *mut Vec<WindowInfo>;

    unsafe extern "system" fn enum_windows_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let list = unsafe { &mut *(lparam.0 as *mut Vec<WindowInfo>) };

        if !unsafe { IsWindowVisible(hwnd) }.as_bool() {
            return BOOL::from(true);
        }

        let title_len = unsafe { GetWindowTextLengthW(hwnd) };
        if title_len == 0 {
            return BOOL::from(true);
        }

        let mut buffer = vec![0u16; title_len as usize + 1];
        let copied = unsafe { GetWindowTextW(hwnd, &mut buffer) };
        if copied == 0 {
            return BOOL::from(true);
        }

        let title = String::from_utf16_lossy(&buffer[..copied as usize]);

        list.push(WindowInfo {
            id: hwnd.0 as usize as u32,
            title,
            app_name: String::new(),
        });

        BOOL::from(true)
    }

    unsafe {
        let _ = EnumWindows(Some(enum_windows_callback), LPARAM(list_ptr as isize));
    }

    windows_list
}

#[cfg(not(target_os = "windows"))]
pub fn get_windows() -> Vec<WindowInfo> {
    Vec::new()
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

        sources.push(CaptureSourceInfo {
            id: CaptureTarget::Window(window.id).source_id(),
            name: window.title,
            kind: SourceKind::Window,
            thumbnail,
        });
    }

    sources
}

/// Copy the contents of a device context into a BGRA buffer
#[cfg(target_os = "windows")]
unsafe fn blit_to_bgra(hdc_src: HDC, width: u32, height: u32) -> Option<Vec<u8>> {
    use std::mem::zeroed;

    let hdc_mem = CreateCompatibleDC(hdc_src);
    if hdc_mem.is_invalid() {
        return None;
    }

    let hbitmap = CreateCompatibleBitmap(hdc_src, width as i32, height as i32);
    if hbitmap.is_invalid() {
        DeleteDC(hdc_mem);
        return None;
    }

    let old_bitmap = SelectObject(hdc_mem, hbitmap);

    if BitBlt(
        hdc_mem,
        0,
        0,
        width as i32,
        height as i32,
        hdc_src,
        0,
        0,
        SRCCOPY,
    )
    .is_err()
    {
        SelectObject(hdc_mem, old_bitmap);
        DeleteObject(hbitmap);
        DeleteDC(hdc_mem);
        return None;
    }

    let mut bmi: BITMAPINFO = zeroed();
    bmi.bmiHeader.biSize = std::mem::size_of::<BITMAPINFOHEADER>() as u32;
    bmi.bmiHeader.biWidth = width as i32;
    bmi.bmiHeader.biHeight = -(height as i32); // Negative for top-down
    bmi.bmiHeader.biPlanes = 1;
    bmi.bmiHeader.biBitCount = 32; // BGRA
    bmi.bmiHeader.biCompression = BI_RGB.0;

    let buffer_size = (width * height * 4) as usize;
    let mut buffer = vec![0u8; buffer_size];

    let lines = GetDIBits(
        hdc_mem,
        hbitmap,
        0,
        height,
        Some(buffer.as_mut_ptr() as *mut _),
        &mut bmi,
        DIB_RGB_COLORS,
    );

    SelectObject(hdc_mem, old_bitmap);
    DeleteObject(hbitmap);
    DeleteDC(hdc_mem);

    if lines == 0 {
        return None;
    }

    Some(buffer)
}

/// Capture a single BGRA frame of a display
#[cfg(target_os = "windows")]
pub fn capture_display_frame(display_id: u32) -> Option<(Vec<u8>, u32, u32)> {
    unsafe {
        let displays = get_displays();
        let display = displays.get(display_id as usize)?;
        let width = display.width;
        let height = display.height;

        let hwnd = GetDesktopWindow();
        let hdc_screen = GetDC(hwnd);
        if hdc_screen.is_invalid() {
            return None;
        }

        let frame = blit_to_bgra(hdc_screen, width, height);
        ReleaseDC(hwnd, hdc_screen);

        frame.map(|data| (data, width, height))
    }
}

#[cfg(not(target_os = "windows"))]
pub fn capture_display_frame(_display_id: u32) -> Option<(Vec<u8>, u32, u32)> {
    None
}

/// Capture a single BGRA frame of a window
#[cfg(target_os = "windows")]
pub fn capture_window_frame(window_id: u32) -> Option<(Vec<u8>, u32, u32)> {
    unsafe {
        let hwnd = HWND(window_id as usize as *mut core::ffi::c_void);

        let mut rect = RECT::default();
        if GetWindowRect(hwnd, &mut rect).is_err() {
            return None;
        }

        let width = (rect.right - rect.left).max(1) as u32;
        let height = (rect.bottom - rect.top).max(1) as u32;

        let hdc_window = GetWindowDC(hwnd);
        if hdc_window.is_invalid() {
            return None;
        }

        let frame = blit_to_bgra(hdc_window, width, height);
        ReleaseDC(hwnd, hdc_window);

        frame.map(|data| (data, width, height))
    }
}

#[cfg(not(target_os = "windows"))]
pub fn capture_window_frame(_window_id: u32) -> Option<(Vec<u8>, u32, u32)> {
    None
}

/// Capture a frame of either target kind
fn capture_target_frame(target: CaptureTarget) -> Option<(Vec<u8>, u32, u32)> {
    match target {
        CaptureTarget::Screen(id) => capture_display_frame(id),
        CaptureTarget::Window(id) => capture_window_frame(id),
    }
}

/// Screen capture channel for Windows
///
/// Grabs GDI frames at a fixed cadence and pipes them into the ffmpeg
/// VP9 encoder.
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
