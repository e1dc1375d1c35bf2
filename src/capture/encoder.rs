//! Video track encoder
//!
//! Raw BGRA frames from the platform capture loop are piped into an
//! ffmpeg child process that encodes a VP9 WebM track. The recorder
//! never touches codec internals.

use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// ffmpeg child process encoding raw BGRA frames to a VP9 WebM track
pub struct VideoEncoder {
    process: Mutex<Option<Child>>,
    frame_count: AtomicU64,
    running: AtomicBool,
    output_file: PathBuf,
}

impl VideoEncoder {
    /// Spawn the encoder for the given frame geometry
    pub fn new(
        width: u32,
        height: u32,
        fps: u32,
        output_dir: &Path,
    ) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(output_dir)?;

        let output_file = output_dir.join("video.webm");

        let process = Command::new("ffmpeg")
            .args([
                "-y",
                "-f",
                "rawvideo",
                "-pixel_format",
                "bgra",
                "-video_size",
                &format!("{width}x{height}"),
                "-framerate",
                &fps.to_string(),
                "-i",
                "-",
                "-c:v",
                "libvpx-vp9",
                "-deadline",
                "realtime",
                "-cpu-used",
                "8",
                "-pix_fmt",
                "yuv420p",
                "-b:v",
                "4M",
                &output_file.to_string_lossy(),
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        tracing::info!(
            "Started video encoder: {}x{} @ {}fps, output: {:?}",
            width,
            height,
            fps,
            output_file
        );

        Ok(Self {
            process: Mutex::new(Some(process)),
            frame_count: AtomicU64::new(0),
            running: AtomicBool::new(true),
            output_file,
        })
    }

    /// Write one raw BGRA frame. Returns false once the encoder is gone.
    pub fn write_frame(&self, data: &[u8]) -> bool {
        if !self.running.load(Ordering::Relaxed) {
            return false;
        }

        let mut guard = self.process.lock();
        if let Some(ref mut process) = *guard {
            if let Some(ref mut stdin) = process.stdin {
                if stdin.write_all(data).is_ok() {
                    self.frame_count.fetch_add(1, Ordering::Relaxed);
                    return true;
                }
            }
        }
        false
    }

    /// Frames written so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Close stdin, wait for ffmpeg to finish, and return the track path
    pub fn finish(&self) -> Result<PathBuf, std::io::Error> {
        self.running.store(false, Ordering::Relaxed);

        let mut guard = self.process.lock();
        if let Some(mut process) = guard.take() {
            drop(process.stdin.take());
            let output = process.wait_with_output()?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::warn!("ffmpeg exited with status {}: {}", output.status, stderr);
            }
        }

        tracing::info!(
            "Video encoder finished: {} frames -> {:?}",
            self.frame_count(),
            self.output_file
        );

        Ok(self.output_file.clone())
    }

    /// Path of the encoded track
    pub fn output_file(&self) -> &Path {
        &self.output_file
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        let mut guard = self.process.lock();
        if let Some(mut process) = guard.take() {
            drop(process.stdin.take());
            let _ = process.wait();
        }
    }
}
