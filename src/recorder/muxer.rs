//! Final container assembly
//!
//! Muxes the session artifacts (encoded video track, mixed audio track)
//! into the WebM the user keeps. All codec work is delegated to the
//! ffmpeg CLI; this module only builds command lines and checks results.

use super::channel::{RecordingError, RecordingResult};
use std::path::Path;
use std::process::Command;

/// Mux an encoded video track and an optional audio track into `output`.
///
/// The video stream is copied as-is (the capture channel already encoded
/// VP9); audio is encoded to Opus.
pub fn mux_video(video: &Path, audio: Option<&Path>, output: &Path) -> RecordingResult<()> {
    let mut args: Vec<String> = vec![
        "-y".to_string(),
        "-i".to_string(),
        video.to_string_lossy().to_string(),
    ];

    if let Some(audio) = audio {
        args.push("-i".to_string());
        args.push(audio.to_string_lossy().to_string());
    }

    args.extend(["-c:v".to_string(), "copy".to_string()]);

    if audio.is_some() {
        args.extend([
            "-c:a".to_string(),
            "libopus".to_string(),
            "-b:a".to_string(),
            "128k".to_string(),
        ]);
    }

    args.push(output.to_string_lossy().to_string());

    run_ffmpeg(&args)
}

/// Encode a mixed audio track into an audio-only WebM at `output`
pub fn mux_audio_only(audio: &Path, output: &Path) -> RecordingResult<()> {
    let args: Vec<String> = vec![
        "-y".to_string(),
        "-i".to_string(),
        audio.to_string_lossy().to_string(),
        "-c:a".to_string(),
        "libopus".to_string(),
        "-b:a".to_string(),
        "128k".to_string(),
        output.to_string_lossy().to_string(),
    ];

    run_ffmpeg(&args)
}

fn run_ffmpeg(args: &[String]) -> RecordingResult<()> {
    tracing::debug!("Running ffmpeg {}", args.join(" "));

    let output = Command::new("ffmpeg")
        .args(args)
        .output()
        .map_err(|e| RecordingError::Mux(format!("Failed to run ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RecordingError::Mux(format!(
            "ffmpeg exited with {}: {}",
            output.status, stderr
        )));
    }

    Ok(())
}

/// Probe the duration of a muxed container in milliseconds using ffprobe
pub fn probe_duration_ms(path: &Path) -> RecordingResult<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
            &path.to_string_lossy(),
        ])
        .output()
        .map_err(|e| RecordingError::Mux(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RecordingError::Mux(format!("ffprobe failed: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let duration_secs: f64 = stdout.trim().parse().unwrap_or(0.0);

    Ok(duration_secs * 1000.0)
}
