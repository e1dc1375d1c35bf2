//! Audio mixing
//!
//! Combines the microphone and system-audio tracks into a single track.
//! Samples are summed with clipping; the output is as long as the longest
//! input, so a track that ends early contributes silence at the tail.

use super::channel::{RecordingError, RecordingResult};
use hound::{WavReader, WavSpec, WavWriter};
use std::path::Path;

/// Mix PCM buffers by adding samples together with clipping.
///
/// The output length is the length of the longest input; shorter inputs
/// are padded with silence.
pub fn mix_buffers(buffers: &[&[i16]]) -> Vec<i16> {
    let max_len = buffers.iter().map(|b| b.len()).max().unwrap_or(0);
    let mut mixed = Vec::with_capacity(max_len);

    for i in 0..max_len {
        let mut sum: i32 = 0;
        for buffer in buffers {
            sum += buffer.get(i).copied().unwrap_or(0) as i32;
        }
        mixed.push(sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
    }

    mixed
}

/// Read a 16-bit PCM WAV artifact into memory
pub fn read_wav(path: &Path) -> RecordingResult<(WavSpec, Vec<i16>)> {
    let mut reader = WavReader::open(path)
        .map_err(|e| RecordingError::Configuration(format!("Failed to open {:?}: {}", path, e)))?;

    let spec = reader.spec();
    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()
        .map_err(|e| RecordingError::Configuration(format!("Failed to read {:?}: {}", path, e)))?;

    Ok((spec, samples))
}

/// Write a PCM buffer as a 16-bit WAV artifact
pub fn write_wav(path: &Path, spec: WavSpec, samples: &[i16]) -> RecordingResult<()> {
    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| RecordingError::Configuration(format!("Failed to create {:?}: {}", path, e)))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| RecordingError::Configuration(format!("Failed to write {:?}: {}", path, e)))?;
    }

    writer
        .finalize()
        .map_err(|e| RecordingError::Configuration(format!("Failed to finalize {:?}: {}", path, e)))?;

    Ok(())
}

/// Mix the given WAV artifacts into a single track at `output`.
///
/// The output takes the first input's spec. A single input is passed
/// through unchanged. Zero inputs is an error: the caller should not
/// have asked for a mix.
pub fn mix_wav_files(inputs: &[&Path], output: &Path) -> RecordingResult<()> {
    if inputs.is_empty() {
        return Err(RecordingError::NoAudioSource);
    }

    let mut specs = Vec::with_capacity(inputs.len());
    let mut buffers = Vec::with_capacity(inputs.len());
    for path in inputs {
        let (spec, samples) = read_wav(path)?;
        specs.push(spec);
        buffers.push(samples);
    }

    let out_spec = specs[0];
    for (path, spec) in inputs.iter().zip(&specs).skip(1) {
        if spec.sample_rate != out_spec.sample_rate || spec.channels != out_spec.channels {
            tracing::warn!(
                "Audio spec mismatch for {:?}: {}Hz/{}ch vs {}Hz/{}ch",
                path,
                spec.sample_rate,
                spec.channels,
                out_spec.sample_rate,
                out_spec.channels
            );
        }
    }

    let refs: Vec<&[i16]> = buffers.iter().map(|b| b.as_slice()).collect();
    let mixed = mix_buffers(&refs);

    tracing::info!(
        "Mixed {} audio track(s) into {:?} ({} samples)",
        inputs.len(),
        output,
        mixed.len()
    );

    write_wav(output, out_spec, &mixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::SampleFormat;
    use tempfile::tempdir;

    fn test_spec() -> WavSpec {
        WavSpec {
            channels: 2,
            sample_rate: 48_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    #[test]
    fn test_mix_buffers_equal_length() {
        let a: Vec<i16> = vec![100, 200, 300];
        let b: Vec<i16> = vec![50, 100, 150];

        let mixed = mix_buffers(&[&a, &b]);

        assert_eq!(mixed, vec![150, 300, 450]);
    }

    #[test]
    fn test_mix_buffers_with_clipping() {
        let a: Vec<i16> = vec![i16::MAX - 100, i16::MIN + 100];
        let b: Vec<i16> = vec![200, -200];

        let mixed = mix_buffers(&[&a, &b]);

        assert_eq!(mixed[0], i16::MAX);
        assert_eq!(mixed[1], i16::MIN);
    }

    #[test]
    fn test_mix_buffers_different_lengths() {
        let a: Vec<i16> = vec![100, 200];
        let b: Vec<i16> = vec![50, 100, 150, 200];

        let mixed = mix_buffers(&[&a, &b]);

        assert_eq!(mixed.len(), 4);
        assert_eq!(mixed[2], 150); // a ended, silence padded
        assert_eq!(mixed[3], 200);
    }

    #[test]
    fn test_mix_buffers_single_source() {
        let a: Vec<i16> = vec![1, 2, 3];

        let mixed = mix_buffers(&[&a]);

        assert_eq!(mixed, a);
    }

    #[test]
    fn test_mix_wav_files_round_trip() {
        let dir = tempdir().unwrap();
        let mic = dir.path().join("mic.wav");
        let system = dir.path().join("system.wav");
        let out = dir.path().join("mixed.wav");

        write_wav(&mic, test_spec(), &[10, 20, 30]).unwrap();
        write_wav(&system, test_spec(), &[1, 2, 3, 4]).unwrap();

        mix_wav_files(&[mic.as_path(), system.as_path()], &out).unwrap();

        let (spec, mixed) = read_wav(&out).unwrap();
        assert_eq!(spec.sample_rate, 48_000);
        assert_eq!(mixed, vec![11, 22, 33, 4]);
    }

    #[test]
    fn test_mix_wav_files_rejects_empty_input() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("mixed.wav");

        assert!(mix_wav_files(&[], &out).is_err());
    }
}
