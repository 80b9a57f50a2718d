//! WAV playback through the default cpal output device.
//!
//! hound decodes the whole file up front; the cpal callback walks a shared
//! cursor over the decoded samples and outputs silence while stopped.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

use groov_core::{AudioTransport, TransportError};

/// Decoded, interleaved samples in [-1, 1].
#[derive(Clone, Debug, Default)]
struct Track {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl Track {
    fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1)
    }
}

#[derive(Debug, Default)]
struct PlayCursor {
    track: Track,
    /// Position in source frames.
    pos: f64,
    playing: bool,
}

type Shared = Arc<Mutex<PlayCursor>>;

fn lock(cursor: &Shared) -> std::sync::MutexGuard<'_, PlayCursor> {
    cursor.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct WavTransport {
    cursor: Shared,
    stream: Option<cpal::Stream>,
}

impl WavTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_stream(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| TransportError::Device("no output device".to_string()))?;
        let config = device
            .default_output_config()
            .map_err(|e| TransportError::Device(e.to_string()))?;
        log::info!(
            "audio output: {} ({} Hz, {} ch, {:?})",
            device.name().unwrap_or_default(),
            config.sample_rate().0,
            config.channels(),
            config.sample_format()
        );

        let cursor = Arc::clone(&self.cursor);
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into(), cursor),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into(), cursor),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into(), cursor),
            other => {
                return Err(TransportError::Device(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        }
        .map_err(|e| TransportError::Device(e.to_string()))?;
        stream
            .play()
            .map_err(|e| TransportError::Device(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }
}

impl AudioTransport for WavTransport {
    fn open(&mut self, path: &Path) -> Result<(), TransportError> {
        let track = decode(path)?;
        log::debug!(
            "decoded {}: {} frames at {} Hz",
            path.display(),
            track.frames(),
            track.sample_rate
        );
        let mut cursor = lock(&self.cursor);
        cursor.track = track;
        cursor.pos = 0.0;
        cursor.playing = false;
        Ok(())
    }

    fn play(&mut self) -> Result<(), TransportError> {
        if lock(&self.cursor).track.frames() == 0 {
            return Err(TransportError::NothingLoaded);
        }
        self.ensure_stream()?;
        lock(&self.cursor).playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        lock(&self.cursor).playing = false;
    }

    fn rewind(&mut self) {
        lock(&self.cursor).pos = 0.0;
    }

    fn is_playing(&self) -> bool {
        lock(&self.cursor).playing
    }
}

fn decode(path: &Path) -> Result<Track, TransportError> {
    let open_error = |reason: String| TransportError::Open {
        path: path.display().to_string(),
        reason,
    };
    let mut reader = hound::WavReader::open(path).map_err(|e| open_error(e.to_string()))?;
    let spec = reader.spec();
    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| open_error(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| open_error(e.to_string()))?
        }
    };
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(open_error("no channels".to_string()));
    }
    Ok(Track {
        samples,
        channels: usize::from(spec.channels),
        sample_rate: spec.sample_rate,
    })
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    cursor: Shared,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = usize::from(config.channels);
    let rate = config.sample_rate.0;
    device.build_output_stream(
        config,
        move |data: &mut [T], _| fill(data, channels, rate, &mut lock(&cursor)),
        |err| log::error!("audio stream error: {err}"),
        None,
    )
}

/// Writes the next `data.len() / channels` frames; nearest-neighbour rate
/// conversion, extra output channels repeat the last source channel.
fn fill<T>(data: &mut [T], channels: usize, rate: u32, cursor: &mut PlayCursor)
where
    T: Sample + FromSample<f32>,
{
    let step = f64::from(cursor.track.sample_rate) / f64::from(rate.max(1));
    let frames = cursor.track.frames();
    let src_channels = cursor.track.channels.max(1);
    for frame in data.chunks_mut(channels.max(1)) {
        let index = cursor.pos as usize;
        if !cursor.playing || index >= frames {
            if cursor.playing {
                log::debug!("end of file");
                cursor.playing = false;
            }
            for s in frame.iter_mut() {
                *s = T::from_sample(0.0f32);
            }
            continue;
        }
        let base = index * src_channels;
        for (c, s) in frame.iter_mut().enumerate() {
            let v = cursor.track.samples[base + c.min(src_channels - 1)];
            *s = T::from_sample(v);
        }
        cursor.pos += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(samples: Vec<f32>, channels: usize, sample_rate: u32) -> PlayCursor {
        PlayCursor {
            track: Track {
                samples,
                channels,
                sample_rate,
            },
            pos: 0.0,
            playing: true,
        }
    }

    #[test]
    fn mono_is_copied_to_every_output_channel() {
        let mut c = cursor(vec![0.5, -0.5], 1, 48_000);
        let mut out = [0.0f32; 6];
        fill(&mut out, 2, 48_000, &mut c);
        assert_eq!(out, [0.5, 0.5, -0.5, -0.5, 0.0, 0.0]);
        assert!(!c.playing, "end of file stops playback");
    }

    #[test]
    fn stopped_cursor_outputs_silence() {
        let mut c = cursor(vec![1.0; 8], 1, 48_000);
        c.playing = false;
        let mut out = [7i16; 4];
        fill(&mut out, 1, 48_000, &mut c);
        assert_eq!(out, [0; 4]);
        assert_eq!(c.pos, 0.0);
    }

    #[test]
    fn lower_output_rate_skips_source_frames() {
        let mut c = cursor(vec![0.0, 0.1, 0.2, 0.3], 1, 48_000);
        let mut out = [0.0f32; 2];
        fill(&mut out, 1, 24_000, &mut c);
        assert_eq!(out, [0.0, 0.2]);
    }

    #[test]
    fn decodes_sixteen_bit_wav() {
        let path = std::env::temp_dir().join("groov-audio-test.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [16384i16, -16384, 0, i16::MIN] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let track = decode(&path).unwrap();
        assert_eq!(track.channels, 2);
        assert_eq!(track.sample_rate, 22_050);
        assert_eq!(track.frames(), 2);
        assert_eq!(track.samples, vec![0.5, -0.5, 0.0, -1.0]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let mut t = WavTransport::new();
        let err = t.open(Path::new("/nonexistent/loop.wav")).unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
        assert!(!t.is_playing());
        assert_eq!(t.play(), Err(TransportError::NothingLoaded));
    }
}
