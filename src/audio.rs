//! Narration audio: decoding the speech model's PCM and playing it on the
//! default output device. Clips can also be kept as WAV files.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use crate::constants::{SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("speech response contained no audio")]
    EmptyClip,
    #[error("no audio output device")]
    NoDevice,
    #[error("unsupported output sample format {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
    #[error("cannot query output device: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("cannot open output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("cannot start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
    #[error("cannot write WAV file: {0}")]
    Wav(#[from] hound::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Decoded narration, interleaved signed 16-bit samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechClip {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl SpeechClip {
    /// Little-endian 16-bit PCM. A trailing odd byte is dropped.
    pub fn from_pcm16le(bytes: &[u8], sample_rate: u32, channels: u16) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Clip in the speech model's native format.
    pub fn from_speech(bytes: &[u8]) -> Self {
        Self::from_pcm16le(bytes, SPEECH_SAMPLE_RATE, SPEECH_CHANNELS)
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn samples_f32(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|&sample| sample as f32 / 32768.0)
            .collect()
    }

    /// Channels averaged into one stream, as fed to the output device.
    pub fn mono_f32(&self) -> Vec<f32> {
        let samples = self.samples_f32();
        let channels = self.channels as usize;
        if channels == 1 {
            return samples;
        }
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as f64 / self.channels as f64;
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }

    pub fn write_wav(&self, path: &Path) -> Result<(), AudioError> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

/// Linear interpolation from `from` Hz to `to` Hz.
pub fn resample(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || from == 0 || to == 0 || samples.is_empty() {
        return samples.to_vec();
    }
    let step = from as f64 / to as f64;
    let len = ((samples.len() as f64) / step).round().max(1.0) as usize;
    let last = samples.len() - 1;
    (0..len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos.floor() as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (pos - idx as f64) as f32;
            samples[idx] + (samples[next] - samples[idx]) * frac
        })
        .collect()
}

/// Mono samples waiting for the output callback.
#[derive(Debug, Default)]
pub struct SampleQueue {
    samples: Mutex<VecDeque<f32>>,
}

impl SampleQueue {
    pub fn new(samples: impl IntoIterator<Item = f32>) -> Self {
        Self {
            samples: Mutex::new(samples.into_iter().collect()),
        }
    }

    /// Fill interleaved `frames`, copying each mono sample to every
    /// channel. Silence once the queue runs dry.
    pub fn fill<T: Copy>(&self, frames: &mut [T], channels: usize, convert: impl Fn(f32) -> T) {
        let Ok(mut samples) = self.samples.lock() else {
            return;
        };
        for frame in frames.chunks_mut(channels.max(1)) {
            let sample = samples.pop_front().unwrap_or(0.0);
            frame.fill(convert(sample));
        }
    }

    pub fn remaining(&self) -> usize {
        self.samples.lock().map(|samples| samples.len()).unwrap_or(0)
    }
}

/// A clip being played. Dropping it stops the sound.
pub trait Playback {
    fn is_finished(&self) -> bool;
}

/// Where narration is played.
pub trait AudioOutput {
    fn play(&mut self, clip: &SpeechClip) -> Result<Box<dyn Playback>, AudioError>;
}

struct StreamPlayback {
    _stream: cpal::Stream,
    queue: Arc<SampleQueue>,
}

impl Playback for StreamPlayback {
    fn is_finished(&self) -> bool {
        self.queue.remaining() == 0
    }
}

/// Default output device of the default host.
#[derive(Debug, Default)]
pub struct DeviceOutput;

impl AudioOutput for DeviceOutput {
    fn play(&mut self, clip: &SpeechClip) -> Result<Box<dyn Playback>, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let supported = device.default_output_config()?;
        let format = supported.sample_format();
        let rate = supported.sample_rate();
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.into();

        let queue = Arc::new(SampleQueue::new(resample(
            &clip.mono_f32(),
            clip.sample_rate(),
            rate,
        )));
        let on_error = |err: cpal::StreamError| tracing::warn!(%err, "narration stream error");
        let stream = match format {
            cpal::SampleFormat::F32 => {
                let queue = Arc::clone(&queue);
                device.build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        queue.fill(data, channels, |sample| sample)
                    },
                    on_error,
                    None,
                )?
            }
            cpal::SampleFormat::I16 => {
                let queue = Arc::clone(&queue);
                device.build_output_stream(
                    &config,
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        queue.fill(data, channels, |sample| {
                            (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
                        })
                    },
                    on_error,
                    None,
                )?
            }
            other => return Err(AudioError::UnsupportedFormat(other)),
        };
        stream.play()?;
        tracing::debug!(
            rate,
            channels,
            secs = clip.duration().as_secs_f32(),
            "narration playing"
        );
        Ok(Box::new(StreamPlayback {
            _stream: stream,
            queue,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationOutcome {
    /// Playing; `saved` holds the WAV copy when saving is enabled.
    Playing { saved: Option<PathBuf> },
    /// No output device could play it, but the WAV copy was written.
    Saved(PathBuf),
}

/// Play/stop control for narration.
pub struct Narrator {
    output: Box<dyn AudioOutput>,
    save_dir: Option<PathBuf>,
    current: Option<Box<dyn Playback>>,
}

impl Narrator {
    /// Plays on the default device. With `save_dir`, every clip is also
    /// written there as WAV.
    pub fn new(save_dir: Option<PathBuf>) -> Self {
        Self::with_output(Box::new(DeviceOutput), save_dir)
    }

    pub fn with_output(output: Box<dyn AudioOutput>, save_dir: Option<PathBuf>) -> Self {
        Self {
            output,
            save_dir,
            current: None,
        }
    }

    pub fn is_playing(&mut self) -> bool {
        if self.current.as_ref().is_some_and(|playback| playback.is_finished()) {
            self.current = None;
        }
        self.current.is_some()
    }

    /// Stop the clip being played. Returns whether something was playing.
    pub fn stop(&mut self) -> bool {
        let playing = self.is_playing();
        self.current = None;
        playing
    }

    fn save(&self, clip: &SpeechClip, label: &str) -> Result<Option<PathBuf>, AudioError> {
        let Some(dir) = &self.save_dir else {
            return Ok(None);
        };
        std::fs::create_dir_all(dir)?;
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let path = dir.join(format!("narration-{stamp}-{label}.wav"));
        clip.write_wav(&path)?;
        tracing::debug!(path = %path.display(), "narration saved");
        Ok(Some(path))
    }

    /// Play `clip`, replacing whatever was playing.
    pub fn narrate(
        &mut self,
        clip: &SpeechClip,
        label: &str,
    ) -> Result<NarrationOutcome, AudioError> {
        if clip.is_empty() {
            return Err(AudioError::EmptyClip);
        }
        self.stop();
        let saved = self.save(clip, label)?;
        match self.output.play(clip) {
            Ok(playback) => {
                self.current = Some(playback);
                Ok(NarrationOutcome::Playing { saved })
            }
            Err(err) => match saved {
                Some(path) => {
                    tracing::warn!(%err, "narration not played; kept the file");
                    Ok(NarrationOutcome::Saved(path))
                }
                None => Err(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn decodes_little_endian_and_drops_odd_byte() {
        let clip = SpeechClip::from_pcm16le(&[0x01, 0x00, 0x00, 0x80, 0xFF], 24_000, 1);
        assert_eq!(clip.samples(), &[1, i16::MIN]);
        assert_eq!(clip.samples_f32(), vec![1.0 / 32768.0, -1.0]);
    }

    #[test]
    fn duration_accounts_for_channels() {
        let bytes = vec![0u8; 24_000 * 2];
        assert_eq!(SpeechClip::from_speech(&bytes).duration(), Duration::from_secs(1));
        let stereo = SpeechClip::from_pcm16le(&bytes, 24_000, 2);
        assert_eq!(stereo.duration(), Duration::from_millis(500));
    }

    #[test]
    fn stereo_clips_are_mixed_down() {
        let bytes = [0x00, 0x40, 0x00, 0xC0, 0x00, 0x40, 0x00, 0x40];
        let clip = SpeechClip::from_pcm16le(&bytes, 8, 2);
        assert_eq!(clip.mono_f32(), vec![0.0, 0.5]);
    }

    #[test]
    fn writes_readable_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let clip = SpeechClip::from_pcm16le(&[0x10, 0x00, 0xF0, 0xFF], 24_000, 1);
        clip.write_wav(&path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 24_000);
        assert_eq!(reader.spec().bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![16, -16]);
    }

    #[test]
    fn resample_doubles_and_halves() {
        let up = resample(&[0.0, 1.0], 24_000, 48_000);
        assert_eq!(up, vec![0.0, 0.5, 1.0, 1.0]);
        let down = resample(&[0.0, 0.25, 0.5, 0.75], 48_000, 24_000);
        assert_eq!(down, vec![0.0, 0.5]);
        assert_eq!(resample(&[0.3], 24_000, 24_000), vec![0.3]);
    }

    #[test]
    fn queue_fans_out_to_channels_then_goes_silent() {
        let queue = SampleQueue::new([0.5, -0.5]);
        let mut frames = [9.0f32; 6];
        queue.fill(&mut frames, 2, |s| s);
        assert_eq!(frames, [0.5, 0.5, -0.5, -0.5, 0.0, 0.0]);
        assert_eq!(queue.remaining(), 0);

        let queue = SampleQueue::new([1.0]);
        let mut ints = [0i16; 1];
        queue.fill(&mut ints, 1, |s| (s * i16::MAX as f32) as i16);
        assert_eq!(ints, [i16::MAX]);
    }

    /// Records what was played; playback ends when the shared flag is set.
    #[derive(Default)]
    struct FakeOutput {
        played: Rc<RefCell<Vec<usize>>>,
        done: Rc<RefCell<bool>>,
        fail: bool,
    }

    struct FakePlayback(Rc<RefCell<bool>>);

    impl Playback for FakePlayback {
        fn is_finished(&self) -> bool {
            *self.0.borrow()
        }
    }

    impl AudioOutput for FakeOutput {
        fn play(&mut self, clip: &SpeechClip) -> Result<Box<dyn Playback>, AudioError> {
            if self.fail {
                return Err(AudioError::NoDevice);
            }
            self.played.borrow_mut().push(clip.samples().len());
            Ok(Box::new(FakePlayback(Rc::clone(&self.done))))
        }
    }

    #[test]
    fn narrate_plays_and_stop_toggles() {
        let output = FakeOutput::default();
        let played = Rc::clone(&output.played);
        let done = Rc::clone(&output.done);
        let mut narrator = Narrator::with_output(Box::new(output), None);

        let clip = SpeechClip::from_speech(&[1, 0, 2, 0, 3, 0]);
        assert_eq!(
            narrator.narrate(&clip, "1").unwrap(),
            NarrationOutcome::Playing { saved: None }
        );
        assert_eq!(*played.borrow(), vec![3]);
        assert!(narrator.is_playing());
        assert!(narrator.stop());
        assert!(!narrator.is_playing());
        assert!(!narrator.stop());

        narrator.narrate(&clip, "2").unwrap();
        *done.borrow_mut() = true;
        assert!(!narrator.is_playing());
    }

    #[test]
    fn saves_a_copy_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let mut narrator =
            Narrator::with_output(Box::new(FakeOutput::default()), Some(dir.path().join("audio")));
        let clip = SpeechClip::from_speech(&[0, 0, 1, 0]);
        let NarrationOutcome::Playing { saved: Some(path) } = narrator.narrate(&clip, "7").unwrap()
        else {
            panic!("expected a saved copy");
        };
        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with("-7.wav"));
    }

    #[test]
    fn missing_device_falls_back_to_the_saved_file() {
        let failing = || {
            Box::new(FakeOutput {
                fail: true,
                ..FakeOutput::default()
            })
        };
        let clip = SpeechClip::from_speech(&[0, 0, 1, 0]);

        let mut narrator = Narrator::with_output(failing(), None);
        assert!(matches!(narrator.narrate(&clip, "1"), Err(AudioError::NoDevice)));

        let dir = tempfile::tempdir().unwrap();
        let mut narrator = Narrator::with_output(failing(), Some(dir.path().to_path_buf()));
        assert!(matches!(
            narrator.narrate(&clip, "1"),
            Ok(NarrationOutcome::Saved(path)) if path.exists()
        ));
    }

    #[test]
    fn empty_clip_is_rejected() {
        let mut narrator = Narrator::with_output(Box::new(FakeOutput::default()), None);
        assert!(matches!(
            narrator.narrate(&SpeechClip::from_speech(&[]), "x"),
            Err(AudioError::EmptyClip)
        ));
    }
}
