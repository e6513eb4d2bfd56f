use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use super::device::{AudioBackend, OutputDevice};
use super::effect::{EffectVoice, VoicePlayer};
use super::types::{AudioData, DeviceCommand, DeviceState};
use crate::error::{AudioError, Result};

/// Upper bound on simultaneous effect voices.
const MAX_VOICES: usize = 32;

/// The looped track being rendered.
struct Source {
    asset: Arc<AudioData>,
    /// Fractional read position in asset frames.
    position: f64,
    rate: f32,
}

/// Audio-thread render state. Driven by `DeviceCommand`s drained at the top
/// of every callback.
struct Mixer {
    source: Option<Source>,
    voices: Vec<VoicePlayer>,
    output_sample_rate: u32,
    master_gain: f32,
    frames_rendered: Arc<AtomicU64>,
}

impl Mixer {
    fn new(output_sample_rate: u32, master_gain: f32, frames_rendered: Arc<AtomicU64>) -> Self {
        Self {
            source: None,
            voices: Vec::with_capacity(MAX_VOICES),
            output_sample_rate,
            master_gain,
            frames_rendered,
        }
    }

    fn handle_command(&mut self, cmd: DeviceCommand) {
        match cmd {
            DeviceCommand::StartSource {
                asset,
                offset,
                rate,
            } => {
                let frames = asset.num_frames() as f64;
                let position = if frames > 0.0 {
                    (offset * asset.sample_rate as f64).rem_euclid(frames)
                } else {
                    0.0
                };
                self.source = Some(Source {
                    asset,
                    position,
                    rate,
                });
            }
            DeviceCommand::StopSource => {
                self.source = None;
            }
            DeviceCommand::SetRate(rate) => {
                if let Some(source) = &mut self.source {
                    source.rate = rate;
                }
            }
            DeviceCommand::StartVoice(voice) => {
                if self.voices.len() < MAX_VOICES {
                    self.voices
                        .push(VoicePlayer::new(voice, self.output_sample_rate));
                }
            }
        }
    }

    /// Fill the interleaved output buffer with the source plus all voices.
    fn fill_buffer(&mut self, output: &mut [f32], channels: u16) {
        let out_channels = channels as usize;
        let out_frames = output.len() / out_channels;
        output.fill(0.0);

        if let Some(source) = &mut self.source {
            let asset = source.asset.clone();
            let total_frames = asset.num_frames();
            if total_frames > 0 {
                let audio_channels = asset.channels as usize;
                let step = source.rate as f64 * asset.sample_rate as f64
                    / self.output_sample_rate as f64;
                let len = total_frames as f64;

                for f in 0..out_frames {
                    let i = source.position.floor() as usize % total_frames;
                    let next = (i + 1) % total_frames;
                    let frac = (source.position - source.position.floor()) as f32;
                    for c in 0..out_channels {
                        let src_c = c % audio_channels;
                        let s0 = asset.sample(i, src_c);
                        let s1 = asset.sample(next, src_c);
                        output[f * out_channels + c] =
                            (s0 + (s1 - s0) * frac) * self.master_gain;
                    }
                    source.position = (source.position + step).rem_euclid(len);
                }
            }
        }

        for voice in &mut self.voices {
            for f in 0..out_frames {
                let s = voice.next_sample();
                for c in 0..out_channels {
                    output[f * out_channels + c] += s;
                }
            }
        }
        self.voices.retain(|v| !v.is_finished());

        self.frames_rendered
            .fetch_add(out_frames as u64, Ordering::Relaxed);
    }
}

/// Opens the default cpal output device.
pub struct CpalBackend {
    master_gain: f32,
}

impl CpalBackend {
    pub fn new(master_gain: f32) -> Self {
        Self { master_gain }
    }
}

impl AudioBackend for CpalBackend {
    type Device = CpalDevice;

    fn open(&mut self) -> Result<CpalDevice> {
        CpalDevice::open(self.master_gain)
    }
}

/// A cpal output stream plus the channel feeding its render callback.
/// Dropping it closes the stream.
pub struct CpalDevice {
    cmd_tx: Sender<DeviceCommand>,
    stream: cpal::Stream,
    state: DeviceState,
    sample_rate: u32,
    frames_rendered: Arc<AtomicU64>,
}

impl CpalDevice {
    fn open(master_gain: f32) -> Result<Self> {
        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded::<DeviceCommand>(256);

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Unlock("no audio output device found".into()))?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::Unlock(format!("failed to get output config: {e}")))?;

        let sample_rate = config.sample_rate();
        let channels = config.channels();
        let sample_format = config.sample_format();

        let frames_rendered = Arc::new(AtomicU64::new(0));
        let mixer = Mixer::new(sample_rate, master_gain, frames_rendered.clone());

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_output_stream(&device, &config.into(), cmd_rx, mixer, channels)?
            }
            _ => {
                return Err(AudioError::Unlock(format!(
                    "unsupported sample format: {sample_format:?}"
                )))
            }
        };

        // Some hosts start streams on creation; hold it until resumed.
        if let Err(e) = stream.pause() {
            tracing::debug!("could not pause fresh stream: {e}");
        }

        tracing::info!(sample_rate, channels, "audio device opened");

        Ok(Self {
            cmd_tx,
            stream,
            state: DeviceState::Suspended,
            sample_rate,
            frames_rendered,
        })
    }

    fn send(&self, cmd: DeviceCommand) {
        if let Err(e) = self.cmd_tx.try_send(cmd) {
            tracing::warn!("dropping audio command: {e}");
        }
    }
}

impl OutputDevice for CpalDevice {
    fn state(&self) -> DeviceState {
        self.state
    }

    fn resume(&mut self) -> Result<()> {
        self.stream
            .play()
            .map_err(|e| AudioError::Unlock(format!("failed to start stream: {e}")))?;
        self.state = DeviceState::Running;
        Ok(())
    }

    fn now(&self) -> f64 {
        self.frames_rendered.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    fn start_source(&mut self, asset: Arc<AudioData>, offset: f64, rate: f32) {
        self.send(DeviceCommand::StartSource {
            asset,
            offset,
            rate,
        });
    }

    fn stop_source(&mut self) {
        self.send(DeviceCommand::StopSource);
    }

    fn set_source_rate(&mut self, rate: f32) {
        self.send(DeviceCommand::SetRate(rate));
    }

    fn start_voice(&mut self, voice: EffectVoice) {
        tracing::debug!(kind = ?voice.kind, duration = voice.duration, "starting voice");
        self.send(DeviceCommand::StartVoice(voice));
    }

    fn supports_reverse(&self) -> bool {
        true
    }
}

fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    cmd_rx: Receiver<DeviceCommand>,
    mut mixer: Mixer,
    channels: u16,
) -> Result<cpal::Stream> {
    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                while let Ok(cmd) = cmd_rx.try_recv() {
                    mixer.handle_command(cmd);
                }
                mixer.fill_buffer(data, channels);
            },
            |err| {
                tracing::error!("audio stream error: {err}");
            },
            None,
        )
        .map_err(|e| AudioError::Unlock(format!("failed to build output stream: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_asset(frames: usize, sample_rate: u32) -> Arc<AudioData> {
        Arc::new(AudioData {
            samples: (0..frames).map(|i| i as f32 / frames as f32).collect(),
            sample_rate,
            channels: 1,
            duration: frames as f64 / sample_rate as f64,
        })
    }

    fn mixer(sample_rate: u32) -> Mixer {
        Mixer::new(sample_rate, 1.0, Arc::new(AtomicU64::new(0)))
    }

    #[test]
    fn source_loops_without_gap() {
        let mut m = mixer(10);
        m.handle_command(DeviceCommand::StartSource {
            asset: ramp_asset(10, 10),
            offset: 0.8,
            rate: 1.0,
        });
        let mut out = [0.0f32; 4];
        m.fill_buffer(&mut out, 1);
        assert_eq!(out, [0.8, 0.9, 0.0, 0.1]);
    }

    #[test]
    fn mono_source_fills_every_output_channel() {
        let mut m = mixer(10);
        m.handle_command(DeviceCommand::StartSource {
            asset: ramp_asset(10, 10),
            offset: 0.2,
            rate: 1.0,
        });
        let mut out = [0.0f32; 4];
        m.fill_buffer(&mut out, 2);
        assert_eq!(out, [0.2, 0.2, 0.3, 0.3]);
    }

    #[test]
    fn negative_rate_plays_backwards_across_loop_start() {
        let mut m = mixer(10);
        m.handle_command(DeviceCommand::StartSource {
            asset: ramp_asset(10, 10),
            offset: 0.1,
            rate: -1.0,
        });
        let mut out = [0.0f32; 3];
        m.fill_buffer(&mut out, 1);
        assert_eq!(out, [0.1, 0.0, 0.9]);
    }

    #[test]
    fn rate_change_takes_effect_next_block() {
        let mut m = mixer(10);
        m.handle_command(DeviceCommand::StartSource {
            asset: ramp_asset(10, 10),
            offset: 0.0,
            rate: 1.0,
        });
        let mut out = [0.0f32; 2];
        m.fill_buffer(&mut out, 1);
        m.handle_command(DeviceCommand::SetRate(0.0));
        m.fill_buffer(&mut out, 1);
        assert_eq!(out, [0.2, 0.2]);
    }

    #[test]
    fn stopped_source_renders_silence_but_clock_runs() {
        let frames = Arc::new(AtomicU64::new(0));
        let mut m = Mixer::new(10, 1.0, frames.clone());
        m.handle_command(DeviceCommand::StartSource {
            asset: ramp_asset(10, 10),
            offset: 0.5,
            rate: 1.0,
        });
        m.handle_command(DeviceCommand::StopSource);
        let mut out = [1.0f32; 8];
        m.fill_buffer(&mut out, 2);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(frames.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn finished_voices_are_dropped_and_overlap_while_alive() {
        let mut m = mixer(1000);
        m.handle_command(DeviceCommand::StartVoice(EffectVoice::laser()));
        m.handle_command(DeviceCommand::StartVoice(EffectVoice::laser()));
        let mut out = vec![0.0f32; 100];
        m.fill_buffer(&mut out, 1);
        assert_eq!(m.voices.len(), 2);
        // Two identical voices in phase double the first sample.
        assert!((out[0] - 0.6).abs() < 1e-6);

        let mut rest = vec![0.0f32; 200];
        m.fill_buffer(&mut rest, 1);
        assert!(m.voices.is_empty());
    }

    #[test]
    fn master_gain_scales_source_only() {
        let mut m = Mixer::new(10, 0.5, Arc::new(AtomicU64::new(0)));
        m.handle_command(DeviceCommand::StartSource {
            asset: ramp_asset(10, 10),
            offset: 0.4,
            rate: 1.0,
        });
        let mut out = [0.0f32; 1];
        m.fill_buffer(&mut out, 1);
        assert!((out[0] - 0.2).abs() < 1e-6);
    }
}
