use std::path::Path;
use std::sync::Arc;

use super::effect::EffectVoice;

/// Decoded audio data stored entirely in memory. Immutable once decoded.
#[derive(Clone, Debug)]
pub struct AudioData {
    /// Interleaved samples normalized to [-1.0, 1.0].
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Duration in seconds.
    pub duration: f64,
}

impl AudioData {
    /// Total number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Sample at `frame` for `channel`, or silence past the end.
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        self.samples
            .get(frame * self.channels as usize + channel)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Reference to a track, resolved by an `AssetSource`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackRef(pub String);

impl TrackRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File extension, used as a decoder hint.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.0).extension().and_then(|e| e.to_str())
    }
}

impl std::fmt::Display for TrackRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commands sent from the UI thread to the audio thread.
#[derive(Debug, Clone)]
pub enum DeviceCommand {
    StartSource {
        asset: Arc<AudioData>,
        offset: f64,
        rate: f32,
    },
    StopSource,
    SetRate(f32),
    StartVoice(EffectVoice),
}

/// Lifecycle of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Uninitialized,
    Loading,
    /// Decoded and ready, never started.
    Stopped,
    Playing,
    Paused,
    Failed,
}

/// Whether the output device currently produces sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Suspended,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Siren,
    Laser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_extension_is_used_as_hint() {
        assert_eq!(TrackRef::new("music/40 Bjorn.mp3").extension(), Some("mp3"));
        assert_eq!(TrackRef::new("noext").extension(), None);
    }

    #[test]
    fn sample_past_end_is_silent() {
        let data = AudioData {
            samples: vec![0.1, 0.2, 0.3, 0.4],
            sample_rate: 4,
            channels: 2,
            duration: 0.5,
        };
        assert_eq!(data.num_frames(), 2);
        assert_eq!(data.sample(1, 1), 0.4);
        assert_eq!(data.sample(2, 0), 0.0);
    }
}
