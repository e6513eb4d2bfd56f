use std::sync::Arc;

use super::device::{AudioBackend, OutputDevice};
use super::effect::EffectVoice;
use super::source::{fetch_and_decode, AssetSource};
use super::types::{AudioData, DeviceState, EffectKind, TrackRef, TransportState};
use crate::error::{AudioError, Result};
use crate::gesture::RateSink;

/// Identifies one `begin_load` call so late completions of an older load are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Owns the decoded track, the output device and the play/pause clock.
///
/// The device is opened lazily by the first user-triggered entry point
/// (`play` or `trigger_effect`), and every such entry point resumes it
/// before doing anything audible.
pub struct Transport<B: AudioBackend> {
    backend: B,
    device: Option<B::Device>,
    asset: Option<Arc<AudioData>>,
    state: TransportState,
    /// Position within the loop in seconds, always below the asset duration.
    offset: f64,
    /// Device time at which the asset's beginning would have played.
    started_at: f64,
    rate: f32,
    load_generation: u64,
    last_error: Option<AudioError>,
}

impl<B: AudioBackend> Transport<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            device: None,
            asset: None,
            state: TransportState::Uninitialized,
            offset: 0.0,
            started_at: 0.0,
            rate: 1.0,
            load_generation: 0,
            last_error: None,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.asset.is_some()
            && matches!(
                self.state,
                TransportState::Stopped | TransportState::Playing | TransportState::Paused
            )
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Stored loop offset in seconds (not live while playing).
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn duration(&self) -> Option<f64> {
        self.asset.as_ref().map(|a| a.duration)
    }

    pub fn last_error(&self) -> Option<&AudioError> {
        self.last_error.as_ref()
    }

    /// Start loading a new track. Output stops and the previous asset is dropped.
    pub fn begin_load(&mut self, track: &TrackRef) -> LoadTicket {
        if self.is_playing() {
            if let Some(device) = &mut self.device {
                device.stop_source();
            }
        }
        self.load_generation += 1;
        self.asset = None;
        self.offset = 0.0;
        self.state = TransportState::Loading;
        tracing::info!(%track, "loading track");
        LoadTicket(self.load_generation)
    }

    /// Complete a load started with `begin_load`. Stale tickets are ignored.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<AudioData>) -> Result<()> {
        if ticket.0 != self.load_generation || self.state != TransportState::Loading {
            tracing::debug!(?ticket, "ignoring stale load completion");
            return Ok(());
        }

        match result {
            Ok(data) => {
                tracing::info!(
                    duration = data.duration,
                    sample_rate = data.sample_rate,
                    channels = data.channels,
                    "track ready"
                );
                self.asset = Some(Arc::new(data));
                self.offset = 0.0;
                self.last_error = None;
                self.state = TransportState::Stopped;
                Ok(())
            }
            Err(e) => {
                tracing::error!("track load failed: {e}");
                self.fail(e.clone());
                Err(e)
            }
        }
    }

    /// Fetch and decode `track` synchronously.
    pub fn load(&mut self, source: &dyn AssetSource, track: &TrackRef) -> Result<()> {
        let ticket = self.begin_load(track);
        let result = fetch_and_decode(source, track);
        self.finish_load(ticket, result)
    }

    /// Start looping playback from the stored offset. No-op when already
    /// playing or when no track is ready.
    pub fn play(&mut self) {
        if self.is_playing() {
            tracing::debug!("play ignored, already playing");
            return;
        }

        if let Err(e) = self.ensure_unlocked() {
            tracing::error!("play aborted: {e}");
            self.fail(e);
            return;
        }

        let Some(asset) = self.asset.clone().filter(|_| self.is_ready()) else {
            tracing::debug!(state = ?self.state, "play ignored, track not ready");
            return;
        };
        let Some(device) = self.device.as_mut() else {
            return;
        };

        let offset = wrap_offset(self.offset, asset.duration);
        let rate = applied_rate(self.rate, device.supports_reverse());
        device.start_source(asset, offset, rate);
        self.started_at = device.now() - offset;
        self.offset = offset;
        self.state = TransportState::Playing;
        tracing::info!(offset, rate, "playing");
    }

    /// Stop output and remember where it stopped.
    pub fn pause(&mut self) {
        if !self.is_playing() {
            tracing::debug!("pause ignored, not playing");
            return;
        }
        let (Some(device), Some(asset)) = (self.device.as_mut(), self.asset.as_ref()) else {
            return;
        };

        device.stop_source();
        let elapsed = device.now() - self.started_at;
        self.offset = wrap_offset(elapsed, asset.duration);
        self.state = TransportState::Paused;
        tracing::info!(elapsed, offset = self.offset, "paused");
    }

    /// Store a new rate multiplier and apply it to live output immediately.
    /// Negative rates are clamped to zero on devices without reverse playback.
    pub fn set_rate(&mut self, rate: f32) {
        if !rate.is_finite() {
            tracing::warn!(rate, "ignoring non-finite rate");
            return;
        }
        self.rate = rate;
        if self.is_playing() {
            if let Some(device) = &mut self.device {
                device.set_source_rate(applied_rate(rate, device.supports_reverse()));
            }
        }
    }

    /// Play a siren or laser voice independently of the transport.
    pub fn trigger_effect(&mut self, kind: EffectKind) {
        if let Err(e) = self.ensure_unlocked() {
            tracing::warn!(?kind, "effect dropped: {e}");
            self.last_error = Some(e);
            return;
        }
        if let Some(device) = &mut self.device {
            tracing::debug!(?kind, "triggering effect");
            device.start_voice(EffectVoice::new(kind));
        }
    }

    /// Release the output device. The next user action reopens it.
    pub fn close(&mut self) {
        if self.is_playing() {
            self.pause();
        }
        if self.device.take().is_some() {
            tracing::info!("audio device released");
        }
    }

    /// One-line state summary for diagnostics.
    pub fn debug_string(&self) -> String {
        let device = match self.device.as_ref().map(|d| d.state()) {
            None => "closed",
            Some(DeviceState::Suspended) => "suspended",
            Some(DeviceState::Running) => "running",
        };
        let mut line = format!(
            "state={:?} offset={:.2}s rate={:.2} device={device}",
            self.state, self.offset, self.rate
        );
        if let Some(e) = &self.last_error {
            line.push_str(&format!(" error=\"{e}\""));
        }
        line
    }

    fn ensure_unlocked(&mut self) -> Result<()> {
        if self.device.is_none() {
            tracing::info!("opening audio device");
            self.device = Some(self.backend.open()?);
        }
        if let Some(device) = &mut self.device {
            if device.state() == DeviceState::Suspended {
                device.resume()?;
                tracing::debug!("audio device resumed");
            }
        }
        Ok(())
    }

    fn fail(&mut self, error: AudioError) {
        if self.is_playing() {
            if let Some(device) = &mut self.device {
                device.stop_source();
            }
        }
        self.asset = None;
        self.state = TransportState::Failed;
        self.last_error = Some(error);
    }
}

impl<B: AudioBackend> RateSink for Transport<B> {
    fn set_rate(&mut self, rate: f32) {
        Transport::set_rate(self, rate);
    }
}

fn wrap_offset(elapsed: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        elapsed.rem_euclid(duration)
    } else {
        0.0
    }
}

fn applied_rate(rate: f32, supports_reverse: bool) -> f32 {
    if supports_reverse {
        rate
    } else {
        rate.max(0.0)
    }
}
