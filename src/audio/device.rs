use std::sync::Arc;

use super::effect::EffectVoice;
use super::types::{AudioData, DeviceState};
use crate::error::Result;

/// Creates output devices on demand.
pub trait AudioBackend {
    type Device: OutputDevice;

    /// Open a new device. A freshly opened device is `Suspended`.
    fn open(&mut self) -> Result<Self::Device>;
}

/// The platform output the transport plays through.
pub trait OutputDevice {
    fn state(&self) -> DeviceState;

    /// Unlock the device so it produces sound.
    fn resume(&mut self) -> Result<()>;

    /// Device clock in seconds. Only advances while running.
    fn now(&self) -> f64;

    /// Start looping `asset` from `offset` seconds, replacing any current source.
    fn start_source(&mut self, asset: Arc<AudioData>, offset: f64, rate: f32);

    fn stop_source(&mut self);

    fn set_source_rate(&mut self, rate: f32);

    /// Play a self-terminating voice alongside the source.
    fn start_voice(&mut self, voice: EffectVoice);

    /// Whether negative rates play the source backwards.
    fn supports_reverse(&self) -> bool;
}
