use super::types::EffectKind;

/// How a segment moves from the previous value to its end value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ramp {
    Linear,
    /// Geometric interpolation. Both endpoints must be non-zero and share a sign.
    Exponential,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub end_time: f32,
    pub end_value: f32,
    pub ramp: Ramp,
}

/// A value that changes over time: an initial value followed by ramps.
/// After the last segment the final value is held.
#[derive(Clone, Debug, PartialEq)]
pub struct Automation {
    initial: f32,
    segments: Vec<Segment>,
}

impl Automation {
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            segments: Vec::new(),
        }
    }

    pub fn linear_to(mut self, end_value: f32, end_time: f32) -> Self {
        self.segments.push(Segment {
            end_time,
            end_value,
            ramp: Ramp::Linear,
        });
        self
    }

    pub fn exponential_to(mut self, end_value: f32, end_time: f32) -> Self {
        self.segments.push(Segment {
            end_time,
            end_value,
            ramp: Ramp::Exponential,
        });
        self
    }

    pub fn value_at(&self, t: f32) -> f32 {
        let mut start_time = 0.0;
        let mut start_value = self.initial;

        for seg in &self.segments {
            if t < seg.end_time {
                let span = seg.end_time - start_time;
                if span <= 0.0 {
                    return seg.end_value;
                }
                let frac = ((t - start_time) / span).clamp(0.0, 1.0);
                return match seg.ramp {
                    Ramp::Linear => start_value + (seg.end_value - start_value) * frac,
                    Ramp::Exponential => {
                        start_value * (seg.end_value / start_value).powf(frac)
                    }
                };
            }
            start_time = seg.end_time;
            start_value = seg.end_value;
        }

        start_value
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Waveform {
    Sawtooth,
    Square,
}

impl Waveform {
    /// Sample at `phase` in [0, 1).
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// A short synthesized sound with fixed frequency and gain envelopes.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectVoice {
    pub kind: EffectKind,
    pub waveform: Waveform,
    pub frequency: Automation,
    pub gain: Automation,
    /// Seconds until the voice stops itself.
    pub duration: f32,
}

impl EffectVoice {
    pub fn new(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Siren => Self::siren(),
            EffectKind::Laser => Self::laser(),
        }
    }

    /// 400 -> 800 -> 400 Hz over one second, fading out by 1.2s.
    pub fn siren() -> Self {
        Self {
            kind: EffectKind::Siren,
            waveform: Waveform::Sawtooth,
            frequency: Automation::new(400.0)
                .linear_to(800.0, 0.5)
                .linear_to(400.0, 1.0),
            gain: Automation::new(0.3).linear_to(0.0, 1.2),
            duration: 1.2,
        }
    }

    /// Exponential 800 -> 100 Hz drop with a fast exponential decay.
    pub fn laser() -> Self {
        Self {
            kind: EffectKind::Laser,
            waveform: Waveform::Square,
            frequency: Automation::new(800.0).exponential_to(100.0, 0.3),
            gain: Automation::new(0.3).exponential_to(0.01, 0.3),
            duration: 0.3,
        }
    }
}

/// Renders one `EffectVoice` on the audio thread.
#[derive(Debug)]
pub struct VoicePlayer {
    voice: EffectVoice,
    phase: f32,
    elapsed_frames: u64,
    sample_rate: f32,
}

impl VoicePlayer {
    pub fn new(voice: EffectVoice, sample_rate: u32) -> Self {
        Self {
            voice,
            phase: 0.0,
            elapsed_frames: 0,
            sample_rate: sample_rate as f32,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed_frames as f32 / self.sample_rate
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed() >= self.voice.duration
    }

    /// Produce the next mono sample, or silence once finished.
    pub fn next_sample(&mut self) -> f32 {
        if self.is_finished() {
            return 0.0;
        }
        let t = self.elapsed();
        let out = self.voice.waveform.sample(self.phase) * self.voice.gain.value_at(t);

        self.phase += self.voice.frequency.value_at(t) / self.sample_rate;
        self.phase -= self.phase.floor();
        self.elapsed_frames += 1;
        out
    }
}
