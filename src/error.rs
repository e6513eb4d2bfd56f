/// Failures the audio core can report. All of them leave the transport in a
/// consistent state; the caller sees them as a `Failed` transition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    /// The track bytes could not be obtained.
    #[error("failed to fetch track: {0}")]
    Fetch(String),
    /// The bytes were fetched but are not decodable audio.
    #[error("failed to decode track: {0}")]
    Decode(String),
    /// The output device could not be opened or resumed.
    #[error("failed to unlock audio device: {0}")]
    Unlock(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;
