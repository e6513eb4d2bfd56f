use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::decoder;
use super::types::{AudioData, TrackRef};
use crate::error::{AudioError, Result};

/// Supplies the encoded bytes for a track.
pub trait AssetSource: Send + Sync {
    fn fetch(&self, track: &TrackRef) -> Result<Vec<u8>>;
}

/// Reads tracks from disk. Relative references resolve against `root`.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, track: &TrackRef) -> PathBuf {
        self.root.join(track.as_str())
    }
}

impl AssetSource for FileSource {
    fn fetch(&self, track: &TrackRef) -> Result<Vec<u8>> {
        let path = self.resolve(track);
        std::fs::read(&path).map_err(|e| AudioError::Fetch(format!("{}: {e}", path.display())))
    }
}

/// Fetch and decode in one step.
pub fn fetch_and_decode(source: &dyn AssetSource, track: &TrackRef) -> Result<AudioData> {
    let bytes = source.fetch(track)?;
    tracing::debug!(%track, bytes = bytes.len(), "fetched track");
    decoder::decode_bytes(bytes, track.extension())
}

/// Fetch and decode on a blocking task, giving up after `timeout`.
pub async fn load_track(
    source: Arc<dyn AssetSource>,
    track: TrackRef,
    timeout: Duration,
) -> Result<AudioData> {
    let task_track = track.clone();
    let task = tokio::task::spawn_blocking(move || fetch_and_decode(source.as_ref(), &task_track));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(AudioError::Fetch(format!("load task for {track} failed: {e}"))),
        Err(_) => Err(AudioError::Fetch(format!(
            "timed out after {:.1}s loading {track}",
            timeout.as_secs_f64()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowSource;

    impl AssetSource for SlowSource {
        fn fetch(&self, _track: &TrackRef) -> Result<Vec<u8>> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(Vec::new())
        }
    }

    struct BytesSource(Vec<u8>);

    impl AssetSource for BytesSource {
        fn fetch(&self, _track: &TrackRef) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn missing_file_is_a_fetch_failure() {
        let source = FileSource::new(std::env::temp_dir());
        let err = source
            .fetch(&TrackRef::new("vinyl-scratch-does-not-exist.mp3"))
            .unwrap_err();
        assert!(matches!(err, AudioError::Fetch(_)));
    }

    #[test]
    fn file_source_reads_relative_to_root() {
        let dir = std::env::temp_dir();
        let name = format!("vinyl-scratch-source-{}.bin", std::process::id());
        std::fs::write(dir.join(&name), b"abc").unwrap();

        let bytes = FileSource::new(&dir).fetch(&TrackRef::new(name.clone())).unwrap();
        assert_eq!(bytes, b"abc");

        let _ = std::fs::remove_file(dir.join(name));
    }

    #[tokio::test]
    async fn slow_fetch_times_out_as_fetch_failure() {
        let err = load_track(
            Arc::new(SlowSource),
            TrackRef::new("slow.mp3"),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();
        match err {
            AudioError::Fetch(msg) => assert!(msg.contains("timed out")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_bytes_surface_decode_failure() {
        let err = load_track(
            Arc::new(BytesSource(b"junk".to_vec())),
            TrackRef::new("junk.wav"),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AudioError::Decode(_)));
    }
}
