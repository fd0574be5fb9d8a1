//! rodio-based decoding and output
//!
//! The output device is opened lazily on the first `open()` and kept for the
//! lifetime of the backend. Each session gets its own `Sink`; a watcher
//! thread blocks on the sink and fires the completion signal when the queue
//! drains, either naturally or because the session was stopped.
//!
//! `Sink::stop()` only flags the queue; the mixer drops the decoded source on
//! its next pass. Every source is therefore wrapped in [`Tracked`], and
//! [`RodioStream::stop`] waits until that wrapper is gone.

use super::{ActiveStream, AudioBackend, CompletionSignal, DecodeStrategy};
use crate::error::PlaybackError;
use crate::library::AudioFileRef;
use rodio::cpal::FromSample;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sample, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

type FileDecoder = Decoder<BufReader<File>>;

/// Upper bound on waiting for the mixer to drop a stopped source
const RELEASE_TIMEOUT: Duration = Duration::from_millis(500);

/// Decode a file with the decoder matching its strategy
pub fn decode(path: &Path, strategy: DecodeStrategy) -> Result<FileDecoder, PlaybackError> {
    let file = File::open(path).map_err(|e| PlaybackError::decode(path, e))?;
    let reader = BufReader::new(file);
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let decoded = match (strategy, ext.as_str()) {
        (DecodeStrategy::Vorbis, _) => Decoder::new_vorbis(reader),
        (DecodeStrategy::Direct, "wav") => Decoder::new_wav(reader),
        (DecodeStrategy::Direct, "mp3") => Decoder::new_mp3(reader),
        (DecodeStrategy::Container, "flac") => Decoder::new_flac(reader),
        (DecodeStrategy::Container, "aac") => Decoder::new_aac(reader),
        // m4a/alac/aiff/wma and unknown extensions: let the decoder sniff the format
        _ => Decoder::new(reader),
    };

    decoded.map_err(|e| PlaybackError::decode(path, e))
}

/// Source wrapper whose drop disconnects the paired receiver
struct Tracked<S> {
    inner: S,
    _alive: mpsc::Sender<()>,
}

impl<S: Iterator> Iterator for Tracked<S> {
    type Item = S::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S> Source for Tracked<S>
where
    S: Source,
    S::Item: Sample,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

/// Start `source` on `sink` and watch it for the end of the queue
fn start<S>(
    sink: Sink,
    source: S,
    volume: f32,
    done: CompletionSignal,
) -> Result<RodioStream, PlaybackError>
where
    S: Source + Send + 'static,
    S::Item: Sample + Send,
    f32: FromSample<S::Item>,
{
    let (alive, released) = mpsc::channel();
    sink.set_volume(volume);
    sink.append(Tracked {
        inner: source,
        _alive: alive,
    });
    let sink = Arc::new(sink);

    let watched = Arc::clone(&sink);
    let session = done.session();
    std::thread::Builder::new()
        .name(format!("sink-watch-{}", session.0))
        .spawn(move || {
            watched.sleep_until_end();
            done.notify();
        })
        .map_err(|e| {
            sink.stop();
            PlaybackError::Device(format!("Failed to watch audio sink: {}", e))
        })?;

    Ok(RodioStream { sink, released })
}

/// Audio backend playing through the default output device
pub struct RodioBackend {
    output: Option<(OutputStream, OutputStreamHandle)>,
    volume: f32,
}

impl RodioBackend {
    pub fn new(volume: f32) -> Self {
        Self {
            output: None,
            volume,
        }
    }

    fn handle(&mut self) -> Result<&OutputStreamHandle, PlaybackError> {
        if self.output.is_none() {
            let pair = OutputStream::try_default()
                .map_err(|e| PlaybackError::Device(format!("Failed to open audio output: {}", e)))?;
            tracing::debug!("Opened default audio output");
            self.output = Some(pair);
        }

        match &self.output {
            Some((_, handle)) => Ok(handle),
            None => Err(PlaybackError::Device("audio output not initialised".into())),
        }
    }
}

impl AudioBackend for RodioBackend {
    fn open(
        &mut self,
        file: &AudioFileRef,
        strategy: DecodeStrategy,
        done: CompletionSignal,
    ) -> Result<Box<dyn ActiveStream>, PlaybackError> {
        let source = decode(file.path(), strategy)?;
        let volume = self.volume;
        let handle = self.handle()?;

        let sink = Sink::try_new(handle)
            .map_err(|e| PlaybackError::Device(format!("Failed to create audio sink: {}", e)))?;

        Ok(Box::new(start(sink, source, volume, done)?))
    }
}

struct RodioStream {
    sink: Arc<Sink>,
    /// Disconnects once the mixer has dropped the decoded source
    released: mpsc::Receiver<()>,
}

impl ActiveStream for RodioStream {
    fn pause(&self) {
        self.sink.pause();
    }

    fn resume(&self) {
        self.sink.play();
    }

    fn stop(&self) {
        self.sink.stop();
        if let Err(RecvTimeoutError::Timeout) = self.released.recv_timeout(RELEASE_TIMEOUT) {
            tracing::warn!(
                "Audio source still held {:?} after stop, output may be stalled",
                RELEASE_TIMEOUT
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::SessionId;
    use rodio::source::SineWave;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc as tokio_mpsc;

    fn write_tone(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..800 {
            let t = i as f32 / 8000.0;
            let sample = (t * 440.0 * 2.0 * std::f32::consts::PI).sin();
            writer.write_sample((sample * 8000.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_wav_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_tone(&path);

        let source = decode(&path, DecodeStrategy::Direct).unwrap();
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 8000);
    }

    #[test]
    fn test_fallback_sniffs_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.snd");
        write_tone(&path);

        assert!(decode(&path, DecodeStrategy::Fallback).is_ok());
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let Err(err) = decode(&path, DecodeStrategy::Direct) else {
            panic!("garbage decoded as audio");
        };
        assert!(matches!(err, PlaybackError::Decode { .. }));
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let Err(err) = decode(Path::new("/nonexistent/clip.ogg"), DecodeStrategy::Vorbis) else {
            panic!("missing file decoded");
        };
        assert!(matches!(err, PlaybackError::Decode { .. }));
    }

    #[test]
    fn test_vorbis_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ogg");
        std::fs::write(&path, b"OggS but not really").unwrap();

        let Err(err) = decode(&path, DecodeStrategy::Vorbis) else {
            panic!("garbage decoded as vorbis");
        };
        assert!(matches!(err, PlaybackError::Decode { .. }));
    }

    #[test]
    fn test_container_flac_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.flac");
        std::fs::write(&path, b"fLaC? no").unwrap();

        let Err(err) = decode(&path, DecodeStrategy::Container) else {
            panic!("garbage decoded as flac");
        };
        assert!(matches!(err, PlaybackError::Decode { .. }));
    }

    #[test]
    fn test_container_without_dedicated_decoder_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.m4a");
        write_tone(&path);

        let source = decode(&path, DecodeStrategy::Container).unwrap();
        assert_eq!(source.sample_rate(), 8000);
    }

    /// Endless tone that records when the mixer lets go of it
    struct DropFlag {
        inner: SineWave,
        dropped: Arc<AtomicBool>,
    }

    impl Iterator for DropFlag {
        type Item = f32;

        fn next(&mut self) -> Option<f32> {
            self.inner.next()
        }
    }

    impl Source for DropFlag {
        fn current_frame_len(&self) -> Option<usize> {
            None
        }

        fn channels(&self) -> u16 {
            1
        }

        fn sample_rate(&self) -> u32 {
            48000
        }

        fn total_duration(&self) -> Option<Duration> {
            None
        }
    }

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    /// Pull samples from an idle sink's queue the way an output device would
    fn drive(mut output: impl Iterator<Item = f32> + Send + 'static) -> Arc<AtomicBool> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        std::thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                if output.next().is_none() {
                    std::thread::sleep(Duration::from_millis(1));
                }
            }
        });
        running
    }

    #[test]
    fn test_stop_returns_after_source_is_dropped() {
        let (sink, output) = Sink::new_idle();
        let running = drive(output);

        let dropped = Arc::new(AtomicBool::new(false));
        let (tx, _rx) = tokio_mpsc::unbounded_channel();
        let source = DropFlag {
            inner: SineWave::new(440.0),
            dropped: Arc::clone(&dropped),
        };
        let stream = start(sink, source, 1.0, CompletionSignal::new(SessionId(1), tx)).unwrap();

        stream.pause();
        stream.stop();
        assert!(dropped.load(Ordering::SeqCst));

        running.store(false, Ordering::SeqCst);
    }

    #[test]
    fn test_natural_end_fires_completion() {
        let (sink, output) = Sink::new_idle();
        let running = drive(output);

        let (tx, mut rx) = tokio_mpsc::unbounded_channel();
        let source = SineWave::new(440.0).take_duration(Duration::from_millis(10));
        let stream = start(sink, source, 1.0, CompletionSignal::new(SessionId(7), tx)).unwrap();

        assert_eq!(rx.blocking_recv(), Some(SessionId(7)));

        // source is already gone; stop must not wait
        let begun = std::time::Instant::now();
        stream.stop();
        assert!(begun.elapsed() < RELEASE_TIMEOUT);

        running.store(false, Ordering::SeqCst);
    }
}
