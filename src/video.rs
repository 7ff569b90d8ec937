//! Seekable video source backed by a directory of still frames.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::display::{DisplaySurface, VideoFrame};
use crate::error::{Error, Result};

/// A video the beat reactor can jump around in
pub trait VideoSource: Send {
    fn frame_count(&self) -> u64;

    /// Request a seek to `index` (must be `< frame_count()`). Returns without
    /// waiting for the frame; the source notifies its display once the frame
    /// is ready.
    fn seek_to_frame(&mut self, index: u64);
}

/// Image extensions treated as frames
const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Frames are the image files of a directory, ordered by file name.
///
/// Decoding happens on a `frame-decoder` thread. When seeks pile up behind a
/// slow decode only the latest one is loaded.
pub struct FrameSequence {
    frame_count: u64,
    requests: Option<Sender<u64>>,
    decoder: Option<JoinHandle<()>>,
}

impl FrameSequence {
    pub fn open(dir: &Path, display: Arc<dyn DisplaySurface>) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::MissingAssets(dir.to_path_buf()));
        }

        let mut frames = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_frame = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    FRAME_EXTENSIONS
                        .iter()
                        .any(|known| known.eq_ignore_ascii_case(ext))
                });
            if is_frame {
                frames.push(path);
            }
        }
        frames.sort();

        log::info!("Video: {} frames from {}", frames.len(), dir.display());

        let frame_count = frames.len() as u64;
        let (tx, rx) = unbounded();
        let decoder = thread::Builder::new()
            .name("frame-decoder".to_string())
            .spawn(move || run_decoder(frames, display, rx))
            .map_err(Error::Io)?;

        Ok(Self {
            frame_count,
            requests: Some(tx),
            decoder: Some(decoder),
        })
    }
}

impl VideoSource for FrameSequence {
    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn seek_to_frame(&mut self, index: u64) {
        if index >= self.frame_count {
            log::warn!("Seek to frame {} past end ({})", index, self.frame_count);
            return;
        }
        if let Some(requests) = &self.requests {
            if requests.send(index).is_err() {
                log::warn!("Frame decoder gone, dropping seek to {}", index);
            }
        }
    }
}

impl Drop for FrameSequence {
    fn drop(&mut self) {
        // Closing the channel lets the decoder finish queued seeks and exit
        self.requests.take();
        if let Some(decoder) = self.decoder.take() {
            if decoder.join().is_err() {
                log::warn!("Frame decoder panicked");
            }
        }
    }
}

/// Decode requested frames and hand them to the display until the sender closes
fn run_decoder(frames: Vec<PathBuf>, display: Arc<dyn DisplaySurface>, requests: Receiver<u64>) {
    while let Ok(first) = requests.recv() {
        let index = requests.try_iter().last().unwrap_or(first);
        match load_frame(&frames[index as usize], index) {
            Ok(frame) => display.present_frame(&frame),
            Err(e) => log::warn!("Failed to load frame {}: {}", index, e),
        }
    }
    log::debug!("Frame decoder stopped");
}

fn load_frame(path: &Path, index: u64) -> Result<VideoFrame> {
    let image = image::open(path)?.to_rgba8();
    Ok(VideoFrame {
        index,
        image: Arc::new(image),
    })
}
