// Asynchronous image loading.
//
// Requests return an `AssetId` immediately. Decoding runs on tokio's
// blocking pool and results come back as `AssetEvent`s, which the frame
// driver drains once per frame without blocking.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::RgbaImage;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(pub(crate) u64);

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("no tokio runtime available for asset loading")]
    NoRuntime,
    #[error("failed to load {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("loading {0} was cancelled")]
    Cancelled(PathBuf),
    #[error("failed to list {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub enum AssetEvent {
    Loaded {
        id: AssetId,
        path: PathBuf,
        image: Arc<RgbaImage>,
    },
    Failed {
        id: AssetId,
        path: PathBuf,
        error: Arc<AssetError>,
    },
    /// One more item of a batch finished, successfully or not.
    Progress {
        batch: BatchId,
        path: PathBuf,
        loaded: usize,
        total: usize,
    },
    /// Every item of the batch finished. Sent after its last `Progress`.
    BatchComplete { batch: BatchId, ids: Vec<AssetId> },
}

impl AssetEvent {
    /// Id of the asset this event is about, for load results.
    pub fn asset(&self) -> Option<AssetId> {
        match self {
            AssetEvent::Loaded { id, .. } | AssetEvent::Failed { id, .. } => Some(*id),
            _ => None,
        }
    }
}

struct BatchState {
    id: BatchId,
    ids: Vec<AssetId>,
    /// Held while reporting so progress counts arrive in order.
    done: Mutex<usize>,
}

/// Queues image decodes and reports their results.
pub struct AssetLoader {
    root: PathBuf,
    runtime: Handle,
    sender: UnboundedSender<AssetEvent>,
    receiver: UnboundedReceiver<AssetEvent>,
    next_id: u64,
    next_batch: u64,
    in_flight: usize,
}

impl AssetLoader {
    /// Relative paths are resolved against `root`.
    pub fn new(root: impl Into<PathBuf>, runtime: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            root: root.into(),
            runtime,
            sender,
            receiver,
            next_id: 1,
            next_batch: 1,
            in_flight: 0,
        }
    }

    /// Creates a loader on the runtime the caller is running in.
    pub fn current(root: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let runtime = Handle::try_current().map_err(|_| AssetError::NoRuntime)?;
        Ok(Self::new(root, runtime))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Requests a single image.
    pub fn load(&mut self, path: impl AsRef<Path>) -> AssetId {
        let id = self.allocate();
        self.spawn(id, path.as_ref().to_path_buf(), None);
        id
    }

    /// Requests several images tracked as one batch. Ids are returned in
    /// request order.
    pub fn load_batch<P: AsRef<Path>>(&mut self, paths: &[P]) -> (BatchId, Vec<AssetId>) {
        let batch = BatchId(self.next_batch);
        self.next_batch += 1;
        let ids: Vec<AssetId> = paths.iter().map(|_| self.allocate()).collect();

        if paths.is_empty() {
            let _ = self.sender.send(AssetEvent::BatchComplete { batch, ids: Vec::new() });
            return (batch, ids);
        }

        let state = Arc::new(BatchState {
            id: batch,
            ids: ids.clone(),
            done: Mutex::new(0),
        });
        for (path, id) in paths.iter().zip(&ids) {
            self.spawn(*id, path.as_ref().to_path_buf(), Some(state.clone()));
        }
        log::debug!("batch {batch:?}: {} images requested", ids.len());
        (batch, ids)
    }

    /// Returns the next finished event without waiting.
    pub fn try_next(&mut self) -> Option<AssetEvent> {
        let event = self.receiver.try_recv().ok()?;
        Some(self.received(event))
    }

    /// Waits for the next event.
    pub async fn next_event(&mut self) -> Option<AssetEvent> {
        let event = self.receiver.recv().await?;
        Some(self.received(event))
    }

    /// Loads whose result has not been taken from the loader yet.
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    fn received(&mut self, event: AssetEvent) -> AssetEvent {
        if matches!(event, AssetEvent::Loaded { .. } | AssetEvent::Failed { .. }) {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        event
    }

    fn allocate(&mut self) -> AssetId {
        let id = AssetId(self.next_id);
        self.next_id += 1;
        id
    }

    fn spawn(&mut self, id: AssetId, path: PathBuf, batch: Option<Arc<BatchState>>) {
        let full_path = self.root.join(&path);
        let sender = self.sender.clone();
        self.in_flight += 1;

        self.runtime.spawn(async move {
            let decode_path = full_path.clone();
            let result = match tokio::task::spawn_blocking(move || decode(&decode_path)).await {
                Ok(result) => result,
                Err(_) => Err(AssetError::Cancelled(full_path)),
            };

            let event = match result {
                Ok(image) => {
                    log::debug!("loaded {} ({}x{})", path.display(), image.width(), image.height());
                    AssetEvent::Loaded {
                        id,
                        path: path.clone(),
                        image: Arc::new(image),
                    }
                }
                Err(error) => {
                    log::warn!("{error}");
                    AssetEvent::Failed {
                        id,
                        path: path.clone(),
                        error: Arc::new(error),
                    }
                }
            };
            // The receiver is gone only when the loader was dropped.
            let _ = sender.send(event);

            if let Some(batch) = batch {
                let mut done = match batch.done.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                *done += 1;
                let loaded = *done;
                let total = batch.ids.len();
                let _ = sender.send(AssetEvent::Progress {
                    batch: batch.id,
                    path,
                    loaded,
                    total,
                });
                if loaded == total {
                    let _ = sender.send(AssetEvent::BatchComplete {
                        batch: batch.id,
                        ids: batch.ids.clone(),
                    });
                }
            }
        });
    }
}

fn decode(path: &Path) -> Result<RgbaImage, AssetError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Image files directly inside `dir`, sorted by name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, AssetError> {
    let entries = std::fs::read_dir(dir).map_err(|source| AssetError::ListDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// A source of frames that change over time.
pub trait VideoSource {
    /// Returns the frame to show at `seconds` if it differs from the last
    /// one returned.
    fn frame_at(&mut self, seconds: f32) -> Option<Arc<RgbaImage>>;
}

/// Decoded frames played back at a fixed rate, looping.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    frames: Vec<Arc<RgbaImage>>,
    fps: f32,
    current: Option<usize>,
}

impl ImageSequence {
    pub fn new(frames: Vec<Arc<RgbaImage>>, fps: f32) -> Self {
        Self {
            frames,
            fps: if fps > 0.0 { fps } else { 1.0 },
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn index_at(&self, seconds: f32) -> Option<usize> {
        if self.frames.is_empty() {
            return None;
        }
        let frame = (seconds.max(0.0) * self.fps).floor() as usize;
        Some(frame % self.frames.len())
    }
}

impl VideoSource for ImageSequence {
    fn frame_at(&mut self, seconds: f32) -> Option<Arc<RgbaImage>> {
        let index = self.index_at(seconds)?;
        if self.current == Some(index) {
            return None;
        }
        self.current = Some(index);
        self.frames.get(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: u8) -> Vec<Arc<RgbaImage>> {
        (0..n)
            .map(|i| Arc::new(RgbaImage::from_pixel(1, 1, image::Rgba([i, 0, 0, 255]))))
            .collect()
    }

    #[test]
    fn sequence_loops_and_reports_changes_only() {
        let mut video = ImageSequence::new(frames(3), 10.0);
        assert_eq!(video.index_at(0.0), Some(0));
        assert_eq!(video.index_at(0.25), Some(2));
        assert_eq!(video.index_at(0.35), Some(0));

        let first = video.frame_at(0.0);
        assert!(first.is_some());
        assert!(video.frame_at(0.05).is_none());
        let second = video.frame_at(0.1);
        assert_eq!(second.map(|f| f.get_pixel(0, 0)[0]), Some(1));
    }

    #[test]
    fn empty_sequence_has_no_frames() {
        let mut video = ImageSequence::new(Vec::new(), 30.0);
        assert!(video.is_empty());
        assert!(video.frame_at(1.0).is_none());
    }

    #[test]
    fn loader_needs_a_runtime() {
        assert!(matches!(AssetLoader::current("."), Err(AssetError::NoRuntime)));
    }
}
