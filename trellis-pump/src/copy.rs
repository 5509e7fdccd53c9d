//! Copy threads that import a file and report progress.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;
use trellis_api::{CopyEvent, CopyId};

const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("unsupported source scheme: {0}")]
    UnsupportedScheme(String),

    #[error("source has no file name: {0}")]
    NoFileName(String),

    #[error("invalid source encoding: {0}")]
    Encoding(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("copy thread panicked")]
    Panicked,
}

/// Counter for generating copy ids.
static COPY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_copy_id() -> CopyId {
    CopyId(COPY_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// Turn a `file://` URI or a plain path into a filesystem path.
pub fn resolve_source(source: &str) -> Result<PathBuf, CopyError> {
    let source = source.trim();
    let path = match source.split_once("://") {
        Some(("file", rest)) => rest,
        Some((scheme, _)) => return Err(CopyError::UnsupportedScheme(scheme.to_string())),
        None => source,
    };
    let decoded = urlencoding::decode(path).map_err(|e| CopyError::Encoding(e.to_string()))?;
    Ok(PathBuf::from(decoded.into_owned()))
}

/// Receives the events of one copy task, in order.
pub trait CopyCallback {
    fn on_pre_execute(&mut self);

    fn on_progress(&mut self, percent: u8);

    /// `detail` is the file name on success, the failure reason otherwise.
    fn on_finished(&mut self, path: &Path, success: bool, detail: &str);

    fn on_cancelled(&mut self, path: &Path, bytes_written: u64) {
        tracing::debug!("copy to {} cancelled after {} bytes", path.display(), bytes_written);
    }
}

/// Cancels a [`CopyTask`] from elsewhere, e.g. from inside its callback.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    stop: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// A file copy running on its own thread.
pub struct CopyTask {
    copy_id: CopyId,

    /// Handle to the copy thread.
    handle: Option<JoinHandle<()>>,

    /// Signal to stop writing.
    stop: Arc<AtomicBool>,
}

impl CopyTask {
    /// Spawn a thread copying `source` into `dest_dir`.
    ///
    /// The output file is named after the last segment of the source path.
    pub fn spawn(
        source: impl Into<String>,
        dest_dir: impl Into<PathBuf>,
        events: Sender<CopyEvent>,
    ) -> Self {
        let copy_id = next_copy_id();
        let stop = Arc::new(AtomicBool::new(false));
        let source = source.into();
        let dest_dir = dest_dir.into();

        let stop_clone = stop.clone();
        let handle = thread::spawn(move || {
            copy_loop(copy_id, &source, &dest_dir, &events, &stop_clone);
        });

        Self {
            copy_id,
            handle: Some(handle),
            stop,
        }
    }

    pub fn copy_id(&self) -> CopyId {
        self.copy_id
    }

    /// Stop writing. Bytes already written are flushed and kept.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            stop: self.stop.clone(),
        }
    }

    /// Wait for the copy thread to finish.
    pub fn join(mut self) -> Result<(), CopyError> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| CopyError::Panicked)?;
        }
        Ok(())
    }

    /// Dispatch this task's events to `callback` until the terminal one,
    /// then wait for the thread.
    pub fn drive(
        self,
        events: &Receiver<CopyEvent>,
        callback: &mut impl CopyCallback,
    ) -> Result<(), CopyError> {
        for event in events.iter() {
            if event.copy_id() != self.copy_id {
                continue;
            }
            let terminal = event.is_terminal();
            match event {
                CopyEvent::Started { .. } => callback.on_pre_execute(),
                CopyEvent::Progress { percent, .. } => callback.on_progress(percent),
                CopyEvent::Finished {
                    path,
                    success,
                    detail,
                    ..
                } => callback.on_finished(&path, success, &detail),
                CopyEvent::Cancelled {
                    path, bytes_written, ..
                } => callback.on_cancelled(&path, bytes_written),
            }
            if terminal {
                break;
            }
        }
        self.join()
    }
}

enum Outcome {
    Copied,
    Cancelled(u64),
}

/// The copy thread body. Always ends with exactly one terminal event.
fn copy_loop(
    copy_id: CopyId,
    source: &str,
    dest_dir: &Path,
    events: &Sender<CopyEvent>,
    stop: &AtomicBool,
) {
    let _ = events.send(CopyEvent::Started {
        copy_id,
        source: source.to_string(),
    });

    let mut dest = dest_dir.to_path_buf();
    let result = resolve_source(source).and_then(|path| {
        let name = path
            .file_name()
            .ok_or_else(|| CopyError::NoFileName(source.to_string()))?
            .to_owned();
        dest = dest_dir.join(&name);
        copy_file(copy_id, &path, &dest, events, stop)
            .map(|outcome| (outcome, name.to_string_lossy().into_owned()))
    });

    let terminal = match result {
        Ok((Outcome::Copied, name)) => {
            tracing::debug!("copied {} to {}", source, dest.display());
            CopyEvent::Finished {
                copy_id,
                path: dest,
                success: true,
                detail: name,
            }
        }
        Ok((Outcome::Cancelled(bytes_written), _)) => CopyEvent::Cancelled {
            copy_id,
            path: dest,
            bytes_written,
        },
        Err(e) => {
            tracing::warn!("copy of {} failed: {}", source, e);
            CopyEvent::Finished {
                copy_id,
                path: dest,
                success: false,
                detail: e.to_string(),
            }
        }
    };
    let _ = events.send(terminal);
}

fn copy_file(
    copy_id: CopyId,
    source: &Path,
    dest: &Path,
    events: &Sender<CopyEvent>,
    stop: &AtomicBool,
) -> Result<Outcome, CopyError> {
    let mut reader = File::open(source)?;
    let size = reader.metadata().map(|m| m.len()).ok().filter(|len| *len > 0);
    let mut writer = File::create(dest)?;

    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    let mut last_percent = None;

    loop {
        if stop.load(Ordering::SeqCst) {
            writer.flush()?;
            return Ok(Outcome::Cancelled(total));
        }
        let n = match reader.read(&mut buf) {
            Ok(0) => break, // EOF
            Ok(n) => n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.write_all(&buf[..n])?;
        total += n as u64;

        if let Some(size) = size {
            let percent = (total.saturating_mul(100) / size).min(100) as u8;
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                let _ = events.send(CopyEvent::Progress { copy_id, percent });
            }
        }
    }

    writer.flush()?;
    Ok(Outcome::Copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};
    use std::fs;

    fn collect(task: CopyTask, rx: &Receiver<CopyEvent>) -> Vec<CopyEvent> {
        task.join().unwrap();
        rx.try_iter().collect()
    }

    #[test]
    fn test_resolve_source() {
        assert_eq!(
            resolve_source("file:///tmp/my%20photo.png").unwrap(),
            PathBuf::from("/tmp/my photo.png")
        );
        assert_eq!(resolve_source("/tmp/a.png").unwrap(), PathBuf::from("/tmp/a.png"));
        assert!(matches!(
            resolve_source("content://media/42"),
            Err(CopyError::UnsupportedScheme(s)) if s == "content"
        ));
    }

    #[test]
    fn test_copy_reports_progress_and_name() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("logo.png");
        let payload = vec![7u8; CHUNK_SIZE * 4 + 100];
        fs::write(&source, &payload).unwrap();

        let (tx, rx) = unbounded();
        let task = CopyTask::spawn(source.display().to_string(), dest_dir.path(), tx);
        let id = task.copy_id();
        let events = collect(task, &rx);

        assert!(matches!(events.first(), Some(CopyEvent::Started { .. })));
        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                CopyEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents.len(), 5);
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(percents.last(), Some(&100));

        let dest = dest_dir.path().join("logo.png");
        assert_eq!(
            events.last(),
            Some(&CopyEvent::Finished {
                copy_id: id,
                path: dest.clone(),
                success: true,
                detail: "logo.png".to_string(),
            })
        );
        assert_eq!(fs::read(dest).unwrap(), payload);
    }

    #[test]
    fn test_empty_file_has_no_progress() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("empty.xml");
        fs::write(&source, b"").unwrap();

        let (tx, rx) = unbounded();
        let task = CopyTask::spawn(source.display().to_string(), dest_dir.path(), tx);
        let events = collect(task, &rx);

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], CopyEvent::Finished { success: true, .. }));
    }

    #[test]
    fn test_missing_source_reports_reason() {
        let dest_dir = tempfile::tempdir().unwrap();
        let (tx, rx) = unbounded();
        let task = CopyTask::spawn("file:///definitely/not/here.png", dest_dir.path(), tx);
        let events = collect(task, &rx);

        match events.last() {
            Some(CopyEvent::Finished {
                success, detail, ..
            }) => {
                assert!(!success);
                assert!(!detail.is_empty());
            }
            other => panic!("expected failed Finished, got {:?}", other),
        }
    }

    #[test]
    fn test_cancelled_copy_keeps_written_bytes() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("big.bin");
        fs::write(&source, vec![1u8; CHUNK_SIZE * 2]).unwrap();
        let dest = dest_dir.path().join("big.bin");

        let (tx, rx) = unbounded();
        let stop = AtomicBool::new(true);
        let outcome = copy_file(CopyId(0), &source, &dest, &tx, &stop).unwrap();

        assert!(matches!(outcome, Outcome::Cancelled(0)));
        assert!(dest.exists());
        assert!(rx.try_iter().next().is_none());
    }

    /// A source of 100 chunks, so every chunk is one percent.
    fn large_source(dir: &Path) -> PathBuf {
        let source = dir.join("large.bin");
        fs::write(&source, vec![3u8; CHUNK_SIZE * 100]).unwrap();
        source
    }

    #[test]
    fn test_cancel_stops_a_running_copy() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = large_source(src_dir.path());

        // Rendezvous channel: the thread blocks on each event until it is received.
        let (tx, rx) = bounded(0);
        let task = CopyTask::spawn(source.display().to_string(), dest_dir.path(), tx);
        let id = task.copy_id();

        assert!(matches!(rx.recv().unwrap(), CopyEvent::Started { .. }));
        assert!(matches!(rx.recv().unwrap(), CopyEvent::Progress { percent: 1, .. }));
        task.cancel();
        assert!(task.is_cancelled());

        let mut terminal = None;
        for event in rx.iter() {
            if event.is_terminal() {
                terminal = Some(event);
                break;
            }
        }
        task.join().unwrap();

        let dest = dest_dir.path().join("large.bin");
        match terminal {
            Some(CopyEvent::Cancelled {
                copy_id,
                path,
                bytes_written,
            }) => {
                assert_eq!(copy_id, id);
                assert_eq!(path, dest);
                assert!(bytes_written >= CHUNK_SIZE as u64);
                assert!(bytes_written <= 2 * CHUNK_SIZE as u64);
                assert_eq!(fs::metadata(&dest).unwrap().len(), bytes_written);
            }
            other => panic!("expected Cancelled, got {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        cancel_on_progress: Option<CancelHandle>,
    }

    impl CopyCallback for Recorder {
        fn on_pre_execute(&mut self) {
            self.calls.push("pre".to_string());
        }

        fn on_progress(&mut self, percent: u8) {
            self.calls.push(format!("progress {}", percent));
            if let Some(handle) = &self.cancel_on_progress {
                handle.cancel();
            }
        }

        fn on_finished(&mut self, _path: &Path, success: bool, detail: &str) {
            self.calls.push(format!("finished {} {}", success, detail));
        }

        fn on_cancelled(&mut self, path: &Path, bytes_written: u64) {
            let len = fs::metadata(path).map(|m| m.len()).unwrap_or(u64::MAX);
            assert_eq!(len, bytes_written);
            self.calls.push(format!("cancelled {}", bytes_written));
        }
    }

    #[test]
    fn test_drive_reports_cancellation() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = large_source(src_dir.path());

        let (tx, rx) = bounded(0);
        let task = CopyTask::spawn(source.display().to_string(), dest_dir.path(), tx);
        let mut recorder = Recorder {
            cancel_on_progress: Some(task.cancel_handle()),
            ..Recorder::default()
        };
        task.drive(&rx, &mut recorder).unwrap();

        assert_eq!(recorder.calls.first().map(String::as_str), Some("pre"));
        assert_eq!(recorder.calls[1], "progress 1");
        assert!(recorder.calls.len() <= 4);
        let last = recorder.calls.last().unwrap();
        assert!(last.starts_with("cancelled "), "last call was {}", last);
        assert!(!recorder.calls.iter().any(|c| c.starts_with("finished")));
    }

    #[test]
    fn test_drive_dispatches_to_callback() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("icon.svg");
        fs::write(&source, b"<svg/>").unwrap();

        let (tx, rx) = unbounded();
        let task = CopyTask::spawn(source.display().to_string(), dest_dir.path(), tx);
        let mut recorder = Recorder::default();
        task.drive(&rx, &mut recorder).unwrap();

        assert_eq!(
            recorder.calls,
            vec!["pre", "progress 100", "finished true icon.svg"]
        );
    }
}
