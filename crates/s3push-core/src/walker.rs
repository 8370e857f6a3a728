//! File walker: expands local paths into upload tasks
//!
//! The walker is blocking code. It runs on its own thread and pushes every
//! task into the bounded queue as soon as it is found, so a full queue pauses
//! the directory traversal until a worker frees a slot.

use std::fs;
use std::path::{Path, PathBuf};

use async_channel::Sender;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::utils::to_slash;
use crate::{Destination, Error, UploadTask};

/// Counters collected while walking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Tasks handed to the queue
    pub queued: usize,
    /// Total size of the queued files
    pub bytes: u64,
    /// Paths or directory entries that were skipped
    pub skipped: usize,
}

/// Walk `paths` and send one task per regular file to `queue`.
///
/// Unreadable paths are logged and skipped. Returns early if the receiving
/// side of the queue has been closed.
pub fn walk(paths: &[PathBuf], destination: &Destination, queue: &Sender<UploadTask>) -> WalkSummary {
    let mut walker = Walker {
        prefix: &destination.key_prefix,
        queue,
        summary: WalkSummary::default(),
    };

    for path in paths {
        if !walker.visit(path) {
            debug!("Upload queue closed, stopping walk");
            break;
        }
    }

    walker.summary
}

struct Walker<'a> {
    prefix: &'a str,
    queue: &'a Sender<UploadTask>,
    summary: WalkSummary,
}

impl Walker<'_> {
    /// Returns false once the queue no longer accepts tasks
    fn visit(&mut self, path: &Path) -> bool {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                self.skip(Error::traversal(path, e));
                return true;
            }
        };

        if metadata.is_file() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.send(UploadTask::new(path, metadata.len(), self.prefix, &name))
        } else if metadata.is_dir() {
            self.visit_dir(path)
        } else {
            self.skip(Error::traversal(path, "not a regular file or directory"));
            true
        }
    }

    fn visit_dir(&mut self, dir: &Path) -> bool {
        // Keys are relative to the parent so the directory keeps its name
        let base = dir.parent().unwrap_or(dir);

        for entry in WalkDir::new(dir) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    self.skip(Error::traversal(path, e));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let size = match entry.metadata() {
                Ok(m) => m.len(),
                Err(e) => {
                    self.skip(Error::traversal(entry.path(), e));
                    continue;
                }
            };

            let relative = entry.path().strip_prefix(base).unwrap_or(entry.path());
            let task = UploadTask::new(entry.path(), size, self.prefix, &to_slash(relative));
            if !self.send(task) {
                return false;
            }
        }

        true
    }

    fn send(&mut self, task: UploadTask) -> bool {
        debug!(
            "Queueing {} -> {}",
            task.local_path().display(),
            task.remote_key()
        );
        let size = task.size();

        if self.queue.send_blocking(task).is_err() {
            return false;
        }

        self.summary.queued += 1;
        self.summary.bytes += size;
        true
    }

    fn skip(&mut self, err: Error) {
        warn!("Skipping: {}", err);
        self.summary.skipped += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Walk with an unbounded queue and collect what was produced
    fn collect(paths: &[PathBuf], reference: &str) -> (Vec<UploadTask>, WalkSummary) {
        let destination = Destination::parse(reference).unwrap();
        let (tx, rx) = async_channel::unbounded();
        let summary = walk(paths, &destination, &tx);
        drop(tx);

        let mut tasks = Vec::new();
        while let Ok(task) = rx.try_recv() {
            tasks.push(task);
        }
        (tasks, summary)
    }

    fn keys(tasks: &[UploadTask]) -> BTreeSet<String> {
        tasks.iter().map(|t| t.remote_key().to_string()).collect()
    }

    #[test]
    fn test_directory_keeps_its_name() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path().join("d");
        write(&d.join("a.txt"), "a");
        write(&d.join("sub").join("b.txt"), "bb");

        let (tasks, summary) = collect(&[d], "s3://bucket/pre");

        assert_eq!(tasks.len(), 2);
        assert_eq!(
            keys(&tasks),
            BTreeSet::from(["pre/d/a.txt".to_string(), "pre/d/sub/b.txt".to_string()])
        );
        assert_eq!(summary.queued, 2);
        assert_eq!(summary.bytes, 3);
        assert_eq!(summary.skipped, 0);
    }

    #[test]
    fn test_single_file_uses_basename() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("deep").join("nested").join("f.txt");
        write(&file, "hello");

        let (tasks, _) = collect(&[file.clone()], "s3://bucket/pre");

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].remote_key(), "pre/f.txt");
        assert_eq!(tasks[0].size(), 5);
        assert_eq!(tasks[0].local_path(), file.as_path());
    }

    #[test]
    fn test_trailing_slash_prefix_and_bucket_root() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f.txt");
        write(&file, "x");

        let (tasks, _) = collect(&[file.clone()], "s3://bucket/pre/");
        assert_eq!(tasks[0].remote_key(), "pre/f.txt");

        let (tasks, _) = collect(&[file], "s3://bucket");
        assert_eq!(tasks[0].remote_key(), "f.txt");
    }

    #[test]
    fn test_missing_path_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("present.txt");
        write(&file, "x");

        let paths = vec![tmp.path().join("absent"), file];
        let (tasks, summary) = collect(&paths, "s3://bucket/pre");

        assert_eq!(keys(&tasks), BTreeSet::from(["pre/present.txt".to_string()]));
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_same_tree_gives_same_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path().join("site");
        write(&d.join("index.html"), "<html/>");
        write(&d.join("css").join("main.css"), "body{}");
        write(&d.join("img").join("a").join("logo.png"), "png");

        let paths = vec![d];
        let (first, _) = collect(&paths, "s3://bucket/www");
        let (second, _) = collect(&paths, "s3://bucket/www");

        assert_eq!(keys(&first), keys(&second));
        assert_eq!(keys(&first).len(), 3);
    }

    #[test]
    fn test_empty_directory_produces_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path().join("empty");
        fs::create_dir_all(d.join("inner")).unwrap();

        let (tasks, summary) = collect(&[d], "s3://bucket/pre");
        assert!(tasks.is_empty());
        assert_eq!(summary, WalkSummary::default());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_inside_directory_are_not_followed() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tmp.path().join("outside.txt");
        write(&outside, "secret");
        let d = tmp.path().join("d");
        write(&d.join("real.txt"), "r");
        std::os::unix::fs::symlink(&outside, d.join("link.txt")).unwrap();

        let (tasks, _) = collect(&[d], "s3://bucket");
        assert_eq!(keys(&tasks), BTreeSet::from(["d/real.txt".to_string()]));
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_in_file_name_is_not_a_separator() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path().join("d");
        write(&d.join("a\\b.txt"), "escaped");
        write(&d.join("a").join("b.txt"), "nested");

        let (tasks, summary) = collect(&[d], "s3://bucket/pre");

        assert_eq!(summary.queued, 2);
        assert_eq!(
            keys(&tasks),
            BTreeSet::from(["pre/d/a\\b.txt".to_string(), "pre/d/a/b.txt".to_string()])
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path().join("d");
        write(&d.join("before.txt"), "b");
        write(&d.join("locked").join("hidden.txt"), "h");
        write(&d.join("zafter").join("after.txt"), "a");

        let locked = d.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root can read the directory anyway
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let (tasks, summary) = collect(&[d], "s3://bucket/pre");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(
            keys(&tasks),
            BTreeSet::from([
                "pre/d/before.txt".to_string(),
                "pre/d/zafter/after.txt".to_string()
            ])
        );
        assert_eq!(summary.queued, 2);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_closed_queue_stops_walk() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path().join("d");
        write(&d.join("a.txt"), "a");
        write(&d.join("b.txt"), "b");

        let destination = Destination::parse("s3://bucket").unwrap();
        let (tx, rx) = async_channel::bounded(1);
        drop(rx);

        let summary = walk(&[d], &destination, &tx);
        assert_eq!(summary.queued, 0);
    }
}
