use crate::domain::clips::ARCHIVE_NAME;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Output locations owned by a single job.
///
/// Everything lives under `<output_root>/<job id>/`, so concurrent jobs never
/// share a clip directory or archive.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    pub id: String,
    pub dir: PathBuf,
    pub clips_dir: PathBuf,
    pub archive_path: PathBuf,
}

pub fn new_job_id() -> String {
    Uuid::new_v4().to_string()
}

impl JobWorkspace {
    pub fn create(output_root: &Path, id: &str) -> io::Result<Self> {
        let dir = output_root.join(id);
        let clips_dir = dir.join("clips");
        std::fs::create_dir_all(&clips_dir)?;

        Ok(Self {
            id: id.to_string(),
            archive_path: dir.join(ARCHIVE_NAME),
            dir,
            clips_dir,
        })
    }

    /// Remove everything the job wrote.
    pub fn discard(&self) -> io::Result<()> {
        match std::fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Job workspaces under one output root, bounded to the `keep` most recent
/// finished jobs. Running jobs are never pruned.
pub struct WorkspaceRetention {
    root: PathBuf,
    keep: usize,
    active: Mutex<HashSet<String>>,
}

/// Workspace of a running job. Dropping it marks the job finished.
pub struct ActiveJob<'a> {
    retention: &'a WorkspaceRetention,
    pub workspace: JobWorkspace,
}

impl WorkspaceRetention {
    pub fn new(root: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            root: root.into(),
            keep,
            active: Mutex::new(HashSet::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the workspace for a new job, then prune the oldest finished
    /// jobs beyond the retention bound.
    pub fn open(&self, id: &str) -> io::Result<ActiveJob<'_>> {
        let workspace = JobWorkspace::create(&self.root, id)?;
        let active = {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            active.insert(id.to_string());
            active.clone()
        };

        match prune_workspaces(&self.root, self.keep, &active) {
            Ok(0) => {}
            Ok(removed) => debug!("Pruned {} old job directories", removed),
            Err(e) => warn!("Could not prune job directories in {:?}: {}", self.root, e),
        }

        Ok(ActiveJob {
            retention: self,
            workspace,
        })
    }
}

impl Drop for ActiveJob<'_> {
    fn drop(&mut self) {
        self.retention
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.workspace.id);
    }
}

/// Remove the least recently modified job directories under `root` so that
/// at most `keep` remain, ignoring the ones named in `active`. Returns how
/// many were removed.
pub fn prune_workspaces(root: &Path, keep: usize, active: &HashSet<String>) -> io::Result<usize> {
    let mut finished = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if metadata.is_dir() && !active.contains(&name) {
            finished.push((metadata.modified()?, entry.path()));
        }
    }
    if finished.len() <= keep {
        return Ok(0);
    }

    finished.sort();
    let excess = finished.len() - keep;
    let mut removed = 0;
    for (_, dir) in finished.into_iter().take(excess) {
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove job directory {:?}: {}", dir, e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn age(dir: &Path, secs: u64) {
        let when = SystemTime::now() - Duration::from_secs(secs);
        File::open(dir).unwrap().set_modified(when).unwrap();
    }

    #[test]
    fn test_workspaces_are_scoped_by_job() {
        let root = tempdir().unwrap();
        let a = JobWorkspace::create(root.path(), &new_job_id()).unwrap();
        let b = JobWorkspace::create(root.path(), &new_job_id()).unwrap();

        assert_ne!(a.dir, b.dir);
        assert!(a.clips_dir.is_dir());
        assert_eq!(a.archive_path, a.dir.join("highlights.zip"));
        assert!(a.archive_path.starts_with(root.path()));
    }

    #[test]
    fn test_discard_removes_job_directory() {
        let root = tempdir().unwrap();
        let workspace = JobWorkspace::create(root.path(), "job-1").unwrap();
        std::fs::write(workspace.clips_dir.join("highlight_0.mp4"), b"x").unwrap();

        workspace.discard().unwrap();
        assert!(!workspace.dir.exists());
        // Discarding twice is harmless.
        workspace.discard().unwrap();
    }

    #[test]
    fn test_open_prunes_oldest_finished_jobs() {
        let root = tempdir().unwrap();
        let retention = WorkspaceRetention::new(root.path(), 2);

        for (id, secs) in [("job-a", 300), ("job-b", 200), ("job-c", 100)] {
            drop(retention.open(id).unwrap());
            age(&root.path().join(id), secs);
        }
        let _next = retention.open("job-d").unwrap();

        assert!(!root.path().join("job-a").exists());
        for id in ["job-b", "job-c", "job-d"] {
            assert!(root.path().join(id).is_dir(), "{} was pruned", id);
        }
    }

    #[test]
    fn test_running_jobs_are_never_pruned() {
        let root = tempdir().unwrap();
        let retention = WorkspaceRetention::new(root.path(), 1);

        let running = retention.open("job-running").unwrap();
        age(&running.workspace.dir, 500);
        for (id, secs) in [("job-old", 300), ("job-new", 100)] {
            drop(retention.open(id).unwrap());
            age(&root.path().join(id), secs);
        }
        let _next = retention.open("job-next").unwrap();

        assert!(running.workspace.clips_dir.is_dir());
        assert!(!root.path().join("job-old").exists());
        assert!(root.path().join("job-new").is_dir());
    }

    #[test]
    fn test_prune_within_bound_removes_nothing() {
        let root = tempdir().unwrap();
        JobWorkspace::create(root.path(), "job-1").unwrap();
        std::fs::write(root.path().join("stray.txt"), b"x").unwrap();

        assert_eq!(prune_workspaces(root.path(), 1, &HashSet::new()).unwrap(), 0);
        assert!(root.path().join("job-1").is_dir());
    }
}
