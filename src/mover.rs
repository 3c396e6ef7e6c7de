//! Execute change sets against the filesystem with a bounded worker pool.
//!
//! Two movers share the manifest and pool plumbing: [`StagingMover`] relays
//! TV episodes through a staging directory before an atomic-per-file rename
//! into the target, and [`BatchMover`] copies movies straight to the target
//! with whole-batch rollback on failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::changes::ChangeEntry;
use crate::logger::RunLog;
use crate::walk::{self, FileOperation};

/// Partial finalize runs after every N successfully staged files.
/// A throughput/risk tradeoff, not a correctness requirement.
const CHECKPOINT_INTERVAL: usize = 5;

/// Shared interrupt flag, set from the ctrl-c handler and polled by workers.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Terminal state of a staged run.
#[derive(Debug)]
pub enum MoveOutcome {
    Complete {
        moved: usize,
    },
    /// Staged and finalized counts disagree; the staging directory is kept
    /// so the next run can retry the leftovers.
    FailedPartial {
        staged: usize,
        finalized: usize,
        missing: Vec<PathBuf>,
    },
}

impl MoveOutcome {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Settings shared by both movers.
#[derive(Debug, Clone, Copy)]
pub struct MoverOptions {
    /// Worker pool size for the per-file operations.
    pub workers: usize,
    /// Replace existing destination files instead of skipping them.
    pub overwrite: bool,
    /// Build and print the manifest, move nothing.
    pub dryrun: bool,
}

/// Drop entries the `keep` predicate rejects, sort by destination for a
/// deterministic, reviewable manifest, and log it.
fn build_manifest(
    changes: Vec<ChangeEntry>,
    log: &RunLog,
    mut keep: impl FnMut(&ChangeEntry) -> bool,
) -> Vec<ChangeEntry> {
    log.header("processing duplicates");

    let mut manifest: Vec<ChangeEntry> = changes
        .into_iter()
        .filter(|entry| {
            let kept = keep(entry);
            if !kept {
                log.message(&format!("[SKIP] {}", entry.new_name()));
            }
            kept
        })
        .collect();

    manifest.sort_by(|a, b| a.destination.cmp(&b.destination));

    if manifest.is_empty() {
        log.header("no changes");
    } else {
        log.header("deployment manifest");
        for (idx, entry) in manifest.iter().enumerate() {
            log.message(&format!("[{:02}] {}", idx, entry.destination.display()));
        }
        log.divider();
    }

    manifest
}

fn lock_into_inner<T>(mutex: Mutex<T>) -> T {
    mutex.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Moves TV episodes through a staging directory mirroring the final target
/// layout, then renames staged files into place.
pub struct StagingMover<'a> {
    stage_root: PathBuf,
    target_root: PathBuf,
    operation: FileOperation,
    options: MoverOptions,
    pool: rayon::ThreadPool,
    log: &'a RunLog,
    cancel: CancelFlag,
}

impl<'a> StagingMover<'a> {
    /// Create a mover with a bounded worker pool.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be built.
    pub fn new(
        stage_root: &Path,
        target_root: &Path,
        operation: FileOperation,
        options: MoverOptions,
        log: &'a RunLog,
        cancel: CancelFlag,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(options.workers).build()?;
        Ok(Self {
            stage_root: stage_root.to_path_buf(),
            target_root: target_root.to_path_buf(),
            operation,
            options,
            pool,
            log,
            cancel,
        })
    }

    /// Staging-side mirror of a target destination path.
    fn stage_path(&self, destination: &Path) -> PathBuf {
        destination.strip_prefix(&self.target_root).map_or_else(
            |_| self.stage_root.join(destination.file_name().unwrap_or_default()),
            |relative| self.stage_root.join(relative),
        )
    }

    /// Run the full staged state machine for one change set:
    /// manifest → staged (checkpointed) → finalized → complete or partial.
    ///
    /// # Errors
    /// Returns an error if the run is interrupted or the staging root is
    /// unusable. Per-file failures do not error; they surface in the outcome.
    pub fn run(&self, changes: Vec<ChangeEntry>) -> Result<MoveOutcome> {
        let overwrite = self.options.overwrite;
        let manifest = build_manifest(changes, self.log, |entry| {
            let at_target = !overwrite && entry.destination.is_file();
            let at_stage = self.stage_path(&entry.destination).is_file();
            !at_target && !at_stage
        });

        if self.options.dryrun {
            self.log.message("dryrun: nothing moved");
            return Ok(MoveOutcome::Complete { moved: 0 });
        }

        walk::ensure_directory(&self.stage_root)?;

        let mut staged_total = 0;
        let mut finalized_total = 0;
        let mut failures = Vec::new();

        for chunk in manifest.chunks(CHECKPOINT_INTERVAL) {
            let (staged, failed) = self.stage_entries(chunk)?;
            staged_total += staged;
            failures.extend(failed);
            // Checkpoint: push already-staged files through to the target
            finalized_total += self.finalize_pass()?;
        }

        if !failures.is_empty() {
            self.log.message(&format!("retrying {} failed moves", failures.len()));
            let (staged, still_failed) = self.stage_entries(&failures)?;
            staged_total += staged;
            // Clean up half-processed files for re-attempting on a later run
            for entry in &still_failed {
                let _ = walk::remove_file_if_exists(&self.stage_path(&entry.destination));
            }
        }

        finalized_total += self.finalize_pass()?;

        let missing = self.remaining_staged_files();
        if missing.is_empty() {
            walk::reset_directory(&self.stage_root)?;
            self.log.header("deployment complete");
            Ok(MoveOutcome::Complete { moved: finalized_total })
        } else {
            self.log.header("deployment failed");
            self.log
                .message(&format!("staged {staged_total} files but finalized {finalized_total}"));
            for path in &missing {
                self.log.message(&format!("[MISSING] {}", path.display()));
            }
            self.log.message("staging directory retained for inspection and retry");
            Ok(MoveOutcome::FailedPartial {
                staged: staged_total,
                finalized: finalized_total,
                missing,
            })
        }
    }

    /// Stage a batch of entries concurrently. Returns the staged count and
    /// the entries that failed.
    ///
    /// # Errors
    /// Returns an error when interrupted, after best-effort undo of the
    /// moves this batch already made.
    fn stage_entries(&self, entries: &[ChangeEntry]) -> Result<(usize, Vec<ChangeEntry>)> {
        let staged = Mutex::new(Vec::new());
        let failures = Mutex::new(Vec::new());

        self.pool.install(|| {
            entries.par_iter().for_each(|entry| {
                if self.cancel.is_cancelled() {
                    return;
                }
                let stage_path = self.stage_path(&entry.destination);
                // Raced by another process between manifest and execution
                if stage_path.is_file() || (!self.options.overwrite && entry.destination.is_file()) {
                    self.log.message(&format!("[SKIP] {}", entry.new_name()));
                    return;
                }

                self.log
                    .message(&format!("[MOVE] {} ({})", entry.new_name(), entry.old_name()));

                let result = stage_path
                    .parent()
                    .map_or_else(
                        || Ok(()),
                        walk::ensure_directory,
                    )
                    .and_then(|()| self.operation.execute(&entry.source, &stage_path));

                match result {
                    Ok(()) => {
                        self.log.message(&format!("[DONE] {}", entry.new_name()));
                        if let Ok(mut staged) = staged.lock() {
                            staged.push((entry.source.clone(), stage_path));
                        }
                    }
                    Err(e) => {
                        self.log.message(&format!("[FAIL] {}: {e:#}", entry.new_name()));
                        let _ = walk::remove_file_if_exists(&stage_path);
                        if let Ok(mut failures) = failures.lock() {
                            failures.push(entry.clone());
                        }
                    }
                }
            });
        });

        let staged = lock_into_inner(staged);
        if self.cancel.is_cancelled() {
            // Staged copies are discarded; staged renames go back to the
            // source, since the staged file is the only remaining copy
            for (source, staged_path) in &staged {
                let _ = self.operation.undo(source, staged_path);
            }
            anyhow::bail!("Interrupted; undid {} staged moves", staged.len());
        }

        Ok((staged.len(), lock_into_inner(failures)))
    }

    /// Rename every staged file into its final target location.
    ///
    /// Re-runnable: files no longer present in staging are simply skipped,
    /// so a later run can finish what a failed one left behind. Per-file
    /// failures are logged and leave the staged file in place.
    ///
    /// # Errors
    /// Returns an error if a target directory cannot be created.
    fn finalize_pass(&self) -> Result<usize> {
        if !self.stage_root.exists() {
            return Ok(0);
        }

        let mut moved = 0;
        for staged_file in self.remaining_staged_files() {
            let Ok(relative) = staged_file.strip_prefix(&self.stage_root) else {
                continue;
            };
            let target = self.target_root.join(relative);

            if target.is_file() {
                if self.options.overwrite {
                    walk::remove_file_if_exists(&target)?;
                } else {
                    // A duplicate, not a failure: drop the staged copy so it
                    // does not get reported as missing on every later run
                    self.log
                        .message(&format!("[SKIP] target exists: {}", target.display()));
                    let _ = walk::remove_file_if_exists(&staged_file);
                    continue;
                }
            }

            if let Some(parent) = target.parent() {
                walk::ensure_directory(parent)?;
            }
            match FileOperation::Rename.execute(&staged_file, &target) {
                Ok(()) => moved += 1,
                Err(e) => self.log.message(&format!("[FAIL] finalize {}: {e:#}", target.display())),
            }
        }
        Ok(moved)
    }

    /// Files still sitting in the staging tree.
    fn remaining_staged_files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.stage_root)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .collect()
    }
}

/// Moves files straight from source to target without staging.
///
/// With `rollback_on_failure` set (the movie policy) any per-file failure
/// aborts the batch and undoes every move already completed; without it
/// (TV specials and in-place cleaning) failures are logged, their
/// half-written copies removed, and the rest of the batch proceeds.
pub struct BatchMover<'a> {
    operation: FileOperation,
    options: MoverOptions,
    rollback_on_failure: bool,
    pool: rayon::ThreadPool,
    log: &'a RunLog,
    cancel: CancelFlag,
}

impl<'a> BatchMover<'a> {
    /// Create a mover with a bounded worker pool.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be built.
    pub fn new(
        operation: FileOperation,
        options: MoverOptions,
        rollback_on_failure: bool,
        log: &'a RunLog,
        cancel: CancelFlag,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(options.workers).build()?;
        Ok(Self {
            operation,
            options,
            rollback_on_failure,
            pool,
            log,
            cancel,
        })
    }

    /// Execute a change set concurrently. Returns the number of files moved.
    ///
    /// # Errors
    /// Returns an error when interrupted or, under the rollback policy, when
    /// any entry fails.
    pub fn run(&self, changes: Vec<ChangeEntry>) -> Result<usize> {
        let overwrite = self.options.overwrite;
        let manifest = build_manifest(changes, self.log, |entry| overwrite || !entry.destination.is_file());

        if self.options.dryrun {
            self.log.message("dryrun: nothing moved");
            return Ok(0);
        }

        let completed = Mutex::new(Vec::new());
        let failures = Mutex::new(Vec::new());

        self.pool.install(|| {
            manifest.par_iter().for_each(|entry| {
                if self.cancel.is_cancelled() {
                    return;
                }
                if !self.options.overwrite && entry.destination.is_file() {
                    self.log.message(&format!("[SKIP] {}", entry.new_name()));
                    return;
                }

                self.log
                    .message(&format!("[MOVE] {} ({})", entry.new_name(), entry.old_name()));

                let result = entry
                    .destination
                    .parent()
                    .map_or_else(|| Ok(()), walk::ensure_directory)
                    .and_then(|()| self.operation.execute(&entry.source, &entry.destination));

                match result {
                    Ok(()) => {
                        self.log.message(&format!("[DONE] {}", entry.new_name()));
                        if let Ok(mut completed) = completed.lock() {
                            completed.push(entry.clone());
                        }
                    }
                    Err(e) => {
                        self.log.message(&format!("[FAIL] {}: {e:#}", entry.new_name()));
                        if let Ok(mut failures) = failures.lock() {
                            failures.push(entry.clone());
                        }
                    }
                }
            });
        });

        let completed = lock_into_inner(completed);
        let failures = lock_into_inner(failures);

        if self.cancel.is_cancelled() {
            // Completed copies are discarded; completed renames go back to
            // the source, since the destination is the only remaining copy
            for entry in &completed {
                let _ = self.operation.undo(&entry.source, &entry.destination);
            }
            anyhow::bail!("Interrupted; undid {} completed moves", completed.len());
        }

        if !failures.is_empty() {
            if self.rollback_on_failure {
                // Coarse policy: the whole batch is rolled back
                for entry in &completed {
                    let _ = self.operation.undo(&entry.source, &entry.destination);
                }
                if self.operation == FileOperation::Copy {
                    for entry in &failures {
                        let _ = walk::remove_file_if_exists(&entry.destination);
                    }
                }
                anyhow::bail!(
                    "{} moves failed; rolled back {} completed moves",
                    failures.len(),
                    completed.len()
                );
            }
            // A failed rename leaves nothing behind; a failed copy may leave
            // a half-written destination to clean up for re-attempting
            if self.operation == FileOperation::Copy {
                for entry in &failures {
                    let _ = walk::remove_file_if_exists(&entry.destination);
                }
            }
        }

        Ok(completed.len())
    }

    /// Move entries one at a time, logging and continuing past failures.
    /// Used for oddly-named specials, which skip the staged path entirely.
    pub fn run_sequential(&self, entries: &[ChangeEntry]) -> usize {
        let mut moved = 0;
        for entry in entries {
            if self.cancel.is_cancelled() {
                break;
            }
            if self.options.dryrun {
                self.log
                    .message(&format!("[DRYRUN] {} ({})", entry.new_name(), entry.old_name()));
                continue;
            }
            if !self.options.overwrite && entry.destination.is_file() {
                self.log.message(&format!("[SKIP] {}", entry.new_name()));
                continue;
            }

            self.log
                .message(&format!("[MOVE] {} ({})", entry.new_name(), entry.old_name()));

            let result = entry
                .destination
                .parent()
                .map_or_else(|| Ok(()), walk::ensure_directory)
                .and_then(|()| self.operation.execute(&entry.source, &entry.destination));

            match result {
                Ok(()) => {
                    self.log.message(&format!("[DONE] {}", entry.new_name()));
                    moved += 1;
                }
                Err(e) => self.log.message(&format!("[FAIL] {}: {e:#}", entry.new_name())),
            }
        }
        moved
    }
}

#[cfg(test)]
mod mover_tests {
    use super::*;

    use std::fs::{self, File};
    use std::io::Write;

    use tempfile::tempdir;

    fn options() -> MoverOptions {
        MoverOptions {
            workers: 2,
            overwrite: false,
            dryrun: false,
        }
    }

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("should create parent");
        }
        let mut file = File::create(path).expect("should create file");
        write!(file, "{content}").expect("should write file");
    }

    fn change(source: &Path, destination: &Path) -> ChangeEntry {
        ChangeEntry::new(source, destination)
    }

    #[test]
    fn staging_run_moves_files_and_clears_stage() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        let src_a = source.join("Show.S01E01.mkv");
        let src_b = source.join("Show.S01E02.mkv");
        write_file(&src_a, "a");
        write_file(&src_b, "b");

        let log = RunLog::disabled();
        let mover = StagingMover::new(&stage, &target, FileOperation::Copy, options(), &log, CancelFlag::new())
            .expect("should create mover");

        let changes = vec![
            change(&src_a, &target.join("Show/s01/s01e01.mkv")),
            change(&src_b, &target.join("Show/s01/s01e02.mkv")),
        ];
        let outcome = mover.run(changes).expect("run should succeed");

        assert!(outcome.is_complete());
        assert!(target.join("Show/s01/s01e01.mkv").is_file());
        assert!(target.join("Show/s01/s01e02.mkv").is_file());
        // Stage was cleared and recreated empty
        assert!(stage.is_dir());
        assert_eq!(fs::read_dir(&stage).expect("should read stage").count(), 0);
        // Copy leaves sources in place
        assert!(src_a.is_file());
    }

    #[test]
    fn staging_run_skips_existing_destinations() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");

        let src = source.join("Show.S01E01.mkv");
        write_file(&src, "new");
        let existing = target.join("Show/s01/s01e01.mkv");
        write_file(&existing, "old");

        let log = RunLog::disabled();
        let mover = StagingMover::new(&stage, &target, FileOperation::Copy, options(), &log, CancelFlag::new())
            .expect("should create mover");

        let outcome = mover.run(vec![change(&src, &existing)]).expect("run should succeed");

        assert!(matches!(outcome, MoveOutcome::Complete { moved: 0 }));
        assert_eq!(fs::read_to_string(&existing).expect("should read"), "old");
    }

    #[test]
    fn staging_run_overwrite_replaces_existing() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");

        let src = source.join("Show.S01E01.mkv");
        write_file(&src, "new");
        let existing = target.join("Show/s01/s01e01.mkv");
        write_file(&existing, "old");

        let log = RunLog::disabled();
        let mut opts = options();
        opts.overwrite = true;
        let mover = StagingMover::new(&stage, &target, FileOperation::Copy, opts, &log, CancelFlag::new())
            .expect("should create mover");

        let outcome = mover.run(vec![change(&src, &existing)]).expect("run should succeed");

        assert!(matches!(outcome, MoveOutcome::Complete { moved: 1 }));
        assert_eq!(fs::read_to_string(&existing).expect("should read"), "new");
    }

    #[test]
    fn staging_run_reports_partial_failure_and_keeps_stage() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");

        let src = source.join("Show.S01E01.mkv");
        write_file(&src, "a");
        // A leftover staged file whose target path is blocked by a directory,
        // so finalize cannot commit it
        write_file(&stage.join("Show/s01/blocked.mkv"), "leftover");
        fs::create_dir_all(target.join("Show/s01/blocked.mkv")).expect("should create blocking dir");

        let log = RunLog::disabled();
        let mover = StagingMover::new(&stage, &target, FileOperation::Copy, options(), &log, CancelFlag::new())
            .expect("should create mover");

        let outcome = mover
            .run(vec![change(&src, &target.join("Show/s01/s01e01.mkv"))])
            .expect("run should succeed");

        match outcome {
            MoveOutcome::FailedPartial { missing, .. } => {
                assert_eq!(missing.len(), 1);
                assert!(missing[0].ends_with("Show/s01/blocked.mkv"));
            }
            MoveOutcome::Complete { .. } => panic!("expected partial failure"),
        }
        // The healthy file still made it over; the stage is retained
        assert!(target.join("Show/s01/s01e01.mkv").is_file());
        assert!(stage.join("Show/s01/blocked.mkv").is_file());
    }

    #[test]
    fn staging_run_interrupted_cleans_up_and_bails() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        let src = source.join("Show.S01E01.mkv");
        write_file(&src, "a");

        let log = RunLog::disabled();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mover = StagingMover::new(&stage, &target, FileOperation::Copy, options(), &log, cancel)
            .expect("should create mover");

        let result = mover.run(vec![change(&src, &target.join("Show/s01/s01e01.mkv"))]);
        assert!(result.is_err());
        assert!(!target.join("Show/s01/s01e01.mkv").exists());
    }

    #[test]
    fn staging_run_retry_pass_recovers_transient_failures() {
        let dir = tempdir().expect("should create tempdir");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");
        fs::create_dir_all(&stage).expect("should create stage");
        fs::create_dir_all(&target).expect("should create target");

        let src = dir.path().join("source/ep.mkv");
        write_file(&src, "episode");
        // A file sits where the first entry's stage directory must go, so its
        // first attempt fails. The blocker is itself the source of a later
        // entry: staging that entry renames it away, and the retry pass gets
        // a clear path.
        let blocker = stage.join("a");
        write_file(&blocker, "misplaced");

        let log = RunLog::disabled();
        let mut opts = options();
        opts.workers = 1;
        let mover = StagingMover::new(&stage, &target, FileOperation::Rename, opts, &log, CancelFlag::new())
            .expect("should create mover");

        let changes = vec![
            change(&src, &target.join("a/ep.mkv")),
            change(&blocker, &target.join("zzz/blocker.mkv")),
        ];
        let outcome = mover.run(changes).expect("run should succeed");

        assert!(matches!(outcome, MoveOutcome::Complete { moved: 2 }));
        assert!(target.join("a/ep.mkv").is_file());
        assert!(target.join("zzz/blocker.mkv").is_file());
        assert!(!src.exists());
    }

    #[test]
    fn finalize_drops_staged_duplicates() {
        let dir = tempdir().expect("should create tempdir");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");

        // A leftover staged file whose target already exists: a duplicate,
        // not a failure, so the run must complete and stop reporting it
        write_file(&stage.join("Show/s01/s01e01.mkv"), "staged");
        let existing = target.join("Show/s01/s01e01.mkv");
        write_file(&existing, "old");

        let log = RunLog::disabled();
        let mover = StagingMover::new(&stage, &target, FileOperation::Copy, options(), &log, CancelFlag::new())
            .expect("should create mover");

        let outcome = mover.run(Vec::new()).expect("run should succeed");

        assert!(matches!(outcome, MoveOutcome::Complete { moved: 0 }));
        assert_eq!(fs::read_to_string(&existing).expect("should read"), "old");
        assert_eq!(fs::read_dir(&stage).expect("should read stage").count(), 0);
    }

    #[test]
    fn batch_run_moves_files_directly() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        let src = source.join("Movie.2010.mkv");
        write_file(&src, "movie");

        let log = RunLog::disabled();
        let mover = BatchMover::new(FileOperation::Copy, options(), true, &log, CancelFlag::new())
            .expect("should create mover");

        let moved = mover
            .run(vec![change(&src, &target.join("Movie_(2010).mkv"))])
            .expect("run should succeed");

        assert_eq!(moved, 1);
        assert!(target.join("Movie_(2010).mkv").is_file());
    }

    #[test]
    fn batch_run_rolls_back_whole_batch_on_failure() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        let good = source.join("Good.2010.mkv");
        write_file(&good, "ok");
        let missing = source.join("Vanished.2011.mkv");

        let log = RunLog::disabled();
        let mover = BatchMover::new(FileOperation::Copy, options(), true, &log, CancelFlag::new())
            .expect("should create mover");

        let result = mover.run(vec![
            change(&good, &target.join("Good_(2010).mkv")),
            change(&missing, &target.join("Vanished_(2011).mkv")),
        ]);

        assert!(result.is_err());
        // The successful copy was rolled back along with the rest
        assert!(!target.join("Good_(2010).mkv").exists());
    }

    #[test]
    fn batch_run_without_rollback_keeps_successes() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        let good = source.join("Show.S01E01.mkv");
        write_file(&good, "ok");
        let missing = source.join("Show.S01E02.mkv");

        let log = RunLog::disabled();
        let mover = BatchMover::new(FileOperation::Copy, options(), false, &log, CancelFlag::new())
            .expect("should create mover");

        let moved = mover
            .run(vec![
                change(&good, &target.join("s01e01.mkv")),
                change(&missing, &target.join("s01e02.mkv")),
            ])
            .expect("run should succeed");

        assert_eq!(moved, 1);
        assert!(target.join("s01e01.mkv").is_file());
        assert!(!target.join("s01e02.mkv").exists());
    }

    #[test]
    fn batch_rename_interrupt_keeps_every_file() {
        let dir = tempdir().expect("should create tempdir");
        let old_dir = dir.path().join("old");
        let new_dir = dir.path().join("new");
        fs::create_dir_all(&new_dir).expect("should create new dir");

        let names: Vec<String> = (0..200).map(|i| format!("clip{i:03}.mkv")).collect();
        for name in &names {
            write_file(&old_dir.join(name), name);
        }
        let changes: Vec<ChangeEntry> = names
            .iter()
            .map(|name| change(&old_dir.join(name), &new_dir.join(name)))
            .collect();

        let log = RunLog::disabled();
        let cancel = CancelFlag::new();
        let mover = BatchMover::new(FileOperation::Rename, options(), false, &log, cancel.clone())
            .expect("should create mover");

        // Interrupt mid-run, once the first rename has landed
        let watcher_flag = cancel.clone();
        let watcher_dir = new_dir.clone();
        let watcher = std::thread::spawn(move || {
            while fs::read_dir(&watcher_dir).map_or(0, std::iter::Iterator::count) == 0 {
                std::thread::sleep(std::time::Duration::from_micros(100));
            }
            watcher_flag.cancel();
        });

        // Interrupted runs error, a run that won the race completes; either
        // way a rename must never leave a file at neither location
        let _ = mover.run(changes);
        watcher.join().expect("watcher should finish");

        for name in &names {
            assert!(
                old_dir.join(name).is_file() || new_dir.join(name).is_file(),
                "{name} vanished after interrupt"
            );
        }
    }

    #[test]
    fn run_sequential_continues_past_failures() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        let good = source.join("extras.mkv");
        write_file(&good, "ok");
        let missing = source.join("gone.mkv");

        let log = RunLog::disabled();
        let mover = BatchMover::new(FileOperation::Copy, options(), false, &log, CancelFlag::new())
            .expect("should create mover");

        let moved = mover.run_sequential(&[
            change(&missing, &target.join("s00/gone.mkv")),
            change(&good, &target.join("s00/extras.mkv")),
        ]);

        assert_eq!(moved, 1);
        assert!(target.join("s00/extras.mkv").is_file());
    }

    #[test]
    fn dryrun_moves_nothing() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        let src = source.join("Show.S01E01.mkv");
        write_file(&src, "a");

        let log = RunLog::disabled();
        let mut opts = options();
        opts.dryrun = true;
        let mover = StagingMover::new(&stage, &target, FileOperation::Copy, opts, &log, CancelFlag::new())
            .expect("should create mover");

        let outcome = mover
            .run(vec![change(&src, &target.join("Show/s01/s01e01.mkv"))])
            .expect("run should succeed");

        assert!(matches!(outcome, MoveOutcome::Complete { moved: 0 }));
        assert!(!target.join("Show/s01/s01e01.mkv").exists());
        assert!(!stage.exists());
    }
}
