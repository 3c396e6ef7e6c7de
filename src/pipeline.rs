//! End-to-end pipelines behind the two binaries.
//!
//! Each pipeline run is: enumerate, build a change set, hand it to a mover.
//! All decisions about names live in [`crate::cleaner`] and
//! [`crate::changes`]; all filesystem effects live in [`crate::mover`].

use std::path::{Path, PathBuf};

use anyhow::Result;
use itertools::Itertools;

use crate::changes::{ChangeEntry, movie_changes, show_changes};
use crate::classify::classify;
use crate::config::{MoviesConfig, TvConfig};
use crate::logger::RunLog;
use crate::mover::{BatchMover, CancelFlag, MoveOutcome, MoverOptions, StagingMover};
use crate::walk::{self, FileOperation, choose_operation};

/// Moves movies straight from source to target with batch rollback.
pub struct MoviePipeline<'a> {
    source_root: PathBuf,
    target_root: PathBuf,
    /// Restrict to the preferred container formats.
    preferred_only: bool,
    options: MoverOptions,
    log: &'a RunLog,
    cancel: CancelFlag,
}

impl<'a> MoviePipeline<'a> {
    /// Build a movie pipeline from validated config paths.
    ///
    /// # Errors
    /// Returns an error if the config is incomplete or either root is
    /// missing.
    pub fn new(
        config: &MoviesConfig,
        preferred_only: bool,
        options: MoverOptions,
        log: &'a RunLog,
        cancel: CancelFlag,
    ) -> Result<Self> {
        config.validate()?;
        let source_root = existing_directory(&config.source_path)?;
        let target_root = existing_directory(&config.target_path)?;
        Ok(Self {
            source_root,
            target_root,
            preferred_only,
            options,
            log,
            cancel,
        })
    }

    /// Run the movie pipeline. Returns the number of files moved.
    ///
    /// # Errors
    /// Returns an error when interrupted or when the batch fails and gets
    /// rolled back.
    pub fn run(&self) -> Result<usize> {
        self.log.header("movie move");
        self.log.message(&format!(
            "{} -> {}",
            self.source_root.display(),
            self.target_root.display()
        ));

        let files = walk::list_files(&self.source_root)?;
        let (videos, subtitles) = classify(&files, self.preferred_only);
        let change_set = movie_changes(&videos, &subtitles, &self.target_root);

        for name in &change_set.skipped {
            self.log.message(&format!("[SKIP] could not resolve name: {name}"));
        }

        let operation = choose_operation(&self.source_root, &self.target_root);
        let mover = BatchMover::new(operation, self.options, true, self.log, self.cancel.clone())?;
        let moved = mover.run(change_set.changes)?;

        self.log.message(&format!("Moved {moved} files"));
        Ok(moved)
    }
}

/// Moves TV episodes through the staging directory, show by show.
pub struct TvPipeline<'a> {
    source_root: PathBuf,
    stage_root: PathBuf,
    target_root: PathBuf,
    options: MoverOptions,
    log: &'a RunLog,
    cancel: CancelFlag,
}

impl<'a> TvPipeline<'a> {
    /// Build a TV pipeline from validated config paths.
    ///
    /// The staging root is created on demand by the mover, so only source
    /// and target have to exist up front.
    ///
    /// # Errors
    /// Returns an error if the config is incomplete or a root is missing.
    pub fn new(config: &TvConfig, options: MoverOptions, log: &'a RunLog, cancel: CancelFlag) -> Result<Self> {
        config.validate()?;
        let source_root = existing_directory(&config.source_path)?;
        let target_root = existing_directory(&config.target_path)?;
        Ok(Self {
            source_root,
            stage_root: PathBuf::from(&config.staging_path),
            target_root,
            options,
            log,
            cancel,
        })
    }

    /// Run the staged TV pipeline over every show folder under the source.
    ///
    /// # Errors
    /// Returns an error when interrupted or when enumeration fails; per-file
    /// move failures surface in the outcome instead.
    pub fn run(&self) -> Result<MoveOutcome> {
        self.log.header("tv move");
        self.log.message(&format!(
            "{} -> {}",
            self.source_root.display(),
            self.target_root.display()
        ));

        let (episodes, specials) = self.collect_changes(&self.source_root)?;

        let operation = choose_operation(&self.source_root, &self.target_root);
        let mover = StagingMover::new(
            &self.stage_root,
            &self.target_root,
            operation,
            self.options,
            self.log,
            self.cancel.clone(),
        )?;
        let outcome = mover.run(episodes)?;

        if !specials.is_empty() {
            self.log.header("specials");
            let batch = BatchMover::new(operation, self.options, false, self.log, self.cancel.clone())?;
            let moved = batch.run_sequential(&specials);
            self.log.message(&format!("Moved {moved} specials"));
        }

        Ok(outcome)
    }

    /// Clean episode names in place on the target tree, without staging.
    ///
    /// Renames never cross a storage boundary here, so failures leave the
    /// original files untouched and there is nothing to roll back.
    ///
    /// # Errors
    /// Returns an error when interrupted or when enumeration fails.
    pub fn run_clean(&self) -> Result<usize> {
        self.log.header("tv clean");
        self.log.message(&format!("cleaning in place: {}", self.target_root.display()));

        let (episodes, specials) = self.collect_changes(&self.target_root)?;

        let mover = BatchMover::new(FileOperation::Rename, self.options, false, self.log, self.cancel.clone())?;
        let mut moved = mover.run(episodes)?;

        if !specials.is_empty() {
            self.log.header("specials");
            moved += mover.run_sequential(&specials);
        }

        self.log.message(&format!("Renamed {moved} files"));
        Ok(moved)
    }

    /// Walk every show folder under `root` and build the combined episode
    /// and specials change lists.
    fn collect_changes(&self, root: &Path) -> Result<(Vec<ChangeEntry>, Vec<ChangeEntry>)> {
        let mut episodes = Vec::new();
        let mut specials = Vec::new();

        let shows = walk::list_show_folders(root)?;
        self.log
            .message(&format!("Found {} shows: {}", shows.len(), shows.iter().join(", ")));

        for show in shows {
            if self.cancel.is_cancelled() {
                anyhow::bail!("Interrupted");
            }
            let files = walk::list_season_files(&root.join(&show))?;
            let set = show_changes(&show, &files, &self.target_root);
            self.log.message(&format!(
                "{}: {} episodes, {} specials",
                set.show_name,
                set.changes.len(),
                set.odd_names.len()
            ));
            episodes.extend(set.changes);
            specials.extend(set.odd_names);
        }

        Ok((episodes, specials))
    }
}

fn existing_directory(path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(path);
    if !path.is_dir() {
        anyhow::bail!("Directory does not exist: {}", path.display());
    }
    Ok(path)
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    use std::fs::{self, File};
    use std::io::Write;

    use tempfile::tempdir;

    use crate::path_to_string;

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

    fn movies_config(source: &Path, target: &Path) -> MoviesConfig {
        MoviesConfig {
            source_path: path_to_string(source),
            target_path: path_to_string(target),
        }
    }

    fn tv_config(source: &Path, stage: &Path, target: &Path) -> TvConfig {
        TvConfig {
            source_path: path_to_string(source),
            staging_path: path_to_string(stage),
            target_path: path_to_string(target),
            overwrite: false,
        }
    }

    #[test]
    fn movie_pipeline_moves_video_and_subtitle() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        write_file(&source.join("The.Matrix.1999.1080p.BluRay.x264-GROUP.mkv"), "video");
        write_file(&source.join("The.Matrix.1999.1080p.BluRay.x264-GROUP.srt"), "subs");
        write_file(&source.join("no.year.at.all.mkv"), "skipped");

        let log = RunLog::disabled();
        let pipeline = MoviePipeline::new(&movies_config(&source, &target), false, options(), &log, CancelFlag::new())
            .expect("should create pipeline");
        let moved = pipeline.run().expect("run should succeed");

        assert_eq!(moved, 2);
        assert!(target.join("The_Matrix_(1999).mkv").is_file());
        assert!(target.join("The_Matrix_(1999).eng.srt").is_file());
        assert!(!target.join("no.year.at.all.mkv").exists());
    }

    #[test]
    fn movie_pipeline_second_run_is_noop() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        write_file(&source.join("Movie.Name.2010.mkv"), "video");

        let log = RunLog::disabled();
        let pipeline = MoviePipeline::new(&movies_config(&source, &target), false, options(), &log, CancelFlag::new())
            .expect("should create pipeline");

        assert_eq!(pipeline.run().expect("first run should succeed"), 1);
        // The source still holds the file (copy semantics), but the
        // destination exists now, so nothing moves
        assert_eq!(pipeline.run().expect("second run should succeed"), 0);
    }

    #[test]
    fn tv_pipeline_moves_episodes_through_staging() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        write_file(&source.join("ShowName/Season 2/ShowName.S02E05.720p.mkv"), "ep");
        write_file(&source.join("ShowName/Season 2/random_clip.mkv"), "extra");

        let log = RunLog::disabled();
        let pipeline = TvPipeline::new(&tv_config(&source, &stage, &target), options(), &log, CancelFlag::new())
            .expect("should create pipeline");
        let outcome = pipeline.run().expect("run should succeed");

        assert!(outcome.is_complete());
        assert!(target.join("ShowName/s02/s02e05.mkv").is_file());
        assert!(target.join("ShowName/s00/random_clip.mkv").is_file());
        // Staging directory was reset after completion
        assert_eq!(fs::read_dir(&stage).expect("should read stage").count(), 0);
    }

    #[test]
    fn tv_pipeline_second_run_is_noop() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        write_file(&source.join("Show/s01/Show.S01E01.mkv"), "ep");

        let log = RunLog::disabled();
        let pipeline = TvPipeline::new(&tv_config(&source, &stage, &target), options(), &log, CancelFlag::new())
            .expect("should create pipeline");

        let first = pipeline.run().expect("first run should succeed");
        assert!(matches!(first, MoveOutcome::Complete { moved: 1 }));
        let second = pipeline.run().expect("second run should succeed");
        assert!(matches!(second, MoveOutcome::Complete { moved: 0 }));
    }

    #[test]
    fn tv_clean_renames_in_place() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");
        fs::create_dir_all(&source).expect("should create source");

        write_file(&target.join("Show/Season 1/Show.Name.S01E03.720p.WEB.mkv"), "ep");

        let log = RunLog::disabled();
        let pipeline = TvPipeline::new(&tv_config(&source, &stage, &target), options(), &log, CancelFlag::new())
            .expect("should create pipeline");
        let renamed = pipeline.run_clean().expect("clean should succeed");

        assert_eq!(renamed, 1);
        assert!(target.join("Show/s01/s01e03.mkv").is_file());
        // Rename semantics: the original is gone
        assert!(!target.join("Show/Season 1/Show.Name.S01E03.720p.WEB.mkv").exists());
        // Clean mode never touches staging
        assert!(!stage.exists());
    }

    #[test]
    fn pipelines_reject_missing_directories() {
        let dir = tempdir().expect("should create tempdir");
        let missing = dir.path().join("does-not-exist");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        let log = RunLog::disabled();
        assert!(
            MoviePipeline::new(
                &movies_config(&missing, &target),
                false,
                options(),
                &log,
                CancelFlag::new()
            )
            .is_err()
        );
        assert!(
            TvPipeline::new(
                &tv_config(&missing, &dir.path().join("stage"), &target),
                options(),
                &log,
                CancelFlag::new()
            )
            .is_err()
        );
    }

    #[test]
    fn tv_dryrun_moves_nothing() {
        let dir = tempdir().expect("should create tempdir");
        let source = dir.path().join("source");
        let stage = dir.path().join("stage");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).expect("should create target");

        write_file(&source.join("Show/s01/Show.S01E01.mkv"), "ep");

        let log = RunLog::disabled();
        let mut opts = options();
        opts.dryrun = true;
        let pipeline = TvPipeline::new(&tv_config(&source, &stage, &target), opts, &log, CancelFlag::new())
            .expect("should create pipeline");

        let outcome = pipeline.run().expect("run should succeed");
        assert!(matches!(outcome, MoveOutcome::Complete { moved: 0 }));
        assert!(!target.join("Show/s01/s01e01.mkv").exists());
    }
}
