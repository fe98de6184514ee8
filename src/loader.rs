use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::env::EnvStore;
use crate::error::Error;
use crate::model::{Env, LoadReport};
use crate::parser::{parse_with, strict_parse_with};

/// Load `.env` from the current working directory into the process
/// environment, keeping existing non-empty variables.
pub fn load() -> Result<LoadReport, Error> {
    process_loader().load()
}

/// Load `.env` from the current working directory into the process
/// environment, overwriting existing variables.
pub fn overload() -> Result<LoadReport, Error> {
    process_loader().override_existing(true).load()
}

/// Load the named files, in order, into the process environment, keeping
/// existing non-empty variables.
pub fn load_paths<I, P>(paths: I) -> Result<LoadReport, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    process_loader().paths(paths).load()
}

/// Load the named files, in order, into the process environment, overwriting
/// existing variables.
pub fn overload_paths<I, P>(paths: I) -> Result<LoadReport, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    process_loader().paths(paths).override_existing(true).load()
}

/// Strictly parse one open reader and merge it into the process environment,
/// keeping existing non-empty variables. Format errors surface to the caller.
pub fn apply<R: BufRead>(reader: R) -> Result<LoadReport, Error> {
    process_loader().apply(reader)
}

/// Strictly parse one open reader and merge it into the process environment,
/// overwriting existing variables. Format errors surface to the caller.
pub fn over_apply<R: BufRead>(reader: R) -> Result<LoadReport, Error> {
    process_loader().override_existing(true).apply(reader)
}

/// [`load`], turning any error into a panic. Convenience for program startup
/// where a missing or unreadable `.env` is fatal.
#[track_caller]
pub fn must_load() -> LoadReport {
    match load() {
        Ok(report) => report,
        Err(err) => panic!("envfold: failed to load .env: {err}"),
    }
}

fn process_loader() -> EnvLoader {
    EnvLoader::new().target(EnvStore::process_store())
}

/// Builder-style dotenv loader.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    paths: Vec<PathBuf>,
    override_existing: bool,
    debug: bool,
    target: EnvStore,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.paths
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    /// Whether loaded keys replace values already set in the target store.
    /// Off by default; a key that is absent or empty in the target is always
    /// written.
    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn target(mut self, target: EnvStore) -> Self {
        self.target = target;
        self
    }

    pub fn target_env(&self) -> &EnvStore {
        &self.target
    }

    pub fn target_env_mut(&mut self) -> &mut EnvStore {
        &mut self.target
    }

    pub fn into_target(self) -> EnvStore {
        self.target
    }

    /// Open and parse each configured source in order (default `.env` when
    /// none was given), merging every source into the target before the next
    /// one is opened, so later sources can reference variables set by earlier
    /// ones. Lines that fail the grammar are skipped. The first open or read
    /// error halts processing; merges from earlier sources stay in place.
    pub fn load(&mut self) -> Result<LoadReport, Error> {
        let mut report = LoadReport::default();

        for path in self.effective_paths() {
            let file = File::open(&path)?;
            let env = parse_with(BufReader::new(file), &self.target)?;
            report.sources_read += 1;
            self.merge(env, &mut report);
        }

        Ok(report)
    }

    /// Strictly parse one already-open reader and merge it into the target.
    /// A format error surfaces to the caller and nothing is merged.
    pub fn apply<R: BufRead>(&mut self, reader: R) -> Result<LoadReport, Error> {
        let env = strict_parse_with(reader, &self.target)?;
        let mut report = LoadReport::default();
        self.merge(env, &mut report);
        Ok(report)
    }

    fn merge(&mut self, env: Env, report: &mut LoadReport) {
        for (key, value) in env {
            if !self.override_existing && self.target.is_set(&key) {
                report.skipped_existing += 1;
                if self.debug {
                    eprintln!("envfold: skipping existing key {key}");
                }
                continue;
            }

            self.target.set(&key, &value);
            report.loaded += 1;
        }
    }

    fn effective_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(".env")]
        } else {
            self.paths.clone()
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            override_existing: false,
            debug: false,
            target: EnvStore::memory(),
        }
    }
}
