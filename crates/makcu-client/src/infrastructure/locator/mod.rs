//! Discovery of the `makcu-cpp` backend executable.
//!
//! The backend is usually built next to the client checkout, so discovery
//! probes a fixed, ordered list of build-output directories relative to a
//! search root, then the search root itself, then one system-wide install
//! location.  The first candidate that is an existing regular file wins.
//!
//! ```text
//! <root>/makcu-cpp/x64/Release/makcu-cpp[.exe]
//! <root>/makcu-cpp/Debug/makcu-cpp[.exe]
//! <root>/makcu-cpp/Release/makcu-cpp[.exe]
//! <root>/x64/Release/makcu-cpp[.exe]
//! <root>/Release/makcu-cpp[.exe]
//! <root>/makcu-cpp/makcu-cpp[.exe]
//! <root>/makcu-cpp[.exe]
//! /usr/local/bin/makcu-cpp     (C:\Program Files\makcu-cpp\makcu-cpp.exe on Windows)
//! ```
//!
//! Discovery has no side effects and never retries.  A missing backend is a
//! construction-time failure: callers either abort or record it as
//! [`BackendAvailability::Missing`].

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// File stem of the backend executable.
pub const BACKEND_NAME: &str = "makcu-cpp";

/// Build-output directories probed, in priority order, relative to the search root.
pub const RELATIVE_BUILD_DIRS: [&str; 6] = [
    "makcu-cpp/x64/Release",
    "makcu-cpp/Debug",
    "makcu-cpp/Release",
    "x64/Release",
    "Release",
    "makcu-cpp",
];

/// Errors raised while locating the backend.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// None of the candidates exists.
    #[error("makcu-cpp executable not found; searched: {}", format_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    /// The working directory needed to build relative candidates is unavailable.
    #[error("could not determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Backend file name for the current platform (`makcu-cpp` or `makcu-cpp.exe`).
pub fn backend_file_name() -> String {
    format!("{BACKEND_NAME}{}", std::env::consts::EXE_SUFFIX)
}

/// The single absolute system-wide install location.
pub fn system_install_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        PathBuf::from(r"C:\Program Files\makcu-cpp").join(backend_file_name())
    }

    #[cfg(not(target_os = "windows"))]
    {
        PathBuf::from("/usr/local/bin").join(backend_file_name())
    }
}

// ── ExecutablePath ────────────────────────────────────────────────────────────

/// Absolute path to a backend executable that existed when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutablePath(PathBuf);

impl ExecutablePath {
    /// Wraps `path` if it names an existing regular file.
    ///
    /// Relative paths are anchored at the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::NotFound`] if `path` is not an existing file.
    pub fn from_existing(path: impl AsRef<Path>) -> Result<Self, DiscoveryError> {
        let path = path.as_ref();
        if path.is_file() {
            Ok(Self(absolutize(path)))
        } else {
            Err(DiscoveryError::NotFound {
                searched: vec![path.to_path_buf()],
            })
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Wraps `path` without checking that it exists.
    #[cfg(test)]
    pub(crate) fn for_tests(path: PathBuf) -> Self {
        Self(path)
    }
}

impl AsRef<Path> for ExecutablePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ExecutablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|dir| dir.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

// ── Locator ───────────────────────────────────────────────────────────────────

/// Resolves the backend path from an ordered candidate list.
#[derive(Debug, Clone)]
pub struct ExecutableLocator {
    candidates: Vec<PathBuf>,
}

impl ExecutableLocator {
    /// Creates a locator over an explicit candidate list, probed in order.
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Creates a locator over the default candidate list anchored at `root`.
    pub fn with_default_candidates(root: &Path) -> Self {
        let file_name = backend_file_name();
        let mut candidates: Vec<PathBuf> = RELATIVE_BUILD_DIRS
            .iter()
            .map(|dir| root.join(dir).join(&file_name))
            .collect();
        candidates.push(root.join(&file_name));
        candidates.push(system_install_path());
        Self { candidates }
    }

    /// Creates a locator over the default candidates anchored at the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::CurrentDir`] if the working directory is unavailable.
    pub fn from_current_dir() -> Result<Self, DiscoveryError> {
        let root = std::env::current_dir().map_err(DiscoveryError::CurrentDir)?;
        Ok(Self::with_default_candidates(&root))
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Returns the backend to use.
    ///
    /// An `explicit` path that exists always wins.  Otherwise the candidates
    /// are probed in order and the first existing file is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::NotFound`] listing every probed path when
    /// nothing matches.
    pub fn resolve(&self, explicit: Option<&Path>) -> Result<ExecutablePath, DiscoveryError> {
        let mut searched = Vec::with_capacity(self.candidates.len() + 1);

        if let Some(path) = explicit {
            match ExecutablePath::from_existing(path) {
                Ok(exe) => {
                    debug!("using explicit backend path {exe}");
                    return Ok(exe);
                }
                Err(_) => {
                    warn!(
                        "explicit backend path {} does not exist, probing default locations",
                        path.display()
                    );
                    searched.push(path.to_path_buf());
                }
            }
        }

        for candidate in &self.candidates {
            if let Ok(exe) = ExecutablePath::from_existing(candidate) {
                debug!("found backend at {exe}");
                return Ok(exe);
            }
            searched.push(candidate.clone());
        }

        Err(DiscoveryError::NotFound { searched })
    }
}

// ── BackendAvailability ───────────────────────────────────────────────────────

/// Whether a backend was found, computed once and passed around as data.
#[derive(Debug)]
pub enum BackendAvailability {
    Available(ExecutablePath),
    Missing(DiscoveryError),
}

impl BackendAvailability {
    /// Runs discovery once and records the outcome.
    pub fn probe(locator: &ExecutableLocator, explicit: Option<&Path>) -> Self {
        match locator.resolve(explicit) {
            Ok(exe) => BackendAvailability::Available(exe),
            Err(e) => {
                warn!("backend unavailable: {e}");
                BackendAvailability::Missing(e)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, BackendAvailability::Available(_))
    }

    pub fn executable(&self) -> Option<&ExecutablePath> {
        match self {
            BackendAvailability::Available(exe) => Some(exe),
            BackendAvailability::Missing(_) => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
