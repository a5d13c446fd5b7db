//! Locating and opening the PCRE2 shared library
//!
//! Uses `libloading`. An explicitly configured path wins; otherwise the
//! configured and platform search paths are scanned for the platform's
//! library names, and finally the bare names are handed to the dynamic
//! linker so `LD_LIBRARY_PATH` and the linker cache apply.

use libloading::Library;
use mpcre2_config::BridgeConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// No candidate could be opened
    #[error("PCRE2 library not found (tried {})", tried.join(", "))]
    LibraryNotFound { tried: Vec<String> },
    /// The library opened but lacks an entry point, usually a PCRE2 that is too old
    #[error("Symbol '{symbol}' not found in library '{library}'")]
    SymbolNotFound { library: String, symbol: String },
    /// The file exists but could not be loaded
    #[error("Failed to load library {path}: {reason}")]
    LoadFailed { path: String, reason: String },
}

/// File names of the 8-bit library, most specific first
pub fn library_names() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &["pcre2-8.dll", "libpcre2-8-0.dll", "libpcre2-8.dll"]
    } else if cfg!(target_os = "macos") {
        &["libpcre2-8.0.dylib", "libpcre2-8.dylib"]
    } else {
        &["libpcre2-8.so.0", "libpcre2-8.so"]
    }
}

/// Where distribution packages and Homebrew install `libpcre2-8`
#[cfg(target_os = "linux")]
const SYSTEM_DIRS: &[&str] = &[
    "/usr/lib/x86_64-linux-gnu",
    "/usr/lib/aarch64-linux-gnu",
    "/usr/lib64",
    "/usr/lib",
    "/usr/local/lib",
];

#[cfg(target_os = "macos")]
const SYSTEM_DIRS: &[&str] = &[
    "/opt/homebrew/opt/pcre2/lib",
    "/usr/local/opt/pcre2/lib",
    "/opt/local/lib",
];

// Windows and the rest rely on the dynamic linker's own search
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const SYSTEM_DIRS: &[&str] = &[];

/// Finds and opens the PCRE2 library
///
/// # Safety
///
/// Loading a dynamic library executes its initialization code. The caller
/// must trust whatever library the configuration points at.
#[derive(Debug, Clone)]
pub struct LibraryLoader {
    /// Exact file, skips searching
    explicit: Option<PathBuf>,
    /// Directories scanned in order
    search_paths: Vec<PathBuf>,
}

impl LibraryLoader {
    pub fn new() -> Self {
        Self {
            explicit: None,
            search_paths: Self::default_search_paths(),
        }
    }

    /// Create a loader honoring `[library]` from the configuration
    pub fn from_config(config: &BridgeConfig) -> Self {
        let mut loader = Self::new();
        for path in config.search_paths().iter().rev() {
            loader.add_search_path(path.clone());
        }
        loader.explicit = config.library_path().map(Path::to_path_buf);
        loader
    }

    fn default_search_paths() -> Vec<PathBuf> {
        SYSTEM_DIRS.iter().map(PathBuf::from).collect()
    }

    /// Searched before every directory added so far
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.insert(0, path);
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Candidate files that exist in the search paths, in priority order
    pub fn candidates(&self) -> Vec<PathBuf> {
        if let Some(explicit) = &self.explicit {
            return vec![explicit.clone()];
        }

        let mut found = Vec::new();
        for dir in &self.search_paths {
            for name in library_names() {
                let path = dir.join(name);
                if path.exists() {
                    found.push(path);
                }
            }
        }
        found
    }

    /// Open the library
    pub fn load(&self) -> Result<(Library, String), LoadError> {
        let mut tried = Vec::new();

        for path in self.candidates() {
            let label = path.display().to_string();
            // Safety: see the type-level contract
            match unsafe { Library::new(&path) } {
                Ok(library) => {
                    log::debug!("loaded PCRE2 from {}", label);
                    return Ok((library, label));
                }
                Err(e) if self.explicit.is_some() => {
                    return Err(LoadError::LoadFailed {
                        path: label,
                        reason: e.to_string(),
                    })
                }
                Err(e) => {
                    log::debug!("skipping {}: {}", label, e);
                    tried.push(label);
                }
            }
        }

        if self.explicit.is_none() {
            for name in library_names() {
                // Safety: see the type-level contract
                if let Ok(library) = unsafe { Library::new(name) } {
                    log::debug!("loaded PCRE2 as {} via the dynamic linker", name);
                    return Ok((library, (*name).to_string()));
                }
                tried.push((*name).to_string());
            }
        }

        Err(LoadError::LibraryNotFound { tried })
    }
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self::new()
    }
}
