//! Option models, outcome enums, and the crate error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Destination layout for one `copy_files_x` source pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyMode {
    /// Only the immediate directory level; files land directly in the target.
    Shallow,
    /// Whole subtree; relative paths are kept under the target (`+` prefix).
    Recursive,
    /// Whole subtree; every file lands directly in the target (`-` prefix).
    Flatten,
}

impl EnumCopyMode {
    /// Whether the source directory is walked below its first level.
    pub fn is_recursive(self) -> bool {
        !matches!(self, Self::Shallow)
    }
}

/// Terminal state of a single `copy_file` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyOutcome {
    /// Fingerprints matched; target left untouched.
    Skipped,
    /// Bytes (or the symlink itself) were written to the target.
    Copied,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `find_files` / [`crate::walk::IterWalk`].
#[derive(Debug, Clone)]
pub struct SpecFindOptions {
    /// Basename globs an entry must match to be yielded (empty = everything).
    pub in_filter: Vec<String>,
    /// Globs that hide an entry; a matching directory is pruned with its subtree.
    pub out_filter: Vec<String>,
    /// Descend into subdirectories.
    pub if_recursive: bool,
    /// Prefix yielded paths with the root directory.
    pub if_include_root_dir: bool,
}

impl Default for SpecFindOptions {
    fn default() -> Self {
        Self {
            in_filter: vec!["*".to_string()],
            out_filter: Vec::new(),
            if_recursive: true,
            if_include_root_dir: true,
        }
    }
}

/// Input options for `copy_file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecCopyFileOptions {
    /// Replace an existing target instead of failing.
    pub if_override: bool,
    /// Recreate a source symlink at the target instead of copying its bytes.
    pub if_preserve_symlink: bool,
    /// Skip the copy when `.md5` sidecars agree; refresh them after copying.
    pub if_md5_check: bool,
}

impl Default for SpecCopyFileOptions {
    fn default() -> Self {
        Self {
            if_override: true,
            if_preserve_symlink: false,
            if_md5_check: false,
        }
    }
}

/// Input options for `copy_files`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecCopyFilesOptions {
    /// Create the target directory when it is missing.
    pub if_create_target_dir: bool,
    /// Route every file through the fingerprint gate; sidecars are not copied as entries.
    pub if_md5_check: bool,
}

/// Errors raised by every public filesystem operation.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path uses a scheme other than the local filesystem.
    #[error("Protocol not implemented for: {path}")]
    NotImplementedProtocol { path: PathBuf },

    /// Target file exists and overriding was not requested.
    #[error("File already exists: {path}")]
    FileAlreadyExists { path: PathBuf },

    /// Target directory exists and overriding was not requested.
    #[error("Directory already exists: {path}")]
    DirectoryAlreadyExists { path: PathBuf },

    /// Required file is missing.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Required directory is missing.
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// A file-only action was pointed at something else.
    #[error("Not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Source and target resolve to the same path, or one contains the other.
    #[error("Source and target overlap: {path_src} <-> {path_dst}")]
    SourceTargetOverlap { path_src: PathBuf, path_dst: PathBuf },

    /// Glob pattern could not be compiled.
    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Any other OS-level failure, with the path it happened on.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Wrap an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io;

    use super::{EnumCopyMode, FsError, SpecCopyFileOptions, SpecFindOptions};

    #[test]
    fn find_options_default_matches_everything_recursively() {
        let spec_find_options = SpecFindOptions::default();
        assert_eq!(spec_find_options.in_filter, vec!["*".to_string()]);
        assert!(spec_find_options.out_filter.is_empty());
        assert!(spec_find_options.if_recursive);
        assert!(spec_find_options.if_include_root_dir);
    }

    #[test]
    fn copy_file_options_default_overrides_without_fingerprint() {
        let spec_cp_options = SpecCopyFileOptions::default();
        assert!(spec_cp_options.if_override);
        assert!(!spec_cp_options.if_preserve_symlink);
        assert!(!spec_cp_options.if_md5_check);
    }

    #[test]
    fn copy_mode_recursion_flags() {
        assert!(!EnumCopyMode::Shallow.is_recursive());
        assert!(EnumCopyMode::Recursive.is_recursive());
        assert!(EnumCopyMode::Flatten.is_recursive());
    }

    #[test]
    fn io_error_display_carries_path() {
        let err = FsError::io(
            "/tmp/locked",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error at /tmp/locked: denied");
    }

    #[test]
    fn overlap_error_names_both_paths() {
        let err = FsError::SourceTargetOverlap {
            path_src: "/data/src".into(),
            path_dst: "/data/src/mirror".into(),
        };
        assert_eq!(
            err.to_string(),
            "Source and target overlap: /data/src <-> /data/src/mirror"
        );
    }
}
