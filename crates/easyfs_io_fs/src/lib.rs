//! `easyfs_io_fs` v1:
//! Local filesystem search, copy, and fingerprint engine.
//!
//! Modules:
//! - `pattern`     : glob filters and `copy_files_x` pattern parsing
//! - `walk`        : deterministic, prunable directory traversal
//! - `fingerprint` : MD5 sidecar records
//! - `copy`        : single-file, directory, and pattern-driven copies
//! - `ops`         : move/delete/create helpers
//! - `spec`        : enums/options/errors
//! - `util`        : shared helper functions

pub mod copy;
pub mod fingerprint;
pub mod ops;
pub mod pattern;
pub mod spec;
mod util;
pub mod walk;

pub use copy::{copy_directory, copy_file, copy_files, copy_files_x};
pub use fingerprint::{C_MD5_EXTENSION, compute_md5, create_md5, is_up_to_date};
pub use ops::{create_directory, delete_directory, delete_file, move_directory, move_file};
pub use pattern::{SpecCopyPattern, SpecPathFilter, SpecPatternList};
pub use spec::{
    EnumCopyMode, EnumCopyOutcome, FsError, SpecCopyFileOptions, SpecCopyFilesOptions,
    SpecFindOptions,
};
pub use util::{derive_url_scheme, is_local_path, is_symlink, list_files};
pub use walk::{IterWalk, SpecWalkNode, find_files};
