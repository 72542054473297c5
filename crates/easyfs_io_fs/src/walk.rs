//! Lazy, depth-first directory traversal with include/exclude filters.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::pattern::SpecPathFilter;
use crate::spec::{FsError, SpecFindOptions};

/// One entry produced by [`IterWalk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecWalkNode {
    /// Path as yielded: root-prefixed or root-relative, per `if_include_root_dir`.
    pub path: PathBuf,
    /// Path on disk (always root-prefixed).
    pub path_abs: PathBuf,
    /// Root-relative path with `/` separators on every platform (lossy UTF-8).
    pub path_rel: String,
    /// Root-relative path as stored on disk.
    pub path_rel_native: PathBuf,
    pub if_is_dir: bool,
    pub if_is_symlink: bool,
}

#[derive(Debug, Clone)]
struct SpecWalkEntry {
    name: OsString,
    /// Lossy UTF-8 form used for matching only.
    c_name: String,
    if_is_dir: bool,
    if_is_symlink: bool,
}

#[derive(Debug)]
struct SpecWalkLevel {
    path_rel: String,
    path_rel_native: PathBuf,
    iter_entries: std::vec::IntoIter<SpecWalkEntry>,
}

/// Pre-order traversal of a directory tree.
///
/// Each level is listed once, sorted by name, and the directory handle is
/// closed before any child is yielded, so dropping the iterator mid-walk
/// leaves nothing open. A missing root produces an empty sequence.
#[derive(Debug)]
pub struct IterWalk {
    path_root: PathBuf,
    spec_filter: SpecPathFilter,
    if_recursive: bool,
    if_include_root_dir: bool,
    l_stack: Vec<SpecWalkLevel>,
}

impl IterWalk {
    pub fn new<P: AsRef<Path>>(
        dir_root: P,
        spec_find_options: &SpecFindOptions,
    ) -> Result<Self, FsError> {
        let spec_filter =
            SpecPathFilter::new(&spec_find_options.in_filter, &spec_find_options.out_filter)?;
        Ok(Self::with_filter(
            dir_root,
            spec_filter,
            spec_find_options.if_recursive,
            spec_find_options.if_include_root_dir,
        ))
    }

    pub fn with_filter<P: AsRef<Path>>(
        dir_root: P,
        spec_filter: SpecPathFilter,
        if_recursive: bool,
        if_include_root_dir: bool,
    ) -> Self {
        let path_root = dir_root.as_ref().to_path_buf();
        let mut l_stack = Vec::new();
        if let Some(l_entries) = read_sorted_entries(&path_root) {
            l_stack.push(SpecWalkLevel {
                path_rel: String::new(),
                path_rel_native: PathBuf::new(),
                iter_entries: l_entries.into_iter(),
            });
        } else {
            tracing::debug!(root = %path_root.display(), "walk root missing; nothing to yield");
        }
        Self {
            path_root,
            spec_filter,
            if_recursive,
            if_include_root_dir,
            l_stack,
        }
    }

    fn derive_node(
        &self,
        path_rel: String,
        path_rel_native: PathBuf,
        entry: &SpecWalkEntry,
    ) -> SpecWalkNode {
        let path_abs = self.path_root.join(&path_rel_native);
        let path = if self.if_include_root_dir {
            path_abs.clone()
        } else {
            path_rel_native.clone()
        };
        SpecWalkNode {
            path,
            path_abs,
            path_rel,
            path_rel_native,
            if_is_dir: entry.if_is_dir,
            if_is_symlink: entry.if_is_symlink,
        }
    }
}

impl Iterator for IterWalk {
    type Item = SpecWalkNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.l_stack.last_mut()?;
            let Some(entry) = level.iter_entries.next() else {
                self.l_stack.pop();
                continue;
            };
            let path_rel = if level.path_rel.is_empty() {
                entry.c_name.clone()
            } else {
                format!("{}/{}", level.path_rel, entry.c_name)
            };
            let path_rel_native = level.path_rel_native.join(&entry.name);

            if entry.if_is_dir && self.spec_filter.is_pruned(&path_rel) {
                tracing::debug!(path = %path_rel, "pruned directory");
                continue;
            }

            if entry.if_is_dir && self.if_recursive && !entry.if_is_symlink {
                let path_dir = self.path_root.join(&path_rel_native);
                let l_entries = read_sorted_entries(&path_dir).unwrap_or_else(|| {
                    tracing::warn!(path = %path_dir.display(), "failed to list directory");
                    Vec::new()
                });
                self.l_stack.push(SpecWalkLevel {
                    path_rel: path_rel.clone(),
                    path_rel_native: path_rel_native.clone(),
                    iter_entries: l_entries.into_iter(),
                });
            }

            if self.spec_filter.is_match(&path_rel) {
                return Some(self.derive_node(path_rel, path_rel_native, &entry));
            }
        }
    }
}

fn read_sorted_entries(path_dir: &Path) -> Option<Vec<SpecWalkEntry>> {
    let iter_entries = fs::read_dir(path_dir).ok()?;
    let mut l_entries = Vec::new();
    for entry_res in iter_entries {
        let entry = match entry_res {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    path = %path_dir.display(),
                    error = %e,
                    "failed to read directory entry"
                );
                continue;
            }
        };
        let Ok(cfg_file_type) = entry.file_type() else {
            continue;
        };
        let if_is_symlink = cfg_file_type.is_symlink();
        let if_is_dir = cfg_file_type.is_dir() || (if_is_symlink && entry.path().is_dir());
        let name = entry.file_name();
        l_entries.push(SpecWalkEntry {
            c_name: name.to_string_lossy().into_owned(),
            name,
            if_is_dir,
            if_is_symlink,
        });
    }
    l_entries.sort_by(|a, b| a.name.cmp(&b.name));
    Some(l_entries)
}

/// Collect every path under `dir_root` that passes the filters.
///
/// Missing roots yield an empty list; only invalid patterns fail.
pub fn find_files<P: AsRef<Path>>(
    dir_root: P,
    spec_find_options: &SpecFindOptions,
) -> Result<Vec<PathBuf>, FsError> {
    Ok(IterWalk::new(dir_root, spec_find_options)?
        .map(|node| node.path)
        .collect())
}
