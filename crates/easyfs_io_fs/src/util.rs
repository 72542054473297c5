use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::spec::FsError;

////////////////////////////////////////////////////////////////////////////////
// #region SchemeClassification

static RE_URL_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]+)://").expect("static scheme regex")
});

/// Return the URL scheme of `path` (`http`, `ftp`, ...) or `None` for plain paths.
///
/// Single-letter schemes are not recognized so Windows drive letters stay local.
pub fn derive_url_scheme(path: &Path) -> Option<String> {
    let c_path = path.to_string_lossy();
    RE_URL_SCHEME
        .captures(&c_path)
        .map(|caps| caps["scheme"].to_ascii_lowercase())
}

/// Whether `path` addresses the local filesystem.
pub fn is_local_path(path: &Path) -> bool {
    derive_url_scheme(path).is_none()
}

pub(crate) fn assert_is_local(path: &Path) -> Result<(), FsError> {
    if is_local_path(path) {
        return Ok(());
    }
    Err(FsError::NotImplementedProtocol {
        path: path.to_path_buf(),
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Join the normal components of a relative path with `/`.
pub(crate) fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `true` when something (including a dangling symlink) occupies `path`.
pub(crate) fn is_path_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Whether `path` itself is a symbolic link.
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// Names of the immediate children of `path_dir`, sorted.
///
/// Returns `None` when the directory does not exist or cannot be listed.
pub fn list_files<P: AsRef<Path>>(path_dir: P) -> Option<Vec<String>> {
    let l_names = list_names_native(path_dir.as_ref())?;
    Some(
        l_names
            .into_iter()
            .map(|name| name.to_string_lossy().into_owned())
            .collect(),
    )
}

/// [`list_files`] without the lossy UTF-8 conversion.
pub(crate) fn list_names_native(path_dir: &Path) -> Option<Vec<OsString>> {
    let iter_entries = fs::read_dir(path_dir).ok()?;
    let mut l_names = iter_entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name())
        .collect::<Vec<_>>();
    l_names.sort();
    Some(l_names)
}

pub(crate) fn create_parent_directory(path: &Path) -> Result<(), FsError> {
    if let Some(path_parent) = path.parent()
        && !path_parent.as_os_str().is_empty()
        && !path_parent.is_dir()
    {
        fs::create_dir_all(path_parent).map_err(|e| FsError::io(path_parent, e))?;
    }
    Ok(())
}

/// Resolve symlinks and `..` through the deepest existing ancestor of `path`.
fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(path_parent), Some(name)) => {
            let path_parent = if path_parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                path_parent
            };
            normalize_path(path_parent).join(name)
        }
        _ => path.to_path_buf(),
    }
}

/// Whether `path_a` and `path_b` resolve to the same location.
pub(crate) fn is_same_path(path_a: &Path, path_b: &Path) -> bool {
    normalize_path(path_a) == normalize_path(path_b)
}

/// Whether `path` resolves to `path_base` or somewhere below it.
pub(crate) fn is_within(path: &Path, path_base: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(path_base))
}

/// Whether either path lies inside (or is) the other once resolved.
pub(crate) fn is_overlap(path_src: &Path, path_dst: &Path) -> bool {
    is_within(path_dst, path_src) || is_within(path_src, path_dst)
}

/// Remove whatever sits at `path`: a directory tree, a file, or a symlink.
pub(crate) fn remove_path(path: &Path) -> Result<(), FsError> {
    let meta = match fs::symlink_metadata(path) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(FsError::io(path, e)),
    };
    let res_remove = if meta.file_type().is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    res_remove.map_err(|e| FsError::io(path, e))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CopyPrimitives

/// Recreate the symlink `path_src` at `path_dst`, pointing at the same target.
pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> Result<(), FsError> {
    let target = fs::read_link(path_src).map_err(|e| FsError::io(path_src, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::symlink;
        symlink(&target, path_dst).map_err(|e| FsError::io(path_dst, e))
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        let res = if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        };
        res.map_err(|e| FsError::io(path_dst, e))
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = target;
        Err(FsError::io(
            path_dst,
            io::Error::new(
                io::ErrorKind::Unsupported,
                "Symbolic links are unsupported on this platform",
            ),
        ))
    }
}

/// Copy file bytes, then carry permissions, timestamps and xattrs over.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<u64, FsError> {
    let n_bytes = fs::copy(path_file_src, path_file_dst).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound if !path_file_src.exists() => FsError::FileNotFound {
            path: path_file_src.to_path_buf(),
        },
        _ => FsError::io(path_file_dst, e),
    })?;
    apply_file_times(path_file_src, path_file_dst).map_err(|e| FsError::io(path_file_dst, e))?;
    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(n_bytes)
}

fn apply_file_times(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(iter_xattr_names) = xattr::list(path_file_src) else {
        return;
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(
                path = %path_file_dst.display(),
                name = ?name,
                error = %e,
                "xattr not copied"
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
