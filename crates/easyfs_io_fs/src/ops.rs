//! Move, delete, and create helpers for local paths.

use std::fs;
use std::path::Path;

use crate::copy::copy_directory;
use crate::spec::FsError;
use crate::util::{
    assert_is_local, copy_file_with_metadata, create_parent_directory, is_path_occupied,
    remove_path,
};

/// Move a file. Falls back to copy + delete when `rename` fails (cross-device).
pub fn move_file<P, Q>(file_source: P, file_target: Q) -> Result<(), FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_file_src = file_source.as_ref();
    let path_file_dst = file_target.as_ref();
    assert_is_local(path_file_src)?;
    assert_is_local(path_file_dst)?;

    if !path_file_src.is_file() {
        return Err(FsError::FileNotFound {
            path: path_file_src.to_path_buf(),
        });
    }
    if is_path_occupied(path_file_dst) {
        return Err(FsError::FileAlreadyExists {
            path: path_file_dst.to_path_buf(),
        });
    }
    create_parent_directory(path_file_dst)?;

    if let Err(e) = fs::rename(path_file_src, path_file_dst) {
        tracing::debug!(
            src = %path_file_src.display(),
            error = %e,
            "rename failed; falling back to copy"
        );
        copy_file_with_metadata(path_file_src, path_file_dst)?;
        fs::remove_file(path_file_src).map_err(|e| FsError::io(path_file_src, e))?;
    }
    Ok(())
}

/// Move a directory tree. Falls back to mirror + delete when `rename` fails.
pub fn move_directory<P, Q>(dir_source: P, dir_target: Q) -> Result<(), FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref();
    let path_dir_dst = dir_target.as_ref();
    assert_is_local(path_dir_src)?;
    assert_is_local(path_dir_dst)?;

    if !path_dir_src.is_dir() {
        return Err(FsError::DirectoryNotFound {
            path: path_dir_src.to_path_buf(),
        });
    }
    if is_path_occupied(path_dir_dst) {
        return Err(FsError::DirectoryAlreadyExists {
            path: path_dir_dst.to_path_buf(),
        });
    }
    create_parent_directory(path_dir_dst)?;

    if let Err(e) = fs::rename(path_dir_src, path_dir_dst) {
        tracing::debug!(
            src = %path_dir_src.display(),
            error = %e,
            "rename failed; falling back to copy"
        );
        copy_directory(path_dir_src, path_dir_dst, false)?;
        remove_path(path_dir_src)?;
    }
    Ok(())
}

/// Delete a file. Missing files are ignored; directories are refused.
pub fn delete_file<P: AsRef<Path>>(file_target: P) -> Result<(), FsError> {
    let path_file = file_target.as_ref();
    assert_is_local(path_file)?;

    if !is_path_occupied(path_file) {
        return Ok(());
    }
    if path_file.is_dir() && !path_file.is_symlink() {
        return Err(FsError::NotAFile {
            path: path_file.to_path_buf(),
        });
    }
    remove_path(path_file)
}

/// Delete a directory tree. Missing directories are ignored.
pub fn delete_directory<P: AsRef<Path>>(dir_target: P) -> Result<(), FsError> {
    let path_dir = dir_target.as_ref();
    assert_is_local(path_dir)?;
    remove_path(path_dir)
}

/// Create `dir_target` and every missing parent.
pub fn create_directory<P: AsRef<Path>>(dir_target: P) -> Result<(), FsError> {
    let path_dir = dir_target.as_ref();
    assert_is_local(path_dir)?;
    fs::create_dir_all(path_dir).map_err(|e| FsError::io(path_dir, e))
}
