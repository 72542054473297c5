//! Single-file copy, directory mirroring, and pattern-driven bulk copy.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::fingerprint::{C_MD5_EXTENSION, is_up_to_date, write_sidecar};
use crate::pattern::{SpecCopyPattern, SpecPathFilter, SpecPatternList};
use crate::spec::{
    EnumCopyMode, EnumCopyOutcome, FsError, SpecCopyFileOptions, SpecCopyFilesOptions,
    SpecFindOptions,
};
use crate::util::{
    assert_is_local, copy_file_with_metadata, create_parent_directory, create_symbolic_link,
    is_overlap, is_path_occupied, is_same_path, is_symlink, is_within, list_names_native,
    remove_path,
};
use crate::walk::IterWalk;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SpecCopyTaskFile {
    path_file_src: PathBuf,
    path_file_dst: PathBuf,
}

/// Copy `file_source` to `file_target`.
///
/// Decision order:
/// 1. both paths must be local, otherwise [`FsError::NotImplementedProtocol`]
///    is returned before any I/O;
/// 2. a target resolving to the source itself is [`FsError::SourceTargetOverlap`];
/// 3. an occupied target without `if_override` is [`FsError::FileAlreadyExists`],
///    and a target that is a directory is [`FsError::NotAFile`];
/// 4. with `if_md5_check`, matching sidecars return [`EnumCopyOutcome::Skipped`];
/// 5. the bytes are copied (or the symlink recreated with `if_preserve_symlink`),
///    missing parent directories of the target are created;
/// 6. with `if_md5_check`, both sidecars are rewritten from fresh digests.
pub fn copy_file<P, Q>(
    file_source: P,
    file_target: Q,
    spec_cp_options: SpecCopyFileOptions,
) -> Result<EnumCopyOutcome, FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_file_src = file_source.as_ref();
    let path_file_dst = file_target.as_ref();
    assert_is_local(path_file_src)?;
    assert_is_local(path_file_dst)?;

    if is_same_path(path_file_src, path_file_dst) {
        return Err(FsError::SourceTargetOverlap {
            path_src: path_file_src.to_path_buf(),
            path_dst: path_file_dst.to_path_buf(),
        });
    }
    if is_path_occupied(path_file_dst) {
        if !spec_cp_options.if_override {
            return Err(FsError::FileAlreadyExists {
                path: path_file_dst.to_path_buf(),
            });
        }
        if path_file_dst.is_dir() && !is_symlink(path_file_dst) {
            return Err(FsError::NotAFile {
                path: path_file_dst.to_path_buf(),
            });
        }
    }

    if spec_cp_options.if_md5_check && is_up_to_date(path_file_src, path_file_dst) {
        tracing::debug!(
            src = %path_file_src.display(),
            dst = %path_file_dst.display(),
            "fingerprints match; copy skipped"
        );
        return Ok(EnumCopyOutcome::Skipped);
    }

    if !is_path_occupied(path_file_src) {
        return Err(FsError::FileNotFound {
            path: path_file_src.to_path_buf(),
        });
    }
    create_parent_directory(path_file_dst)?;

    if spec_cp_options.if_preserve_symlink && is_symlink(path_file_src) {
        remove_path(path_file_dst)?;
        create_symbolic_link(path_file_src, path_file_dst)?;
    } else {
        if is_symlink(path_file_dst) {
            // Replace the link itself instead of writing through it.
            remove_path(path_file_dst)?;
        }
        copy_file_with_metadata(path_file_src, path_file_dst)?;
    }

    if spec_cp_options.if_md5_check {
        write_sidecar(path_file_src)?;
        write_sidecar(path_file_dst)?;
    }
    tracing::debug!(
        src = %path_file_src.display(),
        dst = %path_file_dst.display(),
        "copied file"
    );
    Ok(EnumCopyOutcome::Copied)
}

/// Mirror the whole tree under `dir_source` into `dir_target`.
///
/// Source and target must not overlap. An existing target is an error unless
/// `if_override` is set, in which case it is removed first; a failed removal
/// (locked handle, permissions) is returned as [`FsError::Io`]. Symlinks
/// inside the tree are recreated as symlinks.
pub fn copy_directory<P, Q>(
    dir_source: P,
    dir_target: Q,
    if_override: bool,
) -> Result<(), FsError>
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
    if is_overlap(path_dir_src, path_dir_dst) {
        return Err(FsError::SourceTargetOverlap {
            path_src: path_dir_src.to_path_buf(),
            path_dst: path_dir_dst.to_path_buf(),
        });
    }
    if is_path_occupied(path_dir_dst) {
        if !if_override {
            return Err(FsError::DirectoryAlreadyExists {
                path: path_dir_dst.to_path_buf(),
            });
        }
        remove_path(path_dir_dst)?;
    }
    fs::create_dir_all(path_dir_dst).map_err(|e| FsError::io(path_dir_dst, e))?;

    let spec_find_options = SpecFindOptions::default();
    for node in IterWalk::new(path_dir_src, &spec_find_options)? {
        let path_dst = path_dir_dst.join(&node.path_rel_native);
        if node.if_is_symlink {
            create_symbolic_link(&node.path_abs, &path_dst)?;
        } else if node.if_is_dir {
            fs::create_dir_all(&path_dst).map_err(|e| FsError::io(&path_dst, e))?;
        } else {
            copy_file_with_metadata(&node.path_abs, &path_dst)?;
        }
    }
    tracing::debug!(
        src = %path_dir_src.display(),
        dst = %path_dir_dst.display(),
        "mirrored directory"
    );
    Ok(())
}

/// Copy the entries of `dir_source` into `dir_target`.
///
/// `dir_source` is either a directory (every entry is copied) or
/// `directory/<glob>` (only matching entries). Matching subdirectories are
/// copied recursively. A missing source directory is a silent no-op. A target
/// resolving inside the source directory is [`FsError::SourceTargetOverlap`].
pub fn copy_files<P, Q>(
    dir_source: P,
    dir_target: Q,
    spec_cp_options: SpecCopyFilesOptions,
) -> Result<(), FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_source = dir_source.as_ref();
    let path_dir_dst = dir_target.as_ref();
    assert_is_local(path_source)?;
    assert_is_local(path_dir_dst)?;

    let (path_dir_src, c_mask) = split_source_mask(path_source)?;
    if is_within(path_dir_dst, &path_dir_src) {
        return Err(FsError::SourceTargetOverlap {
            path_src: path_dir_src,
            path_dst: path_dir_dst.to_path_buf(),
        });
    }
    let pats_mask = SpecPatternList::compile(&[c_mask])?;
    copy_files_matching(&path_dir_src, &pats_mask, path_dir_dst, spec_cp_options)
}

fn split_source_mask(path_source: &Path) -> Result<(PathBuf, String), FsError> {
    if path_source.is_dir() {
        return Ok((path_source.to_path_buf(), "*".to_string()));
    }
    match (path_source.parent(), path_source.file_name()) {
        (Some(path_parent), Some(name)) if !path_parent.as_os_str().is_empty() => Ok((
            path_parent.to_path_buf(),
            name.to_string_lossy().into_owned(),
        )),
        _ => Err(FsError::InvalidPattern {
            pattern: path_source.to_string_lossy().into_owned(),
            message: "missing base directory".to_string(),
        }),
    }
}

fn copy_files_matching(
    path_dir_src: &Path,
    pats_mask: &SpecPatternList,
    path_dir_dst: &Path,
    spec_cp_options: SpecCopyFilesOptions,
) -> Result<(), FsError> {
    if !path_dir_dst.is_dir() {
        if !spec_cp_options.if_create_target_dir {
            return Err(FsError::DirectoryNotFound {
                path: path_dir_dst.to_path_buf(),
            });
        }
        fs::create_dir_all(path_dir_dst).map_err(|e| FsError::io(path_dir_dst, e))?;
    }

    let Some(l_names) = list_names_native(path_dir_src) else {
        tracing::debug!(src = %path_dir_src.display(), "source directory missing; nothing to copy");
        return Ok(());
    };

    let c_suffix_sidecar = format!(".{C_MD5_EXTENSION}");
    let spec_cp_options_sub = SpecCopyFilesOptions {
        if_create_target_dir: true,
        ..spec_cp_options
    };
    let spec_cp_file_options = SpecCopyFileOptions {
        if_md5_check: spec_cp_options.if_md5_check,
        ..SpecCopyFileOptions::default()
    };
    let pats_all = SpecPatternList::default();

    for name in l_names {
        let c_name = name.to_string_lossy();
        if spec_cp_options.if_md5_check && c_name.ends_with(&c_suffix_sidecar) {
            continue;
        }
        if !pats_mask.should_include(&c_name) {
            continue;
        }
        let path_src = path_dir_src.join(&name);
        let path_dst = path_dir_dst.join(&name);
        if path_src.is_dir() {
            copy_files_matching(&path_src, &pats_all, &path_dst, spec_cp_options_sub)?;
        } else {
            copy_file(&path_src, &path_dst, spec_cp_file_options)?;
        }
    }
    Ok(())
}

/// Pattern-driven bulk copy.
///
/// Each item pairs a target directory with a source pattern:
/// - `dir/mask` copies matching files directly under `dir` (no recursion);
/// - `+dir/mask` walks `dir` recursively and keeps relative paths under the target;
/// - `-dir/mask` walks `dir` recursively and drops every file directly into the target.
///
/// The mask may hold `;`-separated globs, where a leading `!` excludes
/// (and prunes directories with a matching name). Only files are copied.
///
/// Every pattern is parsed up front, so invalid or non-local items fail
/// before anything is written. Items then run in order: each source is
/// walked and its files copied before the next item is walked, so a later
/// item sees the output of an earlier one. Copies are not rolled back if a
/// later one fails. When two sources map to the same destination the later
/// copy wins.
///
/// Returns the set of `(source, destination)` pairs that were copied.
pub fn copy_files_x<P, S>(
    l_file_mapping: &[(P, S)],
) -> Result<BTreeSet<(PathBuf, PathBuf)>, FsError>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let mut l_specs_copy: Vec<(&Path, SpecCopyPattern, SpecPathFilter)> =
        Vec::with_capacity(l_file_mapping.len());
    for (dir_target, c_pattern) in l_file_mapping {
        let path_dir_dst = dir_target.as_ref();
        assert_is_local(path_dir_dst)?;
        let spec_cp_pattern = SpecCopyPattern::parse(c_pattern.as_ref())?;
        assert_is_local(&spec_cp_pattern.path_dir_base)?;
        let spec_filter = spec_cp_pattern.build_filter()?;
        l_specs_copy.push((path_dir_dst, spec_cp_pattern, spec_filter));
    }

    let mut set_pairs_copied = BTreeSet::new();
    for (path_dir_dst, spec_cp_pattern, spec_filter) in l_specs_copy {
        let l_tasks_file_copy = plan_copy_pattern(&spec_cp_pattern, spec_filter, path_dir_dst);
        for spec_task in l_tasks_file_copy {
            copy_file(
                &spec_task.path_file_src,
                &spec_task.path_file_dst,
                SpecCopyFileOptions::default(),
            )?;
            set_pairs_copied.insert((spec_task.path_file_src, spec_task.path_file_dst));
        }
    }
    tracing::info!(n_copied = set_pairs_copied.len(), "copy_files_x finished");
    Ok(set_pairs_copied)
}

/// Walk one pattern's base directory to completion before anything is copied.
fn plan_copy_pattern(
    spec_cp_pattern: &SpecCopyPattern,
    spec_filter: SpecPathFilter,
    path_dir_dst: &Path,
) -> Vec<SpecCopyTaskFile> {
    IterWalk::with_filter(
        &spec_cp_pattern.path_dir_base,
        spec_filter,
        spec_cp_pattern.mode.is_recursive(),
        true,
    )
    .filter(|node| !node.if_is_dir)
    .map(|node| SpecCopyTaskFile {
        path_file_dst: derive_destination_path(
            &node.path_rel_native,
            spec_cp_pattern.mode,
            path_dir_dst,
        ),
        path_file_src: node.path_abs,
    })
    .collect()
}

/// Destination for a walked file, given its root-relative path.
///
/// - [`EnumCopyMode::Recursive`]: `path_dir_dst/<path_rel>`;
/// - [`EnumCopyMode::Flatten`] and [`EnumCopyMode::Shallow`]: `path_dir_dst/<basename>`.
fn derive_destination_path(path_rel: &Path, mode: EnumCopyMode, path_dir_dst: &Path) -> PathBuf {
    match mode {
        EnumCopyMode::Recursive => path_dir_dst.join(path_rel),
        EnumCopyMode::Flatten | EnumCopyMode::Shallow => match path_rel.file_name() {
            Some(name) => path_dir_dst.join(name),
            None => path_dir_dst.join(path_rel),
        },
    }
}
