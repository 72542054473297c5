use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use easyfs_io_fs::{
    EnumCopyOutcome, FsError, SpecCopyFileOptions, SpecCopyFilesOptions, SpecFindOptions,
    copy_directory, copy_file, copy_files, copy_files_x, create_md5, find_files,
};
use pyo3::create_exception;
use pyo3::exceptions::{PyFileNotFoundError, PyIsADirectoryError, PyOSError, PyValueError};
use pyo3::prelude::*;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "easyfs.fs.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

const C_OUTCOME_MD5_SKIP: &str = "MD5_SKIP";
const C_OUTCOME_COPIED: &str = "COPIED";

create_exception!(_easyfs_io_fs_rs, NotImplementedProtocol, PyOSError);
create_exception!(_easyfs_io_fs_rs, FileAlreadyExistsError, PyOSError);
create_exception!(_easyfs_io_fs_rs, DirectoryAlreadyExistsError, PyOSError);

fn map_fs_error(exception: FsError) -> PyErr {
    let c_message = exception.to_string();
    match exception {
        FsError::NotImplementedProtocol { .. } => NotImplementedProtocol::new_err(c_message),
        FsError::FileAlreadyExists { .. } => FileAlreadyExistsError::new_err(c_message),
        FsError::DirectoryAlreadyExists { .. } => DirectoryAlreadyExistsError::new_err(c_message),
        FsError::FileNotFound { .. } | FsError::DirectoryNotFound { .. } => {
            PyFileNotFoundError::new_err(c_message)
        }
        FsError::NotAFile { .. } => PyIsADirectoryError::new_err(c_message),
        FsError::SourceTargetOverlap { .. } | FsError::InvalidPattern { .. } => {
            PyValueError::new_err(c_message)
        }
        FsError::Io { .. } => PyOSError::new_err(c_message),
    }
}

fn format_outcome(outcome: EnumCopyOutcome) -> &'static str {
    match outcome {
        EnumCopyOutcome::Skipped => C_OUTCOME_MD5_SKIP,
        EnumCopyOutcome::Copied => C_OUTCOME_COPIED,
    }
}

fn format_path(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

#[pyfunction(name = "find_files")]
#[pyo3(signature = (
    dir_root,
    in_filter = None,
    out_filter = None,
    if_recursive = true,
    if_include_root_dir = true
))]
fn find_files_py(
    py: Python<'_>,
    dir_root: String,
    in_filter: Option<Vec<String>>,
    out_filter: Option<Vec<String>>,
    if_recursive: bool,
    if_include_root_dir: bool,
) -> PyResult<Vec<String>> {
    let spec_defaults = SpecFindOptions::default();
    let spec_find_options = SpecFindOptions {
        in_filter: in_filter.unwrap_or(spec_defaults.in_filter),
        out_filter: out_filter.unwrap_or(spec_defaults.out_filter),
        if_recursive,
        if_include_root_dir,
    };
    let l_paths = py
        .allow_threads(|| find_files(dir_root, &spec_find_options))
        .map_err(map_fs_error)?;
    Ok(l_paths.into_iter().map(format_path).collect())
}

#[pyfunction(name = "copy_file")]
#[pyo3(signature = (
    file_source,
    file_target,
    if_override = true,
    if_preserve_symlink = false,
    if_md5_check = false
))]
fn copy_file_py(
    py: Python<'_>,
    file_source: String,
    file_target: String,
    if_override: bool,
    if_preserve_symlink: bool,
    if_md5_check: bool,
) -> PyResult<&'static str> {
    let spec_cp_options = SpecCopyFileOptions {
        if_override,
        if_preserve_symlink,
        if_md5_check,
    };
    let outcome = py
        .allow_threads(|| copy_file(file_source, file_target, spec_cp_options))
        .map_err(map_fs_error)?;
    Ok(format_outcome(outcome))
}

#[pyfunction(name = "copy_directory")]
#[pyo3(signature = (dir_source, dir_target, if_override = false))]
fn copy_directory_py(
    py: Python<'_>,
    dir_source: String,
    dir_target: String,
    if_override: bool,
) -> PyResult<()> {
    py.allow_threads(|| copy_directory(dir_source, dir_target, if_override))
        .map_err(map_fs_error)
}

#[pyfunction(name = "copy_files")]
#[pyo3(signature = (dir_source, dir_target, if_create_target_dir = false, if_md5_check = false))]
fn copy_files_py(
    py: Python<'_>,
    dir_source: String,
    dir_target: String,
    if_create_target_dir: bool,
    if_md5_check: bool,
) -> PyResult<()> {
    let spec_cp_options = SpecCopyFilesOptions {
        if_create_target_dir,
        if_md5_check,
    };
    py.allow_threads(|| copy_files(dir_source, dir_target, spec_cp_options))
        .map_err(map_fs_error)
}

#[pyfunction(name = "copy_files_x")]
#[pyo3(signature = (file_mapping))]
fn copy_files_x_py(
    py: Python<'_>,
    file_mapping: Vec<(String, String)>,
) -> PyResult<BTreeSet<(String, String)>> {
    let set_pairs = py
        .allow_threads(|| copy_files_x(&file_mapping))
        .map_err(map_fs_error)?;
    Ok(set_pairs
        .into_iter()
        .map(|(path_src, path_dst)| (format_path(path_src), format_path(path_dst)))
        .collect())
}

#[pyfunction(name = "create_md5")]
#[pyo3(signature = (file_source, file_target = None))]
fn create_md5_py(
    py: Python<'_>,
    file_source: String,
    file_target: Option<String>,
) -> PyResult<String> {
    py.allow_threads(|| {
        let path_target = file_target.map(PathBuf::from);
        create_md5(Path::new(&file_source), path_target.as_deref())
    })
    .map_err(map_fs_error)
}

#[pymodule]
fn _easyfs_io_fs_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = module.py();
    module.add_function(wrap_pyfunction!(find_files_py, module)?)?;
    module.add_function(wrap_pyfunction!(copy_file_py, module)?)?;
    module.add_function(wrap_pyfunction!(copy_directory_py, module)?)?;
    module.add_function(wrap_pyfunction!(copy_files_py, module)?)?;
    module.add_function(wrap_pyfunction!(copy_files_x_py, module)?)?;
    module.add_function(wrap_pyfunction!(create_md5_py, module)?)?;
    module.add(
        "NotImplementedProtocol",
        py.get_type::<NotImplementedProtocol>(),
    )?;
    module.add(
        "FileAlreadyExistsError",
        py.get_type::<FileAlreadyExistsError>(),
    )?;
    module.add(
        "DirectoryAlreadyExistsError",
        py.get_type::<DirectoryAlreadyExistsError>(),
    )?;
    module.add("MD5_SKIP", C_OUTCOME_MD5_SKIP)?;
    module.add("COPIED", C_OUTCOME_COPIED)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
