//! MD5 content fingerprints persisted as `<file>.md5` sidecars.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::spec::FsError;

/// Extension appended (not substituted) to form the sidecar path.
pub const C_MD5_EXTENSION: &str = "md5";

const N_READ_BUFFER_SIZE: usize = 64 * 1024;

/// `dir/file.txt` -> `dir/file.txt.md5`.
pub fn derive_sidecar_path(path: &Path) -> PathBuf {
    let mut os_path = OsString::from(path.as_os_str());
    os_path.push(".");
    os_path.push(C_MD5_EXTENSION);
    PathBuf::from(os_path)
}

/// Lowercase hex MD5 of the bytes in `path`.
pub fn compute_md5(path: &Path) -> Result<String, FsError> {
    let mut file = fs::File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FsError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => FsError::io(path, e),
    })?;
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; N_READ_BUFFER_SIZE];
    loop {
        let n_read = file.read(&mut buffer).map_err(|e| FsError::io(path, e))?;
        if n_read == 0 {
            break;
        }
        hasher.update(&buffer[..n_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write the MD5 of `path_src` to `path_dst`, or to `<path_src>.md5` when unset.
pub fn create_md5(path_src: &Path, path_dst: Option<&Path>) -> Result<String, FsError> {
    let c_digest = compute_md5(path_src)?;
    let path_sidecar = match path_dst {
        Some(p) => p.to_path_buf(),
        None => derive_sidecar_path(path_src),
    };
    fs::write(&path_sidecar, c_digest.as_bytes()).map_err(|e| FsError::io(&path_sidecar, e))?;
    Ok(c_digest)
}

/// Recompute and overwrite the sidecar of `path`.
pub fn write_sidecar(path: &Path) -> Result<String, FsError> {
    create_md5(path, None)
}

fn read_sidecar(path: &Path) -> Option<Vec<u8>> {
    fs::read(derive_sidecar_path(path)).ok()
}

/// Whether copying `path_src` over `path_dst` can be skipped.
///
/// Requires the target file and both sidecars to exist with equal contents.
/// Never writes anything.
pub fn is_up_to_date(path_src: &Path, path_dst: &Path) -> bool {
    if !path_dst.is_file() {
        return false;
    }
    let Some(raw_digest_dst) = read_sidecar(path_dst) else {
        return false;
    };
    let Some(raw_digest_src) = read_sidecar(path_src) else {
        return false;
    };
    raw_digest_src == raw_digest_dst
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::{compute_md5, create_md5, derive_sidecar_path, is_up_to_date, write_sidecar};
    use crate::spec::FsError;

    #[test]
    fn sidecar_path_appends_extension() {
        assert_eq!(
            derive_sidecar_path(Path::new("dir/alpha.txt")),
            Path::new("dir/alpha.txt.md5")
        );
    }

    #[test]
    fn digest_of_empty_and_known_content() {
        let tmp = TempDir::new().expect("tempdir");
        let path_empty = tmp.path().join("alpha.txt");
        let path_test = tmp.path().join("ação.txt");
        std::fs::write(&path_empty, "").expect("write");
        std::fs::write(&path_test, "test").expect("write");

        assert_eq!(
            compute_md5(&path_empty).expect("md5"),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            compute_md5(&path_test).expect("md5"),
            "098f6bcd4621d373cade4e832627b4f6"
        );
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let tmp = TempDir::new().expect("tempdir");
        let err = compute_md5(&tmp.path().join("missing")).expect_err("must fail");
        assert!(matches!(err, FsError::FileNotFound { .. }));
    }

    #[test]
    fn create_md5_default_and_forced_target() {
        let tmp = TempDir::new().expect("tempdir");
        let path_src = tmp.path().join("alpha.txt");
        std::fs::write(&path_src, "").expect("write");

        create_md5(&path_src, None).expect("create md5");
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("alpha.txt.md5")).expect("read"),
            "d41d8cd98f00b204e9800998ecf8427e"
        );

        let path_forced = tmp.path().join("md5_file");
        create_md5(&path_src, Some(&path_forced)).expect("create md5");
        assert_eq!(
            std::fs::read_to_string(&path_forced).expect("read"),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn up_to_date_requires_every_piece() {
        let tmp = TempDir::new().expect("tempdir");
        let path_src = tmp.path().join("file");
        let path_dst = tmp.path().join("copied_file");
        std::fs::write(&path_src, "payload").expect("write");

        assert!(!is_up_to_date(&path_src, &path_dst));

        std::fs::write(&path_dst, "payload").expect("write");
        write_sidecar(&path_src).expect("sidecar");
        assert!(!is_up_to_date(&path_src, &path_dst));

        write_sidecar(&path_dst).expect("sidecar");
        assert!(is_up_to_date(&path_src, &path_dst));

        std::fs::write(derive_sidecar_path(&path_dst), "00000000000000000000000000000000")
            .expect("write");
        assert!(!is_up_to_date(&path_src, &path_dst));
    }

    #[test]
    fn check_never_writes_sidecars() {
        let tmp = TempDir::new().expect("tempdir");
        let path_src = tmp.path().join("file");
        let path_dst = tmp.path().join("copied_file");
        std::fs::write(&path_src, "a").expect("write");
        std::fs::write(&path_dst, "a").expect("write");

        assert!(!is_up_to_date(&path_src, &path_dst));
        assert!(!derive_sidecar_path(&path_src).exists());
        assert!(!derive_sidecar_path(&path_dst).exists());
    }
}
