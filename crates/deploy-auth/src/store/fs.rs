use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::warn;
use uuid::Uuid;

use crate::error::{AuthError, Result};

/// Replaces `path` through a sibling temp file so readers never see a partial write.
/// There is no locking: concurrent writers still race and the last rename wins.
pub(crate) fn write_private_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|err| AuthError::storage(parent, err))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(err) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                warn!(path = %parent.display(), "failed to restrict directory permissions: {err}");
            }
        }
    }

    let tmp_path = parent.join(format!(".{}.tmp", Uuid::now_v7()));
    let mut options = fs::OpenOptions::new();
    options.create_new(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(&tmp_path)
        .map_err(|err| AuthError::storage(&tmp_path, err))?;
    let written = file
        .write_all(contents.as_bytes())
        .and_then(|()| file.sync_all())
        .and_then(|()| restrict_to_owner(&tmp_path));
    drop(file);
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(AuthError::storage(&tmp_path, err));
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(AuthError::storage(path, err));
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_parent_and_replaces_contents() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("file.json");
        write_private_atomic(&path, "one").expect("first write");
        write_private_atomic(&path, "two").expect("second write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "two");
        let leftovers = fs::read_dir(path.parent().expect("parent"))
            .expect("read dir")
            .count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("secrets.yaml");
        write_private_atomic(&path, "a: b\n").expect("write");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn replacing_a_loose_file_leaves_it_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("secrets.yaml");
        fs::write(&path, "old: value\n").expect("write");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("chmod");
        write_private_atomic(&path, "new: value\n").expect("write");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&path).expect("read"), "new: value\n");
    }

    #[test]
    fn write_into_file_parent_fails() {
        let dir = tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").expect("write blocker");
        let err = write_private_atomic(&blocker.join("file.json"), "{}").expect_err("fails");
        assert!(matches!(err, AuthError::Storage { .. }));
    }
}
