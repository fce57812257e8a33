//! Path and directory management.

use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// Ensure a directory exists, creating it if necessary.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    if !tokio::fs::try_exists(path).await? {
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}

/// Check whether `path` lies inside `dir`, comparing lexically normalized forms.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    let path = normalize(path);
    let dir = normalize(dir);
    path != dir && path.starts_with(&dir)
}

/// Lexically normalize a path: drop `.` components and resolve `..` against prior ones.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_within() {
        assert!(is_within(Path::new("tmp/xyz.gif"), Path::new("tmp")));
        assert!(is_within(Path::new("./tmp/xyz.gif"), Path::new("tmp/")));
        assert!(is_within(Path::new("/data/tmp/a.mp4"), Path::new("/data/tmp")));

        assert!(!is_within(Path::new("tmp"), Path::new("tmp")));
        assert!(!is_within(Path::new("other/xyz.gif"), Path::new("tmp")));
        assert!(!is_within(Path::new("tmp/../secret"), Path::new("tmp")));
        assert!(!is_within(Path::new("tmp2/xyz.gif"), Path::new("tmp")));
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_nested() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");

        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());

        // Idempotent
        ensure_dir(&nested).await.unwrap();
    }
}
