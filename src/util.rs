use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Resolves `.` and `..` components without touching the filesystem. A `..`
/// that would climb above the root is dropped; one that would climb above
/// the start of a relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Writes `contents` to a hidden temporary file beside `path` and renames it
/// into place, so `path` either doesn't exist or holds all of `contents`.
pub fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let temp_path = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        nanos
    ));
    if let Err(e) = std::fs::write(&temp_path, contents) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }
    std::fs::rename(&temp_path, path)
}

/// Builds a `/`-separated link from the directory `from` to `to`, climbing
/// out of `from` with `../` as needed. Both paths must be relative to the
/// same base (or both absolute); `..` components are resolved first. If they
/// share no ancestor, `to` is returned as-is. Returns an empty string when
/// `to` is `from` itself.
pub fn relative_href(from: &Path, to: &Path) -> String {
    let from = normalize(from);
    let to = normalize(to);
    let mut ups = 0;
    let mut ancestor = Some(from.as_path());
    while let Some(dir) = ancestor {
        if let Ok(rest) = to.strip_prefix(dir) {
            let mut parts: Vec<String> = vec![String::from(".."); ups];
            parts.extend(rest.components().filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            }));
            return parts.join("/");
        }
        ups += 1;
        ancestor = dir.parent();
    }
    to.to_string_lossy().into_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_relative_href_to_parent_file() {
        assert_eq!(
            "../index.html",
            relative_href(Path::new("/site/posts"), Path::new("/site/index.html"))
        );
    }

    #[test]
    fn test_relative_href_into_subdirectory() {
        assert_eq!(
            "posts",
            relative_href(Path::new("/site"), Path::new("/site/posts"))
        );
        assert_eq!(
            "out/posts",
            relative_href(Path::new("/site"), Path::new("/site/./out/posts"))
        );
    }

    #[test]
    fn test_relative_href_same_directory() {
        assert_eq!("", relative_href(Path::new("/site"), Path::new("/site")));
    }

    #[test]
    fn test_relative_href_resolves_parent_components() {
        assert_eq!(
            "../site/index.html",
            relative_href(Path::new("/site/../out"), Path::new("/site/index.html"))
        );
        assert_eq!(
            "../out",
            relative_href(Path::new("/site/./"), Path::new("/site/../out"))
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(PathBuf::from("/out"), normalize(Path::new("/site/../out")));
        assert_eq!(PathBuf::from("/a/c"), normalize(Path::new("/a/./b/../c")));
        assert_eq!(PathBuf::from("/x"), normalize(Path::new("/../x")));
        assert_eq!(PathBuf::from("../x"), normalize(Path::new("a/../../x")));
    }

    #[test]
    fn test_write_atomically_replaces_contents() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("page.html");
        std::fs::write(&path, "old")?;
        write_atomically(&path, b"new")?;
        assert_eq!("new", std::fs::read_to_string(&path)?);
        let leftovers = std::fs::read_dir(dir.path())?.count();
        assert_eq!(1, leftovers);
        Ok(())
    }

    #[test]
    fn test_relative_href_across_trees() {
        assert_eq!(
            "../../www/index.html",
            relative_href(Path::new("/data/posts"), Path::new("/www/index.html"))
        );
    }
}
