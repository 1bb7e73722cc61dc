//! Shared filesystem helpers.

use std::fs::Permissions;
use std::io::Write;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A regular file found under a walked root.
#[derive(Debug, Clone)]
pub struct WalkedFile {
    /// Full path on disk
    pub path: PathBuf,
    /// Path relative to the walked root
    pub relative: PathBuf,
    /// File name only
    pub name: String,
    /// 1 for files directly inside the root, 2 one directory down, ...
    pub depth: usize,
}

/// Collect every regular file under `root`, entries sorted by name within
/// each directory. `max_depth` limits how far down the walk goes.
///
/// Symbolic links are followed, so a linked file is listed under the link's
/// name. A missing root yields no files.
pub fn walk_files(root: &Path, max_depth: Option<usize>) -> std::io::Result<Vec<WalkedFile>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    if let Some(max_depth) = max_depth {
        walker = walker.max_depth(max_depth);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(entry.file_name()));
        files.push(WalkedFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            depth: entry.depth(),
            relative,
            path: entry.into_path(),
        });
    }
    Ok(files)
}

/// Write `contents` to `path` in full or not at all: the bytes go to a
/// temporary sibling which is then renamed over the destination.
///
/// The result is world-readable (`0o644` on Unix) so a web server running as
/// another user can publish it.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    write_with_permissions(path, contents, published_permissions())
}

/// Copy a file byte-for-byte with the same all-or-nothing guarantee as
/// [`write_atomic`], keeping the source file's permissions.
pub fn copy_atomic(from: &Path, to: &Path) -> std::io::Result<()> {
    let contents = std::fs::read(from)?;
    let permissions = std::fs::metadata(from)?.permissions();
    write_with_permissions(to, &contents, Some(permissions))
}

#[cfg(unix)]
fn published_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn published_permissions() -> Option<Permissions> {
    None
}

fn write_with_permissions(
    path: &Path,
    contents: &[u8],
    permissions: Option<Permissions>,
) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Swap a markdown extension (any case) for `.html`; other extensions are
/// kept as they are.
pub fn converted_path(relative: &Path) -> PathBuf {
    let is_markdown = relative
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"));

    if is_markdown {
        relative.with_extension("html")
    } else {
        relative.to_path_buf()
    }
}

/// File name without its final extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Forward-slash form of a relative path, for links.
pub fn to_url_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_converted_path() {
        assert_eq!(converted_path(Path::new("a.md")), PathBuf::from("a.html"));
        assert_eq!(converted_path(Path::new("sub/B.MD")), PathBuf::from("sub/B.html"));
        assert_eq!(converted_path(Path::new("c.markdown")), PathBuf::from("c.html"));
        assert_eq!(converted_path(Path::new("d.html")), PathBuf::from("d.html"));
    }

    #[test]
    fn test_walk_files_depth_and_order() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.md"), "").unwrap();
        std::fs::write(dir.path().join("a.md"), "").unwrap();
        std::fs::write(dir.path().join("sub/c.md"), "").unwrap();

        let all = walk_files(dir.path(), None).unwrap();
        let names: Vec<_> = all.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.md", "c.md"]);
        assert_eq!(all[2].depth, 2);
        assert_eq!(all[2].relative, PathBuf::from("sub/c.md"));

        let top = walk_files(dir.path(), Some(1)).unwrap();
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_walk_missing_root() {
        let dir = TempDir::new().unwrap();
        assert!(walk_files(&dir.path().join("nope"), None).unwrap().is_empty());
    }

    #[test]
    fn test_write_atomic_creates_parents_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x/y/out.html");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        let leftovers = std::fs::read_dir(dir.path().join("x/y")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_follows_symlinked_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("real.css"), "body {}").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.css"), root.join("style.css")).unwrap();

        let files = walk_files(&root, None).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, PathBuf::from("style.css"));
        assert_eq!(std::fs::read_to_string(&files[0].path).unwrap(), "body {}");
    }

    #[cfg(unix)]
    #[test]
    fn test_written_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let page = dir.path().join("out/a.html");
        write_atomic(&page, b"<p>hi</p>").unwrap();
        let mode = std::fs::metadata(&page).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);

        let script = dir.path().join("run.sh");
        std::fs::write(&script, "#!/bin/sh").unwrap();
        std::fs::set_permissions(&script, Permissions::from_mode(0o755)).unwrap();
        let copied = dir.path().join("out/run.sh");
        copy_atomic(&script, &copied).unwrap();
        let mode = std::fs::metadata(&copied).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_to_url_path() {
        assert_eq!(to_url_path(Path::new("sub/dir/a.html")), "sub/dir/a.html");
    }
}
