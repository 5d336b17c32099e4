use crate::StoreError;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Create a deterministic tar archive from a package directory.
///
/// Regular files, directories, and symlinks are supported; other file types
/// are skipped with a warning.
///
/// Determinism guarantees:
/// - Each directory's entries appended in name order, parents before children
/// - All timestamps set to 0 (Unix epoch)
/// - All ownership set to 0:0 (root:root)
/// - Fixed 0o644/0o755 modes, independent of the packing host's umask
pub fn pack_archive(source_dir: &Path) -> Result<Vec<u8>, StoreError> {
    let mut ar = tar::Builder::new(Vec::new());
    ar.follow_symlinks(false);
    append_tree(&mut ar, source_dir, Path::new(""))?;
    Ok(ar.into_inner()?)
}

/// Extract a package archive into a target directory.
///
/// Every member path is validated before anything is written: absolute
/// paths and `..` components are rejected, so a hostile archive cannot
/// write outside `target_dir`.
pub fn unpack_archive(tar_data: &[u8], target_dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(target_dir)?;

    let mut ar = tar::Archive::new(tar_data);
    ar.set_preserve_permissions(true);
    ar.set_preserve_mtime(false);
    ar.set_unpack_xattrs(false);

    for entry in ar.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        validate_member_path(&path)?;
        entry.unpack_in(target_dir)?;
    }
    Ok(())
}

fn validate_member_path(path: &Path) -> Result<(), StoreError> {
    let safe = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(())
    } else {
        Err(StoreError::UnsafeArchivePath(
            path.to_string_lossy().into_owned(),
        ))
    }
}

/// Append one directory level to the archive in name order, descending into
/// each subdirectory right after its own entry so parents always precede
/// their children. `prefix` is the archive-relative path of `dir`.
fn append_tree(
    ar: &mut tar::Builder<Vec<u8>>,
    dir: &Path,
    prefix: &Path,
) -> Result<(), StoreError> {
    if !dir.exists() {
        return Ok(());
    }

    let mut children: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        children.push((name, entry.path()));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, full) in children {
        let rel = prefix.join(&name);
        let rel_str = rel.to_string_lossy().into_owned();
        let ft = match full.symlink_metadata() {
            Ok(meta) => meta.file_type(),
            Err(e) => {
                warn!("skipping {rel_str}: metadata error: {e}");
                continue;
            }
        };

        if ft.is_file() {
            append_file(ar, &rel_str, &full)?;
        } else if ft.is_dir() {
            append_dir(ar, &rel_str)?;
            append_tree(ar, &full, &rel)?;
        } else if ft.is_symlink() {
            append_symlink(ar, &rel_str, &full)?;
        } else {
            warn!("skipping unsupported file type: {rel_str}");
        }
    }
    Ok(())
}

fn make_header(entry_type: tar::EntryType) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(entry_type);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mode(0o644);
    header
}

fn append_file(
    ar: &mut tar::Builder<Vec<u8>>,
    rel_path: &str,
    full_path: &Path,
) -> Result<(), StoreError> {
    let data = fs::read(full_path)?;
    let mut header = make_header(tar::EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_cksum();
    ar.append_data(&mut header, rel_path, data.as_slice())?;
    Ok(())
}

fn append_dir(ar: &mut tar::Builder<Vec<u8>>, rel_path: &str) -> Result<(), StoreError> {
    let mut header = make_header(tar::EntryType::Directory);
    header.set_mode(0o755);
    header.set_size(0);
    header.set_cksum();
    let path = if rel_path.ends_with('/') {
        rel_path.to_owned()
    } else {
        format!("{rel_path}/")
    };
    ar.append_data(&mut header, &path, &[] as &[u8])?;
    Ok(())
}

fn append_symlink(
    ar: &mut tar::Builder<Vec<u8>>,
    rel_path: &str,
    full_path: &Path,
) -> Result<(), StoreError> {
    let target = fs::read_link(full_path)?;
    let mut header = make_header(tar::EntryType::Symlink);
    header.set_size(0);
    header.set_cksum();
    ar.append_link(&mut header, rel_path, &target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack_roundtrip() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("recipe.toml"), "name = \"A\"").unwrap();
        fs::create_dir(src.path().join("src")).unwrap();
        fs::write(src.path().join("src").join("main.cpp"), "int main() {}").unwrap();

        let data = pack_archive(src.path()).unwrap();

        let dest = tempfile::tempdir().unwrap();
        unpack_archive(&data, dest.path()).unwrap();

        assert_eq!(
            fs::read_to_string(dest.path().join("recipe.toml")).unwrap(),
            "name = \"A\""
        );
        assert_eq!(
            fs::read_to_string(dest.path().join("src").join("main.cpp")).unwrap(),
            "int main() {}"
        );
    }

    #[test]
    fn pack_is_deterministic() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("b.txt"), "b").unwrap();
        fs::write(src.path().join("a.txt"), "a").unwrap();

        let first = pack_archive(src.path()).unwrap();
        let second = pack_archive(src.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn pack_empty_directory() {
        let src = tempfile::tempdir().unwrap();
        let data = pack_archive(src.path()).unwrap();
        let dest = tempfile::tempdir().unwrap();
        unpack_archive(&data, dest.path()).unwrap();
        assert!(dest.path().is_dir());
    }

    #[test]
    fn unpack_rejects_parent_traversal() {
        let mut ar = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(4);
        let name = b"../evil.txt";
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_cksum();
        ar.append(&header, b"evil".as_slice()).unwrap();
        let data = ar.into_inner().unwrap();

        let dest = tempfile::tempdir().unwrap();
        let err = unpack_archive(&data, dest.path()).unwrap_err();
        assert!(matches!(err, StoreError::UnsafeArchivePath(_)));
    }

    #[test]
    fn unpack_into_missing_directory_creates_it() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("f"), "x").unwrap();
        let data = pack_archive(src.path()).unwrap();

        let base = tempfile::tempdir().unwrap();
        let dest = base.path().join("nested").join("dir");
        unpack_archive(&data, &dest).unwrap();
        assert!(dest.join("f").is_file());
    }
}
