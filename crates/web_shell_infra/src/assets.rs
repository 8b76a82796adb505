use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::function::Code;
use crate::graph::StackGraph;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read asset '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("asset '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("asset entry '{}' is a symlink; copy its target into the asset instead", .0.display())]
    Symlink(PathBuf),

    #[error("asset '{}' has not been hashed", .0.display())]
    Unhashed(PathBuf),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> AssetError + '_ {
    move |source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Relative paths of every regular file below `dir`, sorted. Symlinks are
/// rejected so the hash and the archive always cover the same bytes.
pub fn asset_files(dir: &Path) -> Result<Vec<PathBuf>, AssetError> {
    if !dir.is_dir() {
        return Err(AssetError::NotADirectory(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    collect_files(dir, dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(root: &Path, current: &Path, files: &mut Vec<PathBuf>) -> Result<(), AssetError> {
    for entry in fs::read_dir(current).map_err(io_error(current))? {
        let entry = entry.map_err(io_error(current))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_error(&path))?;
        if file_type.is_symlink() {
            return Err(AssetError::Symlink(path));
        }
        if file_type.is_dir() {
            collect_files(root, &path, files)?;
        } else if file_type.is_file() {
            if let Ok(relative) = path.strip_prefix(root) {
                files.push(relative.to_path_buf());
            }
        }
    }
    Ok(())
}

/// `/`-separated form of a relative asset path, independent of the host.
pub fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// SHA-256 over the names and contents of every file in `dir`.
pub fn hash_asset_dir(dir: &Path) -> Result<String, AssetError> {
    let mut hasher = Sha256::new();
    for relative in asset_files(dir)? {
        let path = dir.join(&relative);
        let contents = fs::read(&path).map_err(io_error(&path))?;
        hasher.update(archive_name(&relative).as_bytes());
        hasher.update([0u8]);
        hasher.update((contents.len() as u64).to_be_bytes());
        hasher.update(&contents);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn asset_object_key(hash: &str) -> String {
    format!("assets/{hash}.zip")
}

/// Content hashes of the code assets a graph refers to, and the bucket their
/// archives are uploaded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    bucket: String,
    hashes: BTreeMap<PathBuf, String>,
}

impl AssetManifest {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            hashes: BTreeMap::new(),
        }
    }

    /// Hashes every distinct code directory of `graph`, resolved against `root`.
    pub fn collect(
        graph: &StackGraph,
        root: &Path,
        bucket: impl Into<String>,
    ) -> Result<Self, AssetError> {
        let mut manifest = Self::new(bucket);
        for function in graph.functions() {
            let Code::Asset(path) = &function.props.code;
            if manifest.hashes.contains_key(path) {
                continue;
            }
            let hash = hash_asset_dir(&root.join(path))?;
            manifest.insert(path.clone(), hash);
        }
        Ok(manifest)
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, hash: impl Into<String>) {
        self.hashes.insert(path.into(), hash.into());
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn hash_for(&self, path: &Path) -> Option<&str> {
        self.hashes.get(path).map(String::as_str)
    }

    pub fn object_key(&self, path: &Path) -> Result<String, AssetError> {
        self.hash_for(path)
            .map(asset_object_key)
            .ok_or_else(|| AssetError::Unhashed(path.to_path_buf()))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.hashes
            .iter()
            .map(|(path, hash)| (path.as_path(), hash.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write file");
    }

    #[test]
    fn hash_depends_on_contents_not_on_directory_location() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        for dir in [first.path(), second.path()] {
            write(dir, "lambda_function.py", "def lambda_handler(event, context): pass\n");
            write(dir, "lib/util.py", "X = 1\n");
        }

        let hash = hash_asset_dir(first.path()).expect("hash");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_asset_dir(second.path()).expect("hash"));

        write(second.path(), "lib/util.py", "X = 2\n");
        assert_ne!(hash, hash_asset_dir(second.path()).expect("hash"));
    }

    #[test]
    fn renaming_a_file_changes_the_hash() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        write(first.path(), "a.py", "same");
        write(second.path(), "b.py", "same");
        assert_ne!(
            hash_asset_dir(first.path()).expect("hash"),
            hash_asset_dir(second.path()).expect("hash")
        );
    }

    #[test]
    fn lists_nested_files_in_sorted_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "z.py", "");
        write(dir.path(), "a/b.py", "");
        let names: Vec<String> = asset_files(dir.path())
            .expect("list")
            .iter()
            .map(|path| archive_name(path))
            .collect();
        assert_eq!(names, vec!["a/b.py", "z.py"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_entries_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outside = tempfile::tempdir().expect("tempdir");
        write(outside.path(), "shared.py", "X = 1\n");
        write(dir.path(), "lambda_function.py", "");
        std::os::unix::fs::symlink(outside.path().join("shared.py"), dir.path().join("shared.py"))
            .expect("create symlink");

        assert!(matches!(
            hash_asset_dir(dir.path()),
            Err(AssetError::Symlink(path)) if path.ends_with("shared.py")
        ));
        assert!(matches!(
            asset_files(dir.path()),
            Err(AssetError::Symlink(_))
        ));
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        assert!(matches!(
            hash_asset_dir(&missing),
            Err(AssetError::NotADirectory(_))
        ));
    }

    #[test]
    fn object_key_requires_a_hash() {
        let mut manifest = AssetManifest::new("bucket");
        assert!(matches!(
            manifest.object_key(Path::new("lambda/producer")),
            Err(AssetError::Unhashed(_))
        ));

        manifest.insert("lambda/producer", "abc123");
        assert_eq!(
            manifest
                .object_key(Path::new("lambda/producer"))
                .expect("hashed"),
            "assets/abc123.zip"
        );
    }
}
