//! File system repository for tagsets

use crate::domain::tags::{TagLibrary, TagsetDefinition};
use crate::error::{Result, TagweaveError};
use crate::infrastructure::config::WORKSPACE_DIR;
use crate::infrastructure::Config;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Id of the tag library that holds all tagsets of a workspace
pub const WORKSPACE_LIBRARY_ID: &str = "workspace";

const TAGSETS_DIR: &str = "tagsets";

fn tagset_uuid_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap())
}

/// Tagset uuids name files in the store, so they must be plain file stems
fn validate_tagset_uuid(uuid: &str) -> Result<()> {
    if tagset_uuid_regex().is_match(uuid) {
        Ok(())
    } else {
        Err(TagweaveError::Config(format!(
            "Invalid tagset uuid '{}': only letters, digits, '-' and '_' are allowed",
            uuid
        )))
    }
}

/// Abstract repository for workspace operations
pub trait TaxonomyRepository {
    /// Get the root directory of this repository
    fn root(&self) -> &Path;

    /// Load configuration from .tagweave/config.toml
    fn load_config(&self) -> Result<Config>;

    /// Save configuration to .tagweave/config.toml
    fn save_config(&self, config: &Config) -> Result<()>;

    /// Check if .tagweave directory exists
    fn is_initialized(&self) -> bool;

    /// Create .tagweave directory structure
    fn initialize(&self) -> Result<()>;

    /// All stored tagsets as one library
    fn load_library(&self) -> Result<TagLibrary>;

    /// Store every tagset of the library and drop files of tagsets it no longer has
    fn save_library(&self, library: &TagLibrary) -> Result<()>;
}

/// File system implementation of TaxonomyRepository
#[derive(Debug, Clone)]
pub struct FileSystemRepository {
    pub root: PathBuf,
}

impl FileSystemRepository {
    /// Create a new repository with the given root directory
    pub fn new(root: PathBuf) -> Self {
        FileSystemRepository { root }
    }

    /// Discover workspace root by walking up from current directory
    /// First checks TAGWEAVE_ROOT environment variable, then falls back to discovery
    pub fn discover() -> Result<Self> {
        if let Ok(root_path) = std::env::var("TAGWEAVE_ROOT") {
            let path = PathBuf::from(root_path);
            if Self::has_workspace_dir(&path) {
                return Ok(FileSystemRepository::new(path));
            } else {
                return Err(TagweaveError::Config(format!(
                    "TAGWEAVE_ROOT is set to '{}' but no .tagweave directory found. \
                    Run 'tagweave init' in that directory or unset TAGWEAVE_ROOT.",
                    path.display()
                )));
            }
        }

        let current_dir = std::env::current_dir()?;
        Self::discover_from(&current_dir)
    }

    /// Discover workspace root by walking up from a specific starting directory
    pub fn discover_from(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();

        loop {
            if Self::has_workspace_dir(&current) {
                return Ok(FileSystemRepository::new(current));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(TagweaveError::NotTagweaveDirectory(start.to_path_buf())),
            }
        }
    }

    fn has_workspace_dir(path: &Path) -> bool {
        path.join(WORKSPACE_DIR).is_dir()
    }

    fn tagsets_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR).join(TAGSETS_DIR)
    }

    fn tagset_path(&self, uuid: &str) -> Result<PathBuf> {
        validate_tagset_uuid(uuid)?;
        Ok(self.tagsets_dir().join(format!("{}.toml", uuid)))
    }

    /// Read a tagset from any TOML file
    pub fn read_tagset_file(path: &Path) -> Result<TagsetDefinition> {
        let contents = fs::read_to_string(path)?;
        let tagset = toml::from_str(&contents)?;
        Ok(tagset)
    }

    /// Write a tagset to any TOML file, replacing it atomically
    pub fn write_tagset_file(path: &Path, tagset: &TagsetDefinition) -> Result<()> {
        let contents = toml::to_string_pretty(tagset)?;
        write_atomic(path, &contents)
    }

    /// Uuids of all stored tagsets
    pub fn stored_tagset_uuids(&self) -> BTreeSet<String> {
        let dir = self.tagsets_dir();
        if !dir.is_dir() {
            return BTreeSet::new();
        }

        WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?;
                name.strip_suffix(".toml").map(str::to_string)
            })
            .filter(|uuid| tagset_uuid_regex().is_match(uuid))
            .collect()
    }

    pub fn load_tagset(&self, uuid: &str) -> Result<Option<TagsetDefinition>> {
        let path = self.tagset_path(uuid)?;
        if !path.exists() {
            return Ok(None);
        }
        Self::read_tagset_file(&path).map(Some)
    }

    pub fn save_tagset(&self, tagset: &TagsetDefinition) -> Result<()> {
        debug!("saving {}", tagset);
        Self::write_tagset_file(&self.tagset_path(tagset.uuid())?, tagset)
    }

    /// Copy a tagset file from outside the workspace into the store
    pub fn import_tagset(&self, path: &Path) -> Result<TagsetDefinition> {
        let tagset = Self::read_tagset_file(path)?;
        if self.tagset_path(tagset.uuid())?.exists() {
            return Err(TagweaveError::Config(format!(
                "Tagset '{}' ({}) already exists. Use 'tagweave sync' to merge it.",
                tagset.name(),
                tagset.uuid()
            )));
        }
        self.save_tagset(&tagset)?;
        Ok(tagset)
    }

    /// Write a stored tagset to `path`
    pub fn export_tagset(&self, uuid: &str, path: &Path) -> Result<TagsetDefinition> {
        let tagset = self
            .load_tagset(uuid)?
            .ok_or_else(|| TagweaveError::UnknownTagset(uuid.to_string()))?;
        Self::write_tagset_file(path, &tagset)?;
        Ok(tagset)
    }

    /// Returns true if a stored tagset was deleted
    pub fn delete_tagset(&self, uuid: &str) -> Result<bool> {
        let path = self.tagset_path(uuid)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }
}

impl TaxonomyRepository for FileSystemRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn load_config(&self) -> Result<Config> {
        Config::load_from_dir(&self.root)
    }

    fn save_config(&self, config: &Config) -> Result<()> {
        config.save_to_dir(&self.root)
    }

    fn is_initialized(&self) -> bool {
        Self::has_workspace_dir(&self.root)
    }

    fn initialize(&self) -> Result<()> {
        let workspace_dir = self.root.join(WORKSPACE_DIR);

        if workspace_dir.exists() {
            return Err(TagweaveError::Config(format!(
                "Directory already initialized: {}",
                self.root.display()
            )));
        }

        fs::create_dir(&workspace_dir)?;
        fs::create_dir(workspace_dir.join(TAGSETS_DIR))?;
        Ok(())
    }

    fn load_library(&self) -> Result<TagLibrary> {
        let name = self
            .root
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(WORKSPACE_LIBRARY_ID);
        let mut library = TagLibrary::new(WORKSPACE_LIBRARY_ID, name);

        for uuid in self.stored_tagset_uuids() {
            match self.load_tagset(&uuid)? {
                Some(tagset) if tagset.uuid() == uuid => library.add(tagset),
                Some(tagset) => warn!(
                    "skipping {}: file name does not match uuid {}",
                    tagset,
                    tagset.uuid()
                ),
                None => {}
            }
        }

        Ok(library)
    }

    fn save_library(&self, library: &TagLibrary) -> Result<()> {
        for tagset in library.iter() {
            self.save_tagset(tagset)?;
        }

        for uuid in self.stored_tagset_uuids() {
            if library.tagset_definition(&uuid).is_none() {
                debug!("deleting stored tagset {}", uuid);
                self.delete_tagset(&uuid)?;
            }
        }

        Ok(())
    }
}

/// Best-effort atomic replace: write to a temp file in the same directory,
/// then rename into place.
///
/// On Windows, `rename` does not overwrite existing files, so we remove the destination first.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_name = format!(
        "{}.tagweave-tmp-{}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("tagset.toml"),
        std::process::id()
    );
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, content)?;

    if cfg!(windows) && path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tags::TagDefinition;
    use crate::domain::version::Version;
    use tempfile::TempDir;

    fn initialized() -> (TempDir, FileSystemRepository) {
        let temp = TempDir::new().unwrap();
        let repo = FileSystemRepository::new(temp.path().to_path_buf());
        repo.initialize().unwrap();
        (temp, repo)
    }

    fn tagset(uuid: &str, name: &str) -> TagsetDefinition {
        let mut tagset = TagsetDefinition::new(None, uuid, name, Version::new());
        tagset.add_tag_definition(TagDefinition::new("tag-1", "Person", "", Version::new()));
        tagset.add_tag_definition(
            TagDefinition::new("tag-2", "Character", "tag-1", Version::new()).with_color("#ff0000"),
        );
        tagset
    }

    #[test]
    fn test_new_repository() {
        let path = PathBuf::from("/tmp/test");
        let repo = FileSystemRepository::new(path.clone());
        assert_eq!(repo.root, path);
    }

    #[test]
    fn test_initialize_creates_workspace_dirs() {
        let (temp, repo) = initialized();

        assert!(repo.is_initialized());
        assert!(temp.path().join(".tagweave").is_dir());
        assert!(temp.path().join(".tagweave/tagsets").is_dir());
    }

    #[test]
    fn test_initialize_twice_fails() {
        let (_temp, repo) = initialized();
        assert!(repo.initialize().is_err());
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".tagweave")).unwrap();
        let subdir = temp.path().join("sub").join("deep");
        fs::create_dir_all(&subdir).unwrap();

        let repo = FileSystemRepository::discover_from(&subdir).unwrap();
        assert_eq!(repo.root, temp.path());
    }

    #[test]
    fn test_discover_fails_without_workspace() {
        let temp = TempDir::new().unwrap();

        match FileSystemRepository::discover_from(temp.path()).unwrap_err() {
            TagweaveError::NotTagweaveDirectory(_) => {}
            other => panic!("Expected NotTagweaveDirectory error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_and_load_tagset() {
        let (_temp, repo) = initialized();
        let tagset = tagset("tset-1", "People");

        repo.save_tagset(&tagset).unwrap();
        let loaded = repo.load_tagset("tset-1").unwrap().unwrap();

        assert_eq!(loaded, tagset);
        assert_eq!(loaded.tag_definition("tag-2").unwrap().color(), Some("#ff0000"));
        assert!(repo.load_tagset("tset-9").unwrap().is_none());
    }

    #[test]
    fn test_save_library_removes_dropped_tagsets() {
        let (_temp, repo) = initialized();
        let mut library = TagLibrary::new(WORKSPACE_LIBRARY_ID, "ws");
        library.add(tagset("tset-1", "People"));
        library.add(tagset("tset-2", "Places"));
        repo.save_library(&library).unwrap();
        assert_eq!(repo.stored_tagset_uuids().len(), 2);

        library.remove("tset-1");
        repo.save_library(&library).unwrap();

        let loaded = repo.load_library().unwrap();
        assert!(loaded.tagset_definition("tset-1").is_none());
        assert!(loaded.tagset_definition("tset-2").is_some());
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("export.toml");

        FileSystemRepository::write_tagset_file(&path, &tagset("tset-1", "People")).unwrap();
        FileSystemRepository::write_tagset_file(&path, &tagset("tset-1", "People v2")).unwrap();

        let loaded = FileSystemRepository::read_tagset_file(&path).unwrap();
        assert_eq!(loaded.name(), "People v2");
        let leftovers: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_export_then_import_elsewhere() {
        let (source_dir, source) = initialized();
        let (_target_dir, target) = initialized();
        source.save_tagset(&tagset("tset-1", "People")).unwrap();

        let file = source_dir.path().join("people.toml");
        source.export_tagset("tset-1", &file).unwrap();
        let imported = target.import_tagset(&file).unwrap();

        assert_eq!(imported.uuid(), "tset-1");
        assert!(target.load_tagset("tset-1").unwrap().is_some());
        assert!(target.import_tagset(&file).is_err());
        assert!(matches!(
            source.export_tagset("tset-9", &file),
            Err(TagweaveError::UnknownTagset(_))
        ));
    }

    #[test]
    fn test_import_rejects_uuid_outside_store() {
        let (temp, repo) = initialized();
        let file = temp.path().join("incoming.toml");
        FileSystemRepository::write_tagset_file(&file, &tagset("../../escaped", "Escaped")).unwrap();

        assert!(matches!(repo.import_tagset(&file), Err(TagweaveError::Config(_))));
        assert!(!temp.path().join("escaped.toml").exists());
        assert!(!temp.path().parent().unwrap().join("escaped.toml").exists());
        assert!(repo.stored_tagset_uuids().is_empty());
    }

    #[test]
    fn test_tagset_uuid_must_be_file_stem() {
        let (_temp, repo) = initialized();

        for uuid in ["..", "a/b", "a\\b", "", "tset.1"] {
            assert!(
                matches!(repo.load_tagset(uuid), Err(TagweaveError::Config(_))),
                "{:?} accepted",
                uuid
            );
            assert!(repo.delete_tagset(uuid).is_err());
        }
        assert!(repo.save_tagset(&tagset("../escaped", "Escaped")).is_err());
        assert!(repo.load_tagset("0b1e_tset-2").unwrap().is_none());
    }

    #[test]
    fn test_read_malformed_tagset_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.toml");
        fs::write(&path, "uuid = 3").unwrap();

        assert!(matches!(
            FileSystemRepository::read_tagset_file(&path),
            Err(TagweaveError::TomlDeserialize(_))
        ));
    }
}
