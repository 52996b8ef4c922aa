use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use zvision_formats::text::decode_latin1;

/// Where `.scr` files come from. Names are bare file names such as `gary.scr`.
pub trait ScriptSource {
    fn read_script(&self, name: &str) -> Option<String>;
}

/// Scripts extracted into one directory. File names are matched without
/// regard to case, as the original archives store them upper-case.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    files: BTreeMap<String, PathBuf>,
}

impl DirectorySource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }

        let files: BTreeMap<String, PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("reading script directory {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?.to_ascii_lowercase();
                Some((name, path))
            })
            .collect();
        debug!("indexed {} script files under {}", files.len(), dir.display());

        Ok(Self {
            root: dir.to_path_buf(),
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ScriptSource for DirectorySource {
    fn read_script(&self, name: &str) -> Option<String> {
        let path = self.files.get(&name.to_ascii_lowercase())?;
        match fs::read(path) {
            Ok(bytes) => Some(decode_latin1(&bytes)),
            Err(err) => {
                warn!("failed to read script {}: {err}", path.display());
                None
            }
        }
    }
}

/// In-memory scripts, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    scripts: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, text: &str) {
        self.scripts
            .insert(name.to_ascii_lowercase(), text.to_string());
    }

    pub fn with_script(mut self, name: &str, text: &str) -> Self {
        self.insert(name, text);
        self
    }
}

impl ScriptSource for MemorySource {
    fn read_script(&self, name: &str) -> Option<String> {
        self.scripts.get(&name.to_ascii_lowercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn directory_lookups_ignore_case() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("GARY.SCR"), "puzzle:1 {\n}\n")?;
        fs::create_dir(dir.path().join("nested"))?;

        let source = DirectorySource::open(dir.path())?;
        assert_eq!(source.len(), 1, "directories are not indexed");
        assert_eq!(
            source.read_script("gary.scr").as_deref(),
            Some("puzzle:1 {\n}\n")
        );
        assert!(source.read_script("ga.scr").is_none());
        Ok(())
    }

    #[test]
    fn scripts_are_read_as_latin1() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("TE1A.SCR"), b"action:set_screen(caf\xe9.png)\n")?;
        let source = DirectorySource::open(dir.path())?;
        assert_eq!(
            source.read_script("te1a.scr").as_deref(),
            Some("action:set_screen(café.png)\n")
        );
        Ok(())
    }

    #[test]
    fn opening_a_missing_directory_fails() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("absent");
        assert!(DirectorySource::open(&missing).is_err());
    }

    #[test]
    fn memory_source_matches_any_case() {
        let source = MemorySource::new().with_script("Universe.scr", "# empty");
        assert_eq!(source.read_script("UNIVERSE.SCR").as_deref(), Some("# empty"));
        assert!(source.read_script("g.scr").is_none());
    }
}
