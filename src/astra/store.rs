// astra/store.rs
//! Load/save of astra.conf. Re-read on every call; nothing is cached.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{ConfigParser, ParsedConfig};
use crate::error::{Error, Result};

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file text; an absent file reads as empty.
    pub fn load(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("astra.conf not found at {:?}", self.path);
                Ok(String::new())
            }
            Err(e) => Err(Error::io(&self.path, e)),
        }
    }

    /// Load and resolve blocks in one step
    pub fn parse(&self, parser: &ConfigParser) -> Result<ParsedConfig> {
        Ok(parser.parse(&self.load()?))
    }

    pub fn save(&self, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }
        fs::write(&self.path, text).map_err(|e| Error::io(&self.path, e))
    }

    /// Appends one statement, separated from existing content by a blank line
    pub fn append(&self, statement: &str) -> Result<()> {
        let mut text = self.load()?;
        if !text.is_empty() {
            if !text.ends_with('\n') {
                text.push('\n');
            }
            text.push('\n');
        }
        text.push_str(statement.trim_end());
        text.push('\n');
        self.save(&text)?;
        info!("Appended statement to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_parses_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::new(temp_dir.path().join("astra.conf"));
        assert_eq!(store.load().unwrap(), "");
        assert!(store.parse(&ConfigParser::default()).unwrap().is_empty());
    }

    #[test]
    fn test_append_and_reparse() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::new(temp_dir.path().join("etc/astra/astra.conf"));
        store
            .append(r#"d = make_t2mi_decap({ name = "Ch1", pid = 4095 })"#)
            .unwrap();
        store
            .append(r#"make_channel({ input = { "t2mi://d" }, output = { "http://0.0.0.0:9999/out1" } })"#)
            .unwrap();

        let text = store.load().unwrap();
        assert!(text.contains("})\n\nmake_channel"));
        let cfg = store.parse(&ConfigParser::default()).unwrap();
        assert_eq!(cfg.decap_routed["d"].output_url, "http://0.0.0.0:9999/out1");
    }
}
