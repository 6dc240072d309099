//! `model_metadata.properties`: flat `key=value` lines, `#` comments.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tactics_core::constants::METADATA_FORMAT_VERSION;
use tactics_core::errors::StorageError;

const VERSION_KEY: &str = "version";
const LAST_SAVE_SUFFIX: &str = ".last_save";

#[derive(Debug, Clone)]
pub struct MetadataFile {
    path: PathBuf,
}

impl MetadataFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries. A missing file reads as empty.
    pub fn read(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::io(&self.path, &e)),
        }
    }

    pub fn last_save(&self, component: &str) -> Option<i64> {
        self.read()
            .ok()?
            .get(&format!("{component}{LAST_SAVE_SUFFIX}"))?
            .parse()
            .ok()
    }

    pub fn version(&self) -> Option<String> {
        self.read().ok()?.remove(VERSION_KEY)
    }

    /// Read, merge `<component>.last_save` for each component, write back
    /// through a temp file and rename.
    pub fn record_saves<'a>(
        &self,
        components: impl IntoIterator<Item = &'a str>,
        millis: i64,
    ) -> Result<(), StorageError> {
        let mut entries = self.read()?;
        for component in components {
            entries.insert(format!("{component}{LAST_SAVE_SUFFIX}"), millis.to_string());
        }
        entries.insert(VERSION_KEY.to_string(), METADATA_FORMAT_VERSION.to_string());
        self.write(&entries)
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let mut text = String::from("# model metadata\n");
        for (key, value) in entries {
            text.push_str(key);
            text.push('=');
            text.push_str(value);
            text.push('\n');
        }
        let tmp = self.path.with_extension("properties.tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| StorageError::io(&tmp, &e))?;
        file.write_all(text.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| StorageError::io(&tmp, &e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StorageError::io(&self.path, &e))
    }
}

fn parse(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_comments_blank_and_malformed_lines() {
        let parsed = parse("# header\n\nversion=1.0.0\nnot a pair\n a.last_save = 12 \n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["a.last_save"], "12");
    }
}
