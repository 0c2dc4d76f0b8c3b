use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;

/// Package manifests that sit next to the data files but are not collections.
pub const MANIFEST_FILES: [&str; 2] = ["package.json", "package-lock.json"];

/// Folders whose files are uploaded as sub-documents of one collection each.
pub const DATA_FOLDERS: [&str; 4] = ["items", "quests", "hideout", "map-events"];

const JSON_SUFFIX: &str = ".json";

/// Immediate files (symlinks resolved) in `dir` whose name ends in `.json`, sorted by name.
pub fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        // Follows symlinks.
        if !path.is_file() {
            continue;
        }

        let is_json = entry
            .file_name()
            .to_str()
            .map(|name| name.ends_with(JSON_SUFFIX))
            .unwrap_or(false);

        if is_json {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub fn is_manifest_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| MANIFEST_FILES.contains(&name))
        .unwrap_or(false)
}

/// File name with the `.json` suffix removed; names collections and sub-documents.
pub fn json_stem(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

    name.strip_suffix(JSON_SUFFIX)
        .map(ToOwned::to_owned)
        .with_context(|| format!("not a JSON file: {}", path.display()))
}

/// Case-insensitive match on the image extensions we publish.
pub struct ImageFilter {
    pattern: Regex,
}

impl ImageFilter {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"(?i)\.(png|jpg|jpeg|webp|gif)$")
            .context("failed to compile image extension regex")?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.is_match(file_name)
    }
}

pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Joins `prefix` and the components of `relative` with `/`, whatever the host separator.
pub fn remote_key(prefix: &str, relative: &Path) -> Result<String> {
    let mut key = prefix.trim_end_matches('/').to_string();

    for component in relative.components() {
        let Component::Normal(part) = component else {
            bail!("unexpected path component in {}", relative.display());
        };
        let part = part
            .to_str()
            .with_context(|| format!("invalid UTF-8 path: {}", relative.display()))?;
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(part);
    }

    Ok(key)
}
