use anyhow::{Context, Result};
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::{ItemKey, Tag};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Tags decoded from one audio file.
///
/// Keys are lower-case "easy" names (`artist`, `albumartist`, `style`, ...),
/// each mapping to every value the file carries for that key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackTags {
    pub(crate) values: FxHashMap<String, Vec<String>>,
    pub duration_secs: Option<f64>,
    pub embedded_picture: Option<Vec<u8>>,
}

impl TrackTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `key` (lower-cased)
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .entry(key.to_lowercase())
            .or_default()
            .push(value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values of the first key in `keys` that is present, or `[default]`
    pub fn get(&self, keys: &[&str], default: &str) -> Vec<String> {
        keys.iter()
            .find_map(|key| self.values.get(*key).filter(|values| !values.is_empty()))
            .cloned()
            .unwrap_or_else(|| vec![default.to_string()])
    }

    /// First value of the first key in `keys` that is present, or `default`
    pub fn first(&self, keys: &[&str], default: &str) -> String {
        self.get(keys, default)
            .into_iter()
            .next()
            .unwrap_or_else(|| default.to_string())
    }
}

/// Decodes an audio file into [`TrackTags`]
pub trait TagReader {
    fn read(&self, path: &Path) -> Result<TrackTags>;
}

/// [`TagReader`] backed by lofty
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<TrackTags> {
        let tagged_file = lofty::read_from_path(path)
            .with_context(|| format!("Failed to read audio file '{}'", path.display()))?;

        let mut tags = TrackTags::new();

        let duration = tagged_file.properties().duration().as_secs_f64();
        if duration > 0.0 {
            tags.duration_secs = Some(duration);
        }

        for tag in tagged_file.tags() {
            collect_items(tag, &mut tags);
            if tags.embedded_picture.is_none() {
                tags.embedded_picture = tag.pictures().first().map(|p| p.data().to_vec());
            }
        }

        Ok(tags)
    }
}

fn collect_items(tag: &Tag, tags: &mut TrackTags) {
    for item in tag.items() {
        let Some(text) = item.value().text() else {
            continue;
        };
        if let Some(name) = easy_key_name(item.key()) {
            tags.insert(&name, text);
        }
    }
}

/// Map a lofty item key onto the conventional easy tag name
fn easy_key_name(key: &ItemKey) -> Option<String> {
    let name = match key {
        ItemKey::TrackArtist => "artist",
        ItemKey::AlbumArtist => "albumartist",
        ItemKey::AlbumTitle => "album",
        ItemKey::TrackTitle => "title",
        ItemKey::Genre => "genre",
        ItemKey::Label => "label",
        ItemKey::CatalogNumber => "catalognumber",
        ItemKey::RecordingDate => "date",
        ItemKey::Year => "year",
        ItemKey::Unknown(raw) => return Some(raw.to_lowercase()),
        _ => return None,
    };
    Some(name.to_string())
}
