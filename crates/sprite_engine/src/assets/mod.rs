//! Asset loading
//!
//! Games queue images under string keys during `preload`; the engine then
//! loads the whole queue before `setup` runs. Loading is all-or-nothing: if
//! any queued asset cannot be read or decoded, nothing is added to the cache.

mod image;

pub use self::image::Image;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while reading or decoding assets
#[derive(Debug, Error)]
pub enum AssetError {
    /// The asset bytes could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Asset path as queued
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The bytes are not a decodable image
    #[error("Failed to decode {path}: {source}")]
    Decode {
        /// Asset path as queued
        path: String,
        /// Decoder error
        source: ::image::ImageError,
    },

    /// No loaded asset has this key
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Data is malformed
    #[error("Invalid asset data: {0}")]
    InvalidData(String),
}

/// Source of raw asset bytes
pub trait AssetReader {
    /// Read the complete contents of `path`
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError>;
}

/// Reads assets from a directory on disk
#[derive(Debug, Clone)]
pub struct FsReader {
    root: PathBuf,
}

impl FsReader {
    /// Resolve paths relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetReader for FsReader {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full = self.root.join(path);
        std::fs::read(&full).map_err(|source| AssetError::Io {
            path: full.display().to_string(),
            source,
        })
    }
}

/// Serves assets from memory, for embedded data and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryReader {
    /// Create an empty reader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style
    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }
}

impl AssetReader for MemoryReader {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.files.get(path).cloned().ok_or_else(|| AssetError::Io {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such in-memory asset"),
        })
    }
}

/// Keyed cache of decoded images
pub struct AssetCache {
    reader: Box<dyn AssetReader>,
    pending: Vec<(String, String)>,
    images: HashMap<String, Arc<Image>>,
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("pending", &self.pending)
            .field("loaded", &self.images.len())
            .finish_non_exhaustive()
    }
}

impl AssetCache {
    /// Create an empty cache reading through `reader`
    pub fn new(reader: Box<dyn AssetReader>) -> Self {
        Self {
            reader,
            pending: Vec::new(),
            images: HashMap::new(),
        }
    }

    /// Queue `path` to be loaded under `key`
    ///
    /// Queuing a key twice keeps the latest path.
    pub fn add(&mut self, key: impl Into<String>, path: impl Into<String>) {
        let (key, path) = (key.into(), path.into());
        match self.pending.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = path,
            None => self.pending.push((key, path)),
        }
    }

    /// Load every queued asset, then call `on_finish`
    ///
    /// On failure the error names the offending path and the cache, queue
    /// included, is left exactly as it was.
    pub fn load<F: FnOnce()>(&mut self, on_finish: F) -> Result<(), AssetError> {
        let mut decoded = Vec::with_capacity(self.pending.len());
        for (key, path) in &self.pending {
            let bytes = self.reader.read(path)?;
            let image = Image::from_bytes(path, &bytes)?;
            decoded.push((key.clone(), Arc::new(image)));
        }

        if !decoded.is_empty() {
            log::info!("Loaded {} asset(s)", decoded.len());
        }
        self.pending.clear();
        self.images.extend(decoded);
        on_finish();
        Ok(())
    }

    /// Loaded image for `key`
    pub fn get(&self, key: &str) -> Result<Arc<Image>, AssetError> {
        self.images
            .get(key)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(key.to_string()))
    }

    /// Whether `key` has been loaded
    pub fn contains(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    /// Number of loaded images
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether nothing has been loaded
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Queued `(key, path)` pairs in insertion order
    pub fn pending(&self) -> &[(String, String)] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn cache(reader: MemoryReader) -> AssetCache {
        AssetCache::new(Box::new(reader))
    }

    #[test]
    fn test_load_then_get() {
        let mut assets = cache(
            MemoryReader::new()
                .with("bot.png", png(8, 8))
                .with("font.png", png(320, 160)),
        );
        assets.add("bot", "bot.png");
        assets.add("font", "font.png");

        let mut finished = false;
        assets.load(|| finished = true).unwrap();

        assert!(finished);
        assert!(assets.pending().is_empty());
        assert_eq!(assets.len(), 2);
        assert_eq!(assets.get("font").unwrap().width(), 320);
    }

    #[test]
    fn test_get_before_load_is_not_found() {
        let mut assets = cache(MemoryReader::new().with("bot.png", png(8, 8)));
        assets.add("bot", "bot.png");

        assert!(matches!(assets.get("bot"), Err(AssetError::NotFound(key)) if key == "bot"));
        assert!(matches!(assets.get("nobody"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn test_failed_load_leaves_cache_untouched() {
        let mut assets = cache(
            MemoryReader::new()
                .with("good.png", png(4, 4))
                .with("bad.png", b"garbage".to_vec()),
        );
        assets.add("good", "good.png");
        assets.load(|| {}).unwrap();

        assets.add("other", "good.png");
        assets.add("bad", "bad.png");
        let mut finished = false;
        let err = assets.load(|| finished = true).unwrap_err();

        assert!(!finished);
        assert!(err.to_string().contains("bad.png"));
        assert_eq!(assets.len(), 1);
        assert!(!assets.contains("other"));
        assert_eq!(assets.pending().len(), 2);
    }

    #[test]
    fn test_missing_file_names_path() {
        let mut assets = cache(MemoryReader::new());
        assets.add("ghost", "ghost.png");

        let err = assets.load(|| {}).unwrap_err();
        assert!(matches!(err, AssetError::Io { ref path, .. } if path == "ghost.png"));
        assert!(assets.is_empty());
    }

    #[test]
    fn test_empty_queue_finishes_immediately() {
        let mut assets = cache(MemoryReader::new());
        let mut finished = false;
        assets.load(|| finished = true).unwrap();
        assert!(finished);
    }

    #[test]
    fn test_re_adding_key_overwrites_path() {
        let mut assets = cache(MemoryReader::new().with("b.png", png(2, 3)));
        assets.add("sprite", "a.png");
        assets.add("sprite", "b.png");

        assert_eq!(assets.pending(), &[("sprite".to_string(), "b.png".to_string())]);
        assets.load(|| {}).unwrap();
        assert_eq!(assets.get("sprite").unwrap().height(), 3);
    }

    #[test]
    fn test_fs_reader_joins_root() {
        let dir = std::env::temp_dir().join("sprite_engine_fs_reader_test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tile.png"), png(2, 2)).unwrap();

        let mut assets = AssetCache::new(Box::new(FsReader::new(&dir)));
        assets.add("tile", "tile.png");
        assets.load(|| {}).unwrap();
        assert!(assets.contains("tile"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
