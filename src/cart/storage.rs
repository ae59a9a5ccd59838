use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use super::CartLine;
use crate::config::ClientConfig;

/// Fixed key the cart is persisted under.
pub const CART_STORAGE_KEY: &str = "cart";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cart storage unavailable: {0}")]
    Io(#[from] io::Error),

    #[error("stored cart is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Client-local persistence for the cart's line sequence.
///
/// Every call is a complete acquire/write/release cycle; implementations do
/// not hold handles between calls.
pub trait CartStorage {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<CartLine>>, StorageError>;

    fn save(&mut self, lines: &[CartLine]) -> Result<(), StorageError>;

    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Stores the cart as a JSON array in `<dir>/cart.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.cart_dir.clone())
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{CART_STORAGE_KEY}.json"))
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join(format!("{CART_STORAGE_KEY}.json.tmp"))
    }
}

impl CartStorage for FileStorage {
    fn load(&self) -> Result<Option<Vec<CartLine>>, StorageError> {
        let raw = match fs::read_to_string(self.path()) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let lines = serde_json::from_str(&raw)?;
        Ok(Some(lines))
    }

    fn save(&mut self, lines: &[CartLine]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let body = serde_json::to_vec(lines)?;
        // Write then rename so a failed write never leaves a torn cart file.
        let tmp = self.temp_path();
        fs::write(&tmp, body)?;
        fs::rename(&tmp, self.path())?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        remove_if_present(&self.path())?;
        remove_if_present(&self.temp_path())?;
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

/// Keeps the serialized cart in memory. Data is still round-tripped through
/// JSON so it behaves like the on-disk format.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    raw: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the storage with raw contents, e.g. to simulate a corrupt entry.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Vec<CartLine>>, StorageError> {
        match &self.raw {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, lines: &[CartLine]) -> Result<(), StorageError> {
        self.raw = Some(serde_json::to_string(lines)?);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.raw = None;
        Ok(())
    }
}
