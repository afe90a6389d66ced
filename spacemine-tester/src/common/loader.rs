use serde::de::DeserializeOwned;
use spacemine_core::{
    AsteroidCatalog, CatalogError, CatalogLoader, StaticCatalogLoader, StaticLoadError,
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TesterLoadError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Bundled(#[from] StaticLoadError),
}

/// Serves a catalog file when one is given and the bundled assets otherwise.
#[derive(Debug, Clone, Default)]
pub struct TesterLoader {
    catalog: Option<PathBuf>,
}

impl TesterLoader {
    pub const fn new(catalog: Option<PathBuf>) -> Self {
        Self { catalog }
    }
}

impl CatalogLoader for TesterLoader {
    type Error = TesterLoadError;

    fn load_catalog(&self) -> Result<AsteroidCatalog, Self::Error> {
        let Some(path) = &self.catalog else {
            return Ok(StaticCatalogLoader.load_catalog()?);
        };
        let json = std::fs::read_to_string(path).map_err(|source| TesterLoadError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(AsteroidCatalog::from_json(&json)?)
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        Ok(StaticCatalogLoader.load_config(config_name)?)
    }
}
