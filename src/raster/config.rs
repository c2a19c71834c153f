//! Raster input configuration.

use serde::{Deserialize, Serialize};

use super::grid::GridGeometry;

/// Subfolder names of the four environmental layers inside an input directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerFolders {
    pub sst: String,
    pub chla_surface: String,
    pub mld: String,
    pub zoo: String,
}

impl Default for LayerFolders {
    fn default() -> Self {
        Self {
            sst: "sst".to_string(),
            chla_surface: "chl_surface".to_string(),
            mld: "mld".to_string(),
            zoo: "zoo_200".to_string(),
        }
    }
}

/// Where and how to read environmental rasters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Geometry shared by every layer file.
    pub geometry: GridGeometry,
    #[serde(default)]
    pub folders: LayerFolders,
}
