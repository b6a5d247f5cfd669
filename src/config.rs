use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::convert::OutputStyle;
use crate::errors::{Error, Result};

#[derive(Deserialize, Debug, Clone)]
pub struct UserConfig {
    /// .osm or .osm.xz extract to convert.
    pub data_path: String,
    /// Root of the output tree; each input gets its own directory below it.
    pub dest_path: String,
    /// JSON list of `{"town": "county"}` objects.
    pub towns_path: String,
    /// Saved copy of the An Post delivery zone page.
    pub postal_districts_path: String,
    #[serde(default)]
    pub output_style: OutputStyle,
    #[serde(default)]
    pub skip_invalid_elements: bool,
}

impl UserConfig {
    pub fn input_file_name(&self) -> Result<String> {
        let name = Path::new(&self.data_path)
            .file_name()
            .ok_or("Could not get input file name")?;
        Ok(name.to_string_lossy().into_owned())
    }

    pub fn output_dir(&self) -> Result<PathBuf> {
        Ok(Path::new(&self.dest_path).join(self.input_file_name()?))
    }
}

pub fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)
        .map_err(|err| Error::from(err).context(&format!("Could not open config file {}", path.display())))?;
    let config = serde_json::from_reader(file)
        .map_err(|err| Error::from(err).context("Could not parse config"))?;
    Ok(config)
}

pub fn create_output_dir(config: &UserConfig) -> Result<PathBuf> {
    let output_dir = config.output_dir()?;
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}
