use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::UserConfig;
use crate::data::ReferenceTables;
use crate::errors::{Error, Result};
use crate::loader;

use super::{commit, partial_path, remove_if_exists, write_partial, Etl};

pub const ETL_NAME: &str = "reference";
pub const OUTPUT_FILE_NAME: &str = "reference_tables.json";

pub struct Input {
    postal_districts_html: String,
    towns_json: Vec<u8>,
}

/// Builds the postcode and town lookup tables once and caches them next to the conversion output.
pub struct ReferenceEtl<'a> {
    config: &'a UserConfig,
}

impl ReferenceEtl<'_> {
    pub fn new(config: &UserConfig) -> ReferenceEtl<'_> {
        ReferenceEtl {
            config
        }
    }

    pub fn output_path(dir: &Path) -> PathBuf {
        dir.join(OUTPUT_FILE_NAME)
    }

    /// Tables written by a previous run of this stage.
    pub fn read_cached(dir: &Path) -> Result<ReferenceTables> {
        let path = Self::output_path(dir);
        let file = File::open(&path)
            .map_err(|err| Error::from(err).context(&path.display().to_string()))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

fn read_source(path: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|err| Error::from(err).context(path))
}

impl Etl for ReferenceEtl<'_> {
    type Input = Input;
    type Output = ReferenceTables;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(Self::output_path(dir).try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        let path = Self::output_path(dir);
        remove_if_exists(&partial_path(&path))?;
        remove_if_exists(&path)
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let html = read_source(&self.config.postal_districts_path)?;
        Ok(Input {
            // Saved pages are not always clean UTF-8.
            postal_districts_html: String::from_utf8_lossy(&html).into_owned(),
            towns_json: read_source(&self.config.towns_path)?,
        })
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let tables = loader::reference_tables(&input.postal_districts_html, input.towns_json.as_slice())?;
        info!(postcodes = tables.postcodes.len(), towns = tables.towns.len(); "Built reference tables");
        Ok(tables)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let path = Self::output_path(dir);
        write_partial(&path, |writer| Ok(serde_json::to_writer_pretty(writer, &output)?))?;
        commit(&path)
    }
}
