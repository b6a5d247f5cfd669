use std::path::{Path, PathBuf};

use log::info;

use crate::config::UserConfig;
use crate::convert::{JsonLinesWriter, MapConverter};
use crate::data::ReferenceTables;
use crate::errors::Result;

use super::parse_osm::{create_osm_reader, ElementReader};
use super::reference::ReferenceEtl;
use super::{commit, partial_path, remove_if_exists, write_partial, Etl};

pub const ETL_NAME: &str = "convert_map";

pub struct Input {
    tables: ReferenceTables,
    output_path: PathBuf,
}

/// Records streamed into the partial file of `output_path`, waiting to be committed.
pub struct Output {
    records: usize,
    output_path: PathBuf,
}

/// Shapes every node and way of the configured extract into a JSON lines file, reconciling
/// addresses with the tables cached by the reference stage.
pub struct ConvertMapEtl<'a> {
    config: &'a UserConfig,
    records: usize,
}

impl ConvertMapEtl<'_> {
    pub fn new(config: &UserConfig) -> ConvertMapEtl<'_> {
        ConvertMapEtl {
            config,
            records: 0,
        }
    }

    pub fn output_path(&self, dir: &Path) -> Result<PathBuf> {
        Ok(dir.join(format!("{}.json", self.config.input_file_name()?)))
    }

    /// Records written by the last load.
    pub fn records(&self) -> usize {
        self.records
    }
}

impl Etl for ConvertMapEtl<'_> {
    type Input = Input;
    type Output = Output;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(self.output_path(dir)?.try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        let path = self.output_path(dir)?;
        remove_if_exists(&partial_path(&path))?;
        remove_if_exists(&path)
    }

    fn extract(&mut self, dir: &Path) -> Result<Self::Input> {
        Ok(Input {
            tables: ReferenceEtl::read_cached(dir)?,
            output_path: self.output_path(dir)?,
        })
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let reader = create_osm_reader(Path::new(&self.config.data_path))?;
        let elements = tqdm::tqdm(ElementReader::new(reader));
        let converter = MapConverter::new(&input.tables)
            .skip_invalid_elements(self.config.skip_invalid_elements);
        let style = self.config.output_style;
        let records = write_partial(&input.output_path, |file| {
            let mut writer = JsonLinesWriter::new(file, style);
            let records = converter.convert_into(elements, &mut writer)?;
            writer.into_inner()?;
            Ok(records)
        })?;
        info!(etl_name = ETL_NAME, records = records; "Shaped elements");
        Ok(Output {
            records,
            output_path: input.output_path,
        })
    }

    fn load(&mut self, _dir: &Path, output: Self::Output) -> Result<()> {
        commit(&output.output_path)?;
        self.records = output.records;
        info!(etl_name = ETL_NAME, records = self.records, path = output.output_path.display().to_string().as_str(); "Wrote records");
        Ok(())
    }
}
