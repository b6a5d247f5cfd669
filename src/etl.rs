pub mod convert_map;
pub mod parse_osm;
pub mod reference;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use log::{info, error, warn};

use crate::errors::Result;


pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;

    fn is_cached(&self, dir: &Path) -> Result<bool>;
    fn clean(&self, dir: &Path) -> Result<()>;

    fn extract(&mut self, dir: &Path) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    /// Run extract, transform and load unless the output in `dir` is already there.
    fn process(&mut self, dir: &Path) -> Result<()> {
        let name = self.etl_name().to_string();
        info!(etl_name = name.as_str(); "Starting ETL process");
        if self.is_cached(dir)? {
            info!(etl_name = name.as_str(); "Using cached value");
        } else {
            let input = phase(&name, "extract", self.extract(dir))?;
            let output = phase(&name, "transform", self.transform(input))?;
            phase(&name, "load", self.load(dir, output))?;
        }
        info!(etl_name = name.as_str(); "Process finished");
        Ok(())
    }
}

fn phase<T>(etl_name: &str, phase: &str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => info!(etl_name = etl_name, phase = phase; "Phase done"),
        Err(err) => error!(etl_name = etl_name, phase = phase, err = err.message.as_str(); "Phase failed"),
    }
    result
}

/// Where a stage output is written before it is committed under its final name.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Fill the partial file of `path` with `write` and sync it to disk.
/// The partial file is removed again if anything fails.
pub(crate) fn write_partial<T, F>(path: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<T>,
{
    let partial = partial_path(path);
    let result = fill(&partial, write);
    if result.is_err() {
        if let Err(err) = remove_if_exists(&partial) {
            warn!(path = partial.display().to_string().as_str(), err = err.message.as_str(); "Could not remove partial output");
        }
    }
    result
}

fn fill<T, F>(partial: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<T>,
{
    let mut writer = BufWriter::new(File::create(partial)?);
    let value = write(&mut writer)?;
    let file = writer.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    Ok(value)
}

/// Move a finished partial file to `path`. Until this succeeds `path` does not exist,
/// so an interrupted stage is never mistaken for a cached one.
pub(crate) fn commit(path: &Path) -> Result<()> {
    fs::rename(partial_path(path), path)?;
    Ok(())
}

/// Remove a stage output if present.
pub(crate) fn remove_if_exists(path: &Path) -> Result<()> {
    if path.try_exists()? {
        fs::remove_file(path)?;
    }
    Ok(())
}
