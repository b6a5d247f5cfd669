use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::info;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_shape::audit::{self, StreetTypePosition};
use osm_shape::config::{create_output_dir, load_user_config, UserConfig};
use osm_shape::errors::Result;
use osm_shape::etl::convert_map::ConvertMapEtl;
use osm_shape::etl::parse_osm::{create_osm_reader, ElementReader};
use osm_shape::etl::reference::ReferenceEtl;
use osm_shape::etl::Etl;

const DEFAULT_CONFIG: &str = "config/dublin.json";
const USAGE: &str = "usage: osm_shape [CONFIG] [--clean] [--audit]";

struct Args {
    config_path: PathBuf,
    clean: bool,
    audit: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config_path: PathBuf::from(DEFAULT_CONFIG),
        clean: false,
        audit: false,
    };
    let mut positional = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--clean" => args.clean = true,
            "--audit" => args.audit = true,
            flag if flag.starts_with('-') => return Err(format!("Unknown flag {}\n{}", flag, USAGE).into()),
            path if !positional => {
                args.config_path = PathBuf::from(path);
                positional = true;
            },
            _ => return Err(USAGE.into()),
        }
    }
    Ok(args)
}

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn print_counts(title: &str, counts: &audit::Counts) {
    println!("{}", title);
    for (key, count) in audit::by_frequency(counts) {
        println!("{}\t{}", count, key);
    }
}

/// Frequency reports over the raw extract, for deciding on cleaning rules.
fn run_audit(config: &UserConfig, output_dir: &Path) -> Result<()> {
    let data_path = Path::new(&config.data_path);
    let tables = ReferenceEtl::read_cached(output_dir)?;

    print_counts("# elements", &audit::element_counts(create_osm_reader(data_path)?)?);
    print_counts("# tag keys", &audit::key_counts(ElementReader::new(create_osm_reader(data_path)?))?);
    print_counts(
        "# addr:city values without postcode",
        &audit::unmatched_cities(ElementReader::new(create_osm_reader(data_path)?), &tables)?,
    );

    let streets = audit::value_counts(ElementReader::new(create_osm_reader(data_path)?), "addr:street")?;
    let street_types = audit::street_types(streets.keys().map(String::as_str), StreetTypePosition::Back);
    println!("# street types");
    for (street_type, names) in &street_types {
        println!("{}\t{}", street_type, names.iter().cloned().collect::<Vec<_>>().join("; "));
    }
    Ok(())
}

fn main() -> Result<()> {
    setup_logging();
    let start = Instant::now();

    let args = parse_args()?;
    let user_config = load_user_config(&args.config_path)?;
    let output_dir = create_output_dir(&user_config)?;

    let mut reference_etl = ReferenceEtl::new(&user_config);
    let mut convert_etl = ConvertMapEtl::new(&user_config);
    if args.clean {
        reference_etl.clean(&output_dir)?;
        convert_etl.clean(&output_dir)?;
    }

    reference_etl.process(&output_dir)?;
    if args.audit {
        run_audit(&user_config, &output_dir)?;
    } else {
        convert_etl.process(&output_dir)?;
    }

    info!(elapsed_secs = start.elapsed().as_secs_f64(); "Done");
    Ok(())
}
