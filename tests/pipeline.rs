use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use osm_shape::config::{create_output_dir, UserConfig};
use osm_shape::etl::convert_map::ConvertMapEtl;
use osm_shape::etl::parse_osm::create_osm_reader;
use osm_shape::etl::reference::ReferenceEtl;
use osm_shape::etl::{partial_path, Etl};
use osm_shape::{loader, read_records, ElementReader, MapConverter, OutputStyle, ReferenceTables, ShapedRecord};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data").join(name)
}

fn fixture_tables() -> ReferenceTables {
    let html = fs::read_to_string(fixture("postal_districts.html")).unwrap();
    let towns = File::open(fixture("satellite_towns.json")).unwrap();
    loader::reference_tables(&html, towns).unwrap()
}

fn convert_fixture() -> Vec<ShapedRecord> {
    let tables = fixture_tables();
    let reader = create_osm_reader(&fixture("dublin_sample.osm")).unwrap();
    MapConverter::new(&tables).convert(ElementReader::new(reader)).unwrap()
}

fn record<'a>(records: &'a [ShapedRecord], id: &str) -> &'a ShapedRecord {
    records.iter().find(|r| r.id == id).unwrap()
}

fn config(dest: &Path, style: OutputStyle) -> UserConfig {
    UserConfig {
        data_path: fixture("dublin_sample.osm").display().to_string(),
        dest_path: dest.display().to_string(),
        towns_path: fixture("satellite_towns.json").display().to_string(),
        postal_districts_path: fixture("postal_districts.html").display().to_string(),
        output_style: style,
        skip_invalid_elements: false,
    }
}

fn config_for(data: &str, dest: &Path) -> UserConfig {
    UserConfig {
        data_path: fixture(data).display().to_string(),
        ..config(dest, OutputStyle::Compact)
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("osm_shape_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn only_nodes_and_ways_in_document_order() {
    let ids: Vec<_> = convert_fixture().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["261114295", "1", "757860928", "3", "4", "5", "209809850"]);
}

#[test]
fn first_element_matches_expected_shape() {
    let records = convert_fixture();
    assert_eq!(serde_json::to_value(&records[0]).unwrap(), json!({
        "id": "261114295",
        "visible": "true",
        "type": "node",
        "pos": [41.9730791, -87.6866303],
        "created": {
            "changeset": "11129782",
            "user": "bbmiller",
            "version": "7",
            "uid": "451048",
            "timestamp": "2012-03-28T18:31:23Z",
        },
    }));
}

#[test]
fn minimal_node_has_null_metadata() {
    let records = convert_fixture();
    assert_eq!(serde_json::to_value(record(&records, "1")).unwrap(), json!({
        "id": "1",
        "type": "node",
        "pos": [41.97, -87.68],
        "created": {"version": "7", "changeset": null, "timestamp": null, "user": null, "uid": null},
        "amenity": "cafe",
    }));
}

#[test]
fn address_and_multi_level_tags() {
    let records = convert_fixture();
    let value = serde_json::to_value(record(&records, "757860928")).unwrap();
    assert_eq!(value["address"], json!({"housenumber": "5158", "street": "North Lincoln Avenue"}));
    assert_eq!(value["amenity"], "pharmacy");
    let object = value.as_object().unwrap();
    assert!(object.keys().all(|key| !key.starts_with("addr:")));
}

#[test]
fn cities_are_reconciled() {
    let records = convert_fixture();
    assert_eq!(serde_json::to_value(&record(&records, "3").address).unwrap(), json!({"postcode": "D6"}));
    assert_eq!(
        serde_json::to_value(&record(&records, "4").address).unwrap(),
        json!({"town": "Lucan", "county": "Kildare"})
    );
    assert_eq!(
        serde_json::to_value(&record(&records, "5").address).unwrap(),
        json!({"district": "Ranelagh", "postcode": "D6"})
    );
    assert_eq!(
        serde_json::to_value(&record(&records, "209809850").address).unwrap(),
        json!({"city": "Galway"})
    );
}

#[test]
fn problem_keys_are_excluded() {
    let records = convert_fixture();
    let value = serde_json::to_value(record(&records, "5")).unwrap();
    assert_eq!(value.get("name.en"), None::<&Value>);
}

#[test]
fn way_node_refs() {
    let records = convert_fixture();
    let way = record(&records, "209809850");
    assert_eq!(way.node_refs, vec!["10", "20", "10"]);
    assert_eq!(way.pos, None);
    assert_eq!(way.tags["building"], "yes");
}

#[test]
fn pipeline_writes_and_caches_json_lines() {
    let dest = scratch_dir("pipeline");
    let config = config(&dest, OutputStyle::Compact);
    let output_dir = create_output_dir(&config).unwrap();

    let mut reference_etl = ReferenceEtl::new(&config);
    reference_etl.process(&output_dir).unwrap();
    assert!(reference_etl.is_cached(&output_dir).unwrap());
    assert_eq!(ReferenceEtl::read_cached(&output_dir).unwrap(), fixture_tables());

    let mut convert_etl = ConvertMapEtl::new(&config);
    convert_etl.process(&output_dir).unwrap();
    assert_eq!(convert_etl.records(), 7);

    let output_path = convert_etl.output_path(&output_dir).unwrap();
    assert_eq!(output_path, output_dir.join("dublin_sample.osm.json"));
    let text = fs::read_to_string(&output_path).unwrap();
    assert_eq!(text.lines().count(), 7);
    assert_eq!(read_records(text.as_bytes()).unwrap(), convert_fixture());

    // A second run is served from the cache.
    let mut cached_etl = ConvertMapEtl::new(&config);
    cached_etl.process(&output_dir).unwrap();
    assert_eq!(cached_etl.records(), 0);

    convert_etl.clean(&output_dir).unwrap();
    reference_etl.clean(&output_dir).unwrap();
    assert!(!output_path.exists());
    assert!(!reference_etl.is_cached(&output_dir).unwrap());

    fs::remove_dir_all(&dest).unwrap();
}

#[test]
fn pretty_output_parses_to_the_same_records() {
    let dest = scratch_dir("pretty");
    let config = config(&dest, OutputStyle::Pretty);
    let output_dir = create_output_dir(&config).unwrap();

    ReferenceEtl::new(&config).process(&output_dir).unwrap();
    let mut convert_etl = ConvertMapEtl::new(&config);
    convert_etl.process(&output_dir).unwrap();

    let file = File::open(convert_etl.output_path(&output_dir).unwrap()).unwrap();
    assert_eq!(read_records(file).unwrap(), convert_fixture());

    fs::remove_dir_all(&dest).unwrap();
}

#[test]
fn compressed_extract_gives_the_same_records() {
    let tables = fixture_tables();
    let reader = create_osm_reader(&fixture("dublin_sample.osm.xz")).unwrap();
    let records = MapConverter::new(&tables).convert(ElementReader::new(reader)).unwrap();
    assert_eq!(records, convert_fixture());
}

#[test]
fn compressed_extract_runs_through_the_pipeline() {
    let dest = scratch_dir("xz");
    let config = config_for("dublin_sample.osm.xz", &dest);
    let output_dir = create_output_dir(&config).unwrap();

    ReferenceEtl::new(&config).process(&output_dir).unwrap();
    let mut convert_etl = ConvertMapEtl::new(&config);
    convert_etl.process(&output_dir).unwrap();
    assert_eq!(convert_etl.records(), 7);

    let output_path = convert_etl.output_path(&output_dir).unwrap();
    assert_eq!(output_path, output_dir.join("dublin_sample.osm.xz.json"));
    let file = File::open(output_path).unwrap();
    assert_eq!(read_records(file).unwrap(), convert_fixture());

    fs::remove_dir_all(&dest).unwrap();
}

#[test]
fn leftover_partial_output_is_not_a_cache() {
    let dest = scratch_dir("leftover");
    let config = config(&dest, OutputStyle::Compact);
    let output_dir = create_output_dir(&config).unwrap();
    ReferenceEtl::new(&config).process(&output_dir).unwrap();

    // What an interrupted run leaves behind.
    let mut convert_etl = ConvertMapEtl::new(&config);
    let output_path = convert_etl.output_path(&output_dir).unwrap();
    fs::write(partial_path(&output_path), "{\"id\":\"261114295\",\"ty").unwrap();
    assert!(!convert_etl.is_cached(&output_dir).unwrap());

    convert_etl.process(&output_dir).unwrap();
    assert_eq!(convert_etl.records(), 7);
    assert!(!partial_path(&output_path).exists());
    let file = File::open(&output_path).unwrap();
    assert_eq!(read_records(file).unwrap(), convert_fixture());

    fs::remove_dir_all(&dest).unwrap();
}

#[test]
fn failed_conversion_leaves_no_output() {
    let dest = scratch_dir("failed");
    let config = config_for("invalid_coords.osm", &dest);
    let output_dir = create_output_dir(&config).unwrap();
    ReferenceEtl::new(&config).process(&output_dir).unwrap();

    let mut convert_etl = ConvertMapEtl::new(&config);
    let err = convert_etl.process(&output_dir).unwrap_err();
    assert!(err.message.contains("element 2"), "{}", err.message);

    let output_path = convert_etl.output_path(&output_dir).unwrap();
    assert!(!output_path.exists());
    assert!(!partial_path(&output_path).exists());
    assert!(!convert_etl.is_cached(&output_dir).unwrap());

    // The same extract converts once bad elements may be skipped.
    let skipping = UserConfig { skip_invalid_elements: true, ..config.clone() };
    let mut convert_etl = ConvertMapEtl::new(&skipping);
    convert_etl.process(&output_dir).unwrap();
    assert_eq!(convert_etl.records(), 2);

    fs::remove_dir_all(&dest).unwrap();
}

#[test]
fn conversion_without_reference_cache_fails() {
    let dest = scratch_dir("no_reference");
    let config = config(&dest, OutputStyle::Compact);
    let output_dir = create_output_dir(&config).unwrap();

    let err = ConvertMapEtl::new(&config).process(&output_dir).unwrap_err();
    assert!(err.message.contains(osm_shape::etl::reference::OUTPUT_FILE_NAME), "{}", err.message);

    fs::remove_dir_all(&dest).unwrap();
}
