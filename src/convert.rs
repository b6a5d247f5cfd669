use std::io::{Read, Write};

use log::warn;
use serde::Deserialize;

use crate::data::{RawElement, ReferenceTables, ShapedRecord};
use crate::errors::Result;
use crate::shape::shape_element;

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// One object per line.
    #[default]
    Compact,
    /// Two-space indented objects, each followed by a newline.
    Pretty,
}

pub struct JsonLinesWriter<W: Write> {
    inner: W,
    style: OutputStyle,
    written: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(inner: W, style: OutputStyle) -> Self {
        JsonLinesWriter { inner, style, written: 0 }
    }

    pub fn write_record(&mut self, record: &ShapedRecord) -> Result<()> {
        match self.style {
            OutputStyle::Compact => serde_json::to_writer(&mut self.inner, record)?,
            OutputStyle::Pretty => serde_json::to_writer_pretty(&mut self.inner, record)?,
        }
        self.inner.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Read back records written by [`JsonLinesWriter`] in either style.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<ShapedRecord>> {
    let records = serde_json::Deserializer::from_reader(reader)
        .into_iter::<ShapedRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Shapes every element of a document, in document order.
pub struct MapConverter<'a> {
    tables: &'a ReferenceTables,
    skip_invalid_elements: bool,
}

impl<'a> MapConverter<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        MapConverter {
            tables,
            skip_invalid_elements: false,
        }
    }

    /// Log and skip elements that cannot be shaped instead of failing the whole conversion.
    /// Errors reading the document itself are always returned.
    pub fn skip_invalid_elements(mut self, skip: bool) -> Self {
        self.skip_invalid_elements = skip;
        self
    }

    fn shape(&self, element: RawElement) -> Result<Option<ShapedRecord>> {
        match shape_element(&element, self.tables) {
            Err(err) if self.skip_invalid_elements => {
                warn!(
                    element_id = element.attribute("id").unwrap_or(""),
                    err = err.message.as_str();
                    "Skipping element that could not be shaped"
                );
                Ok(None)
            },
            shaped => shaped,
        }
    }

    fn for_each_record<I, F>(&self, elements: I, mut f: F) -> Result<()>
    where
        I: IntoIterator<Item = Result<RawElement>>,
        F: FnMut(ShapedRecord) -> Result<()>,
    {
        for element in elements {
            if let Some(record) = self.shape(element?)? {
                f(record)?;
            }
        }
        Ok(())
    }

    /// Shape every element. Elements that do not produce a record are left out.
    pub fn convert<I>(&self, elements: I) -> Result<Vec<ShapedRecord>>
    where
        I: IntoIterator<Item = Result<RawElement>>,
    {
        let mut records = Vec::new();
        self.for_each_record(elements, |record| {
            records.push(record);
            Ok(())
        })?;
        Ok(records)
    }

    /// Like [`MapConverter::convert`], but every record goes to `writer` as soon as it is shaped
    /// and nothing is kept in memory. Returns the number of records written.
    pub fn convert_into<I, W>(&self, elements: I, writer: &mut JsonLinesWriter<W>) -> Result<usize>
    where
        I: IntoIterator<Item = Result<RawElement>>,
        W: Write,
    {
        let before = writer.written();
        self.for_each_record(elements, |record| writer.write_record(&record))?;
        Ok(writer.written() - before)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::data::PrimitiveType;
    use crate::etl::parse_osm::ElementReader;

    const MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="53.3498" lon="-6.2603" version="2" changeset="17206049"
        timestamp="2013-08-03T16:43:42Z" user="linuxUser16" uid="1219059" visible="true">
    <tag k="amenity" v="cafe"/>
    <tag k="addr:city" v="Dublin 6"/>
  </node>
  <node id="2" lat="53.3" lon="-6.4">
    <tag k="addr:city" v="Lucan"/>
  </node>
  <way id="3">
    <nd ref="10"/>
    <nd ref="20"/>
    <tag k="highway" v="residential"/>
  </way>
  <relation id="4">
    <member type="way" ref="3" role="outer"/>
  </relation>
</osm>
"#;

    const BROKEN: &str = r#"<osm>
  <node id="1" lat="1.0" lon="2.0"/>
  <node id="2" lat="north" lon="2.0"/>
  <node id="3" lat="3.0" lon="4.0"/>
</osm>"#;

    fn tables() -> ReferenceTables {
        ReferenceTables::new(
            HashMap::from([("Dublin 6".to_string(), "D6".to_string())]),
            HashMap::from([("Lucan".to_string(), "Kildare".to_string())]),
        )
    }

    #[test]
    fn converts_nodes_and_ways_in_order() {
        let tables = tables();
        let records = MapConverter::new(&tables).convert(ElementReader::from_xml(MAP)).unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(records[0].address["postcode"], "D6");
        assert_eq!(records[1].address["county"], "Kildare");
        assert_eq!(records[2].element_type, PrimitiveType::Way);
        assert_eq!(records[2].node_refs, vec!["10", "20"]);
    }

    #[test]
    fn written_lines_round_trip() {
        let tables = tables();
        for style in [OutputStyle::Compact, OutputStyle::Pretty] {
            let converter = MapConverter::new(&tables);
            let records = converter.convert(ElementReader::from_xml(MAP)).unwrap();
            let mut writer = JsonLinesWriter::new(Vec::new(), style);
            let written = converter.convert_into(ElementReader::from_xml(MAP), &mut writer).unwrap();
            assert_eq!(written, 3);
            assert_eq!(writer.written(), 3);

            let bytes = writer.into_inner().unwrap();
            assert_eq!(read_records(bytes.as_slice()).unwrap(), records);
        }
    }

    #[test]
    fn compact_output_is_one_record_per_line() {
        let tables = tables();
        let mut writer = JsonLinesWriter::new(Vec::new(), OutputStyle::Compact);
        MapConverter::new(&tables).convert_into(ElementReader::from_xml(MAP), &mut writer).unwrap();

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.is_object());
        }
    }

    #[test]
    fn invalid_element_halts_by_default() {
        let tables = tables();
        let err = MapConverter::new(&tables).convert(ElementReader::from_xml(BROKEN)).unwrap_err();
        assert!(err.message.contains("element 2"), "{}", err.message);
    }

    #[test]
    fn invalid_element_can_be_skipped() {
        let tables = tables();
        let records = MapConverter::new(&tables)
            .skip_invalid_elements(true)
            .convert(ElementReader::from_xml(BROKEN))
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!(records.iter().all(|r| r.pos != Some([0.0, 0.0])));
    }

    #[test]
    fn records_before_a_failure_are_already_written() {
        let tables = tables();
        let mut writer = JsonLinesWriter::new(Vec::new(), OutputStyle::Compact);
        let result = MapConverter::new(&tables).convert_into(ElementReader::from_xml(BROKEN), &mut writer);
        assert!(result.is_err());
        assert_eq!(writer.written(), 1);
    }

    #[test]
    fn xml_errors_are_not_skipped() {
        let tables = tables();
        let result = MapConverter::new(&tables)
            .skip_invalid_elements(true)
            .convert(ElementReader::from_xml("<osm><node id=\"1\"></way></osm>"));
        assert!(result.is_err());
    }
}
