use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;
use serde::Deserialize;

use crate::data::osm::ElementKind;
use crate::data::table::{ShapedRecord, Table};
use crate::errors::Result;

pub trait TableSink {
    /// Appends every row one shaped element contributes.
    fn write(&mut self, record: &ShapedRecord) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

/// File names of the five tables inside the output directory.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TableFiles {
    pub nodes: String,
    pub node_tags: String,
    pub ways: String,
    pub way_nodes: String,
    pub way_tags: String,
}

impl Default for TableFiles {
    fn default() -> Self {
        TableFiles {
            nodes: "nodes.csv".to_string(),
            node_tags: "nodes_tags.csv".to_string(),
            ways: "ways.csv".to_string(),
            way_nodes: "ways_nodes.csv".to_string(),
            way_tags: "ways_tags.csv".to_string(),
        }
    }
}

impl TableFiles {
    pub fn file_name(&self, table: Table) -> &str {
        match table {
            Table::Nodes => &self.nodes,
            Table::NodeTags => &self.node_tags,
            Table::Ways => &self.ways,
            Table::WayNodes => &self.way_nodes,
            Table::WayTags => &self.way_tags,
        }
    }
}

/// Five CSV writers, one per table, each starting with a header row.
pub struct CsvTables<W: Write> {
    nodes: Writer<W>,
    node_tags: Writer<W>,
    ways: Writer<W>,
    way_nodes: Writer<W>,
    way_tags: Writer<W>,
}

impl CsvTables<File> {
    /// Creates (or truncates) all five files before anything is written.
    pub fn create(dir: &Path, files: &TableFiles) -> Result<Self> {
        let open = |table: Table| File::create(dir.join(files.file_name(table)));
        CsvTables::new(
            open(Table::Nodes)?,
            open(Table::NodeTags)?,
            open(Table::Ways)?,
            open(Table::WayNodes)?,
            open(Table::WayTags)?,
        )
    }
}

impl<W: Write> CsvTables<W> {
    pub fn new(nodes: W, node_tags: W, ways: W, way_nodes: W, way_tags: W) -> Result<Self> {
        let with_header = |inner: W, table: Table| -> Result<Writer<W>> {
            let mut writer = Writer::from_writer(inner);
            writer.write_record(table.columns())?;
            Ok(writer)
        };
        Ok(CsvTables {
            nodes: with_header(nodes, Table::Nodes)?,
            node_tags: with_header(node_tags, Table::NodeTags)?,
            ways: with_header(ways, Table::Ways)?,
            way_nodes: with_header(way_nodes, Table::WayNodes)?,
            way_tags: with_header(way_tags, Table::WayTags)?,
        })
    }

    /// Flushes and hands back the underlying writers in table order.
    pub fn into_inner(self) -> Result<[W; 5]> {
        let inner = |writer: Writer<W>| writer.into_inner().map_err(|err| err.error().to_string());
        Ok([
            inner(self.nodes)?,
            inner(self.node_tags)?,
            inner(self.ways)?,
            inner(self.way_nodes)?,
            inner(self.way_tags)?,
        ])
    }
}

impl<W: Write> TableSink for CsvTables<W> {
    fn write(&mut self, record: &ShapedRecord) -> Result<()> {
        match record.kind {
            ElementKind::Node => {
                self.nodes.write_record(record.primary.row(Table::Nodes.columns()))?;
                for tag in &record.tags {
                    self.node_tags.write_record(tag.row())?;
                }
            }
            ElementKind::Way => {
                self.ways.write_record(record.primary.row(Table::Ways.columns()))?;
                for member in &record.members {
                    self.way_nodes.write_record(member.row())?;
                }
                for tag in &record.tags {
                    self.way_tags.write_record(tag.row())?;
                }
            }
            ElementKind::Relation => (),
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.nodes.flush()?;
        self.node_tags.flush()?;
        self.ways.flush()?;
        self.way_nodes.flush()?;
        self.way_tags.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::osm::RawElement;
    use crate::etl::normalize::Passthrough;
    use crate::etl::shape::ElementShaper;

    fn text(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn writes_headers_and_rows_in_column_order() {
        let shaper = ElementShaper::with_normalizer(Passthrough).unwrap();
        let node = RawElement::new(ElementKind::Node)
            .with_attribute("lon", "2.0")
            .with_attribute("id", "1")
            .with_tag("name", "Zoë, \"the\" café");
        let way = RawElement::new(ElementKind::Way)
            .with_attribute("id", "55")
            .with_node_ref("1")
            .with_node_ref("2")
            .with_tag("addr:city", "Paris");

        let mut tables = CsvTables::new(Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new()).unwrap();
        tables.write(&shaper.shape(&node).unwrap().unwrap()).unwrap();
        tables.write(&shaper.shape(&way).unwrap().unwrap()).unwrap();
        tables.finish().unwrap();

        let [nodes, node_tags, ways, way_nodes, way_tags] = tables.into_inner().unwrap();
        assert_eq!(
            text(&nodes),
            "id,lat,lon,user,uid,version,changeset,timestamp\n1,,2.0,,,,,\n"
        );
        assert_eq!(text(&node_tags), "id,key,value,type\n1,name,\"Zoë, \"\"the\"\" café\",regular\n");
        assert_eq!(text(&ways), "id,user,uid,version,changeset,timestamp\n55,,,,,\n");
        assert_eq!(text(&way_nodes), "id,node_id,position\n55,1,0\n55,2,1\n");
        assert_eq!(text(&way_tags), "id,key,value,type\n55,city,Paris,addr\n");
    }

    #[test]
    fn default_file_names() {
        let files = TableFiles::default();
        assert_eq!(files.file_name(Table::WayNodes), "ways_nodes.csv");
        assert_eq!(files.file_name(Table::NodeTags), "nodes_tags.csv");
    }
}
