use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::info;

use crate::config::UserConfig;
use crate::data::osm::{ElementKind, RawElement};
use crate::data::table::ShapedRecord;
use crate::errors::Result;
use crate::etl::normalize::{AddressNormalizer, Normalize};
use crate::etl::parse_osm::OsmReader;
use crate::etl::shape::ElementShaper;
use crate::etl::validate::{Schema, Validate};
use crate::etl::write_tables::{CsvTables, TableFiles, TableSink};
use crate::etl::Etl;

const ETL_NAME: &str = "osm_tables";

type Elements = Box<dyn Iterator<Item = Result<RawElement>>>;

/// Row counts of one run, per table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub nodes: usize,
    pub node_tags: usize,
    pub ways: usize,
    pub way_nodes: usize,
    pub way_tags: usize,
}

impl RunSummary {
    fn add(&mut self, record: &ShapedRecord) {
        match record.kind {
            ElementKind::Node => {
                self.nodes += 1;
                self.node_tags += record.tags.len();
            }
            ElementKind::Way => {
                self.ways += 1;
                self.way_nodes += record.members.len();
                self.way_tags += record.tags.len();
            }
            ElementKind::Relation => (),
        }
    }
}

/// Lazily shapes (and optionally validates) elements as they are pulled.
pub struct ShapedElements<I, N: Normalize> {
    elements: I,
    shaper: Rc<ElementShaper<N>>,
    validator: Option<Rc<dyn Validate>>,
}

impl<I, N> Iterator for ShapedElements<I, N>
where
    I: Iterator<Item = Result<RawElement>>,
    N: Normalize,
{
    type Item = Result<ShapedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let element = match self.elements.next()? {
                Ok(element) => element,
                Err(err) => return Some(Err(err)),
            };
            let record = match self.shaper.shape(&element) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            };
            if let Some(validator) = &self.validator {
                if let Err(err) = validator.validate(&record) {
                    return Some(Err(err));
                }
            }
            return Some(Ok(record));
        }
    }
}

/// Converts one .osm file into the five CSV tables.
pub struct OsmTablesEtl<N: Normalize> {
    source: PathBuf,
    tables: TableFiles,
    shaper: Rc<ElementShaper<N>>,
    validator: Option<Rc<dyn Validate>>,
    progress: bool,
}

impl OsmTablesEtl<AddressNormalizer> {
    pub fn from_config(source: &Path, config: &UserConfig, validate: bool) -> Result<Self> {
        let normalizer = AddressNormalizer::new(config.street_mapping.clone())?;
        let mut etl = OsmTablesEtl::new(source, ElementShaper::with_normalizer(normalizer)?)
            .with_tables(config.tables.clone())
            .with_progress(config.progress);
        if validate {
            etl = etl.with_validator(Schema::default());
        }
        Ok(etl)
    }
}

impl<N: Normalize> OsmTablesEtl<N> {
    pub fn new(source: &Path, shaper: ElementShaper<N>) -> Self {
        OsmTablesEtl {
            source: source.to_path_buf(),
            tables: TableFiles::default(),
            shaper: Rc::new(shaper),
            validator: None,
            progress: false,
        }
    }

    pub fn with_tables(mut self, tables: TableFiles) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_validator(mut self, validator: impl Validate + 'static) -> Self {
        self.validator = Some(Rc::new(validator));
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

impl<N: Normalize> Etl for OsmTablesEtl<N> {
    type Input = OsmReader<Box<dyn BufRead + Send>>;
    type Output = ShapedElements<Elements, N>;
    type Summary = RunSummary;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn extract(&mut self) -> Result<Self::Input> {
        Ok(OsmReader::open(&self.source)?.with_kinds(&[ElementKind::Node, ElementKind::Way]))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        info!(etl_name = ETL_NAME, validate = self.validator.is_some(); "Shaping elements");
        let elements: Elements = if self.progress {
            Box::new(tqdm::tqdm(input))
        } else {
            Box::new(input)
        };
        Ok(ShapedElements {
            elements,
            shaper: Rc::clone(&self.shaper),
            validator: self.validator.clone(),
        })
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<Self::Summary> {
        let mut tables = CsvTables::create(dir, &self.tables)?;
        let mut summary = RunSummary::default();

        for record in output {
            let record = record?;
            tables.write(&record)?;
            summary.add(&record);
        }
        tables.finish()?;

        info!(
            etl_name = ETL_NAME,
            nodes = summary.nodes,
            node_tags = summary.node_tags,
            ways = summary.ways,
            way_nodes = summary.way_nodes,
            way_tags = summary.way_tags;
            "Wrote tables"
        );
        Ok(summary)
    }
}
