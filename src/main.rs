use std::fs::create_dir_all;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_tables::audit::audit_street_types;
use osm_tables::config::{load_user_config, UserConfig};
use osm_tables::data::osm::ElementKind;
use osm_tables::errors::{Error, ErrorKind, Result};
use osm_tables::etl::osm_tables::OsmTablesEtl;
use osm_tables::etl::parse_osm::OsmReader;
use osm_tables::etl::Etl;

#[derive(Parser)]
#[command(name = "osm_tables", version, about = "Convert an .osm export into CSV tables")]
struct Cli {
    /// JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the nodes, node_tags, ways, way_nodes and way_tags tables.
    Convert {
        /// .osm or .osm.xz file.
        source: PathBuf,
        /// Check every element against the table schema (about 10x slower).
        #[arg(long)]
        validate: bool,
        /// Defaults to output/<source file name>.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// List street types missing from the expected list.
    Audit {
        source: PathBuf,
    },
}

fn create_output_dir(source: &Path, out_dir: Option<PathBuf>) -> Result<PathBuf> {
    let output_dir = match out_dir {
        Some(dir) => dir,
        None => {
            let input_fname = source
                .file_name()
                .ok_or_else(|| Error::new(ErrorKind::Config, "Could not get input file name"))?;
            Path::new("output").join(input_fname)
        }
    };
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn setup_logging(config: &UserConfig) {
    Builder::with_level(&config.log_level)
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let user_config = load_user_config(cli.config.as_deref())?;
    setup_logging(&user_config);

    match cli.command {
        Command::Convert { source, validate, out_dir } => {
            let output_dir = create_output_dir(&source, out_dir)?;
            let mut etl = OsmTablesEtl::from_config(&source, &user_config, validate)?;
            etl.process(&output_dir)?;
            let output_dir_name = output_dir.display().to_string();
            info!(output_dir = output_dir_name.as_str(); "Tables written");
        }
        Command::Audit { source } => {
            let reader = OsmReader::open(&source)?.with_kinds(&[ElementKind::Node, ElementKind::Way]);
            let audit = audit_street_types(reader, &user_config.expected_street_types)?;
            info!(street_types = audit.street_types.len(); "Audit finished");
            print!("{}", audit);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_without_file_name_is_a_config_error() {
        let err = create_output_dir(Path::new("/"), None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
    }

    #[test]
    fn explicit_out_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("tables");
        let created = create_output_dir(Path::new("map.osm"), Some(out.clone())).unwrap();
        assert_eq!(created, out);
        assert!(out.is_dir());
    }
}
