use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::audit::default_expected_street_types;
use crate::errors::Result;
use crate::etl::normalize::default_street_mapping;
use crate::etl::write_tables::TableFiles;

/// Settings read from the JSON file passed with `--config`. Every field is optional.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UserConfig {
    pub log_level: String,
    pub progress: bool,
    /// Street type abbreviation -> full name, e.g. "Ave" -> "Avenue".
    pub street_mapping: BTreeMap<String, String>,
    pub expected_street_types: Vec<String>,
    pub tables: TableFiles,
}

impl Default for UserConfig {
    fn default() -> Self {
        UserConfig {
            log_level: "info".to_string(),
            progress: false,
            street_mapping: default_street_mapping(),
            expected_street_types: default_expected_street_types(),
            tables: TableFiles::default(),
        }
    }
}

pub fn load_user_config(path: Option<&Path>) -> Result<UserConfig> {
    match path {
        Some(path) => {
            let file = File::open(path)?;
            Ok(serde_json::from_reader(file)?)
        }
        None => Ok(UserConfig::default()),
    }
}
