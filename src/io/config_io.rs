use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::atomic_write;
use crate::model::config::Config;

/// Template written by `tick init` and used when no config file exists
pub const CONFIG_TEMPLATE: &str = include_str!("../templates/config.toml");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    Edit(#[from] toml_edit::TomlError),
    #[error("{path} already exists (use --force to overwrite)")]
    AlreadyExists { path: PathBuf },
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for format-preserving edits. A missing file
/// yields the template.
pub fn read_config(data_dir: &Path) -> Result<(Config, toml_edit::DocumentMut), ConfigError> {
    let path = config_path(data_dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            CONFIG_TEMPLATE.to_string()
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    let config: Config = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = config_path(data_dir);
    let write_err = |source| ConfigError::Write {
        path: path.clone(),
        source,
    };
    fs::create_dir_all(data_dir).map_err(write_err)?;
    atomic_write(&path, doc.to_string().as_bytes()).map_err(write_err)
}

/// Write the default config. Refuses to overwrite unless `force`.
pub fn init_config(data_dir: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    let path = config_path(data_dir);
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists { path });
    }
    let doc: toml_edit::DocumentMut = CONFIG_TEMPLATE.parse()?;
    write_config(data_dir, &doc)?;
    Ok(path)
}

fn categories_table(doc: &mut toml_edit::DocumentMut) -> &mut toml_edit::Item {
    if !doc.contains_key("categories") {
        doc["categories"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    &mut doc["categories"]
}

/// Append a label to `categories.labels`, seeding the defaults if the key is absent.
pub fn add_category(doc: &mut toml_edit::DocumentMut, label: &str) {
    let table = categories_table(doc);
    if table.get("labels").and_then(|v| v.as_array()).is_none() {
        let mut seed = toml_edit::Array::new();
        for l in crate::model::category::DEFAULT_CATEGORIES {
            seed.push(l);
        }
        table["labels"] = toml_edit::value(seed);
    }
    if let Some(labels) = table["labels"].as_array_mut()
        && !labels.iter().any(|v| v.as_str() == Some(label))
    {
        labels.push(label);
    }
}

/// Set `categories.default`
pub fn set_default_category(doc: &mut toml_edit::DocumentMut, label: &str) {
    categories_table(doc)["default"] = toml_edit::value(label);
}
