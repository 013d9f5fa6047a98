//! File-backed store: one YAML document per table.
//!
//! Rows live in nested mapping sections. The key path of a row is formed by
//! joining the bound values of a predicate with `.`, so a record keyed by
//! `(guild, user)` lands at `<guild>.<user>`. A section whose children are all
//! scalars is a row; `select` collects every such section below the path.

use super::Store;
use crate::config::YamlConfig;
use crate::record::{RowOutcome, record_to_row, row_to_record, table_of};
use crate::value::{Row, TIMESTAMP_FORMAT};
use crate::{Error, FieldDef, Record, Registry, Result, SemanticType, Value, Where};
use serde_yaml::{Mapping, Value as YamlValue};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

struct Document {
    path: PathBuf,
    data: Mapping,
}

/// A [`Store`] keeping each table in `<root>/<table>.yml`.
///
/// A table must be opened with `create_table` or `create_or_migrate` before
/// rows can be read or written; otherwise operations fail with
/// [`Error::UnknownTable`]. Documents are written back after every change.
pub struct YamlStore {
    root: PathBuf,
    registry: Registry,
    documents: Mutex<HashMap<&'static str, Document>>,
}

impl YamlStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_registry(root, Registry::new())
    }

    pub fn with_registry(root: impl Into<PathBuf>, registry: Registry) -> Self {
        Self {
            root: root.into(),
            registry,
            documents: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &YamlConfig) -> Self {
        Self::new(config.root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Where the document for `R` lives.
    pub fn document_path<R: Record>(&self) -> Result<PathBuf> {
        let table = table_of::<R>()?;
        let Some(custom) = R::yaml_path() else {
            return Ok(self.root.join(format!("{table}.yml")));
        };

        let mut custom = custom.to_string();
        if !custom.ends_with(".yml") {
            custom.push_str(".yml");
        }
        Ok(match custom.strip_prefix('~') {
            Some(absolute) => PathBuf::from(absolute),
            None => self.root.join(custom),
        })
    }

    /// Write every open document back to disk and forget them.
    pub async fn close(&self) -> Result<()> {
        let mut documents = self.documents.lock().await;
        for (table, document) in documents.iter() {
            flush(table, document).await?;
        }
        documents.clear();
        Ok(())
    }

    async fn open<R: Record>(&self) -> Result<()> {
        let table = table_of::<R>()?;
        let path = self.document_path::<R>()?;

        let mut documents = self.documents.lock().await;
        if documents.contains_key(table) {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = if tokio::fs::try_exists(&path).await? {
            parse_document(table, &tokio::fs::read_to_string(&path).await?)?
        } else {
            tracing::info!(table, path = %path.display(), "creating document");
            tokio::fs::write(&path, "").await?;
            Mapping::new()
        };

        documents.insert(table, Document { path, data });
        Ok(())
    }

    fn key_path(&self, predicate: &Where) -> Vec<String> {
        let joined = predicate
            .values()
            .iter()
            .map(|v| self.registry.to_storage(v).to_text().unwrap_or_default())
            .collect::<Vec<_>>()
            .join(".");
        joined
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Store for YamlStore {
    async fn check_if_table_exists<R: Record>(&self) -> Result<bool> {
        let table = table_of::<R>()?;
        if self.documents.lock().await.contains_key(table) {
            return Ok(true);
        }
        Ok(tokio::fs::try_exists(self.document_path::<R>()?).await?)
    }

    async fn create_table<R: Record>(&self) -> Result<()> {
        self.open::<R>().await
    }

    async fn create_or_migrate<R: Record>(&self) -> Result<()> {
        self.open::<R>().await
    }

    async fn insert<R: Record>(&self, record: &R) -> Result<()> {
        let predicate = Where::for_key(record)?;
        self.update(record, &predicate).await?;
        Ok(())
    }

    async fn update<R: Record>(&self, record: &R, predicate: &Where) -> Result<u64> {
        let table = table_of::<R>()?;
        let path = self.key_path(predicate);
        if path.is_empty() {
            return Err(Error::InvalidSchema {
                table: table.to_string(),
                reason: "a write needs at least one key value".to_string(),
            });
        }

        let mut documents = self.documents.lock().await;
        let document = documents
            .get_mut(table)
            .ok_or_else(|| Error::UnknownTable {
                table: table.to_string(),
            })?;

        let section = section_mut(&mut document.data, &path).ok_or_else(|| Error::InvalidSchema {
            table: table.to_string(),
            reason: format!("key path `{}` runs through a value", path.join(".")),
        })?;
        for (column, value) in record_to_row(&self.registry, record) {
            section.insert(YamlValue::String(column.to_string()), to_yaml(value));
        }

        flush(table, document).await?;
        Ok(1)
    }

    async fn select<R: Record>(&self, predicate: &Where) -> Result<Vec<R>> {
        let table = table_of::<R>()?;
        let path = self.key_path(predicate);

        let documents = self.documents.lock().await;
        let document = documents.get(table).ok_or_else(|| Error::UnknownTable {
            table: table.to_string(),
        })?;

        let mut leaves = Vec::new();
        if let Some(section) = find_section(&document.data, &path) {
            collect_leaves(section, &mut leaves);
        }

        let limit = predicate.limit().map(|n| n as usize);
        let mut records = Vec::new();
        for leaf in leaves {
            if limit.is_some_and(|n| records.len() >= n) {
                break;
            }
            match row_to_record::<R>(&self.registry, leaf_row(R::fields(), leaf)) {
                RowOutcome::Loaded(record) => records.push(record),
                RowOutcome::Dropped { column, error } => {
                    tracing::warn!(table, column = %column, %error, "skipping row that does not fit the record type");
                }
            }
        }
        Ok(records)
    }

    async fn exists<R: Record>(&self, predicate: &Where) -> Result<bool> {
        let table = table_of::<R>()?;
        let path = self.key_path(predicate);

        let documents = self.documents.lock().await;
        let document = documents.get(table).ok_or_else(|| Error::UnknownTable {
            table: table.to_string(),
        })?;

        let mut leaves = Vec::new();
        if let Some(section) = find_section(&document.data, &path) {
            collect_leaves(section, &mut leaves);
        }
        Ok(!leaves.is_empty())
    }
}

fn parse_document(table: &str, content: &str) -> Result<Mapping> {
    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<YamlValue>(content)? {
        YamlValue::Mapping(data) => Ok(data),
        YamlValue::Null => Ok(Mapping::new()),
        _ => Err(Error::InvalidSchema {
            table: table.to_string(),
            reason: "document root is not a mapping".to_string(),
        }),
    }
}

async fn flush(table: &str, document: &Document) -> Result<()> {
    let text = serde_yaml::to_string(&document.data)?;
    tokio::fs::write(&document.path, text).await?;
    tracing::debug!(table, path = %document.path.display(), "flushed document");
    Ok(())
}

/// The section at `path`, created on the way down if missing.
///
/// Returns `None` if a key on the path already holds a scalar.
fn section_mut<'m>(mapping: &'m mut Mapping, path: &[String]) -> Option<&'m mut Mapping> {
    let Some((head, rest)) = path.split_first() else {
        return Some(mapping);
    };
    let slot = mapping
        .entry(YamlValue::String(head.clone()))
        .or_insert(YamlValue::Null);
    if slot.is_null() {
        *slot = YamlValue::Mapping(Mapping::new());
    }
    section_mut(slot.as_mapping_mut()?, rest)
}

fn find_section<'m>(mapping: &'m Mapping, path: &[String]) -> Option<&'m Mapping> {
    path.iter()
        .try_fold(mapping, |section, key| section.get(key.as_str())?.as_mapping())
}

fn collect_leaves<'m>(section: &'m Mapping, out: &mut Vec<&'m Mapping>) {
    let mut nested = false;
    for value in section.values() {
        if let YamlValue::Mapping(child) = value {
            nested = true;
            collect_leaves(child, out);
        }
    }
    if !nested && !section.is_empty() {
        out.push(section);
    }
}

fn to_yaml(value: Value) -> YamlValue {
    match value {
        Value::Null => YamlValue::Null,
        Value::I8(v) => YamlValue::Number(i64::from(v).into()),
        Value::I16(v) => YamlValue::Number(i64::from(v).into()),
        Value::I32(v) => YamlValue::Number(i64::from(v).into()),
        Value::I64(v) => YamlValue::Number(v.into()),
        Value::F32(v) => YamlValue::Number(f64::from(v).into()),
        Value::F64(v) => YamlValue::Number(v.into()),
        Value::String(v) => YamlValue::String(v),
        Value::Timestamp(v) => YamlValue::String(v.format(TIMESTAMP_FORMAT).to_string()),
    }
}

fn leaf_row(fields: &[FieldDef], leaf: &Mapping) -> Row {
    fields
        .iter()
        .map(|def| {
            let value = leaf
                .get(def.column)
                .map(|v| from_yaml(def.semantic, v))
                .unwrap_or(Value::Null);
            (def.column.to_string(), value)
        })
        .collect()
}

fn from_yaml(semantic: SemanticType, value: &YamlValue) -> Value {
    let textual = matches!(
        semantic,
        SemanticType::Text
            | SemanticType::Uuid
            | SemanticType::Enum
            | SemanticType::StringList
            | SemanticType::ObjectId
    );
    match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) if textual => Value::String(b.to_string()),
        YamlValue::Bool(b) => Value::I8(i8::from(*b)),
        YamlValue::Number(n) if textual => Value::String(n.to_string()),
        YamlValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(v), _) => Value::I64(v),
            (None, Some(v)) => Value::F64(v),
            (None, None) => Value::String(n.to_string()),
        },
        YamlValue::String(s) => Value::String(s.clone()),
        // Hand-written lists.
        YamlValue::Sequence(items) => Value::String(
            items
                .iter()
                .filter_map(|item| match from_yaml(SemanticType::Text, item) {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        YamlValue::Tagged(tagged) => from_yaml(semantic, &tagged.value),
        YamlValue::Mapping(_) => Value::Null,
    }
}
