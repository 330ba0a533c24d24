use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: unsupported JSON shape for a token corpus")]
    UnsupportedShape { path: String },
}

/// One clustering run's worth of tokens: a language, a file, or a filtered
/// subset, depending on how the corpus was gathered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusUnit {
    pub id: String,
    pub tokens: Vec<String>,
}

// File stems like `preprocessed_fr` carry the language code of the unit.
static LANG_STEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+_([a-z]{2,3})$").unwrap());

fn unit_label(stem: &str) -> String {
    match LANG_STEM.captures(stem) {
        Some(caps) => caps[1].to_string(),
        None => stem.to_string(),
    }
}

/// Gathers corpus units from one input file.
///
/// JSON inputs may be an array of token strings (one unit), an array of
/// documents carrying a `tokens` list (one unit, documents concatenated), or
/// an object keyed by unit id whose values are token lists or nested maps of
/// token lists (one unit per key). Anything else is read as plain text, one
/// token per line.
pub fn units_from_path(path: &Path) -> Result<Vec<CorpusUnit>, CorpusError> {
    let display = path.display().to_string();
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unit");
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        let file = File::open(path).map_err(|source| CorpusError::Io { path: display.clone(), source })?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| CorpusError::Json { path: display.clone(), source })?;
        units_from_value(&value, &unit_label(stem), &display)
    } else {
        let file = File::open(path).map_err(|source| CorpusError::Io { path: display.clone(), source })?;
        let unit = unit_from_reader(BufReader::new(file), &unit_label(stem))
            .map_err(|source| match source {
                CorpusError::Io { source, .. } => CorpusError::Io { path: display.clone(), source },
                other => other,
            })?;
        Ok(vec![unit])
    }
}

/// One unit from a plain-text stream, one token per line, blank lines
/// skipped. Used for files without a JSON extension and for stdin.
pub fn unit_from_reader<R: BufRead>(reader: R, id: &str) -> Result<CorpusUnit, CorpusError> {
    let mut tokens = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| CorpusError::Io { path: id.to_string(), source })?;
        let token = line.trim();
        if !token.is_empty() {
            tokens.push(token.to_string());
        }
    }
    Ok(CorpusUnit { id: id.to_string(), tokens })
}

/// Merges units into the whole-corpus strategy: one unit, tokens
/// concatenated in unit order.
pub fn merge(units: Vec<CorpusUnit>) -> CorpusUnit {
    let tokens = units.into_iter().flat_map(|u| u.tokens).collect();
    CorpusUnit { id: "all".to_string(), tokens }
}

fn units_from_value(value: &Value, label: &str, path: &str) -> Result<Vec<CorpusUnit>, CorpusError> {
    match value {
        Value::Array(items) => {
            let tokens = tokens_from_array(items, path)?;
            Ok(vec![CorpusUnit { id: label.to_string(), tokens }])
        }
        Value::Object(map) => {
            let mut units = Vec::with_capacity(map.len());
            for (key, entry) in map {
                let tokens = match entry {
                    Value::Array(items) => tokens_from_array(items, path)?,
                    Value::Object(nested) => {
                        let mut tokens = Vec::new();
                        for sub in nested.values() {
                            match sub {
                                Value::Array(items) => tokens.extend(tokens_from_array(items, path)?),
                                _ => return Err(CorpusError::UnsupportedShape { path: path.to_string() }),
                            }
                        }
                        tokens
                    }
                    _ => return Err(CorpusError::UnsupportedShape { path: path.to_string() }),
                };
                units.push(CorpusUnit { id: key.clone(), tokens });
            }
            Ok(units)
        }
        _ => Err(CorpusError::UnsupportedShape { path: path.to_string() }),
    }
}

// An array is either plain token strings or documents with a `tokens` list.
fn tokens_from_array(items: &[Value], path: &str) -> Result<Vec<String>, CorpusError> {
    let mut tokens = Vec::new();
    for item in items {
        match item {
            Value::String(s) => {
                if !s.is_empty() {
                    tokens.push(s.clone());
                }
            }
            Value::Object(doc) => match doc.get("tokens") {
                Some(Value::Array(inner)) => tokens.extend(tokens_from_array(inner, path)?),
                _ => return Err(CorpusError::UnsupportedShape { path: path.to_string() }),
            },
            _ => return Err(CorpusError::UnsupportedShape { path: path.to_string() }),
        }
    }
    Ok(tokens)
}
