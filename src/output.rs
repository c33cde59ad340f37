//! Textual renderings of a resolved fact set.
//!
//! Three formats are supported:
//! - `hash`: `name => value` lines, nested values as indented blocks
//! - `json`: pretty-printed JSON
//! - `yaml`: a YAML mapping
//!
//! Facts are always written in lexical name order.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::error::OutputError;
use crate::value::{non_finite_name, Value};

const INDENT: &str = "  ";

/// Output format for [`crate::Collection::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// `name => value` lines.
    #[default]
    Hash,
    /// Pretty-printed JSON object.
    Json,
    /// YAML mapping.
    Yaml,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hash => "hash",
            Self::Json => "json",
            Self::Yaml => "yaml",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(Self::Hash),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(OutputError::UnknownFormat(s.to_string())),
        }
    }
}

/// Writes `facts` to `writer` in the given format, followed by a newline.
///
/// # Errors
///
/// Returns `OutputError` on serialization or I/O failure.
pub fn write<W: Write>(
    facts: &BTreeMap<String, Value>,
    mut writer: W,
    format: Format,
) -> Result<(), OutputError> {
    match format {
        Format::Hash => write_hash(facts, &mut writer)?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut writer, facts)?;
            writeln!(writer)?;
        }
        // serde_yaml terminates the document with a newline itself.
        Format::Yaml => serde_yaml::to_writer(&mut writer, facts)?,
    }
    writer.flush()?;
    Ok(())
}

fn write_hash<W: Write>(facts: &BTreeMap<String, Value>, w: &mut W) -> io::Result<()> {
    for (name, value) in facts {
        write!(w, "{name} => ")?;
        match value {
            // Top-level strings are written bare.
            Value::String(s) => w.write_all(s.as_bytes())?,
            Value::Double(v) if !v.is_finite() => {
                w.write_all(non_finite_name(*v).unwrap_or_default().as_bytes())?;
            }
            other => write_hash_value(w, other, 0)?,
        }
        writeln!(w)?;
    }
    Ok(())
}

fn write_hash_value<W: Write>(w: &mut W, value: &Value, level: usize) -> io::Result<()> {
    match value {
        Value::Boolean(v) => write!(w, "{v}"),
        Value::Integer(v) => write!(w, "{v}"),
        // Non-finite doubles are written as strings, matching JSON and YAML.
        Value::Double(v) => match non_finite_name(*v) {
            Some(name) => write_quoted(w, name),
            None => write!(w, "{v:?}"),
        },
        Value::String(s) => write_quoted(w, s),
        Value::Array(items) => {
            if items.is_empty() {
                return w.write_all(b"[]");
            }
            w.write_all(b"[\n")?;
            for (i, item) in items.iter().enumerate() {
                write_indent(w, level + 1)?;
                write_hash_value(w, item, level + 1)?;
                if i + 1 < items.len() {
                    w.write_all(b",")?;
                }
                w.write_all(b"\n")?;
            }
            write_indent(w, level)?;
            w.write_all(b"]")
        }
        Value::Map(entries) => {
            if entries.is_empty() {
                return w.write_all(b"{}");
            }
            w.write_all(b"{\n")?;
            for (i, (key, item)) in entries.iter().enumerate() {
                write_indent(w, level + 1)?;
                write!(w, "{key} => ")?;
                write_hash_value(w, item, level + 1)?;
                if i + 1 < entries.len() {
                    w.write_all(b",")?;
                }
                w.write_all(b"\n")?;
            }
            write_indent(w, level)?;
            w.write_all(b"}")
        }
    }
}

fn write_quoted<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    w.write_all(b"\"")?;
    for c in s.chars() {
        match c {
            '"' => w.write_all(b"\\\"")?,
            '\\' => w.write_all(b"\\\\")?,
            '\n' => w.write_all(b"\\n")?,
            '\t' => w.write_all(b"\\t")?,
            c => write!(w, "{c}")?,
        }
    }
    w.write_all(b"\"")
}

fn write_indent<W: Write>(w: &mut W, level: usize) -> io::Result<()> {
    for _ in 0..level {
        w.write_all(INDENT.as_bytes())?;
    }
    Ok(())
}
