//! Plain-text persistence for [`NeuralEvaluator`].
//!
//! ## Format
//!
//! Whitespace separated tokens:
//!
//! ```text
//! <id>
//! <layer count>
//! <weight count> <weights...>     (per layer)
//! <bias count> <biases...>
//! <min> <max>
//! <bounds known: 1 | 0>
//! ```
//!
//! Floats are written with Rust's shortest round-trip formatting, so loading a
//! saved evaluator reproduces its outputs bit for bit. Files are named
//! `<GameName><Id>.nn`.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::core::LoadError;

use super::identity::EvaluatorId;
use super::network::{EvalBounds, Layer, NeuralEvaluator};

/// Save file extension.
pub const EXTENSION: &str = "nn";

/// File name for an evaluator of `game_name`.
#[must_use]
pub fn file_name(game_name: &str, id: EvaluatorId) -> String {
    format!("{game_name}{id}.{EXTENSION}")
}

/// Serialize `evaluator` into `writer`.
pub fn write_to<W: Write>(evaluator: &NeuralEvaluator, writer: W) -> std::io::Result<()> {
    let mut out = BufWriter::new(writer);

    writeln!(out, "{}", evaluator.id())?;
    writeln!(out, "{}", evaluator.layer_count())?;
    for layer in evaluator.layers() {
        write_values(&mut out, layer.weights())?;
        write_values(&mut out, layer.biases())?;
    }
    let bounds = evaluator.bounds();
    writeln!(out, "{} {}", bounds.min, bounds.max)?;
    writeln!(out, "{}", u8::from(evaluator.bounds_known()))?;

    out.flush()
}

fn write_values<W: Write>(out: &mut W, values: &[f32]) -> std::io::Result<()> {
    write!(out, "{}", values.len())?;
    for v in values {
        write!(out, " {v}")?;
    }
    writeln!(out)
}

/// Parse an evaluator from its text form.
pub fn parse(text: &str) -> Result<NeuralEvaluator, LoadError> {
    let mut tokens = Tokens(text.split_whitespace());

    let id = EvaluatorId(tokens.next("id")?);
    let layer_count: usize = tokens.next("layer count")?;
    if layer_count == 0 {
        return Err(LoadError::Shape("network has no layers".into()));
    }

    let mut layers = Vec::with_capacity(layer_count.min(64));
    for _ in 0..layer_count {
        let weights = tokens.values("weight")?;
        let biases = tokens.values("bias")?;
        layers.push(Layer::from_parts(weights, biases)?);
    }

    let min: f32 = tokens.next("bounds min")?;
    let max: f32 = tokens.next("bounds max")?;
    let bounds_known = match tokens.raw("bounds flag")? {
        "1" => true,
        "0" => false,
        other => {
            return Err(LoadError::Malformed {
                field: "bounds flag",
                value: other.to_string(),
            })
        }
    };

    if let Some(extra) = tokens.0.next() {
        return Err(LoadError::Malformed {
            field: "trailing data",
            value: extra.to_string(),
        });
    }

    NeuralEvaluator::from_parts(id, layers, EvalBounds::new(min, max), bounds_known)
}

struct Tokens<'a>(std::str::SplitWhitespace<'a>);

impl<'a> Tokens<'a> {
    fn raw(&mut self, field: &'static str) -> Result<&'a str, LoadError> {
        self.0.next().ok_or(LoadError::UnexpectedEof(field))
    }

    fn next<T: FromStr>(&mut self, field: &'static str) -> Result<T, LoadError> {
        let token = self.raw(field)?;
        token.parse().map_err(|_| LoadError::Malformed {
            field,
            value: token.to_string(),
        })
    }

    fn values(&mut self, field: &'static str) -> Result<Vec<f32>, LoadError> {
        let count: usize = self.next(field)?;
        // Cap the preallocation; a corrupt count must not allocate gigabytes
        let mut values = Vec::with_capacity(count.min(1 << 16));
        for _ in 0..count {
            values.push(self.next(field)?);
        }
        Ok(values)
    }
}

/// Write `evaluator` to `path`.
pub fn save_to_path(evaluator: &NeuralEvaluator, path: &Path) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    write_to(evaluator, file)?;
    debug!(path = %path.display(), id = %evaluator.id(), "saved evaluator");
    Ok(())
}

/// Write `evaluator` into `dir` under its canonical file name.
///
/// Creates `dir` if needed and returns the full path written.
pub fn save_in_dir(evaluator: &NeuralEvaluator, dir: &Path, game_name: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name(game_name, evaluator.id()));
    save_to_path(evaluator, &path)?;
    Ok(path)
}

/// Load an evaluator from `path`.
pub fn load(path: &Path) -> Result<NeuralEvaluator, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let evaluator = parse(&text)?;
    debug!(path = %path.display(), id = %evaluator.id(), "loaded evaluator");
    Ok(evaluator)
}

/// Saved evaluator files for `game_name` in `dir`, sorted by path.
///
/// A missing directory yields an empty list.
pub fn list_saves(dir: &Path, game_name: &str) -> std::io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut saves = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if is_save_for(&path, game_name) {
            saves.push(path);
        }
    }
    saves.sort();
    Ok(saves)
}

fn is_save_for(path: &Path, game_name: &str) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
        return false;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|stem| stem.strip_prefix(game_name))
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}
