//! Text formats for tabulated luminosity functions and Schechter parameters
//!
//! Two layouts are supported:
//!
//! - **Tabulated LF**: whitespace separated `(magnitude, log10 n)` columns,
//!   one row per magnitude, `#` comment lines ignored.
//! - **Schechter parameters**: comma separated, three header rows followed by
//!   a single `Phi_star, M_star, alpha, P, Q` data row. Blank and `#` lines
//!   after the header are ignored.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::schechter::SchechterParams;
use crate::algo::interp::InterpError;
use crate::algo::spline::SplineError;

/// Number of header rows preceding the Schechter parameter row
const SCHECHTER_HEADER_ROWS: usize = 3;

/// Errors that can occur while reading, writing or validating a table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error("Interpolation table error: {0}")]
    Interp(#[from] InterpError),

    #[error("Differential spline error: {0}")]
    Spline(#[from] SplineError),
}

impl TableError {
    /// True when the error is a missing input file
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TableError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        TableError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn parse(path: &Path, line: usize, message: impl Into<String>) -> Self {
        TableError::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

fn parse_value(path: &Path, line: usize, field: &str) -> Result<f64, TableError> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| TableError::parse(path, line, format!("invalid number '{}'", field.trim())))
}

/// Read a two column whitespace separated table.
///
/// # Returns
///
/// The first and second columns, in file order.
pub fn read_two_column_table(path: &Path) -> Result<(Vec<f64>, Vec<f64>), TableError> {
    let contents = fs::read_to_string(path).map_err(|e| TableError::io(path, e))?;

    let mut first = Vec::new();
    let mut second = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 2 {
            return Err(TableError::parse(
                path,
                idx + 1,
                format!("expected 2 columns, found {}", fields.len()),
            ));
        }

        first.push(parse_value(path, idx + 1, fields[0])?);
        second.push(parse_value(path, idx + 1, fields[1])?);
    }

    Ok((first, second))
}

/// Write a two column table in scientific notation, one row per line.
pub fn write_two_column_table(
    path: &Path,
    first: &[f64],
    second: &[f64],
) -> Result<(), TableError> {
    if first.len() != second.len() {
        return Err(TableError::MalformedTable(format!(
            "column lengths differ ({} and {})",
            first.len(),
            second.len()
        )));
    }

    let mut out = String::with_capacity(first.len() * 52);
    for (a, b) in first.iter().zip(second) {
        // Writing to a String cannot fail
        let _ = writeln!(out, "{:.18e} {:.18e}", a, b);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TableError::io(parent, e))?;
    }
    fs::write(path, out).map_err(|e| TableError::io(path, e))
}

/// Read Schechter fit parameters from a parameter file.
pub fn read_schechter_params(path: &Path) -> Result<SchechterParams, TableError> {
    let contents = fs::read_to_string(path).map_err(|e| TableError::io(path, e))?;

    let (idx, row) = contents
        .lines()
        .enumerate()
        .skip(SCHECHTER_HEADER_ROWS)
        .find(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .ok_or_else(|| {
            TableError::parse(path, SCHECHTER_HEADER_ROWS + 1, "missing parameter row")
        })?;

    let values = row
        .split(',')
        .map(|field| parse_value(path, idx + 1, field))
        .collect::<Result<Vec<f64>, TableError>>()?;

    match values.as_slice() {
        &[phi_star, m_star, alpha, p, q] => Ok(SchechterParams {
            phi_star,
            m_star,
            alpha,
            p,
            q,
        }),
        _ => Err(TableError::parse(
            path,
            idx + 1,
            format!("expected 5 parameters, found {}", values.len()),
        )),
    }
}
