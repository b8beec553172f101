//! Parsing release tables.
//!
//! A release file is plain text, one record per line, with whitespace
//! separated columns whose names come from configuration:
//!
//! ```text
//! # mult  release_time       X      Y     Z   super
//!   2     2015-04-01         100.0  45.0  5   1000
//!   1     2015-04-01T06      111.0  45.0  5   1000
//! ```
//!
//! Recognised names are `mult` (default 1), `release_time` (required),
//! `X`/`Y` or `lon`/`lat` (one pair required), and `Z` (default 0).
//! Every other column is an extra per-particle attribute. Blank lines
//! and lines starting with `#` are skipped.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use drift_core::{parse_timestamp, DataError, Grid};

use crate::error::ReleaseError;

/// One line of a release table.
#[derive(Clone, Debug, PartialEq)]
pub struct ReleaseRecord {
    /// One-based line number in the source text.
    pub line: usize,
    /// Number of identical particles to release.
    pub mult: u32,
    /// Release time.
    pub time: NaiveDateTime,
    /// Grid X coordinate.
    pub x: f64,
    /// Grid Y coordinate.
    pub y: f64,
    /// Depth, positive down.
    pub z: f64,
    /// Extra attribute values, in the order of
    /// [`ReleaseTable::extra_names`].
    pub extras: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Column {
    Mult,
    Time,
    X,
    Y,
    Lon,
    Lat,
    Z,
    Extra(usize),
}

/// Parsed release records, ordered by time.
///
/// Records with equal times keep their order in the file.
#[derive(Clone, Debug, PartialEq)]
pub struct ReleaseTable {
    extra_names: Vec<String>,
    records: Vec<ReleaseRecord>,
}

impl ReleaseTable {
    /// Read and parse a release file.
    pub fn read(
        path: impl AsRef<Path>,
        format: &[String],
        grid: Option<&dyn Grid>,
    ) -> Result<Self, ReleaseError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| DataError::from(e).at(path))?;
        Self::parse(&text, format, grid)
    }

    /// Parse release records from `text`.
    ///
    /// Geographic positions are converted to grid coordinates through
    /// `grid`, which is then required.
    pub fn parse(
        text: &str,
        format: &[String],
        grid: Option<&dyn Grid>,
    ) -> Result<Self, ReleaseError> {
        let (columns, extra_names) = plan_columns(format)?;
        let geographic = columns.contains(&Column::Lon);
        let grid = match (geographic, grid) {
            (true, None) => {
                return Err(ReleaseError::Config {
                    reason: "lon/lat release positions need a grid".into(),
                })
            }
            (_, grid) => grid,
        };

        let mut records = Vec::new();
        for (n, raw) in text.lines().enumerate() {
            let line = n + 1;
            let raw = raw.trim();
            if raw.is_empty() || raw.starts_with('#') {
                continue;
            }
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            if tokens.len() != columns.len() {
                return Err(ReleaseError::Malformed {
                    line,
                    reason: format!("expected {} columns, found {}", columns.len(), tokens.len()),
                });
            }

            let (mut mult, mut time) = (1, None);
            let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
            let (mut lon, mut lat) = (0.0, 0.0);
            let mut extras = vec![0.0; extra_names.len()];
            for (&column, token) in columns.iter().zip(&tokens) {
                let number = || {
                    token.parse::<f64>().map_err(|_| ReleaseError::Malformed {
                        line,
                        reason: format!("'{token}' is not a number"),
                    })
                };
                match column {
                    Column::Mult => {
                        mult = token.parse().map_err(|_| ReleaseError::Malformed {
                            line,
                            reason: format!("multiplicity '{token}' is not a whole number"),
                        })?;
                    }
                    Column::Time => {
                        time = Some(parse_timestamp(token).ok_or_else(|| {
                            ReleaseError::Malformed {
                                line,
                                reason: format!("'{token}' is not a timestamp"),
                            }
                        })?);
                    }
                    Column::X => x = number()?,
                    Column::Y => y = number()?,
                    Column::Lon => lon = number()?,
                    Column::Lat => lat = number()?,
                    Column::Z => z = number()?,
                    Column::Extra(k) => extras[k] = number()?,
                }
            }
            if let (true, Some(grid)) = (geographic, grid) {
                (x, y) = grid.ll2xy(lon, lat);
            }
            let time = time.ok_or_else(|| ReleaseError::Malformed {
                line,
                reason: "no release time".into(),
            })?;
            records.push(ReleaseRecord {
                line,
                mult,
                time,
                x,
                y,
                z,
                extras,
            });
        }

        records.sort_by_key(|r| r.time);
        Ok(Self {
            extra_names,
            records,
        })
    }

    /// Records in time order.
    pub fn records(&self) -> &[ReleaseRecord] {
        &self.records
    }

    /// Names of the extra attribute columns.
    pub fn extra_names(&self) -> &[String] {
        &self.extra_names
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn plan_columns(format: &[String]) -> Result<(Vec<Column>, Vec<String>), ReleaseError> {
    let config = |reason: String| ReleaseError::Config { reason };
    let mut columns = Vec::with_capacity(format.len());
    let mut extras = Vec::new();
    for (k, name) in format.iter().enumerate() {
        if format[..k].contains(name) {
            return Err(config(format!("column '{name}' appears twice")));
        }
        columns.push(match name.as_str() {
            "mult" => Column::Mult,
            "release_time" => Column::Time,
            "X" => Column::X,
            "Y" => Column::Y,
            "lon" => Column::Lon,
            "lat" => Column::Lat,
            "Z" => Column::Z,
            _ => {
                extras.push(name.clone());
                Column::Extra(extras.len() - 1)
            }
        });
    }

    let has = |c| columns.contains(&c);
    if !has(Column::Time) {
        return Err(config("release format lacks 'release_time'".into()));
    }
    match (has(Column::X) && has(Column::Y), has(Column::Lon) && has(Column::Lat)) {
        (true, false) | (false, true) => {}
        (true, true) => {
            return Err(config("release format has both X/Y and lon/lat".into()));
        }
        (false, false) => {
            return Err(config(
                "release format needs either X and Y or lon and lat".into(),
            ));
        }
    }
    if has(Column::X) != has(Column::Y) || has(Column::Lon) != has(Column::Lat) {
        return Err(config("release format has an unpaired position column".into()));
    }
    Ok((columns, extras))
}
