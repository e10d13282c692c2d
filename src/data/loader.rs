use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::error::{DataFormatError, LoadError};
use super::model::{IsothermRecord, RawSample, DEFAULT_CONCENTRATION_MM, DEFAULT_VOLUME_UL};

// ---------------------------------------------------------------------------
// Column layout of a trough export
// ---------------------------------------------------------------------------

const TIME_COLUMN: usize = 0;
const AREA_COLUMN: usize = 1;
const PRESSURE_COLUMN: usize = 5;

/// Columns 2–4 are written by the trough software but not consumed.
const MIN_COLUMNS: usize = PRESSURE_COLUMN + 1;

const COMMENT_MARKER: u8 = b'#';

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load an isotherm with the default 1 mM / 160 µL spreading solution.
#[allow(dead_code)]
pub fn load_isotherm_default(path: &Path) -> Result<IsothermRecord, LoadError> {
    load_isotherm(path, DEFAULT_CONCENTRATION_MM, DEFAULT_VOLUME_UL)
}

/// Load a trough export and normalize its area column to Å² per molecule.
///
/// File layout:
/// * line 1 – header, always discarded
/// * `#` to end of line – comment, dropped wherever it starts
/// * lines left blank after that – ignored
/// * every other line – tab-separated numbers; column 0 is time (s),
///   column 1 trough area (cm²), column 5 surface pressure (mN/m)
///
/// LF and CRLF line endings are both accepted.
pub fn load_isotherm(
    path: &Path,
    concentration: f64,
    volume: f64,
) -> Result<IsothermRecord, LoadError> {
    if !(concentration.is_finite() && concentration > 0.0 && volume.is_finite() && volume > 0.0)
    {
        return Err(LoadError::InvalidScale {
            concentration,
            volume,
        });
    }

    let io_error = |e: io::Error| match e.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    };

    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut file| file.read_to_end(&mut bytes))
        .map_err(io_error)?;

    let samples = read_samples(&bytes).map_err(|e| match e {
        ReadError::Io(source) => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
        ReadError::Format(source) => LoadError::DataFormat {
            path: path.to_path_buf(),
            source,
        },
    })?;

    log::debug!("{}: {} samples", path.display(), samples.len());

    Ok(IsothermRecord::from_samples(samples, concentration, volume))
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum ReadError {
    Io(io::Error),
    Format(DataFormatError),
}

impl From<DataFormatError> for ReadError {
    fn from(e: DataFormatError) -> Self {
        ReadError::Format(e)
    }
}

/// Data lines with comments removed, one per row, and the file line each
/// came from.
struct DataLines {
    text: Vec<u8>,
    lines: Vec<u64>,
}

/// Drop comments and blank lines from the body of an export. `first_line`
/// is the file line number of the first body line.
fn strip_comments(body: &[u8], first_line: u64) -> DataLines {
    let mut text = Vec::with_capacity(body.len());
    let mut lines = Vec::new();

    for (i, raw) in body.split(|&b| b == b'\n').enumerate() {
        let content = match raw.iter().position(|&b| b == COMMENT_MARKER) {
            Some(end) => &raw[..end],
            None => raw.strip_suffix(b"\r").unwrap_or(raw),
        };
        if content.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        text.extend_from_slice(content);
        text.push(b'\n');
        lines.push(first_line + i as u64);
    }

    DataLines { text, lines }
}

/// Parse every data row of an export. The header line is split off before
/// comments are stripped, so it is skipped even when it starts with `#`.
fn read_samples(bytes: &[u8]) -> Result<Vec<RawSample>, ReadError> {
    if bytes.is_empty() {
        return Err(DataFormatError::Empty.into());
    }
    let body = match bytes.iter().position(|&b| b == b'\n') {
        Some(end) => &bytes[end + 1..],
        None => &bytes[bytes.len()..],
    };

    let data = strip_comments(body, 2);
    let mut reader = tab_reader(data.text.as_slice());
    let mut samples = Vec::with_capacity(data.lines.len());

    // Every kept line is non-blank and quoting is off, so row `i` of the
    // reader is `data.lines[i]`.
    for (i, result) in reader.records().enumerate() {
        let line = data.lines.get(i).copied().unwrap_or(0);
        let record = result.map_err(|e| row_error(e, line))?;

        if record.len() < MIN_COLUMNS {
            return Err(DataFormatError::TooFewColumns {
                line,
                expected: MIN_COLUMNS,
                found: record.len(),
            }
            .into());
        }

        samples.push(RawSample {
            time: parse_field(&record, TIME_COLUMN, line)?,
            area: parse_field(&record, AREA_COLUMN, line)?,
            pressure: parse_field(&record, PRESSURE_COLUMN, line)?,
        });
    }

    if samples.is_empty() {
        return Err(DataFormatError::Empty.into());
    }
    Ok(samples)
}

fn row_error(e: csv::Error, line: u64) -> ReadError {
    if e.is_io_error() {
        // Unwraps to the inner io::Error.
        ReadError::Io(e.into())
    } else {
        DataFormatError::Malformed { line, source: e }.into()
    }
}

fn tab_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn parse_field(
    record: &csv::StringRecord,
    column: usize,
    line: u64,
) -> Result<f64, DataFormatError> {
    let value = record.get(column).unwrap_or("");
    value
        .parse::<f64>()
        .map_err(|_| DataFormatError::InvalidNumber {
            line,
            column,
            value: value.to_string(),
        })
}
