use crate::{RegistryError, RegistryRow};
use csv::{ByteRecord, ReaderBuilder, Trim};
use scout_config::ColumnNames;
use std::fs::File;
use std::io::Read;
use std::path::Path;

struct ColumnIndex {
    address: usize,
    postal_code: usize,
    city: usize,
    description: usize,
}

fn decode(field: Option<&[u8]>) -> String {
    field
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .unwrap_or_default()
}

impl ColumnIndex {
    fn locate(headers: &ByteRecord, columns: &ColumnNames) -> Result<Self, RegistryError> {
        // Excel exports often start with a UTF-8 BOM.
        let names: Vec<String> = headers
            .iter()
            .map(|h| {
                String::from_utf8_lossy(h)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_string()
            })
            .collect();

        let find = |wanted: &str| {
            names
                .iter()
                .position(|name| name == wanted.trim())
                .ok_or_else(|| RegistryError::MissingColumn {
                    column: wanted.to_string(),
                    available: names.clone(),
                })
        };

        Ok(Self {
            address: find(&columns.address)?,
            postal_code: find(&columns.postal_code)?,
            city: find(&columns.city)?,
            description: find(&columns.description)?,
        })
    }

    fn row(&self, record: &ByteRecord) -> RegistryRow {
        RegistryRow {
            address: decode(record.get(self.address)),
            postal_code: decode(record.get(self.postal_code)),
            city: decode(record.get(self.city)),
            description: decode(record.get(self.description)),
        }
    }
}

/// Read at most `limit` rows (all of them when `None`) from a delimited source.
///
/// Invalid UTF-8 is replaced rather than rejected; short records yield empty
/// fields.
pub fn read_rows<R: Read>(
    source: R,
    columns: &ColumnNames,
    separator: char,
    limit: Option<usize>,
) -> Result<Vec<RegistryRow>, RegistryError> {
    if !separator.is_ascii() {
        return Err(RegistryError::Separator(separator));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(separator as u8)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);

    let index = ColumnIndex::locate(reader.byte_headers()?, columns)?;

    let mut rows = Vec::new();
    let mut record = ByteRecord::new();
    while limit.map_or(true, |max| rows.len() < max) {
        if !reader.read_byte_record(&mut record)? {
            break;
        }
        rows.push(index.row(&record));
    }

    tracing::info!(rows = rows.len(), ?limit, "registry rows loaded");
    Ok(rows)
}

pub fn read_rows_from_path(
    path: &Path,
    columns: &ColumnNames,
    separator: char,
    limit: Option<usize>,
) -> Result<Vec<RegistryRow>, RegistryError> {
    tracing::info!(path = %path.display(), "reading registry export");
    let file = File::open(path).map_err(|source| RegistryError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_rows(file, columns, separator, limit)
}
