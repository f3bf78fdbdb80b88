//! CSV output

use std::path::{Path, PathBuf};

use csv::{Terminator, WriterBuilder};

use crate::{config::TitleFilter, entry::Row, error::ExportError};

/// `<category>_<target>[_<filter>].csv`
pub fn output_file_name(category: &str, target_name: &str, filter: TitleFilter) -> String {
    match filter.file_suffix() {
        Some(suffix) => format!("{category}_{target_name}_{suffix}.csv"),
        None => format!("{category}_{target_name}.csv"),
    }
}

/// Writes one table per category into the output directory
#[derive(Debug, Clone)]
pub struct TableWriter {
    output_dir: PathBuf,
    target_name: String,
    filter: TitleFilter,
}

impl TableWriter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        target_name: impl Into<String>,
        filter: TitleFilter,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            target_name: target_name.into(),
            filter,
        }
    }

    pub fn path_for(&self, category: &str) -> PathBuf {
        self.output_dir
            .join(output_file_name(category, &self.target_name, self.filter))
    }

    /// Write the table of `category`, replacing any previous file
    pub fn write(&self, category: &str, rows: &[Row]) -> Result<PathBuf, ExportError> {
        let path = self.path_for(category);
        write_table(&path, rows)?;
        Ok(path)
    }
}

/// Write `rows` under a header line; the header is written even with no rows
pub fn write_table(path: &Path, rows: &[Row]) -> Result<(), ExportError> {
    let csv_error = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(csv_error)?;

    writer.write_record(Row::HEADERS).map_err(csv_error)?;
    for row in rows {
        writer.write_record(row.fields()).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
