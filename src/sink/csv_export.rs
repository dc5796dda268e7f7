//! Dual CSV export
//!
//! Every item is appended to two files: one with the base columns and one
//! with an extra trailing `country` column. Rows are never deduplicated, so
//! repeated crawls append repeated rows.

use crate::item::ItemRecord;
use crate::sink::traits::{Sink, SinkError, SinkResult};
use csv::{Writer, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const NAME: &str = "csv-export";

/// Appending CSV writer pair
pub struct CsvExportSink {
    books_path: PathBuf,
    books_with_country_path: PathBuf,
    writers: Option<CsvWriters>,
}

struct CsvWriters {
    books: Writer<File>,
    books_with_country: Writer<File>,
}

impl CsvExportSink {
    /// Creates an unopened export sink for the two destination paths
    pub fn new(books_path: impl Into<PathBuf>, books_with_country_path: impl Into<PathBuf>) -> Self {
        Self {
            books_path: books_path.into(),
            books_with_country_path: books_with_country_path.into(),
            writers: None,
        }
    }

    /// Header row of the export that carries the country column
    pub fn country_headers() -> Vec<&'static str> {
        let mut headers = ItemRecord::BASE_HEADERS.to_vec();
        headers.push("country");
        headers
    }
}

/// Opens `path` for appending and writes `headers` if the file is empty
fn open_append(path: &Path, headers: &[&str]) -> SinkResult<Writer<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_header = file.metadata()?.len() == 0;

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    if needs_header {
        writer.write_record(headers)?;
        writer.flush()?;
    }

    Ok(writer)
}

impl Sink for CsvExportSink {
    fn name(&self) -> &str {
        NAME
    }

    fn open(&mut self) -> SinkResult<()> {
        if self.writers.is_some() {
            return Ok(());
        }

        let books = open_append(&self.books_path, &ItemRecord::BASE_HEADERS)?;
        let books_with_country =
            open_append(&self.books_with_country_path, &Self::country_headers())?;

        tracing::debug!(
            "Appending to {} and {}",
            self.books_path.display(),
            self.books_with_country_path.display()
        );

        self.writers = Some(CsvWriters {
            books,
            books_with_country,
        });
        Ok(())
    }

    fn process(&mut self, item: ItemRecord) -> SinkResult<Option<ItemRecord>> {
        let writers = self
            .writers
            .as_mut()
            .ok_or_else(|| SinkError::NotOpen(NAME.to_string()))?;

        let base = item.base_fields();
        writers.books.write_record(&base)?;
        writers
            .books_with_country
            .write_record(base.iter().map(String::as_str).chain([item.country.as_str()]))?;

        writers.books.flush()?;
        writers.books_with_country.flush()?;

        Ok(Some(item))
    }

    fn close(&mut self) -> SinkResult<()> {
        let Some(mut writers) = self.writers.take() else {
            return Ok(());
        };

        // Flush both before reporting, so one failure does not skip the other file
        let books = writers.books.flush();
        let with_country = writers.books_with_country.flush();
        books?;
        with_country?;
        Ok(())
    }
}
