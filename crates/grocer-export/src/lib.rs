//! Persistence of a finished product collection as CSV or JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use grocer_core::{OutputFormat, Product};
use thiserror::Error;

/// Column order of the CSV export. Downstream consumers rely on it.
pub const CSV_HEADER: [&str; 8] = [
    "Product_ID",
    "Product_link",
    "Product_image_link",
    "Product_name",
    "Product_measure",
    "Product_price",
    "Product_old_price",
    "Sale",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

fn csv_row(product: &Product) -> [&str; 8] {
    [
        product.id.as_deref().unwrap_or(""),
        &product.url,
        &product.image_url,
        &product.name,
        product.description.as_deref().unwrap_or(""),
        &product.price,
        &product.old_price,
        product.sale.as_deref().unwrap_or(""),
    ]
}

/// Writes `products` as CSV, header first, rows terminated by `\r`.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if the writer fails.
pub fn write_csv<W: Write>(writer: W, products: &[Product]) -> Result<(), ExportError> {
    let mut out = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\r'))
        .from_writer(writer);
    out.write_record(CSV_HEADER)?;
    for product in products {
        out.write_record(csv_row(product))?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes `products` as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization or the writer fails.
pub fn write_json<W: Write>(writer: W, products: &[Product]) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, products)?;
    Ok(())
}

/// Creates (or truncates) `path` and writes `products` in `format`.
///
/// # Errors
///
/// Returns [`ExportError::Io`] when the file cannot be created or flushed,
/// otherwise the encoder's error.
pub fn save(path: &Path, format: OutputFormat, products: &[Product]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Csv => write_csv(&mut writer, products)?,
        OutputFormat::Json => write_json(&mut writer, products)?,
    }
    writer.flush().map_err(io_err)?;

    tracing::info!(
        path = %path.display(),
        %format,
        products = products.len(),
        "product collection written"
    );
    Ok(())
}
