use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::extract::ExtractionResult;

pub mod formatters;

pub use formatters::*;

/// Save extraction result to file
pub fn save_to_file(result: &ExtractionResult, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(result, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print extraction result to console
pub fn print_to_console(result: &ExtractionResult, format: &OutputFormat) -> Result<()> {
    let content = render(result, format)?;
    println!("{}", content);
    Ok(())
}

fn render(result: &ExtractionResult, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_as_text(result)),
        OutputFormat::Json => format_as_json(result),
        OutputFormat::Csv => Ok(format_as_csv(result)),
    }
}
