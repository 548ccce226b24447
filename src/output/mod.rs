// src/output/mod.rs

//! Rendering of kernel releases
//!
//! Text is a fixed-column table for people; JSON and YAML carry every field
//! of [`KernelRelease`] for scripts. An empty result is an empty list in the
//! structured formats and a notice in text.

use crate::error::{Error, Result};
use crate::kernelrelease::KernelRelease;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Message printed by the text format when nothing was found
pub const NO_RELEASES: &str = "No releases found.";

/// Output encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
    Yaml,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "table" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(Error::ConfigError(format!(
                "Unknown output format '{other}' (expected text, json or yaml)"
            ))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

fn write_error(e: impl fmt::Display) -> Error {
    Error::IoError(format!("Failed to write output: {e}"))
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let kept: String = value.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        value.to_string()
    }
}

fn encode_text<W: Write>(writer: &mut W, releases: &[KernelRelease]) -> Result<()> {
    if releases.is_empty() {
        writeln!(writer, "{NO_RELEASES}")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<45} {:<10} {:<25} {:<10} URL",
        "KERNEL RELEASE", "ARCH", "PACKAGE", "COMPILER"
    )?;
    writeln!(writer, "{}", "-".repeat(100))?;

    for release in releases {
        let compiler = if release.compiler_version.is_empty() {
            "-"
        } else {
            release.compiler_version.as_str()
        };
        writeln!(
            writer,
            "{:<45} {:<10} {:<25} {:<10} {}",
            truncate(&release.kernel_release(), 45),
            release.architecture,
            truncate(&release.package_name, 25),
            compiler,
            release.package_url
        )?;
    }

    writeln!(writer, "\nTotal: {} release(s)", releases.len())?;
    Ok(())
}

/// Write `releases` to `writer` in `format`
pub fn encode<W: Write>(writer: &mut W, releases: &[KernelRelease], format: Format) -> Result<()> {
    match format {
        Format::Text => encode_text(writer, releases),
        Format::Json => {
            serde_json::to_writer_pretty(&mut *writer, releases).map_err(write_error)?;
            writeln!(writer)?;
            Ok(())
        }
        Format::Yaml => serde_yaml::to_writer(writer, releases).map_err(write_error),
    }
}
