// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Subcommand implementations.

pub mod analyze;
pub mod refactor;

use std::fs;

use camino::Utf8Path;
use gemtalk_core::image::MemoryImage;
use miette::{Context, IntoDiagnostic, Result};
use serde::Serialize;

use crate::config::OutputFormat;

/// Reads a method source file.
pub fn read_method_file(path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read method file '{path}'"))
}

/// Loads an image snapshot.
pub fn load_image(path: &Utf8Path) -> Result<MemoryImage> {
    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read image snapshot '{path}'"))?;
    MemoryImage::from_json(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse image snapshot '{path}'"))
}

/// Writes an image snapshot back to disk.
pub fn save_image(image: &MemoryImage, path: &Utf8Path) -> Result<()> {
    let json = image
        .to_json()
        .into_diagnostic()
        .wrap_err("Failed to serialize image snapshot")?;
    fs::write(path, json + "\n")
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write image snapshot '{path}'"))
}

/// Pretty JSON for a payload.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .into_diagnostic()
        .wrap_err("Failed to serialize result")
}

/// Renders `value` as JSON, or with `text` in text mode.
pub fn render<T: Serialize>(value: &T, format: OutputFormat, text: impl FnOnce(&T) -> String) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(value),
        OutputFormat::Text => Ok(text(value)),
    }
}
