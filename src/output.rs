// Preview and export of prepared frames.
//
// Console previews are Markdown tables; exports are plain CSV files plus a
// pretty-printed JSON file per chart specification.
use serde::Serialize;
use std::path::Path;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::error::InsightResult;
use crate::frame::Frame;

pub fn write_csv(path: &Path, frame: &Frame) -> InsightResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(frame.columns())?;
    for row in frame.rows() {
        wtr.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> InsightResult<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown rendering of the first `max_rows` rows of a frame.
pub fn frame_markdown(frame: &Frame, max_rows: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record(frame.columns().iter().map(String::as_str));
    for row in frame.rows().iter().take(max_rows) {
        builder.push_record(row.iter().map(|cell| cell.to_string()));
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_frame(frame: &Frame, max_rows: usize) {
    if frame.is_empty() {
        println!("(no rows)\n");
        return;
    }
    println!("{}\n", frame_markdown(frame, max_rows));
}
