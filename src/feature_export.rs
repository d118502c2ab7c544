use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::batch::{BatchOutput, SkippedGame};
use crate::features::{FEATURE_COLUMNS, FeatureCell, ShotFeatureRow};

pub struct ExportReport {
    pub shots: usize,
    pub skipped: usize,
}

pub fn export_workbook(path: &Path, output: &BatchOutput) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Shots")?;
        write_header(sheet, FEATURE_COLUMNS)?;
        write_shot_rows(sheet, &output.rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Skipped")?;
        write_header(sheet, &["Game", "Origin", "Kind", "Reason"])?;
        let rows: Vec<Vec<String>> = output.skipped.iter().map(skipped_row).collect();
        write_text_rows(sheet, 1, &rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        shots: output.rows.len(),
        skipped: output.skipped.len(),
    })
}

fn skipped_row(skipped: &SkippedGame) -> Vec<String> {
    vec![
        skipped.game.clone(),
        skipped.origin.clone(),
        skipped.kind.clone(),
        skipped.reason.clone(),
    ]
}

fn write_header(worksheet: &mut Worksheet, names: &[&str]) -> Result<()> {
    for (col_idx, name) in names.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, *name)
            .with_context(|| format!("write header ({col_idx})"))?;
    }
    Ok(())
}

fn write_shot_rows(worksheet: &mut Worksheet, rows: &[ShotFeatureRow]) -> Result<()> {
    for (idx, row) in rows.iter().enumerate() {
        let row_idx = (idx + 1) as u32;
        for (col_idx, cell) in row.cells().into_iter().enumerate() {
            let col = col_idx as u16;
            let written = match cell {
                FeatureCell::Int(v) => worksheet.write_number(row_idx, col, v as f64),
                FeatureCell::Float(v) => worksheet.write_number(row_idx, col, v),
                FeatureCell::Text(v) => worksheet.write_string(row_idx, col, &v),
                // Blank cell reads back as null in pandas/polars.
                FeatureCell::Null => continue,
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

fn write_text_rows(worksheet: &mut Worksheet, first_row: u32, rows: &[Vec<String>]) -> Result<()> {
    for (idx, row) in rows.iter().enumerate() {
        let row_idx = first_row + idx as u32;
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
