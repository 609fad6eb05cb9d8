use crate::domain::model::{CategorySummary, TenderRow, TransformResult};
use crate::utils::error::{EtlError, Result};
use serde::Serialize;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const TOP_CATEGORIES: usize = 10;

pub fn tenders_file_name(edrpou: &str, year: i32) -> String {
    format!("tenders_{}_{}.csv", edrpou, year)
}

pub fn summary_file_name(edrpou: &str, year: i32) -> String {
    format!("analytics_summary_{}_{}.csv", edrpou, year)
}

/// Console report: totals followed by the top categories.
pub fn render_report(result: &TransformResult, edrpou: &str, year: i32) -> String {
    let rule = "=".repeat(50);
    let mut output = String::new();

    output.push_str(&format!("\n{}\n", rule));
    output.push_str(&format!(
        "АНАЛІЗ ЗАКУПІВЕЛЬ ЗА {} РІК | ЄДРПОУ {}\n",
        year, edrpou
    ));
    output.push_str(&format!("{}\n", rule));
    output.push_str(&format!("Всього тендерів: {}\n", result.tender_count()));
    output.push_str(&format!(
        "Загальна сума: {} грн\n",
        format_thousands(result.total_amount)
    ));
    output.push_str("Топ категорій:\n");
    output.push_str(&render_summary_table(
        &result.summary[..result.summary.len().min(TOP_CATEGORIES)],
    ));

    output
}

pub fn render_saved_files(file_names: &[String]) -> String {
    let mut output = String::from("\nФайли збережено:\n");
    for name in file_names {
        output.push_str(&format!("   • {}\n", name));
    }
    output
}

fn render_summary_table(summary: &[CategorySummary]) -> String {
    let headers = [
        "category_code",
        "category_desc",
        "Кількість_тендерів",
        "Загальна_сума",
        "Середня_сума",
    ];
    let cells: Vec<[String; 5]> = summary
        .iter()
        .map(|row| {
            [
                row.category_code.clone(),
                row.category_desc.clone(),
                row.count.to_string(),
                row.total.to_string(),
                row.mean.to_string(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut table = String::new();
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| format!("{:<width$}", header, width = *width))
        .collect();
    table.push_str(header_line.join("  ").trim_end());
    table.push('\n');

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(column, (cell, width))| {
                if column < 2 {
                    format!("{:<width$}", cell, width = *width)
                } else {
                    format!("{:>width$}", cell, width = *width)
                }
            })
            .collect();
        table.push_str(line.join("  ").trim_end());
        table.push('\n');
    }

    table
}

/// Whole number with `,` thousands separators, e.g. `1,234,568`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round_ties_even();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn tenders_csv(rows: &[TenderRow]) -> Result<Vec<u8>> {
    write_csv(rows)
}

pub fn summary_csv(summary: &[CategorySummary]) -> Result<Vec<u8>> {
    write_csv(summary)
}

/// UTF-8 CSV with a leading byte-order mark so spreadsheet tools pick the
/// right encoding.
fn write_csv<T: Serialize>(records: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(UTF8_BOM.to_vec());

    for record in records {
        writer.serialize(record)?;
    }

    writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("Failed to flush CSV buffer: {}", e),
    })
}
