use crate::error::{Error, Result};
use crate::models::test::Test;
use crate::utils::text::strip_html;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

/// One exported question row, in the same column order the importers
/// expect, so an exported test can be imported back.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub block: String,
    pub kind: String,
    pub points: i32,
    pub question: String,
    pub answer: String,
}

const HEADERS: [&str; 5] = ["block", "type", "points", "question", "answer"];

pub struct ExportService;

impl ExportService {
    /// Generate a styled XLSX workbook with the test's questions. The
    /// header is the first row so the file feeds straight back into the
    /// importers.
    pub fn test_to_xlsx(test: &Test, rows: &[ExportRow]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&worksheet_name(&test.name))?;

        let header_bg = Color::RGB(0x0F172A);
        let border_color = Color::RGB(0xE2E8F0);
        let alt_row = Color::RGB(0xF8FAFC);

        let widths = [25.0, 14.0, 10.0, 70.0, 40.0];
        for (i, width) in widths.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let header_row = 0;
        worksheet.set_row_height(header_row, 24)?;
        for (i, name) in HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start = 1;
        for (idx, row) in rows.iter().enumerate() {
            let r = data_start + idx as u32;
            let bg = if idx % 2 == 0 { alt_row } else { Color::White };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();

            worksheet.write_string_with_format(r, 0, &row.block, &base_fmt)?;
            worksheet.write_string_with_format(r, 1, &row.kind, &center_fmt)?;
            worksheet.write_number_with_format(r, 2, row.points as f64, &center_fmt)?;
            worksheet.write_string_with_format(r, 3, &strip_html(&row.question), &wrap_fmt)?;
            worksheet.write_string_with_format(r, 4, &row.answer, &wrap_fmt)?;
        }

        worksheet.set_freeze_panes(data_start, 0)?;
        if !rows.is_empty() {
            worksheet.autofilter(
                header_row,
                0,
                data_start + rows.len() as u32 - 1,
                (HEADERS.len() - 1) as u16,
            )?;
        }

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }

    /// Plain CSV in the import column order.
    pub fn test_to_csv(rows: &[ExportRow]) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(HEADERS)
            .map_err(|e| Error::Internal(e.to_string()))?;

        for row in rows {
            writer
                .write_record([
                    row.block.as_str(),
                    row.kind.as_str(),
                    &row.points.to_string(),
                    &strip_html(&row.question),
                    row.answer.as_str(),
                ])
                .map_err(|e| Error::Internal(e.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|e| Error::Internal(e.to_string()))
    }
}

/// Excel sheet names are capped at 31 chars and reject a handful of
/// punctuation characters.
fn worksheet_name(test_name: &str) -> String {
    let cleaned: String = test_name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => ' ',
            other => other,
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return "Questions".to_string();
    }
    trimmed.chars().take(31).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<ExportRow> {
        vec![
            ExportRow {
                block: "Networking".to_string(),
                kind: "closed".to_string(),
                points: 2,
                question: "<p>What is TCP?</p>".to_string(),
                answer: "b".to_string(),
            },
            ExportRow {
                block: "Networking".to_string(),
                kind: "open".to_string(),
                points: 5,
                question: "Explain routing.".to_string(),
                answer: "packets are forwarded hop by hop".to_string(),
            },
        ]
    }

    #[test]
    fn csv_export_has_import_header_and_stripped_markup() {
        let data = ExportService::test_to_csv(&rows()).unwrap();
        let text = String::from_utf8(data).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "block,type,points,question,answer");
        let first = lines.next().unwrap();
        assert!(first.contains("What is TCP?"));
        assert!(!first.contains("<p>"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn csv_export_parses_back_through_the_importer() {
        let data = ExportService::test_to_csv(&rows()).unwrap();
        let parsed = crate::services::import_service::parse_rows("test.csv", &data).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["block"], "Networking");
        assert_eq!(parsed[1]["type"], "open");
        assert_eq!(parsed[1]["points"], "5");
    }

    #[test]
    fn xlsx_export_produces_a_workbook() {
        let test = Test {
            id: 1,
            name: "Midterm".to_string(),
            description: String::new(),
            timer_minutes: 30,
            access_code: String::new(),
            created_at: chrono::Utc::now(),
        };

        let data = ExportService::test_to_xlsx(&test, &rows()).unwrap();
        // XLSX containers start with the PK zip magic.
        assert_eq!(&data[..2], b"PK");

        let parsed = crate::services::import_service::parse_rows("midterm.xlsx", &data).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["block"], "Networking");
        assert_eq!(parsed[0]["question"], "What is TCP?");
        assert_eq!(parsed[1]["points"], "5");
    }
}
