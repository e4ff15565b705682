use crate::dto::admin_dto::CreateTestPayload;
use crate::error::{Error, Result};
use crate::models::question::QuestionKind;
use crate::models::test::Test;
use crate::services::bank_service::BankService;
use crate::services::test_service::TestService;
use calamine::Reader;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Expected spreadsheet header. Extra columns are ignored.
const COLUMNS: [&str; 7] = [
    "block",
    "discipline",
    "competence",
    "question",
    "type",
    "points",
    "answer",
];

#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub row: usize,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportOutcome {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Serialize)]
pub struct TestImportReport {
    pub test: Test,
    pub outcome: ImportOutcome,
}

/// One spreadsheet row after validation. Raw cell maps never reach the
/// tag-creation logic.
#[derive(Debug, Clone)]
struct QuestionRow {
    block: Option<String>,
    discipline: Option<String>,
    competence: Option<String>,
    question: String,
    kind: QuestionKind,
    points: i32,
    answer: String,
}

#[derive(Clone)]
pub struct ImportService {
    pool: PgPool,
    bank: BankService,
    tests: TestService,
}

impl ImportService {
    pub fn new(pool: PgPool) -> Self {
        let bank = BankService::new(pool.clone());
        let tests = TestService::new(pool.clone());
        Self { pool, bank, tests }
    }

    /// Upsert questions from an uploaded spreadsheet. Row failures are
    /// collected and the rest of the batch proceeds; only an unparseable
    /// payload aborts the whole import.
    pub async fn import_questions(
        &self,
        filename: &str,
        data: &[u8],
        default_block: Option<&str>,
    ) -> Result<ImportOutcome> {
        let rows = parse_rows(filename, data)?;
        let mut outcome = ImportOutcome::default();

        for (index, cells) in rows.iter().enumerate() {
            // Row 1 is the header.
            let row_no = index + 2;
            match validate_row(row_no, cells) {
                Ok(None) => outcome.skipped += 1,
                Err(mut errors) => outcome.errors.append(&mut errors),
                Ok(Some(row)) => match self.upsert_question(&row, default_block).await {
                    Ok(true) => outcome.created += 1,
                    Ok(false) => outcome.updated += 1,
                    Err(e) => {
                        warn!(row = row_no, error = %e, "question import row failed");
                        outcome.errors.push(RowError {
                            row: row_no,
                            field: String::new(),
                            message: e.to_string(),
                        });
                    }
                },
            }
        }

        info!(
            created = outcome.created,
            updated = outcome.updated,
            skipped = outcome.skipped,
            failed = outcome.errors.len(),
            "question import finished"
        );

        Ok(outcome)
    }

    /// Create a test from an uploaded spreadsheet, named after the file.
    /// Existing names get a numeric suffix. Rows without a block are
    /// skipped, matching the legacy import behavior.
    pub async fn import_test(&self, filename: &str, data: &[u8]) -> Result<TestImportReport> {
        let rows = parse_rows(filename, data)?;

        let base = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("Imported test")
            .to_string();
        let mut name = base.clone();
        let mut counter = 1;
        while self.tests.name_exists(&name).await? {
            name = format!("{}_{}", base, counter);
            counter += 1;
        }

        let test = self
            .tests
            .create_test(CreateTestPayload {
                name,
                description: None,
                timer_minutes: None,
                access_code: None,
                question_ids: None,
            })
            .await?;

        let mut outcome = ImportOutcome::default();
        for (index, cells) in rows.iter().enumerate() {
            let row_no = index + 2;
            match validate_row(row_no, cells) {
                Ok(None) => outcome.skipped += 1,
                Err(mut errors) => outcome.errors.append(&mut errors),
                Ok(Some(row)) => {
                    let Some(block_name) = row.block.as_deref() else {
                        outcome.skipped += 1;
                        continue;
                    };
                    match self.attach_row_to_test(test.id, block_name, &row).await {
                        Ok(true) => outcome.created += 1,
                        Ok(false) => outcome.updated += 1,
                        Err(e) => {
                            warn!(row = row_no, error = %e, "test import row failed");
                            outcome.errors.push(RowError {
                                row: row_no,
                                field: String::new(),
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        info!(
            test_id = test.id,
            name = %test.name,
            questions = outcome.created + outcome.updated,
            "test import finished"
        );

        Ok(TestImportReport { test, outcome })
    }

    /// Returns true when a new question row was created.
    async fn upsert_question(&self, row: &QuestionRow, default_block: Option<&str>) -> Result<bool> {
        let block_id = match row.block.as_deref().or(default_block) {
            Some(name) => Some(self.bank.get_or_create_block(name).await?.id),
            None => None,
        };
        let discipline_id = match row.discipline.as_deref() {
            Some(name) => Some(self.bank.get_or_create_discipline(name).await?.id),
            None => None,
        };
        let competence_id = match row.competence.as_deref() {
            Some(name) => Some(self.bank.get_or_create_competence(name).await?.id),
            None => None,
        };

        // The question text is the identity key for the bank import.
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM questions WHERE question = $1 LIMIT 1")
                .bind(&row.question)
                .fetch_optional(&self.pool)
                .await?;

        match existing {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE questions
                    SET block_id = $1, discipline_id = $2, competence_id = $3,
                        kind = $4, points = $5, answer = $6
                    WHERE id = $7
                    "#,
                )
                .bind(block_id)
                .bind(discipline_id)
                .bind(competence_id)
                .bind(row.kind.as_str())
                .bind(row.points)
                .bind(&row.answer)
                .bind(id)
                .execute(&self.pool)
                .await?;
                Ok(false)
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO questions
                        (block_id, discipline_id, competence_id, kind, points, question, answer)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(block_id)
                .bind(discipline_id)
                .bind(competence_id)
                .bind(row.kind.as_str())
                .bind(row.points)
                .bind(&row.question)
                .bind(&row.answer)
                .execute(&self.pool)
                .await?;
                Ok(true)
            }
        }
    }

    /// Returns true when the question had to be created.
    async fn attach_row_to_test(
        &self,
        test_id: i64,
        block_name: &str,
        row: &QuestionRow,
    ) -> Result<bool> {
        let block = self.bank.get_or_create_block(block_name).await?;

        let existing: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM questions
            WHERE question = $1 AND kind = $2 AND block_id IS NOT DISTINCT FROM $3
            LIMIT 1
            "#,
        )
        .bind(&row.question)
        .bind(row.kind.as_str())
        .bind(block.id)
        .fetch_optional(&self.pool)
        .await?;

        let (question_id, created) = match existing {
            Some(id) => (id, false),
            None => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO questions (block_id, kind, points, question, answer)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id
                    "#,
                )
                .bind(block.id)
                .bind(row.kind.as_str())
                .bind(row.points)
                .bind(&row.question)
                .bind(&row.answer)
                .fetch_one(&self.pool)
                .await?;
                (id, true)
            }
        };

        self.tests.attach_block(test_id, block.id).await?;
        self.tests.attach_question(test_id, question_id).await?;

        Ok(created)
    }
}

/// Parse the upload into header-keyed rows. XLSX/XLS goes through
/// calamine, everything else through the csv reader. A payload that
/// cannot be parsed at all is a single fatal error.
pub fn parse_rows(filename: &str, data: &[u8]) -> Result<Vec<HashMap<String, String>>> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" | "ods" => parse_spreadsheet(data),
        _ => parse_csv(data),
    }
}

fn parse_spreadsheet(data: &[u8]) -> Result<Vec<HashMap<String, String>>> {
    let cursor = std::io::Cursor::new(data.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| Error::BatchParse(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::BatchParse("workbook has no sheets".to_string()))?
        .map_err(|e| Error::BatchParse(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_ascii_lowercase())
            .collect(),
        None => return Ok(Vec::new()),
    };

    let mut parsed = Vec::new();
    for row in rows {
        let mut cells = HashMap::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if header.is_empty() {
                continue;
            }
            let value = cell.to_string().trim().to_string();
            if !value.is_empty() {
                cells.insert(header.clone(), value);
            }
        }
        parsed.push(cells);
    }

    Ok(parsed)
}

fn parse_csv(data: &[u8]) -> Result<Vec<HashMap<String, String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::BatchParse(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let mut parsed = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::BatchParse(e.to_string()))?;
        let mut cells = HashMap::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            if header.is_empty() || value.is_empty() {
                continue;
            }
            cells.insert(header.clone(), value.to_string());
        }
        parsed.push(cells);
    }

    Ok(parsed)
}

/// Turn a raw cell map into a validated row. `Ok(None)` marks a blank
/// row to be skipped; field problems are reported per field.
fn validate_row(
    row_no: usize,
    cells: &HashMap<String, String>,
) -> std::result::Result<Option<QuestionRow>, Vec<RowError>> {
    if COLUMNS.iter().all(|c| !cells.contains_key(*c)) {
        return Ok(None);
    }

    let mut errors = Vec::new();

    let question = match cells.get("question") {
        Some(text) if !text.is_empty() => text.clone(),
        _ => {
            errors.push(RowError {
                row: row_no,
                field: "question".to_string(),
                message: "question text is required".to_string(),
            });
            String::new()
        }
    };

    let kind = match cells.get("type") {
        Some(raw) => match QuestionKind::parse(raw) {
            Some(kind) => Some(kind),
            None => {
                errors.push(RowError {
                    row: row_no,
                    field: "type".to_string(),
                    message: format!(
                        "unknown question type '{}' (expected closed, multiclosed, open or pairs)",
                        raw
                    ),
                });
                None
            }
        },
        None => {
            errors.push(RowError {
                row: row_no,
                field: "type".to_string(),
                message: "question type is required".to_string(),
            });
            None
        }
    };

    let points = match cells.get("points") {
        Some(raw) => match parse_points(raw) {
            Some(points) => points,
            None => {
                errors.push(RowError {
                    row: row_no,
                    field: "points".to_string(),
                    message: format!("invalid points value '{}'", raw),
                });
                1
            }
        },
        None => 1,
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Some(QuestionRow {
        block: cells.get("block").cloned(),
        discipline: cells.get("discipline").cloned(),
        competence: cells.get("competence").cloned(),
        question,
        kind: kind.expect("kind validated above"),
        points,
        answer: cells.get("answer").cloned().unwrap_or_default(),
    }))
}

fn parse_points(raw: &str) -> Option<i32> {
    if let Ok(points) = raw.parse::<i32>() {
        return (points >= 0).then_some(points);
    }
    // Spreadsheet numeric cells round-trip as floats ("2.0").
    match raw.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 => Some(f as i32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn csv_rows_are_keyed_by_header() {
        let data = b"block,type,points,question,answer\nNetworking,closed,2,What is TCP?,b\n";
        let rows = parse_rows("bank.csv", data).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["block"], "Networking");
        assert_eq!(rows[0]["type"], "closed");
        assert_eq!(rows[0]["question"], "What is TCP?");
    }

    #[test]
    fn unreadable_csv_is_a_batch_error() {
        let data = b"block,question\nabc,\xff\xfe\n";
        match parse_rows("bank.csv", data) {
            Err(Error::BatchParse(_)) => {}
            other => panic!("expected BatchParse, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn xlsx_written_by_the_exporter_parses_back() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in ["block", "type", "points", "question", "answer"]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_string(1, 0, "Algebra").unwrap();
        sheet.write_string(1, 1, "open").unwrap();
        sheet.write_number(1, 2, 3.0).unwrap();
        sheet.write_string(1, 3, "Define a group.").unwrap();
        sheet.write_string(1, 4, "a set with an operation").unwrap();
        let data = workbook.save_to_buffer().unwrap();

        let rows = parse_rows("bank.xlsx", &data).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["block"], "Algebra");
        assert_eq!(rows[0]["type"], "open");
        assert_eq!(rows[0]["points"], "3");
        assert_eq!(rows[0]["question"], "Define a group.");
    }

    #[test]
    fn valid_row_passes_validation() {
        let row = validate_row(
            2,
            &cells(&[
                ("block", "Networking"),
                ("discipline", "CS"),
                ("question", "What is TCP?"),
                ("type", "closed"),
                ("points", "2"),
                ("answer", "b"),
            ]),
        )
        .unwrap()
        .unwrap();

        assert_eq!(row.block.as_deref(), Some("Networking"));
        assert_eq!(row.kind, QuestionKind::Closed);
        assert_eq!(row.points, 2);
        assert!(row.competence.is_none());
    }

    #[test]
    fn blank_row_is_skipped_not_an_error() {
        assert!(validate_row(3, &HashMap::new()).unwrap().is_none());
    }

    #[test]
    fn missing_question_and_bad_type_are_reported_per_field() {
        let errors = validate_row(
            4,
            &cells(&[("block", "Networking"), ("type", "guess"), ("points", "x")]),
        )
        .unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.row == 4));
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"question"));
        assert!(fields.contains(&"type"));
        assert!(fields.contains(&"points"));
    }

    #[test]
    fn missing_points_default_to_one() {
        let row = validate_row(
            2,
            &cells(&[("question", "Q"), ("type", "open")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(row.points, 1);
    }

    #[test]
    fn float_formatted_points_are_accepted() {
        assert_eq!(parse_points("2"), Some(2));
        assert_eq!(parse_points("2.0"), Some(2));
        assert_eq!(parse_points("2.5"), None);
        assert_eq!(parse_points("-1"), None);
        assert_eq!(parse_points("many"), None);
    }

    #[test]
    fn one_bad_row_does_not_poison_the_batch() {
        let data = b"question,type,points\nQ1,closed,1\nQ2,guess,1\nQ3,open,2\n";
        let rows = parse_rows("bank.csv", data).unwrap();

        let mut ok = 0;
        let mut failed = 0;
        for (i, row) in rows.iter().enumerate() {
            match validate_row(i + 2, row) {
                Ok(Some(_)) => ok += 1,
                Ok(None) => {}
                Err(_) => failed += 1,
            }
        }
        assert_eq!(ok, 2);
        assert_eq!(failed, 1);
    }
}
