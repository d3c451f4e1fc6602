//! Snapshot file parsing.
//!
//! Supports CSV (with a header row) and JSON (an array of objects).
//! Loading is all-or-nothing: any structural problem aborts the load.

use crate::models::{Deal, DealTable, Stage};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const OWNER_COLUMN: &str = "Deal_Owner_Name";
pub const AD_COLUMN: &str = "Ad";
pub const STAGE_COLUMN: &str = "Stage";
pub const AMOUNT_COLUMN: &str = "Offer_Total_Amount";
pub const PRODUCT_COLUMN: &str = "Product";
pub const EDUCATION_TYPE_COLUMN: &str = "Education_Type";

/// Columns every snapshot must provide, in `Deal` field order.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    OWNER_COLUMN,
    AD_COLUMN,
    STAGE_COLUMN,
    AMOUNT_COLUMN,
    PRODUCT_COLUMN,
    EDUCATION_TYPE_COLUMN,
];

/// Errors that abort loading a snapshot.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Snapshot not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read snapshot {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid CSV in {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Snapshot {} is missing required columns: {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("Malformed snapshot {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// Snapshot serialization, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapshotFormat {
    Csv,
    Json,
}

impl SnapshotFormat {
    fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SnapshotFormat::Json,
            _ => SnapshotFormat::Csv,
        }
    }
}

/// Load the full deal table from a snapshot file.
pub fn load_deals(path: &Path) -> Result<DealTable, LoadError> {
    let format = SnapshotFormat::detect(path);
    debug!("Loading {:?} snapshot from {}", format, path.display());

    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path.to_path_buf())
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    // Strip UTF-8 BOM if present
    let text = text.trim_start_matches('\u{FEFF}');

    let deals = match format {
        SnapshotFormat::Csv => parse_csv(path, text)?,
        SnapshotFormat::Json => parse_json(path, text)?,
    };

    info!("Loaded {} deals from {}", deals.len(), path.display());
    Ok(DealTable::new(deals))
}

fn parse_csv(path: &Path, text: &str) -> Result<Vec<Deal>, LoadError> {
    let csv_error = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(csv_error)?.clone();
    let positions = column_positions(path, |name| headers.iter().position(|h| h == name))?;

    let mut deals = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let field = |i: usize| record.get(positions[i]).unwrap_or("");
        deals.push(build_deal(
            field(0),
            field(1),
            field(2),
            parse_amount(field(3)),
            field(4),
            field(5),
        ));
    }

    Ok(deals)
}

fn parse_json(path: &Path, text: &str) -> Result<Vec<Deal>, LoadError> {
    let malformed = |reason: String| LoadError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let value: Value = serde_json::from_str(text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Array(items) = value else {
        return Err(malformed("top-level value is not an array".to_string()));
    };

    let mut deals = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Value::Object(record) = item else {
            return Err(malformed(format!("record {} is not an object", i)));
        };
        column_positions(path, |name| record.contains_key(name).then_some(0))?;

        deals.push(build_deal(
            &json_text(record, OWNER_COLUMN),
            &json_text(record, AD_COLUMN),
            &json_text(record, STAGE_COLUMN),
            json_amount(record),
            &json_text(record, PRODUCT_COLUMN),
            &json_text(record, EDUCATION_TYPE_COLUMN),
        ));
    }

    Ok(deals)
}

/// Resolve the position of every required column, or report all missing ones.
fn column_positions<F>(path: &Path, find: F) -> Result<[usize; 6], LoadError>
where
    F: Fn(&str) -> Option<usize>,
{
    let mut positions = [0usize; 6];
    let mut missing = Vec::new();

    for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
        match find(name) {
            Some(pos) => *slot = pos,
            None => missing.push(name.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(LoadError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        })
    }
}

fn build_deal(
    owner: &str,
    ad: &str,
    stage: &str,
    amount: Option<f64>,
    product: &str,
    education_type: &str,
) -> Deal {
    Deal {
        owner: owner.to_string(),
        ad: ad.to_string(),
        stage: Stage::from(stage),
        amount,
        product: product.to_string(),
        education_type: education_type.to_string(),
    }
}

/// Parse an amount cell. Empty, non-numeric and non-finite values become `None`.
fn parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn json_text(record: &Map<String, Value>, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn json_amount(record: &Map<String, Value>) -> Option<f64> {
    match record.get(AMOUNT_COLUMN)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stage;
    use tempfile::TempDir;

    const HEADER: &str = "Deal_Owner_Name,Ad,Stage,Offer_Total_Amount,Product,Education_Type\n";

    fn write_snapshot(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!(
            "{}{}{}",
            HEADER,
            "Alice,Search,Payment Done,1500.5,Web Developer,Morning\n",
            "Bob,Social,New,,Data Analyst,Evening\n"
        );
        let path = write_snapshot(&dir, "deals.csv", &content);

        let table = load_deals(&path).unwrap();
        assert_eq!(table.len(), 2);

        let first = &table.rows()[0];
        assert_eq!(first.owner, "Alice");
        assert_eq!(first.ad, "Search");
        assert_eq!(first.stage, Stage::PaymentDone);
        assert_eq!(first.amount, Some(1500.5));
        assert_eq!(first.product, "Web Developer");
        assert_eq!(first.education_type, "Morning");

        let second = &table.rows()[1];
        assert_eq!(second.stage, Stage::Other("New".to_string()));
        assert_eq!(second.amount, None);
    }

    #[test]
    fn test_load_csv_column_order_and_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let content = "Id,Education_Type,Product,Offer_Total_Amount,Stage,Ad,Deal_Owner_Name\n\
                       7,Morning,UX Designer,200,Payment Done,Search,Carol\n";
        let path = write_snapshot(&dir, "deals.csv", content);

        let table = load_deals(&path).unwrap();
        let deal = &table.rows()[0];
        assert_eq!(deal.owner, "Carol");
        assert_eq!(deal.product, "UX Designer");
        assert_eq!(deal.amount, Some(200.0));
    }

    #[test]
    fn test_non_numeric_amount_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!(
            "{}{}{}",
            HEADER,
            "Alice,Search,Payment Done,unknown,Web Developer,Morning\n",
            "Alice,Search,Payment Done,NaN,Web Developer,Morning\n"
        );
        let path = write_snapshot(&dir, "deals.csv", &content);

        let table = load_deals(&path).unwrap();
        assert!(table.rows().iter().all(|d| d.amount.is_none()));
    }

    #[test]
    fn test_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(
            &dir,
            "deals.csv",
            "Deal_Owner_Name,Ad,Stage\nAlice,Search,New\n",
        );

        match load_deals(&path) {
            Err(LoadError::MissingColumns { columns, .. }) => {
                assert_eq!(
                    columns,
                    vec!["Offer_Total_Amount", "Product", "Education_Type"]
                );
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_file_is_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(&dir, "deals.csv", "");
        assert!(matches!(
            load_deals(&path),
            Err(LoadError::MissingColumns { .. })
        ));
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(&dir, "deals.csv", HEADER);
        let table = load_deals(&path).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!(
            "\u{FEFF}{}Alice,Search,New,0,Web Developer,Morning\n",
            HEADER
        );
        let path = write_snapshot(&dir, "deals.csv", &content);
        assert_eq!(load_deals(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_ragged_row_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!(
            "{}{}{}",
            HEADER, "Alice,Search,New,0,Web Developer,Morning\n", "Bob,Search\n"
        );
        let path = write_snapshot(&dir, "deals.csv", &content);
        assert!(matches!(load_deals(&path), Err(LoadError::Csv { .. })));
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        assert!(matches!(load_deals(&path), Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let content = r#"[
            {"Deal_Owner_Name": "Alice", "Ad": "Search", "Stage": "Payment Done",
             "Offer_Total_Amount": 100, "Product": "Web Developer", "Education_Type": "Morning"},
            {"Deal_Owner_Name": "Bob", "Ad": null, "Stage": "New",
             "Offer_Total_Amount": "250.0", "Product": "NoData", "Education_Type": "Evening"},
            {"Deal_Owner_Name": "Bob", "Ad": "Social", "Stage": "New",
             "Offer_Total_Amount": null, "Product": "NoData", "Education_Type": "Evening"}
        ]"#;
        let path = write_snapshot(&dir, "deals.json", content);

        let table = load_deals(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0].amount, Some(100.0));
        assert_eq!(table.rows()[1].ad, "");
        assert_eq!(table.rows()[1].amount, Some(250.0));
        assert_eq!(table.rows()[2].amount, None);
    }

    #[test]
    fn test_json_record_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let content = r#"[{"Deal_Owner_Name": "Alice", "Ad": "Search", "Stage": "New",
                           "Offer_Total_Amount": 1, "Product": "Web Developer"}]"#;
        let path = write_snapshot(&dir, "deals.json", content);

        match load_deals(&path) {
            Err(LoadError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["Education_Type"]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_json_not_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(&dir, "deals.json", r#"{"deals": []}"#);
        assert!(matches!(
            load_deals(&path),
            Err(LoadError::Malformed { .. })
        ));
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(&dir, "deals.json", "[{");
        assert!(matches!(load_deals(&path), Err(LoadError::Json { .. })));
    }

    #[test]
    fn test_load_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/deals.csv");
        let table = load_deals(&path).unwrap();
        assert_eq!(table.len(), 20);
    }

    #[test]
    fn test_error_message_names_columns() {
        let err = LoadError::MissingColumns {
            path: PathBuf::from("deals.csv"),
            columns: vec!["Ad".to_string(), "Stage".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Snapshot deals.csv is missing required columns: Ad, Stage"
        );
    }
}
