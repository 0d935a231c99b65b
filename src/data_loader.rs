use crate::indices::BlendIndex;
use crate::models::{Grade, QualityBasis, QualitySpec};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

// Non-quality columns of the CSV assay table
const RESERVED_CSV_COLUMNS: [&str; 5] = [
    "grade",
    "price_per_bbl",
    "min_supply_bbl",
    "max_supply_bbl",
    "assay_date",
];

#[derive(Debug, Deserialize)]
struct QualityEntry {
    min: f64,
    max: f64,
    #[serde(default)]
    basis: QualityBasis,
    #[serde(default)]
    index: Option<BlendIndex>,
}

#[derive(Debug, Deserialize)]
struct GradeEntry {
    price_per_bbl: f64,
    #[serde(default)]
    min_supply_bbl: f64,
    max_supply_bbl: f64,
    #[serde(default)]
    assay_date: Option<NaiveDate>,
    qualities: HashMap<String, f64>,
}

/// Load quality bounds from a JSON file mapping quality name to
/// `{min, max, basis?, index?}`.
pub fn load_quality_specs(path: &Path) -> Result<Vec<QualitySpec>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open quality bounds file {}", path.display()))?;
    let entries: BTreeMap<String, QualityEntry> = serde_json::from_reader(file)
        .with_context(|| format!("failed to parse quality bounds file {}", path.display()))?;

    let specs: Vec<QualitySpec> = entries
        .into_iter()
        .map(|(name, entry)| QualitySpec {
            name,
            lower: entry.min,
            upper: entry.max,
            basis: entry.basis,
            index: entry.index,
        })
        .collect();
    debug!("Loaded {} quality specs from {}", specs.len(), path.display());
    Ok(specs)
}

/// Load grade assays from a JSON file mapping grade id to
/// `{price_per_bbl, min_supply_bbl?, max_supply_bbl, assay_date?, qualities}`.
pub fn load_grades(path: &Path) -> Result<Vec<Grade>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open assay file {}", path.display()))?;
    let entries: BTreeMap<String, GradeEntry> = serde_json::from_reader(file)
        .with_context(|| format!("failed to parse assay file {}", path.display()))?;
    if entries.is_empty() {
        bail!("assay file {} contains no grades", path.display());
    }

    let grades: Vec<Grade> = entries
        .into_iter()
        .map(|(id, entry)| Grade {
            id,
            price_per_bbl: entry.price_per_bbl,
            min_supply_bbl: entry.min_supply_bbl,
            max_supply_bbl: entry.max_supply_bbl,
            assay_date: entry.assay_date,
            qualities: entry.qualities,
        })
        .collect();
    debug!("Loaded {} grades from {}", grades.len(), path.display());
    Ok(grades)
}

/// Load grade assays from a CSV table.
///
/// Required columns: `grade`, `price_per_bbl`, `max_supply_bbl`. Optional:
/// `min_supply_bbl`, `assay_date` (YYYY-MM-DD). Every other column is read
/// as a numeric quality.
pub fn load_grades_csv(path: &Path) -> Result<Vec<Grade>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open assay file {}", path.display()))?;
    let headers = reader.headers()?.clone();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let grade_col = column("grade")
        .with_context(|| format!("assay file {} has no 'grade' column", path.display()))?;
    let price_col = column("price_per_bbl")
        .with_context(|| format!("assay file {} has no 'price_per_bbl' column", path.display()))?;
    let max_supply_col = column("max_supply_bbl").with_context(|| {
        format!("assay file {} has no 'max_supply_bbl' column", path.display())
    })?;
    let min_supply_col = column("min_supply_bbl");
    let assay_date_col = column("assay_date");

    let quality_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !RESERVED_CSV_COLUMNS.contains(h))
        .map(|(idx, h)| (idx, h.to_string()))
        .collect();

    let mut grades = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        let numeric = |idx: usize, what: &str| -> Result<f64> {
            field(idx).parse::<f64>().with_context(|| {
                format!(
                    "row {} of {}: invalid {} '{}'",
                    row + 2,
                    path.display(),
                    what,
                    field(idx)
                )
            })
        };

        let mut qualities = HashMap::with_capacity(quality_cols.len());
        for (idx, name) in &quality_cols {
            qualities.insert(name.clone(), numeric(*idx, name)?);
        }

        let assay_date = match assay_date_col.map(|idx| field(idx)) {
            Some(text) if !text.is_empty() => Some(
                NaiveDate::parse_from_str(text, "%Y-%m-%d").with_context(|| {
                    format!("row {} of {}: invalid assay_date '{}'", row + 2, path.display(), text)
                })?,
            ),
            _ => None,
        };

        grades.push(Grade {
            id: field(grade_col).to_string(),
            price_per_bbl: numeric(price_col, "price_per_bbl")?,
            min_supply_bbl: match min_supply_col {
                Some(idx) if !field(idx).is_empty() => numeric(idx, "min_supply_bbl")?,
                _ => 0.0,
            },
            max_supply_bbl: numeric(max_supply_col, "max_supply_bbl")?,
            assay_date,
            qualities,
        });
    }
    if grades.is_empty() {
        bail!("assay file {} contains no grades", path.display());
    }
    debug!("Loaded {} grades from {}", grades.len(), path.display());
    Ok(grades)
}
