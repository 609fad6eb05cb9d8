use crate::domain::model::{CategoryKey, CategorySummary, Tender, TenderRow, TransformResult};
use crate::utils::error::{EtlError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

const NOT_AVAILABLE: &str = "N/A";
const DEFAULT_CURRENCY: &str = "UAH";
const DEFAULT_TITLE: &str = "Без назви";

/// Loose view of a tender: each field is taken as whatever JSON the API sent
/// so an unexpected type degrades to text instead of failing the run.
#[derive(Debug, Default, Deserialize)]
struct RawTender {
    #[serde(rename = "tenderID")]
    tender_id: Option<Value>,
    id: Option<Value>,
    title: Option<Value>,
    value: Option<Value>,
    items: Option<Value>,
    #[serde(rename = "dateModified")]
    date_modified: Option<Value>,
    status: Option<Value>,
}

/// Strings pass through, null counts as absent, anything else is rendered as JSON.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn amount(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

impl TenderRow {
    /// Applies the field defaults; `dateModified` has none.
    pub fn from_tender(tender: &Tender, position: usize) -> Result<Self> {
        let raw = RawTender::deserialize(&tender.0)?;
        let tender_id = text(raw.tender_id.as_ref());
        let id = text(raw.id.as_ref());

        let date_modified =
            text(raw.date_modified.as_ref()).ok_or_else(|| EtlError::MissingFieldError {
                record: tender_id
                    .clone()
                    .or_else(|| id.clone())
                    .unwrap_or_else(|| format!("#{}", position + 1)),
                field: "dateModified".to_string(),
            })?;

        let value = raw.value.as_ref();
        let value_amount = amount(value.and_then(|v| v.get("amount")));
        let currency = text(value.and_then(|v| v.get("currency")));

        // Only the first item classifies the tender.
        let classification = raw
            .items
            .as_ref()
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(|item| item.get("classification"));

        Ok(Self {
            tender_id: tender_id.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            id: id.unwrap_or_default(),
            title: text(raw.title.as_ref()).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            value_amount,
            currency: currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            category_code: text(classification.and_then(|c| c.get("id")))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            category_desc: text(classification.and_then(|c| c.get("description")))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            date_modified,
            status: text(raw.status.as_ref()).unwrap_or_default(),
        })
    }

    pub fn category(&self) -> CategoryKey {
        CategoryKey {
            code: self.category_code.clone(),
            description: self.category_desc.clone(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CategoryAccumulator {
    pub count: usize,
    pub sum: f64,
}

impl CategoryAccumulator {
    pub fn add(&mut self, amount: f64) {
        self.count += 1;
        self.sum += amount;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

pub fn flatten(tenders: &[Tender]) -> Result<Vec<TenderRow>> {
    tenders
        .iter()
        .enumerate()
        .map(|(position, tender)| TenderRow::from_tender(tender, position))
        .collect()
}

/// Groups rows by category, largest rounded total first. Equal totals keep
/// ascending category order.
pub fn summarize(rows: &[TenderRow]) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<CategoryKey, CategoryAccumulator> = BTreeMap::new();
    for row in rows {
        groups.entry(row.category()).or_default().add(row.value_amount);
    }

    let mut summary: Vec<CategorySummary> = groups
        .into_iter()
        .map(|(key, acc)| CategorySummary {
            category_code: key.code,
            category_desc: key.description,
            count: acc.count,
            total: round_amount(acc.sum),
            mean: round_amount(acc.mean()),
        })
        .collect();

    summary.sort_by(|a, b| b.total.cmp(&a.total));
    summary
}

pub fn total_amount(rows: &[TenderRow]) -> f64 {
    rows.iter().map(|row| row.value_amount).sum()
}

/// Flat table plus category summary, or `None` when there is nothing to analyze.
pub fn analyze(tenders: &[Tender]) -> Result<Option<TransformResult>> {
    if tenders.is_empty() {
        tracing::info!("Немає тендерів для аналізу.");
        return Ok(None);
    }

    let rows = flatten(tenders)?;
    let summary = summarize(&rows);
    let total_amount = total_amount(&rows);

    tracing::debug!(
        "Aggregated {} tenders into {} categories",
        rows.len(),
        summary.len()
    );

    Ok(Some(TransformResult {
        rows,
        summary,
        total_amount,
    }))
}

/// Nearest integer, halves to even.
pub fn round_amount(value: f64) -> i64 {
    value.round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tender(value: serde_json::Value) -> Tender {
        Tender(value)
    }

    fn classified(id: &str, amount: serde_json::Value, code: &str, desc: &str) -> Tender {
        tender(json!({
            "id": id,
            "tenderID": format!("UA-{}", id),
            "title": format!("Tender {}", id),
            "value": {"amount": amount, "currency": "UAH"},
            "items": [{"classification": {"id": code, "description": desc}}],
            "dateModified": "2025-03-01T10:00:00+02:00",
            "status": "complete"
        }))
    }

    #[test]
    fn test_row_copies_fields() {
        let row = TenderRow::from_tender(&classified("1", json!(1250.5), "A", "Goods"), 0).unwrap();

        assert_eq!(row.tender_id, "UA-1");
        assert_eq!(row.id, "1");
        assert_eq!(row.title, "Tender 1");
        assert_eq!(row.value_amount, 1250.5);
        assert_eq!(row.currency, "UAH");
        assert_eq!(row.category_code, "A");
        assert_eq!(row.category_desc, "Goods");
        assert_eq!(row.date_modified, "2025-03-01T10:00:00+02:00");
        assert_eq!(row.status, "complete");
    }

    #[test]
    fn test_row_defaults_for_missing_fields() {
        let row = TenderRow::from_tender(
            &tender(json!({"dateModified": "2025-01-02T00:00:00+02:00"})),
            0,
        )
        .unwrap();

        assert_eq!(row.tender_id, "N/A");
        assert_eq!(row.id, "");
        assert_eq!(row.title, "Без назви");
        assert_eq!(row.value_amount, 0.0);
        assert_eq!(row.currency, "UAH");
        assert_eq!(row.category_code, "N/A");
        assert_eq!(row.category_desc, "N/A");
        assert_eq!(row.status, "");
    }

    #[test]
    fn test_null_amount_counts_as_zero() {
        let row = TenderRow::from_tender(
            &tender(json!({
                "value": {"amount": null, "currency": "EUR"},
                "dateModified": "2025-01-02T00:00:00+02:00"
            })),
            0,
        )
        .unwrap();

        assert_eq!(row.value_amount, 0.0);
        assert_eq!(row.currency, "EUR");
    }

    #[test]
    fn test_tender_without_items_is_not_categorized() {
        let row = TenderRow::from_tender(
            &tender(json!({"items": [], "dateModified": "2025-01-02T00:00:00+02:00"})),
            0,
        )
        .unwrap();

        assert_eq!(row.category(), CategoryKey {
            code: "N/A".to_string(),
            description: "N/A".to_string(),
        });
    }

    #[test]
    fn test_only_first_item_classifies() {
        let row = TenderRow::from_tender(
            &tender(json!({
                "items": [
                    {"classification": {"id": "09130000-9", "description": "Нафта і дистиляти"}},
                    {"classification": {"id": "30190000-7", "description": "Офісне устаткування"}}
                ],
                "dateModified": "2025-01-02T00:00:00+02:00"
            })),
            0,
        )
        .unwrap();

        assert_eq!(row.category_code, "09130000-9");
        assert_eq!(row.category_desc, "Нафта і дистиляти");
    }

    #[test]
    fn test_unexpected_field_types_degrade_to_text() {
        let row = TenderRow::from_tender(
            &tender(json!({
                "id": 42,
                "tenderID": "UA-42",
                "title": {"uk": "Закупівля"},
                "status": true,
                "value": {"amount": "1500.25", "currency": null},
                "items": [{"classification": "45000000-7"}],
                "dateModified": "2025-01-02T00:00:00+02:00"
            })),
            0,
        )
        .unwrap();

        assert_eq!(row.id, "42");
        assert_eq!(row.title, r#"{"uk":"Закупівля"}"#);
        assert_eq!(row.status, "true");
        assert_eq!(row.value_amount, 1500.25);
        assert_eq!(row.currency, "UAH");
        assert_eq!(row.category_code, "N/A");
        assert_eq!(row.category_desc, "N/A");
    }

    #[test]
    fn test_non_list_items_and_odd_amount_use_defaults() {
        let row = TenderRow::from_tender(
            &tender(json!({
                "value": {"amount": [1, 2]},
                "items": {"classification": {"id": "A"}},
                "dateModified": "2025-01-02T00:00:00+02:00"
            })),
            0,
        )
        .unwrap();

        assert_eq!(row.value_amount, 0.0);
        assert_eq!(row.category_code, "N/A");
    }

    #[test]
    fn test_null_date_modified_is_fatal() {
        let err = TenderRow::from_tender(
            &tender(json!({"id": "abc", "dateModified": null})),
            3,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            EtlError::MissingFieldError { ref record, .. } if record == "abc"
        ));
    }

    #[test]
    fn test_missing_date_modified_is_fatal() {
        let tenders = vec![
            classified("1", json!(100), "A", "Goods"),
            tender(json!({"tenderID": "UA-2", "value": {"amount": 5}})),
        ];

        let err = analyze(&tenders).unwrap_err();

        match err {
            EtlError::MissingFieldError { record, field } => {
                assert_eq!(record, "UA-2");
                assert_eq!(field, "dateModified");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_summary_for_single_category() {
        let rows = flatten(&[
            classified("1", json!(100), "A", "Goods"),
            classified("2", json!(200), "A", "Goods"),
        ])
        .unwrap();

        let summary = summarize(&rows);

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].category_code, "A");
        assert_eq!(summary[0].category_desc, "Goods");
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].total, 300);
        assert_eq!(summary[0].mean, 150);
    }

    #[test]
    fn test_summary_sorted_by_total_descending() {
        let rows = flatten(&[
            classified("1", json!(10), "A", "Goods"),
            classified("2", json!(500), "B", "Works"),
            classified("3", json!(70), "C", "Services"),
            classified("4", json!(30), "A", "Goods"),
        ])
        .unwrap();

        let summary = summarize(&rows);
        let codes: Vec<&str> = summary.iter().map(|s| s.category_code.as_str()).collect();

        assert_eq!(codes, vec!["B", "C", "A"]);
        assert_eq!(summary[2].total, 40);
        assert_eq!(summary[2].mean, 20);
    }

    #[test]
    fn test_summary_ignores_input_order() {
        let tenders = vec![
            classified("1", json!(10), "A", "Goods"),
            classified("2", json!(500), "B", "Works"),
            classified("3", json!(70), "C", "Services"),
            classified("4", json!(30), "A", "Goods"),
            tender(json!({"id": "5", "dateModified": "2025-05-05T00:00:00+03:00"})),
        ];
        let mut reversed = tenders.clone();
        reversed.reverse();
        let mut rotated = tenders.clone();
        rotated.rotate_left(2);

        let expected = summarize(&flatten(&tenders).unwrap());
        assert_eq!(summarize(&flatten(&reversed).unwrap()), expected);
        assert_eq!(summarize(&flatten(&rotated).unwrap()), expected);
    }

    #[test]
    fn test_total_amount_treats_missing_as_zero() {
        let rows = flatten(&[
            classified("1", json!(100.25), "A", "Goods"),
            classified("2", json!(null), "A", "Goods"),
            tender(json!({"id": "3", "dateModified": "2025-01-01T00:00:00+02:00"})),
            classified("4", json!(899.75), "B", "Works"),
        ])
        .unwrap();

        assert_eq!(total_amount(&rows), 1000.0);
    }

    #[test]
    fn test_mean_is_rounded() {
        let rows = flatten(&[
            classified("1", json!(1), "A", "Goods"),
            classified("2", json!(2), "A", "Goods"),
            classified("3", json!(2), "A", "Goods"),
        ])
        .unwrap();

        let summary = summarize(&rows);
        assert_eq!(summary[0].total, 5);
        assert_eq!(summary[0].mean, 2);
        assert_eq!(round_amount(2.5), 2);
        assert_eq!(round_amount(3.5), 4);
    }

    #[test]
    fn test_analyze_empty_input() {
        assert!(analyze(&[]).unwrap().is_none());
    }
}
