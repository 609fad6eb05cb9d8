use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

/// A tender exactly as the API returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tender(pub serde_json::Value);

/// One page of the tender listing.
#[derive(Debug, Clone, Deserialize)]
pub struct TenderPage {
    #[serde(default)]
    pub data: Option<Vec<Tender>>,
    #[serde(default)]
    pub next_page: Option<NextPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextPage {
    #[serde(default)]
    pub offset: Option<serde_json::Value>,
}

impl TenderPage {
    pub fn into_batch(self) -> (Vec<Tender>, Option<String>) {
        let offset = self
            .next_page
            .and_then(|page| page.offset)
            .and_then(|offset| match offset {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .filter(|offset| !offset.is_empty());

        (self.data.unwrap_or_default(), offset)
    }
}

/// Filters sent with every page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenderQuery {
    pub buyer_identifier: String,
    pub date_modified_from: String,
    pub date_modified_to: String,
    pub limit: u64,
    pub descending: bool,
    pub offset: Option<String>,
}

impl TenderQuery {
    /// Query covering the whole calendar year, newest first.
    pub fn for_year(edrpou: &str, year: i32, limit: u64) -> Result<Self> {
        let invalid_year = || EtlError::InvalidConfigValueError {
            field: "year".to_string(),
            value: year.to_string(),
            reason: "Not a representable calendar year".to_string(),
        };

        let first_day = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid_year)?;
        let last_moment = NaiveDate::from_ymd_opt(year, 12, 31)
            .and_then(|day| day.and_hms_opt(23, 59, 59))
            .ok_or_else(invalid_year)?;

        Ok(Self {
            buyer_identifier: edrpou.to_string(),
            date_modified_from: first_day.format("%Y-%m-%d").to_string(),
            date_modified_to: last_moment.format("%Y-%m-%dT%H:%M:%S").to_string(),
            limit,
            descending: true,
            offset: None,
        })
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("descending", self.descending.to_string()),
            ("limit", self.limit.to_string()),
            ("buyer_identifier", self.buyer_identifier.clone()),
            ("date_modified_from", self.date_modified_from.clone()),
            ("date_modified_to", self.date_modified_to.clone()),
        ];
        if let Some(offset) = &self.offset {
            params.push(("offset", offset.clone()));
        }
        params
    }
}

/// Raw HTTP answer for a page request, before the status is judged.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

/// Flat, per-tender view written to `tenders_{edrpou}_{year}.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenderRow {
    #[serde(rename = "tenderID")]
    pub tender_id: String,
    pub id: String,
    pub title: String,
    #[serde(serialize_with = "serialize_amount")]
    pub value_amount: f64,
    pub currency: String,
    pub category_code: String,
    pub category_desc: String,
    #[serde(rename = "dateModified")]
    pub date_modified: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryKey {
    pub code: String,
    pub description: String,
}

/// One row of `analytics_summary_{edrpou}_{year}.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category_code: String,
    pub category_desc: String,
    #[serde(rename = "Кількість_тендерів")]
    pub count: usize,
    #[serde(rename = "Загальна_сума")]
    pub total: i64,
    #[serde(rename = "Середня_сума")]
    pub mean: i64,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub rows: Vec<TenderRow>,
    pub summary: Vec<CategorySummary>,
    pub total_amount: f64,
}

impl TransformResult {
    pub fn tender_count(&self) -> usize {
        self.rows.len()
    }
}

/// Whole amounts are written without a fractional part (`100`, not `100.0`),
/// fractional ones keep it (`12.5`). This intentionally departs from the float
/// column the older tabular export produced, where every amount had a `.0`.
fn serialize_amount<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
