use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::util::time::parse_calendar_date;

use super::types::{ProductionSnapshot, CUSTOMER_FIELD, DATE_FIELD, KEY_FIELD};

struct Entry<'a> {
    date: Option<NaiveDate>,
    record: &'a Map<String, Value>,
}

/// Reduce the `data` list of a stock-request payload.
///
/// Anything that is not an object with a `data` array reduces to an empty list.
pub fn reduce_payload(payload: &Value) -> Vec<ProductionSnapshot> {
    match payload.get("data").and_then(Value::as_array) {
        Some(records) => reduce(records),
        None => Vec::new(),
    }
}

/// One snapshot per distinct trimmed `kode_produk`, keeping the record with
/// the latest parseable `srs_date`; ties and undated candidates keep the
/// first record seen. Output is sorted by product code.
pub fn reduce(records: &[Value]) -> Vec<ProductionSnapshot> {
    let mut index: HashMap<String, Entry<'_>> = HashMap::new();

    for record in records.iter().filter_map(Value::as_object) {
        let Some(key) = str_field(record, KEY_FIELD).map(str::trim) else { continue };
        if key.is_empty() { continue; }
        let date = str_field(record, DATE_FIELD).and_then(parse_calendar_date);

        match index.get_mut(key) {
            None => { index.insert(key.to_string(), Entry { date, record }); }
            Some(existing) => {
                if supersedes(date, existing.date) {
                    *existing = Entry { date, record };
                }
            }
        }
    }

    let mut out: Vec<ProductionSnapshot> = index
        .into_iter()
        .map(|(product_code, e)| ProductionSnapshot {
            date: str_field(e.record, DATE_FIELD).map(str::to_string),
            customer: str_field(e.record, CUSTOMER_FIELD).map(str::to_string),
            product_code,
        })
        .collect();
    out.sort_by(|a, b| a.product_code.cmp(&b.product_code));
    out
}

fn supersedes(candidate: Option<NaiveDate>, existing: Option<NaiveDate>) -> bool {
    match (candidate, existing) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(c), Some(e)) => c > e,
    }
}

fn str_field<'a>(record: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}
