use serde::Serialize;

pub const KEY_FIELD: &str = "kode_produk";
pub const DATE_FIELD: &str = "srs_date";
pub const CUSTOMER_FIELD: &str = "srs_customer";

/// Most recent known production event for one product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductionSnapshot {
    pub date: Option<String>,
    pub customer: Option<String>,
    pub product_code: String,
}

// Result envelope for `reduce`
#[derive(Serialize)]
pub struct ReduceResult {
    pub source: String,
    pub destination: String,
    pub products: usize,
}
