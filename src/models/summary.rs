use bigdecimal::BigDecimal;
use serde::Serialize;

/// 数值列统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// 分类列统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoricalStats {
    pub name: String,
    pub distinct: usize,
}

/// 单表统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStats {
    pub row_count: usize,
    pub numeric: Vec<NumericStats>,
    pub categorical: Vec<CategoricalStats>,
}

/// 开票期间
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: String,
    pub end: String,
}

/// 数据概要 (指标面板 + 列清单)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub header_records: usize,
    pub item_records: usize,
    pub header_columns: Vec<String>,
    pub item_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_suppliers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}
