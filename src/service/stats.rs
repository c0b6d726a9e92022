use crate::data::{column_names, is_numeric, preview, value_range};
use crate::models::{CategoricalStats, DataSummary, InvoiceData, NumericStats, Period, TableStats};
use bigdecimal::BigDecimal;
use polars::prelude::*;
use std::str::FromStr;

/// 分类列最多统计 3 列
pub const MAX_CATEGORICAL_COLUMNS: usize = 3;
/// 预览行数
pub const PREVIEW_ROWS: usize = 3;

const TOTAL_VALUE_COLUMNS: [&str; 2] = ["valor_total", "total_value"];
const SUPPLIER_COLUMNS: [&str; 2] = ["fornecedor", "supplier"];
const ISSUE_DATE_COLUMNS: [&str; 2] = ["data_emissao", "issue_date"];

/// 单表统计：行数、数值列均值/最小/最大、前三个文本列的去重数
pub fn table_stats(df: &DataFrame) -> TableStats {
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let name = column.name().to_string();

        if is_numeric(series.dtype()) {
            let count = series.len() - series.null_count();
            let (Some(mean), Ok(Some(min)), Ok(Some(max))) =
                (series.mean(), series.min::<f64>(), series.max::<f64>())
            else {
                continue;
            };
            numeric.push(NumericStats {
                name,
                count,
                mean,
                min,
                max,
            });
        } else if series.dtype() == &DataType::String && categorical.len() < MAX_CATEGORICAL_COLUMNS {
            match series.drop_nulls().n_unique() {
                Ok(distinct) => categorical.push(CategoricalStats { name, distinct }),
                Err(e) => tracing::debug!("Distinct count skipped for {}: {}", name, e),
            }
        }
    }

    TableStats {
        row_count: df.height(),
        numeric,
        categorical,
    }
}

/// 表结构描述：行数、列名、列类型
pub fn data_info(data: &InvoiceData) -> String {
    let mut info = Vec::new();

    for (title, df) in [("HEADER DATA", &data.header), ("ITEMS DATA", &data.items)] {
        info.push(format!("{} ({} records):", title, df.height()));
        info.push(format!("Columns: {}", column_names(df).join(", ")));
        info.push(format!("Data types: {}", describe_types(df)));
        info.push(String::new());
    }

    info.push(format!("COMBINED DATA ({} records):", data.combined.height()));
    info.push(format!("Columns: {}", column_names(&data.combined).join(", ")));
    if let Some(key) = &data.join_key {
        info.push(format!("Join column: {}", key));
    }

    info.join("\n")
}

fn describe_types(df: &DataFrame) -> String {
    let types: Vec<String> = df
        .get_columns()
        .iter()
        .map(|c| format!("{}: {}", c.name(), c.dtype()))
        .collect();
    format!("{{{}}}", types.join(", "))
}

/// 基础统计文本 (写入提示词)
pub fn basic_stats_text(data: &InvoiceData) -> String {
    let mut lines = Vec::new();

    for (title, df) in [("HEADER STATISTICS", &data.header), ("ITEMS STATISTICS", &data.items)] {
        let stats = table_stats(df);
        lines.push(format!("{}:", title));
        lines.push(format!("- Total records: {}", stats.row_count));
        for col in &stats.numeric {
            lines.push(format!(
                "- {}: mean={:.2}, min={:.2}, max={:.2}",
                col.name, col.mean, col.min, col.max
            ));
        }
        for col in &stats.categorical {
            lines.push(format!("- {}: {} unique values", col.name, col.distinct));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// 数据预览：每张表前 3 行
pub fn data_sample(data: &InvoiceData) -> String {
    let mut samples = Vec::new();

    for (title, df) in [("HEADER SAMPLE", &data.header), ("ITEMS SAMPLE", &data.items)] {
        samples.push(format!("{} (first {} rows):", title, PREVIEW_ROWS));
        samples.push(preview(df, PREVIEW_ROWS));
        samples.push(String::new());
    }

    samples.join("\n")
}

/// 概要：记录数、列清单，以及存在相应列时的总金额、供应商数、开票期间
pub fn data_summary(data: &InvoiceData) -> DataSummary {
    let header = &data.header;
    let mut summary = DataSummary {
        header_records: header.height(),
        item_records: data.items.height(),
        header_columns: column_names(header).iter().map(|c| c.to_string()).collect(),
        item_columns: column_names(&data.items).iter().map(|c| c.to_string()).collect(),
        total_value: None,
        mean_value: None,
        distinct_suppliers: None,
        period: None,
    };

    if let Some(series) = find_column(header, &TOTAL_VALUE_COLUMNS) {
        if is_numeric(series.dtype()) {
            match decimal_sum(series) {
                Ok(total) => summary.total_value = Some(total),
                Err(e) => tracing::warn!("Total value skipped: {}", e),
            }
            summary.mean_value = series.mean();
        }
    }

    if let Some(series) = find_column(header, &SUPPLIER_COLUMNS) {
        summary.distinct_suppliers = series.drop_nulls().n_unique().ok();
    }

    if let Some(series) = find_column(header, &ISSUE_DATE_COLUMNS) {
        summary.period = value_range(series).map(|(start, end)| Period { start, end });
    }

    summary
}

fn find_column<'a>(df: &'a DataFrame, candidates: &[&str]) -> Option<&'a Series> {
    candidates
        .iter()
        .find_map(|name| df.column(name).ok())
        .map(|c| c.as_materialized_series())
}

/// 精确求和，避免浮点累加误差
fn decimal_sum(series: &Series) -> PolarsResult<BigDecimal> {
    let text = series.cast(&DataType::String)?;
    let mut total = BigDecimal::from(0);
    for value in text.str()?.into_iter().flatten() {
        match BigDecimal::from_str(value) {
            Ok(v) => total += v,
            Err(e) => tracing::debug!("Skipping value {} in total: {}", value, e),
        }
    }
    Ok(total)
}

/// 金额格式：千分位逗号，两位小数
pub fn format_currency(value: &BigDecimal) -> String {
    let text = value.with_scale(2).to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{}", sign, grouped, fraction)
}
