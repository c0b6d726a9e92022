use polars::prelude::*;

/// 预览中行号列的列名
const INDEX_COLUMN: &str = "index";

pub fn column_names(df: &DataFrame) -> Vec<&str> {
    df.get_column_names().into_iter().map(|n| n.as_str()).collect()
}

/// 整数或浮点列
pub fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_integer() || dtype.is_float()
}

/// 文本、日期列的最小/最大值 (显示文本)，其他类型或全空返回 None
pub fn value_range(series: &Series) -> Option<(String, String)> {
    match series.dtype() {
        DataType::Date => {
            let dates = series.date().ok()?;
            let start = dates.as_date_iter().flatten().min()?;
            let end = dates.as_date_iter().flatten().max()?;
            Some((start.to_string(), end.to_string()))
        }
        DataType::Datetime(_, _) => {
            let values = series.datetime().ok()?;
            let start = values.as_datetime_iter().flatten().min()?;
            let end = values.as_datetime_iter().flatten().max()?;
            Some((
                start.format("%Y-%m-%d %H:%M:%S").to_string(),
                end.format("%Y-%m-%d %H:%M:%S").to_string(),
            ))
        }
        DataType::String => {
            let values = series.str().ok()?;
            let start = values.into_iter().flatten().min()?;
            let end = values.into_iter().flatten().max()?;
            Some((start.to_string(), end.to_string()))
        }
        _ => None,
    }
}

/// 前 n 行的表格文本，首列为行号
pub fn preview(df: &DataFrame, rows: usize) -> String {
    let head = df.head(Some(rows));
    match head.with_row_index(INDEX_COLUMN.into(), None) {
        Ok(indexed) => indexed.to_string(),
        Err(e) => {
            tracing::debug!("Row index skipped in preview: {}", e);
            head.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_value_range_for_dates_and_text() {
        let df = df!(
            "data_emissao" => [
                NaiveDate::from_ymd_opt(2024, 3, 1),
                None,
                NaiveDate::from_ymd_opt(2024, 1, 15),
            ],
            "fornecedor" => [Some("Beta"), Some("Alpha"), None],
            "valor_total" => [1.0, 2.0, 3.0],
        )
        .unwrap();

        let range = |name: &str| value_range(df.column(name).unwrap().as_materialized_series());
        assert_eq!(
            range("data_emissao"),
            Some(("2024-01-15".to_string(), "2024-03-01".to_string()))
        );
        assert_eq!(range("fornecedor"), Some(("Alpha".to_string(), "Beta".to_string())));
        assert_eq!(range("valor_total"), None);
    }

    #[test]
    fn test_preview_is_limited_to_rows() {
        let df = df!("numero_nf" => ["NF1", "NF2", "NF3", "NF4"]).unwrap();
        let text = preview(&df, 3);

        assert!(text.contains("NF3"));
        assert!(!text.contains("NF4"));
        assert!(text.contains(INDEX_COLUMN));
    }
}
