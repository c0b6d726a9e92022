use crate::error::LoadError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use std::io::Cursor;

/// 可识别的日期时间格式
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];
/// 可识别的纯日期格式
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// 读取时视为空值的缺失标记
pub const NULL_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// 解析 UTF-8 逗号分隔文本 (首行为列名)，推断列类型并尝试转换日期列
pub fn read_csv(file_name: &str, bytes: &[u8]) -> Result<DataFrame, LoadError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(LoadError::MissingHeaderRow {
            file: file_name.to_string(),
        });
    }

    let csv_err = |source: PolarsError| LoadError::Csv {
        file: file_name.to_string(),
        source,
    };

    let null_values = NullValues::AllColumns(NULL_MARKERS.iter().map(|m| (*m).into()).collect());
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_null_values(Some(null_values)))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(csv_err)?;

    coerce_date_columns(&mut df).map_err(csv_err)?;
    tracing::debug!(
        "Parsed {}: {} rows, {} columns",
        file_name,
        df.height(),
        df.width()
    );
    Ok(df)
}

/// 列名包含 data / date 视为日期列
pub fn is_date_like_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("data") || lower.contains("date")
}

pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// 日期列转换：所有非空值都能解析才转换，否则保持原样。
/// 全部为零点时转为 date 列，否则为 datetime 列
pub fn coerce_date_columns(df: &mut DataFrame) -> PolarsResult<()> {
    let candidates: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::String && is_date_like_name(c.name().as_str()))
        .map(|c| c.name().clone())
        .collect();

    for name in candidates {
        let values = df.column(name.as_str())?.as_materialized_series().str()?;

        let mut parsed: Vec<Option<NaiveDateTime>> = Vec::with_capacity(values.len());
        let mut complete = true;
        for value in values.into_iter() {
            match value {
                None => parsed.push(None),
                Some(text) => match parse_date(text) {
                    Some(date) => parsed.push(Some(date)),
                    None => {
                        complete = false;
                        break;
                    }
                },
            }
        }

        if !complete || parsed.iter().all(Option::is_none) {
            tracing::debug!("Column {} kept as text", name);
            continue;
        }

        let series = if parsed.iter().flatten().all(|d| d.time() == NaiveTime::MIN) {
            let dates: Vec<Option<NaiveDate>> = parsed.iter().map(|d| d.map(|d| d.date())).collect();
            Series::new(name.clone(), dates)
        } else {
            Series::new(name.clone(), parsed)
        };
        df.with_column(series)?;
    }

    Ok(())
}
