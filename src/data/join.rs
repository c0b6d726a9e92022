use super::frame::{column_names, is_numeric};
use polars::prelude::*;
use std::collections::BTreeSet;

/// 连接前记录明细行序，连接后按它恢复顺序
const ROW_ORDER: &str = "__row_order";

/// 合并视图及其连接列
#[derive(Debug, Clone)]
pub struct CombinedView {
    pub join_key: Option<String>,
    pub frame: DataFrame,
}

/// 选择连接列：两表共有的列名中字典序最小的一个
pub fn select_join_key(header_columns: &[&str], items_columns: &[&str]) -> Option<String> {
    let header: BTreeSet<&str> = header_columns.iter().copied().collect();
    items_columns
        .iter()
        .copied()
        .filter(|c| header.contains(c))
        .min()
        .map(str::to_string)
}

/// 明细左连接表头。没有共有列或连接失败时退化为表头副本
pub fn combine(header: &DataFrame, items: &DataFrame) -> CombinedView {
    let Some(key) = select_join_key(&column_names(header), &column_names(items)) else {
        tracing::warn!("No shared column between header and items, using header table alone");
        return CombinedView {
            join_key: None,
            frame: header.clone(),
        };
    };

    match left_join(header, items, &key) {
        Ok(frame) => {
            tracing::info!("Joined tables on column {}: {} rows", key, frame.height());
            CombinedView {
                join_key: Some(key),
                frame,
            }
        }
        Err(e) => {
            tracing::warn!("Join on {} failed ({}), using header table alone", key, e);
            CombinedView {
                join_key: None,
                frame: header.clone(),
            }
        }
    }
}

/// 每条明细输出一行，附带第一条键值相同的表头行；空值不匹配。
/// 列顺序：表头各列，然后明细的非键列；同名非键列加 _header / _item 后缀
fn left_join(header: &DataFrame, items: &DataFrame, key: &str) -> PolarsResult<DataFrame> {
    let mut header = header
        .clone()
        .lazy()
        .unique_stable_generic(Some(vec![key]), UniqueKeepStrategy::First)
        .collect()?;
    let mut items = items.clone();
    align_key_types(&mut header, &mut items, key)?;

    let shared: Vec<String> = column_names(&header)
        .into_iter()
        .filter(|n| *n != key && items.get_column_index(n).is_some())
        .map(str::to_string)
        .collect();
    for name in &shared {
        header.rename(name, format!("{}_header", name).into())?;
        items.rename(name, format!("{}_item", name).into())?;
    }

    let mut order: Vec<Expr> = column_names(&header).into_iter().map(|n| col(n)).collect();
    order.extend(
        column_names(&items)
            .into_iter()
            .filter(|n| *n != key)
            .map(|n| col(n)),
    );

    items
        .lazy()
        .with_row_index(ROW_ORDER, None)
        .join(
            header.lazy(),
            [col(key)],
            [col(key)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([ROW_ORDER], SortMultipleOptions::default())
        .select(order)
        .collect()
}

/// 键列类型不同时统一：数值对数值转 f64，其余转文本
fn align_key_types(header: &mut DataFrame, items: &mut DataFrame, key: &str) -> PolarsResult<()> {
    let header_type = header.column(key)?.dtype().clone();
    let items_type = items.column(key)?.dtype().clone();
    if header_type == items_type {
        return Ok(());
    }

    let target = if is_numeric(&header_type) && is_numeric(&items_type) {
        DataType::Float64
    } else {
        DataType::String
    };
    tracing::debug!(
        "Join column {} is {} in header and {} in items, casting both to {}",
        key,
        header_type,
        items_type,
        target
    );

    let casted = header.column(key)?.cast(&target)?;
    header.with_column(casted)?;
    let casted = items.column(key)?.cast(&target)?;
    items.with_column(casted)?;
    Ok(())
}
