use crate::data::combine;
use crate::error::LoadError;
use crate::models::InvoiceData;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

/// 示例数据固定种子
pub const SAMPLE_SEED: u64 = 42;
pub const SAMPLE_INVOICES: usize = 100;

const SUPPLIERS: [&str; 5] = [
    "Empresa Alpha Ltda",
    "Beta Soluções SA",
    "Gamma Tech Corp",
    "Delta Serviços",
    "Epsilon Materiais",
];
const STATUSES: [&str; 3] = ["Pago", "Pendente", "Cancelado"];
/// 状态权重 (十分位)：70% / 20% / 10%
const STATUS_WEIGHTS: [u32; 3] = [7, 2, 1];
const CATEGORIES: [&str; 5] = [
    "Material de Escritório",
    "Equipamentos de TI",
    "Serviços de Consultoria",
    "Material de Limpeza",
    "Manutenção",
];
const PRODUCTS: [&str; 7] = [
    "Notebook Dell",
    "Impressora HP",
    "Mouse Óptico",
    "Teclado Mecânico",
    "Monitor 24\"",
    "Papel A4",
    "Caneta Esferográfica",
];
const UNITS: [&str; 5] = ["UN", "PC", "KG", "CX", "LT"];

/// 生成演示数据 (固定种子)
pub fn create_sample_data() -> Result<InvoiceData, LoadError> {
    generate_sample_data(SAMPLE_SEED)
}

/// 生成 100 张发票表头及 1~5 条关联明细
pub fn generate_sample_data(seed: u64) -> Result<InvoiceData, LoadError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();

    let mut numbers = Vec::with_capacity(SAMPLE_INVOICES);
    let mut suppliers = Vec::with_capacity(SAMPLE_INVOICES);
    let mut issue_dates = Vec::with_capacity(SAMPLE_INVOICES);
    let mut totals = Vec::with_capacity(SAMPLE_INVOICES);
    let mut statuses = Vec::with_capacity(SAMPLE_INVOICES);
    let mut categories = Vec::with_capacity(SAMPLE_INVOICES);

    for i in 0..SAMPLE_INVOICES {
        numbers.push(invoice_number(i + 1));
        suppliers.push(SUPPLIERS.choose(&mut rng).copied().unwrap_or_default());
        issue_dates.push(start + Duration::days(i as i64));
        totals.push(round_cents(rng.gen_range(1000.0..50000.0)));
        statuses.push(pick_status(&mut rng));
        categories.push(CATEGORIES.choose(&mut rng).copied().unwrap_or_default());
    }

    let mut item_numbers = Vec::new();
    let mut item_seq: Vec<i64> = Vec::new();
    let mut descriptions = Vec::new();
    let mut quantities: Vec<i64> = Vec::new();
    let mut unit_prices = Vec::new();
    let mut line_totals = Vec::new();
    let mut units = Vec::new();

    for i in 0..SAMPLE_INVOICES {
        let count = rng.gen_range(1..=5);
        for seq in 1..=count {
            let quantity: i64 = rng.gen_range(1..50);
            let unit_price = cents(rng.gen_range(10.0..2000.0));
            let line_total = (BigDecimal::from(quantity) * &unit_price).with_scale(2);

            item_numbers.push(invoice_number(i + 1));
            item_seq.push(seq);
            descriptions.push(PRODUCTS.choose(&mut rng).copied().unwrap_or_default());
            quantities.push(quantity);
            unit_prices.push(unit_price.to_f64().unwrap_or_default());
            line_totals.push(line_total.to_f64().unwrap_or_default());
            units.push(UNITS.choose(&mut rng).copied().unwrap_or_default());
        }
    }

    let header = df!(
        "numero_nf" => numbers,
        "fornecedor" => suppliers,
        "data_emissao" => issue_dates,
        "valor_total" => totals,
        "status" => statuses,
        "categoria" => categories,
    )?;
    let items = df!(
        "numero_nf" => item_numbers,
        "item_numero" => item_seq,
        "descricao" => descriptions,
        "quantidade" => quantities,
        "valor_unitario" => unit_prices,
        "valor_total_item" => line_totals,
        "unidade" => units,
    )?;

    let view = combine(&header, &items);
    tracing::info!(
        "Sample data created: {} invoices, {} items",
        header.height(),
        items.height()
    );

    Ok(InvoiceData {
        header,
        items,
        combined: view.frame,
        join_key: view.join_key,
    })
}

fn pick_status(rng: &mut StdRng) -> &'static str {
    let mut roll = rng.gen_range(0..STATUS_WEIGHTS.iter().sum::<u32>());
    for (status, weight) in STATUSES.iter().zip(STATUS_WEIGHTS) {
        if roll < weight {
            return *status;
        }
        roll -= weight;
    }
    STATUSES[0]
}

fn invoice_number(n: usize) -> String {
    format!("NF{:06}", n)
}

/// 保留两位小数
fn cents(value: f64) -> BigDecimal {
    BigDecimal::new(((value * 100.0).round() as i64).into(), 2)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .unwrap()
            .cast(&DataType::Float64)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    fn distinct(df: &DataFrame, name: &str) -> usize {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .drop_nulls()
            .n_unique()
            .unwrap()
    }

    #[test]
    fn test_sample_is_deterministic() {
        let a = create_sample_data().unwrap();
        let b = create_sample_data().unwrap();

        assert_eq!(a.header.height(), SAMPLE_INVOICES);
        assert!(a.header.equals_missing(&b.header));
        assert!(a.items.equals_missing(&b.items));
        assert_eq!(
            floats(&a.header, "valor_total").iter().sum::<f64>(),
            floats(&b.header, "valor_total").iter().sum::<f64>()
        );

        let first = a
            .header
            .column("numero_nf")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .get(0)
            .map(str::to_string);
        assert_eq!(first.as_deref(), Some("NF000001"));
    }

    #[test]
    fn test_other_seed_differs() {
        let a = create_sample_data().unwrap();
        let b = generate_sample_data(SAMPLE_SEED + 1).unwrap();
        assert!(!a.header.equals_missing(&b.header));
    }

    #[test]
    fn test_sample_items_reference_headers() {
        let data = create_sample_data().unwrap();
        let items = data.items.height();

        assert!(items >= SAMPLE_INVOICES && items <= SAMPLE_INVOICES * 5);
        assert_eq!(data.combined.height(), items);
        assert_eq!(data.join_key.as_deref(), Some("numero_nf"));
        assert_eq!(
            distinct(&data.combined, "fornecedor"),
            distinct(&data.header, "fornecedor")
        );
        assert_eq!(data.combined.column("fornecedor").unwrap().null_count(), 0);
    }

    #[test]
    fn test_sample_value_ranges() {
        let data = create_sample_data().unwrap();
        let totals = floats(&data.header, "valor_total");
        assert!(totals.iter().all(|v| (1000.0..=50000.0).contains(v)));

        let qty = floats(&data.items, "quantidade");
        assert!(qty.iter().all(|v| (1.0..50.0).contains(v)));

        let dates = data.header.column("data_emissao").unwrap();
        assert_eq!(dates.dtype(), &DataType::Date);
        let last = dates
            .as_materialized_series()
            .date()
            .unwrap()
            .as_date_iter()
            .nth(99)
            .flatten();
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 4, 9));
    }

    #[test]
    fn test_line_total_is_quantity_times_price() {
        let data = create_sample_data().unwrap();
        let qty = floats(&data.items, "quantidade");
        let price = floats(&data.items, "valor_unitario");
        let total = floats(&data.items, "valor_total_item");

        for ((q, p), t) in qty.iter().zip(&price).zip(&total) {
            assert!((q * p - t).abs() < 0.005);
        }
    }
}
