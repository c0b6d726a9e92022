pub mod csv_reader;
pub mod frame;
pub mod join;

pub use csv_reader::{coerce_date_columns, is_date_like_name, parse_date, read_csv};
pub use frame::{column_names, is_numeric, preview, value_range};
pub use join::{combine, select_join_key, CombinedView};
