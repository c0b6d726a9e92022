pub mod loader;
pub mod query;
pub mod sample;
pub mod session;
pub mod stats;

pub use loader::{assign_roles, classify_file_name, load_csv_files, LoadOutcome};
pub use query::QueryService;
pub use sample::create_sample_data;
pub use session::{Session, SessionStore};
pub use stats::{data_summary, table_stats};
