pub mod invoice;
pub mod summary;

pub use invoice::{
    FileRole, InvoiceData, Notice, NoticeLevel, RoleAssignment, RoleDecision, UploadedFile,
};
pub use summary::{CategoricalStats, DataSummary, NumericStats, Period, TableStats};
