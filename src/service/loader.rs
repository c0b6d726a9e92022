use crate::data::{combine, read_csv};
use crate::error::LoadError;
use crate::models::{FileRole, InvoiceData, Notice, RoleAssignment, RoleDecision, UploadedFile};
use polars::prelude::DataFrame;

const HEADER_MARKERS: [&str; 3] = ["cabecalho", "header", "nf"];
const ITEMS_MARKERS: [&str; 3] = ["itens", "items", "produtos"];

/// 加载结果：成功时带数据，失败时 message 为面向用户的错误信息
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub data: Option<InvoiceData>,
    pub notices: Vec<Notice>,
    pub message: String,
}

impl LoadOutcome {
    pub fn is_success(&self) -> bool {
        self.data.is_some()
    }
}

/// 按文件名识别角色；表头关键字优先
pub fn classify_file_name(name: &str) -> Option<FileRole> {
    let lower = name.to_lowercase();
    if HEADER_MARKERS.iter().any(|m| lower.contains(m)) {
        Some(FileRole::Header)
    } else if ITEMS_MARKERS.iter().any(|m| lower.contains(m)) {
        Some(FileRole::Items)
    } else {
        None
    }
}

/// 为一组文件分配角色。
///
/// 按顺序处理：能识别的文件直接占位 (后出现的同角色文件覆盖前者)，
/// 无法识别的文件先补表头、再补明细，两者都已占用则忽略。
pub fn assign_roles<S: AsRef<str>>(names: &[S]) -> RoleAssignment {
    let mut assignment = RoleAssignment::default();

    for (idx, name) in names.iter().enumerate() {
        let decision = match classify_file_name(name.as_ref()) {
            Some(FileRole::Header) => {
                assignment.header = Some(idx);
                RoleDecision::Named(FileRole::Header)
            }
            Some(FileRole::Items) => {
                assignment.items = Some(idx);
                RoleDecision::Named(FileRole::Items)
            }
            None if assignment.header.is_none() => {
                assignment.header = Some(idx);
                RoleDecision::Positional(FileRole::Header)
            }
            None if assignment.items.is_none() => {
                assignment.items = Some(idx);
                RoleDecision::Positional(FileRole::Items)
            }
            None => RoleDecision::Ignored,
        };
        assignment.decisions.push(decision);
    }

    assignment
}

/// 加载上传的 CSV 文件；所有错误在此收敛为用户提示
pub fn load_csv_files(files: &[UploadedFile]) -> LoadOutcome {
    let mut notices = Vec::new();

    match try_load(files, &mut notices) {
        Ok(data) => {
            tracing::info!(
                "Loaded {} header rows, {} item rows, {} combined rows",
                data.header.height(),
                data.items.height(),
                data.combined.height()
            );
            LoadOutcome {
                data: Some(data),
                notices,
                message: "Data loaded successfully".to_string(),
            }
        }
        Err(LoadError::Incomplete) => {
            let message = LoadError::Incomplete.to_string();
            tracing::warn!("{}", message);
            notices.push(Notice::error(message.clone()));
            LoadOutcome {
                data: None,
                notices,
                message,
            }
        }
        Err(e) => {
            let message = format!("Error loading CSV files: {}", e);
            tracing::error!("{}", message);
            notices.push(Notice::error(message.clone()));
            LoadOutcome {
                data: None,
                notices,
                message,
            }
        }
    }
}

fn try_load(files: &[UploadedFile], notices: &mut Vec<Notice>) -> Result<InvoiceData, LoadError> {
    let csv_files: Vec<&UploadedFile> = files.iter().filter(|f| f.is_csv()).collect();
    for skipped in files.iter().filter(|f| !f.is_csv()) {
        tracing::info!("Skipping non-CSV file {}", skipped.name);
    }

    let mut tables: Vec<Option<DataFrame>> = Vec::with_capacity(csv_files.len());
    for file in &csv_files {
        tables.push(Some(read_csv(&file.name, &file.bytes)?));
    }

    let names: Vec<&str> = csv_files.iter().map(|f| f.name.as_str()).collect();
    let assignment = assign_roles(&names);
    for (name, decision) in names.iter().zip(&assignment.decisions) {
        match decision {
            RoleDecision::Named(FileRole::Header) => {
                notices.push(Notice::success(format!("Header file loaded: {}", name)))
            }
            RoleDecision::Named(FileRole::Items) => {
                notices.push(Notice::success(format!("Items file loaded: {}", name)))
            }
            RoleDecision::Positional(FileRole::Header) => {
                notices.push(Notice::info(format!("Assuming header file: {}", name)))
            }
            RoleDecision::Positional(FileRole::Items) => {
                notices.push(Notice::info(format!("Assuming items file: {}", name)))
            }
            RoleDecision::Ignored => tracing::info!("File {} not used", name),
        }
    }

    let header = assignment.header.and_then(|i| tables[i].take());
    let mut items = assignment.items.and_then(|i| tables[i].take());

    if csv_files.len() == 1 && items.is_none() {
        if let Some(header) = &header {
            items = Some(header.clone());
            notices.push(Notice::info("Using the same file for header and items"));
        }
    }

    let (Some(header), Some(items)) = (header, items) else {
        return Err(LoadError::Incomplete);
    };

    let view = combine(&header, &items);
    match &view.join_key {
        Some(key) => notices.push(Notice::info(format!("Joining tables on column: {}", key))),
        None => notices.push(Notice::warning(
            "No shared column found, using the header table as the combined view",
        )),
    }

    Ok(InvoiceData {
        header,
        items,
        combined: view.frame,
        join_key: view.join_key,
    })
}
