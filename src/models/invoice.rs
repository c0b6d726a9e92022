use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// 上传的文件 (文件名 + 原始字节)
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_csv(&self) -> bool {
        self.name.to_lowercase().ends_with(".csv")
    }
}

/// 文件角色：表头 (一张发票一行) 或明细 (一个商品行一行)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Header,
    Items,
}

/// 单个文件的分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDecision {
    /// 按文件名识别
    Named(FileRole),
    /// 无法识别，按顺序补位
    Positional(FileRole),
    Ignored,
}

/// 一组文件的角色分配 (文件下标)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAssignment {
    pub header: Option<usize>,
    pub items: Option<usize>,
    pub decisions: Vec<RoleDecision>,
}

/// 加载完成的发票数据：表头、明细、合并视图
#[derive(Debug, Clone)]
pub struct InvoiceData {
    pub header: DataFrame,
    pub items: DataFrame,
    pub combined: DataFrame,
    pub join_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// 提示横幅
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, text: text.into() }
    }
}
