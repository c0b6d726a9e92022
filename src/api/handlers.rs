use super::AppState;
use crate::error::SessionError;
use crate::llm::{AVAILABLE_MODELS, DEFAULT_MODEL};
use crate::models::{DataSummary, Notice, UploadedFile};
use crate::service::query::{error_text, FINANCIAL_EXAMPLES, OPERATIONAL_EXAMPLES};
use crate::service::stats::format_currency;
use crate::service::{create_sample_data, data_summary, load_csv_files, QueryService};
use axum::{
    extract::{Json, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 请求体: 创建会话
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub api_key: String,
    pub model: Option<String>,
}

/// 请求体: 更新会话设置
#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    #[serde(default)]
    pub api_key: String,
    pub model: Option<String>,
}

/// 请求体: 提问
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub question: String,
}

/// 通用响应体
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    pub notices: Vec<Notice>,
    pub session_id: Option<Uuid>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<&'static str>,
    pub default: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ExamplesResponse {
    pub financial: Vec<&'static str>,
    pub operational: Vec<&'static str>,
}

/// 指标面板
#[derive(Debug, Serialize)]
pub struct Metrics {
    pub header_records: usize,
    pub item_records: usize,
    pub suppliers: String,
    pub total_value: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    pub message: String,
    pub notices: Vec<Notice>,
    pub metrics: Option<Metrics>,
    pub summary: Option<DataSummary>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub message: String,
    pub notices: Vec<Notice>,
    pub model: Option<String>,
    pub answer: Option<String>,
}

fn message(status: StatusCode, success: bool, text: String, notices: Vec<Notice>) -> Response {
    let response = MessageResponse {
        success,
        message: text,
        notices,
    };
    (status, Json(response)).into_response()
}

fn session_error(err: SessionError) -> Response {
    let status = match err {
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::MissingApiKey | SessionError::UnknownModel(_) => StatusCode::BAD_REQUEST,
    };
    let text = err.to_string();
    let notice = match err {
        SessionError::MissingApiKey => Notice::warning(text.clone()),
        _ => Notice::error(text.clone()),
    };
    message(status, false, text, vec![notice])
}

fn metrics(summary: &DataSummary) -> Metrics {
    let total_value = match &summary.total_value {
        Some(total) if *total > BigDecimal::zero() => format!("R$ {}", format_currency(total)),
        _ => "N/A".to_string(),
    };
    Metrics {
        header_records: summary.header_records,
        item_records: summary.item_records,
        suppliers: summary
            .distinct_suppliers
            .map(|n| n.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        total_value,
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 可选模型列表
pub async fn list_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: AVAILABLE_MODELS.to_vec(),
        default: DEFAULT_MODEL,
    })
}

/// 示例问题
pub async fn example_questions() -> Json<ExamplesResponse> {
    Json(ExamplesResponse {
        financial: FINANCIAL_EXAMPLES.to_vec(),
        operational: OPERATIONAL_EXAMPLES.to_vec(),
    })
}

/// 创建会话 (需要 API key)
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Response {
    match state.sessions.create(&req.api_key, req.model.as_deref()) {
        Ok(id) => {
            let model = state.sessions.get(id).ok().map(|s| s.model.clone());
            let response = SessionResponse {
                success: true,
                message: "Session created".to_string(),
                notices: vec![Notice::info(
                    "Upload the CSV files or load the sample data to start.",
                )],
                session_id: Some(id),
                model,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => session_error(e),
    }
}

/// 更新 API key / 模型
pub async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SettingsRequest>,
) -> Response {
    match state.sessions.update_settings(id, &req.api_key, req.model.as_deref()) {
        Ok(reset) => {
            let mut notices = Vec::new();
            if reset {
                notices.push(Notice::info("API key changed, loaded data was cleared."));
            }
            let model = state.sessions.get(id).ok().map(|s| s.model.clone());
            let response = SessionResponse {
                success: true,
                message: "Settings updated".to_string(),
                notices,
                session_id: Some(id),
                model,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => session_error(e),
    }
}

/// 上传 CSV 文件 (multipart)
pub async fn upload_files(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    if let Err(e) = state.sessions.get(id).map(|_| ()) {
        return session_error(e);
    }

    let mut files = Vec::new();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field
                    .file_name()
                    .or_else(|| field.name())
                    .unwrap_or_default()
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => files.push(UploadedFile::new(name, bytes.to_vec())),
                    Err(e) => {
                        let text = format!("Invalid upload: {}", e);
                        return message(StatusCode::BAD_REQUEST, false, text.clone(), vec![Notice::error(text)]);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                let text = format!("Invalid upload: {}", e);
                return message(StatusCode::BAD_REQUEST, false, text.clone(), vec![Notice::error(text)]);
            }
        }
    }

    if files.is_empty() {
        let text = "Upload the CSV files or load the sample data.".to_string();
        return message(StatusCode::BAD_REQUEST, false, text.clone(), vec![Notice::info(text)]);
    }

    tracing::info!("Session {}: {} file(s) uploaded", id, files.len());
    let outcome = load_csv_files(&files);
    let success = outcome.is_success();
    if let Some(data) = outcome.data {
        if let Err(e) = state.sessions.set_data(id, data) {
            return session_error(e);
        }
    }

    message(StatusCode::OK, success, outcome.message, outcome.notices)
}

/// 加载示例数据
pub async fn load_sample(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let data = match create_sample_data() {
        Ok(data) => data,
        Err(e) => {
            tracing::error!("Sample data failed: {}", e);
            let text = format!("Error creating sample data: {}", e);
            return message(
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                text.clone(),
                vec![Notice::error(text)],
            );
        }
    };

    match state.sessions.set_data(id, data) {
        Ok(()) => {
            let text = "Sample data created successfully!".to_string();
            message(StatusCode::OK, true, text.clone(), vec![Notice::success(text)])
        }
        Err(e) => session_error(e),
    }
}

/// 数据概要：指标面板 + 列清单
pub async fn summary(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let session = match state.sessions.get(id) {
        Ok(session) => session,
        Err(e) => return session_error(e),
    };

    let response = match &session.data {
        Some(data) => {
            let summary = data_summary(data);
            SummaryResponse {
                success: true,
                message: "Data summary".to_string(),
                notices: Vec::new(),
                metrics: Some(metrics(&summary)),
                summary: Some(summary),
            }
        }
        None => SummaryResponse {
            success: false,
            message: "No data loaded".to_string(),
            notices: vec![Notice::info("Upload the CSV files or load the sample data.")],
            metrics: None,
            summary: None,
        },
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 提问：组装提示词后调用模型
pub async fn query(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<QueryRequest>,
) -> Response {
    if req.question.trim().is_empty() {
        let text = "Please type a question.".to_string();
        return message(StatusCode::BAD_REQUEST, false, text.clone(), vec![Notice::warning(text)]);
    }

    // 会话引用不能跨 await 持有
    let request = {
        let session = match state.sessions.get(id) {
            Ok(session) => session,
            Err(e) => return session_error(e),
        };
        QueryService::build_request(session.data.as_ref(), &req.question, &session.api_key, &session.model)
    };

    let request = match request {
        Ok(request) => request,
        Err(e) => {
            tracing::info!("Session {}: question refused ({})", id, e);
            let text = "Load the data first.".to_string();
            return message(StatusCode::BAD_REQUEST, false, text.clone(), vec![Notice::error(text)]);
        }
    };

    let model = Some(request.model.clone());
    let response = match state.query.answer(&request).await {
        Ok(answer) => QueryResponse {
            success: true,
            message: "Analysis completed".to_string(),
            notices: Vec::new(),
            model,
            answer: Some(answer),
        },
        Err(e) => {
            let text = error_text(&e);
            QueryResponse {
                success: false,
                message: text.clone(),
                notices: vec![Notice::error(text.clone())],
                model,
                answer: Some(text),
            }
        }
    };
    (StatusCode::OK, Json(response)).into_response()
}
