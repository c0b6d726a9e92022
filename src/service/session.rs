use crate::error::SessionError;
use crate::llm::{is_supported_model, DEFAULT_MODEL};
use crate::models::InvoiceData;
use dashmap::mapref::one::{Ref, RefMut};
use dashmap::DashMap;
use uuid::Uuid;

/// 单个用户会话：API key、所选模型、已加载数据
#[derive(Clone)]
pub struct Session {
    pub api_key: String,
    pub model: String,
    pub data: Option<InvoiceData>,
}

/// 内存会话存储，进程退出即丢弃
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Session>,
}

fn validate(api_key: &str, model: Option<&str>) -> Result<String, SessionError> {
    if api_key.trim().is_empty() {
        return Err(SessionError::MissingApiKey);
    }
    let model = model.unwrap_or(DEFAULT_MODEL);
    if !is_supported_model(model) {
        return Err(SessionError::UnknownModel(model.to_string()));
    }
    Ok(model.to_string())
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, api_key: &str, model: Option<&str>) -> Result<Uuid, SessionError> {
        let model = validate(api_key, model)?;
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            Session {
                api_key: api_key.trim().to_string(),
                model,
                data: None,
            },
        );
        tracing::info!("Session {} created", id);
        Ok(id)
    }

    /// 更新设置；API key 变化时清空已加载数据。返回是否清空
    pub fn update_settings(
        &self,
        id: Uuid,
        api_key: &str,
        model: Option<&str>,
    ) -> Result<bool, SessionError> {
        let model = validate(api_key, model)?;
        let mut session = self.get_mut(id)?;

        let api_key = api_key.trim();
        let reset = session.api_key != api_key;
        if reset {
            session.api_key = api_key.to_string();
            session.data = None;
            tracing::info!("Session {}: API key changed, data cleared", id);
        }
        session.model = model;
        Ok(reset)
    }

    pub fn get(&self, id: Uuid) -> Result<Ref<'_, Uuid, Session>, SessionError> {
        self.sessions.get(&id).ok_or(SessionError::NotFound(id))
    }

    pub fn get_mut(&self, id: Uuid) -> Result<RefMut<'_, Uuid, Session>, SessionError> {
        self.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))
    }

    pub fn set_data(&self, id: Uuid, data: InvoiceData) -> Result<(), SessionError> {
        self.get_mut(id)?.data = Some(data);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
