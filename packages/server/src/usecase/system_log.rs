//! UseCase: リクエスト監査ログの記録と参照

use std::sync::Arc;

use roomcast_shared::time::Clock;

use crate::domain::{NewSystemLog, SystemLog, SystemLogRepository, UserId};

use super::error::SystemLogError;

/// One finished HTTP request
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub method: String,
    pub endpoint: String,
    pub user_id: Option<UserId>,
    pub status_code: u16,
    pub message: String,
}

pub struct RecordRequestUseCase {
    logs: Arc<dyn SystemLogRepository>,
    clock: Arc<dyn Clock>,
}

impl RecordRequestUseCase {
    pub fn new(logs: Arc<dyn SystemLogRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { logs, clock }
    }

    pub async fn execute(&self, record: RequestRecord) -> Result<SystemLog, SystemLogError> {
        Ok(self
            .logs
            .append(NewSystemLog {
                method: record.method,
                endpoint: record.endpoint,
                user_id: record.user_id,
                status_code: record.status_code,
                message: record.message,
                timestamp: self.clock.now(),
            })
            .await?)
    }
}

pub struct ListSystemLogsUseCase {
    logs: Arc<dyn SystemLogRepository>,
}

impl ListSystemLogsUseCase {
    pub fn new(logs: Arc<dyn SystemLogRepository>) -> Self {
        Self { logs }
    }

    /// Newest first; restricted to one user when `user_id` is given.
    pub async fn execute(&self, user_id: Option<UserId>) -> Result<Vec<SystemLog>, SystemLogError> {
        let logs = match user_id {
            Some(user_id) => self.logs.list_logs_by_user(user_id).await?,
            None => self.logs.list_logs().await?,
        };
        Ok(logs)
    }
}
