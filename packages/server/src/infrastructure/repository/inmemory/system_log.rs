//! InMemory SystemLog Repository 実装

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{NewSystemLog, RepositoryError, SystemLog, SystemLogRepository, UserId};

/// 追記専用の監査ログ
#[derive(Default)]
pub struct InMemorySystemLogRepository {
    logs: Mutex<Vec<SystemLog>>,
}

impl InMemorySystemLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SystemLogRepository for InMemorySystemLogRepository {
    async fn append(&self, entry: NewSystemLog) -> Result<SystemLog, RepositoryError> {
        let mut logs = self.logs.lock().await;
        let log = SystemLog {
            id: logs.len() as i64 + 1,
            method: entry.method,
            endpoint: entry.endpoint,
            user_id: entry.user_id,
            status_code: entry.status_code,
            message: entry.message,
            timestamp: entry.timestamp,
        };
        logs.push(log.clone());
        Ok(log)
    }

    async fn list_logs(&self) -> Result<Vec<SystemLog>, RepositoryError> {
        // newest first
        let logs = self.logs.lock().await;
        Ok(logs.iter().rev().cloned().collect())
    }

    async fn list_logs_by_user(&self, user_id: UserId) -> Result<Vec<SystemLog>, RepositoryError> {
        let logs = self.logs.lock().await;
        Ok(logs
            .iter()
            .rev()
            .filter(|log| log.user_id == Some(user_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomcast_shared::time::millis_to_datetime;

    fn entry(endpoint: &str, user_id: Option<i64>, at: i64) -> NewSystemLog {
        NewSystemLog {
            method: "GET".to_string(),
            endpoint: endpoint.to_string(),
            user_id: user_id.map(|id| UserId::new(id).unwrap()),
            status_code: 200,
            message: "OK".to_string(),
            timestamp: millis_to_datetime(at),
        }
    }

    #[tokio::test]
    async fn test_list_logs_newest_first() {
        // テスト項目: ログは新しい順に返される
        // given (前提条件):
        let repository = InMemorySystemLogRepository::new();
        repository.append(entry("/a", None, 1_000)).await.unwrap();
        repository.append(entry("/b", None, 2_000)).await.unwrap();

        // when (操作):
        let logs = repository.list_logs().await.unwrap();

        // then (期待する結果):
        let endpoints: Vec<_> = logs.iter().map(|l| l.endpoint.as_str()).collect();
        assert_eq!(endpoints, vec!["/b", "/a"]);
        assert_eq!(logs[0].id, 2);
    }

    #[tokio::test]
    async fn test_list_logs_by_user_filters() {
        // テスト項目: ユーザー ID でログを絞り込める
        // given (前提条件):
        let repository = InMemorySystemLogRepository::new();
        repository.append(entry("/a", Some(1), 1_000)).await.unwrap();
        repository.append(entry("/b", Some(2), 2_000)).await.unwrap();
        repository.append(entry("/c", None, 3_000)).await.unwrap();

        // when (操作):
        let logs = repository
            .list_logs_by_user(UserId::new(1).unwrap())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].endpoint, "/a");
    }
}
