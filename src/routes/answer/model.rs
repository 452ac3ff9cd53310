use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{Document, EntityStore};

/// 问答题作答，同一用户对同一题可多次提交
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaAnswer {
    pub user_id: String,
    pub article_id: String,
    pub task_id: String,
    #[serde(default)]
    pub task_type: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Document for QaAnswer {
    const COLLECTION: &'static str = "MRCAnswer";
}

/// 情感题作答：用户选中的属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentiAnswer {
    pub user_id: String,
    pub article_id: String,
    pub task_id: String,
    #[serde(default)]
    pub task_type: String,
    #[serde(default)]
    pub aspects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Document for SentiAnswer {
    const COLLECTION: &'static str = "SentiAspect";
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCreated {
    pub answer_id: String,
}

trait AnswerRecord: Document {
    /// 统计作答时用到的字段，不能为空
    fn key(&self) -> Vec<(&'static str, &str)>;
    fn stamp(&mut self, at: DateTime<Utc>);
}

impl AnswerRecord for QaAnswer {
    fn key(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("userId", self.user_id.as_str()),
            ("articleId", self.article_id.as_str()),
            ("taskId", self.task_id.as_str()),
        ]
    }
    fn stamp(&mut self, at: DateTime<Utc>) {
        self.submitted_at = Some(at);
    }
}

impl AnswerRecord for SentiAnswer {
    fn key(&self) -> Vec<(&'static str, &str)> {
        vec![("userId", self.user_id.as_str()), ("taskId", self.task_id.as_str())]
    }
    fn stamp(&mut self, at: DateTime<Utc>) {
        self.submitted_at = Some(at);
    }
}

// 重复提交不去重，每次都新增一条记录
async fn record<A: AnswerRecord>(
    store: &impl EntityStore,
    mut answer: A,
) -> ServiceResult<AnswerCreated> {
    if let Some((field, _)) = answer.key().into_iter().find(|(_, v)| v.is_empty()) {
        return Err(ServiceError::InvalidInput(format!("{field} is required")));
    }
    answer.stamp(Utc::now());
    let answer_id = store.insert_one(&answer).await?;
    tracing::info!("Recorded {} answer {}", A::COLLECTION, answer_id);
    Ok(AnswerCreated { answer_id })
}

impl QaAnswer {
    pub async fn record(self, store: &impl EntityStore) -> ServiceResult<AnswerCreated> {
        record(store, self).await
    }
}

impl SentiAnswer {
    pub async fn record(self, store: &impl EntityStore) -> ServiceResult<AnswerCreated> {
        record(store, self).await
    }
}
