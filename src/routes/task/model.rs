use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::routes::answer::{QaAnswer, SentiAnswer};
use crate::routes::article::{Article, SentiArticle};
use crate::store::{Document, EntityStore, Filter};

pub const QA_TASK_TYPE: &str = "MRC";
pub const SENTI_TASK_TYPE: &str = "Senti";

/// 抽取式问答题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaTask {
    pub task_id: String,
    pub article_id: String,
    #[serde(default)]
    pub task_type: String,
    #[serde(default)]
    pub task_title: String,
    #[serde(default)]
    pub context: String,
}

impl Document for QaTask {
    const COLLECTION: &'static str = "MRCTask";
}

/// 情感/属性标注题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentiTask {
    pub task_id: String,
    pub article_id: String,
    #[serde(default)]
    pub task_type: String,
    #[serde(default)]
    pub task_title: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub aspect_pool: Vec<String>,
}

impl Document for SentiTask {
    const COLLECTION: &'static str = "SentiTask";
}

pub trait TaskRecord {
    fn task_id(&self) -> &str;
    fn task_title(&self) -> &str;
    fn context(&self) -> &str;
    fn aspect_pool(&self) -> Option<&[String]> {
        None
    }
}

impl TaskRecord for QaTask {
    fn task_id(&self) -> &str {
        &self.task_id
    }
    fn task_title(&self) -> &str {
        &self.task_title
    }
    fn context(&self) -> &str {
        &self.context
    }
}

impl TaskRecord for SentiTask {
    fn task_id(&self) -> &str {
        &self.task_id
    }
    fn task_title(&self) -> &str {
        &self.task_title
    }
    fn context(&self) -> &str {
        &self.context
    }
    fn aspect_pool(&self) -> Option<&[String]> {
        Some(&self.aspect_pool)
    }
}

/// 一类标注任务：文章、题目、作答各自所在的集合，以及作答记录如何与题目关联
pub trait TaskKind {
    const TASK_TYPE: &'static str;
    type Article: Document + AsRef<Article>;
    type Task: Document + TaskRecord;
    type Answer: Document;

    fn answer_filter(user_id: &str, article_id: &str, task_id: &str) -> Filter;
}

pub struct QaKind;

impl TaskKind for QaKind {
    const TASK_TYPE: &'static str = QA_TASK_TYPE;
    type Article = Article;
    type Task = QaTask;
    type Answer = QaAnswer;

    fn answer_filter(user_id: &str, article_id: &str, task_id: &str) -> Filter {
        Filter::new()
            .eq("userId", user_id)
            .eq("articleId", article_id)
            .eq("taskId", task_id)
    }
}

pub struct SentiKind;

impl TaskKind for SentiKind {
    const TASK_TYPE: &'static str = SENTI_TASK_TYPE;
    type Article = SentiArticle;
    type Task = SentiTask;
    type Answer = SentiAnswer;

    // 情感题的作答只按 taskId 统计，不区分用户
    fn answer_filter(_user_id: &str, _article_id: &str, task_id: &str) -> Filter {
        Filter::new().eq("taskId", task_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKindTag {
    #[serde(rename = "MRC")]
    Qa,
    #[serde(rename = "Senti")]
    Senti,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksRequest {
    pub article_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub task_type: Option<TaskKindTag>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetailRequest {
    #[serde(default)]
    pub user_id: String,
    pub article_id: String,
    pub task_id: String,
    #[serde(default)]
    pub task_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListItem {
    pub task_id: String,
    pub task_title: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_pool: Option<Vec<String>>,
    pub answered: u64,
    pub is_answered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleTaskView {
    pub article_id: String,
    pub article_title: String,
    pub task_type: String,
    pub task_list: Vec<TaskListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetailView {
    pub task_id: String,
    pub task_type: String,
    pub task_title: String,
    pub context: String,
    pub answered: usize,
    #[serde(rename = "qaList")]
    pub qa_pairs: Vec<QaPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentiTaskDetailView {
    pub task_id: String,
    pub task_type: String,
    pub task_title: String,
    pub context: String,
    pub aspect_pool: Vec<String>,
    pub is_answered: bool,
}

/// 汇总某篇文章下每道题的作答情况
pub async fn aggregate_task_progress(
    store: &impl EntityStore,
    article_id: &str,
    user_id: &str,
    kind: TaskKindTag,
) -> ServiceResult<ArticleTaskView> {
    match kind {
        TaskKindTag::Qa => aggregate::<QaKind>(store, article_id, user_id).await,
        TaskKindTag::Senti => aggregate::<SentiKind>(store, article_id, user_id).await,
    }
}

pub async fn aggregate<K: TaskKind>(
    store: &impl EntityStore,
    article_id: &str,
    user_id: &str,
) -> ServiceResult<ArticleTaskView> {
    let by_article = Filter::new().eq("articleId", article_id);
    let tasks: Vec<K::Task> = store.find(&by_article).await?;
    let article: K::Article = store
        .find_one(&by_article)
        .await?
        .ok_or_else(|| ServiceError::not_found("article", article_id))?;

    // 每道题单独查询作答数，并发执行，结果顺序与题目顺序一致
    let filters: Vec<Filter> = tasks
        .iter()
        .map(|t| K::answer_filter(user_id, article_id, t.task_id()))
        .collect();
    let counts = try_join_all(filters.iter().map(|f| store.count::<K::Answer>(f))).await?;

    let task_list = tasks
        .iter()
        .zip(counts)
        .map(|(task, answered)| TaskListItem {
            task_id: task.task_id().to_string(),
            task_title: task.task_title().to_string(),
            context: task.context().to_string(),
            aspect_pool: task.aspect_pool().map(<[String]>::to_vec),
            answered,
            is_answered: answered > 0,
        })
        .collect();
    tracing::debug!(
        "Aggregated {} {} tasks for article {}",
        tasks.len(),
        K::TASK_TYPE,
        article_id
    );

    Ok(ArticleTaskView {
        article_id: article_id.to_string(),
        article_title: article.as_ref().article_title.clone(),
        task_type: K::TASK_TYPE.to_string(),
        task_list,
    })
}

impl QaTask {
    /// 题目详情及当前用户提交过的问答对
    pub async fn detail(
        store: &impl EntityStore,
        req: &TaskDetailRequest,
    ) -> ServiceResult<TaskDetailView> {
        let answers: Vec<QaAnswer> = store
            .find(
                &QaKind::answer_filter(&req.user_id, &req.article_id, &req.task_id)
                    .eq_if_present("taskType", req.task_type.as_deref()),
            )
            .await?;
        let task: QaTask = store
            .find_one(
                &Filter::new()
                    .eq("articleId", req.article_id.as_str())
                    .eq("taskId", req.task_id.as_str())
                    .eq_if_present("taskType", req.task_type.as_deref()),
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("task", &req.task_id))?;

        Ok(TaskDetailView {
            task_id: task.task_id,
            task_type: task.task_type,
            task_title: task.task_title,
            context: task.context,
            answered: answers.len(),
            qa_pairs: answers
                .into_iter()
                .map(|a| QaPair {
                    question: a.question,
                    answer: a.answer,
                })
                .collect(),
        })
    }
}

impl SentiTask {
    pub async fn detail(
        store: &impl EntityStore,
        req: &TaskDetailRequest,
    ) -> ServiceResult<SentiTaskDetailView> {
        let answered = store
            .count::<SentiAnswer>(&SentiKind::answer_filter(
                &req.user_id,
                &req.article_id,
                &req.task_id,
            ))
            .await?;
        let task: SentiTask = store
            .find_one(
                &Filter::new()
                    .eq("articleId", req.article_id.as_str())
                    .eq("taskId", req.task_id.as_str())
                    .eq_if_present("taskType", req.task_type.as_deref()),
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("task", &req.task_id))?;

        Ok(SentiTaskDetailView {
            task_id: task.task_id,
            task_type: task.task_type,
            task_title: task.task_title,
            context: task.context,
            aspect_pool: task.aspect_pool,
            is_answered: answered > 0,
        })
    }
}
