use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::import::normalize_rows;
use crate::error::{ServiceError, ServiceResult};
use crate::routes::article::Article;
use crate::routes::user::User;
use crate::store::{Document, EntityStore, Filter};
use crate::utils::int_or_string;

/// 有效成员的状态码
pub const ACTIVE_STATUS: &str = "1";
/// 单独授权时写入的角色码
pub const DEFAULT_CODE_TYPE: &str = "1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub project_id: i64,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub label_info: Value,
}

impl Document for Project {
    const COLLECTION: &'static str = "Project";
    const UNIQUE_KEY: Option<&'static str> = Some("projectId");
}

/// 用户与项目的成员关系
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    #[serde(default)]
    pub project_id: i64,
    pub user_id: String,
    #[serde(default)]
    pub code_type: String,
    #[serde(default)]
    pub status_code: String,
}

impl Document for Auth {
    const COLLECTION: &'static str = "Authentication";
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProjectRequest {
    pub project: Project,
    #[serde(default)]
    pub members: Vec<Auth>,
    #[serde(default)]
    pub csv_file: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreated {
    pub project_id: i64,
    pub document_id: String,
    pub articles: usize,
    pub tasks: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProjectsRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMembersRequest {
    #[serde(deserialize_with = "int_or_string")]
    pub project_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMemberView {
    pub project_id: i64,
    pub user_id: String,
    pub code_type: String,
    pub status_code: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

/// 建项目的各个步骤，依次执行，失败时已完成的写入不回滚
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    CountProjects,
    Normalize,
    CheckArticles,
    InsertProject,
    InsertMembers,
    InsertArticles,
    InsertTasks,
}

impl BootstrapStep {
    /// 可以原样重试的步骤；批量插入重试会产生重复记录
    pub fn is_retry_safe(self) -> bool {
        matches!(
            self,
            Self::CountProjects | Self::Normalize | Self::CheckArticles
        )
    }
}

fn step_failed<E: std::fmt::Display>(step: BootstrapStep) -> impl FnOnce(E) -> E {
    move |e| {
        tracing::error!(
            "Project bootstrap failed at {:?} (retry safe: {}): {}",
            step,
            step.is_retry_safe(),
            e
        );
        e
    }
}

impl Project {
    pub async fn find_by_project_id(
        store: &impl EntityStore,
        project_id: i64,
    ) -> ServiceResult<Self> {
        store
            .find_one(&Filter::new().eq("projectId", project_id))
            .await?
            .ok_or_else(|| {
                tracing::warn!("Can't find project {}", project_id);
                ServiceError::not_found("project", project_id)
            })
    }

    /// 建项目：分配 projectId、写项目、写成员、写文章和题目
    ///
    /// CSV 校验在任何写入之前完成。projectId 取当前项目数，并发创建时
    /// 由存储层的唯一约束拒绝重复 id，调用方可重试。
    /// articleId 全局唯一，批次中的文章已存在时整批拒绝。
    pub async fn bootstrap(
        store: &impl EntityStore,
        req: AddProjectRequest,
    ) -> ServiceResult<ProjectCreated> {
        let AddProjectRequest {
            mut project,
            mut members,
            csv_file,
        } = req;

        let project_id = store
            .count::<Project>(&Filter::new())
            .await
            .map_err(step_failed(BootstrapStep::CountProjects))? as i64;

        let batch = normalize_rows(&csv_file, project_id)
            .map_err(step_failed(BootstrapStep::Normalize))?;
        tracing::debug!(
            "Normalized {} rows into {} articles for project {}",
            csv_file.len(),
            batch.articles.len(),
            project_id
        );

        let article_ids = batch.articles.iter().map(|a| a.article_id.as_str());
        let existing = store
            .count::<Article>(&Filter::new().is_in("articleId", article_ids))
            .await
            .map_err(step_failed(BootstrapStep::CheckArticles))?;
        if existing > 0 {
            tracing::warn!(
                "Rejected import for project {}: {} articles already exist",
                project_id,
                existing
            );
            return Err(ServiceError::Conflict(format!(
                "{existing} articles of this batch already exist"
            )));
        }

        project.project_id = project_id;
        let document_id = store
            .insert_one(&project)
            .await
            .map_err(step_failed(BootstrapStep::InsertProject))?;

        for member in &mut members {
            member.project_id = project_id;
        }
        if !members.is_empty() {
            store
                .insert_many(&members)
                .await
                .map_err(step_failed(BootstrapStep::InsertMembers))?;
        }
        if !batch.articles.is_empty() {
            store
                .insert_many(&batch.articles)
                .await
                .map_err(step_failed(BootstrapStep::InsertArticles))?;
        }
        if !batch.tasks.is_empty() {
            store
                .insert_many(&batch.tasks)
                .await
                .map_err(step_failed(BootstrapStep::InsertTasks))?;
        }

        tracing::info!(
            "Created project {} with {} members, {} articles, {} tasks",
            project_id,
            members.len(),
            batch.articles.len(),
            batch.tasks.len()
        );
        Ok(ProjectCreated {
            project_id,
            document_id,
            articles: batch.articles.len(),
            tasks: batch.tasks.len(),
        })
    }

    /// 用户有效成员关系对应的项目，按成员记录中首次出现的顺序返回
    pub async fn resolve_memberships(
        store: &impl EntityStore,
        user_id: &str,
    ) -> ServiceResult<Vec<Project>> {
        let auths: Vec<Auth> = store
            .find(
                &Filter::new()
                    .eq("userId", user_id)
                    .eq("statusCode", ACTIVE_STATUS),
            )
            .await?;

        let mut seen = HashSet::new();
        let project_ids: Vec<i64> = auths
            .iter()
            .map(|a| a.project_id)
            .filter(|id| seen.insert(*id))
            .collect();

        // 引用的项目不存在时整体失败
        let mut projects = Vec::with_capacity(project_ids.len());
        for project_id in project_ids {
            projects.push(Self::find_by_project_id(store, project_id).await?);
        }
        Ok(projects)
    }
}

impl Auth {
    pub async fn grant(mut self, store: &impl EntityStore) -> ServiceResult<String> {
        if self.user_id.trim().is_empty() {
            return Err(ServiceError::InvalidInput("userId is required".into()));
        }
        self.code_type = DEFAULT_CODE_TYPE.to_string();
        let id = store.insert_one(&self).await?;
        tracing::info!(
            "Granted user {} access to project {}",
            self.user_id,
            self.project_id
        );
        Ok(id)
    }

    /// 项目成员列表：成员关系与用户资料按 userId 关联，缺少用户资料的成员不返回
    pub async fn list_members(
        store: &impl EntityStore,
        project_id: i64,
    ) -> ServiceResult<Vec<ProjectMemberView>> {
        let auths: Vec<Auth> = store
            .find(&Filter::new().eq("projectId", project_id))
            .await?;
        let user_ids: Vec<String> = auths.iter().map(|a| a.user_id.clone()).collect();
        let users = User::find_by_ids(store, &user_ids).await?;

        Ok(users
            .into_iter()
            .filter_map(|user| {
                let auth = auths.iter().find(|a| a.user_id == user.user_id)?;
                Some(ProjectMemberView {
                    project_id: auth.project_id,
                    user_id: user.user_id,
                    code_type: auth.code_type.clone(),
                    status_code: auth.status_code.clone(),
                    name: user.name,
                    email: user.email,
                    image_url: user.image_url,
                })
            })
            .collect())
    }
}
