use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ServiceResult;
use crate::routes::project::Project;
use crate::store::{Document, EntityStore, Filter};
use crate::utils::int_or_string;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub article_id: String,
    #[serde(default)]
    pub project_id: i64,
    #[serde(default)]
    pub article_title: String,
    #[serde(default)]
    pub total_tasks: u32,
}

impl Document for Article {
    const COLLECTION: &'static str = "Articles";
}

impl AsRef<Article> for Article {
    fn as_ref(&self) -> &Article {
        self
    }
}

/// 情感标注文章，字段与 Article 相同，单独成集合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentiArticle(pub Article);

impl Document for SentiArticle {
    const COLLECTION: &'static str = "SentiArticles";
}

impl AsRef<Article> for SentiArticle {
    fn as_ref(&self) -> &Article {
        &self.0
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectArticlesRequest {
    #[serde(deserialize_with = "int_or_string")]
    pub project_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectArticlesView {
    pub project_id: i64,
    pub project_name: String,
    pub project_type: String,
    pub label_info: Value,
    pub article_list: Vec<Article>,
}

impl Article {
    pub async fn list_by_project(
        store: &impl EntityStore,
        project_id: i64,
    ) -> ServiceResult<ProjectArticlesView> {
        let project = Project::find_by_project_id(store, project_id).await?;
        let articles: Vec<Article> = store
            .find(&Filter::new().eq("projectId", project_id))
            .await?;
        tracing::debug!(
            "Project {} has {} articles",
            project_id,
            articles.len()
        );

        Ok(ProjectArticlesView {
            project_id: project.project_id,
            project_name: project.project_name,
            project_type: project.project_type,
            label_info: project.label_info,
            article_list: articles,
        })
    }
}

impl SentiArticle {
    pub async fn list(store: &impl EntityStore) -> ServiceResult<Vec<Article>> {
        let articles: Vec<SentiArticle> = store.find(&Filter::new()).await?;
        Ok(articles.into_iter().map(|a| a.0).collect())
    }
}
