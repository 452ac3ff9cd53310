// CSV 导入：把扁平的 (文本, "<文章序号>-<题目序号>") 行拆成文章和题目

use std::collections::HashMap;

use crate::error::FormatError;
use crate::routes::article::Article;
use crate::routes::task::{QA_TASK_TYPE, QaTask};

const ARTICLE_ID_PREFIX: &str = "articleId";
const TASK_ID_PREFIX: &str = "taskId";

#[derive(Debug, Default, PartialEq)]
pub struct ImportBatch {
    pub articles: Vec<Article>,
    pub tasks: Vec<QaTask>,
}

/// 校验并规整整批数据，任一行格式错误则整批失败
///
/// 同一文章序号的第一行文本作为文章标题，`total_tasks` 按出现次数累加。
pub fn normalize_rows<R: AsRef<[String]>>(
    rows: &[R],
    project_id: i64,
) -> Result<ImportBatch, FormatError> {
    let mut batch = ImportBatch::default();
    // articleId -> 在 batch.articles 中的位置
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (row, fields) in rows.iter().enumerate() {
        let fields = fields.as_ref();
        let [text, compound] = fields else {
            return Err(FormatError::FieldCount {
                row,
                fields: fields.len(),
            });
        };
        let Some((article_index, _task_index)) = split_compound_index(compound) else {
            return Err(FormatError::CompoundIndex {
                row,
                index: compound.clone(),
            });
        };

        let article_id = format!("{ARTICLE_ID_PREFIX}{article_index}");
        match seen.get(&article_id) {
            Some(&pos) => batch.articles[pos].total_tasks += 1,
            None => {
                seen.insert(article_id.clone(), batch.articles.len());
                batch.articles.push(Article {
                    article_id: article_id.clone(),
                    project_id,
                    article_title: text.clone(),
                    total_tasks: 1,
                });
            }
        }

        batch.tasks.push(QaTask {
            task_id: format!("{TASK_ID_PREFIX}{compound}"),
            article_id,
            task_type: QA_TASK_TYPE.to_string(),
            task_title: text.clone(),
            context: text.clone(),
        });
    }

    Ok(batch)
}

fn split_compound_index(compound: &str) -> Option<(&str, &str)> {
    let mut parts = compound.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(article), Some(task), None) => Some((article, task)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(pairs: &[&[&str]]) -> Vec<Vec<String>> {
        pairs
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn groups_rows_by_article_prefix() {
        let batch = normalize_rows(
            &rows(&[&["T1", "1-1"], &["T1", "1-2"], &["T2", "2-1"]]),
            4,
        )
        .unwrap();

        let ids: Vec<_> = batch.articles.iter().map(|a| a.article_id.as_str()).collect();
        assert_eq!(ids, ["articleId1", "articleId2"]);
        assert_eq!(batch.articles[0].total_tasks, 2);
        assert_eq!(batch.articles[1].total_tasks, 1);
        assert!(batch.articles.iter().all(|a| a.project_id == 4));

        let task_ids: Vec<_> = batch.tasks.iter().map(|t| t.task_id.as_str()).collect();
        assert_eq!(task_ids, ["taskId1-1", "taskId1-2", "taskId2-1"]);
        assert_eq!(batch.tasks[2].article_id, "articleId2");
        assert!(batch.tasks.iter().all(|t| t.task_type == QA_TASK_TYPE));
    }

    #[test]
    fn first_row_text_is_the_title() {
        let batch = normalize_rows(&rows(&[&["first", "7-1"], &["second", "7-2"]]), 0).unwrap();
        assert_eq!(batch.articles.len(), 1);
        assert_eq!(batch.articles[0].article_title, "first");
        assert_eq!(batch.tasks[1].task_title, "second");
        assert_eq!(batch.tasks[1].context, "second");
    }

    #[test]
    fn interleaved_rows_count_against_their_own_article() {
        let batch = normalize_rows(
            &rows(&[&["a", "1-1"], &["b", "2-1"], &["a", "1-2"], &["a", "1-3"]]),
            0,
        )
        .unwrap();

        for article in &batch.articles {
            let owned = batch
                .tasks
                .iter()
                .filter(|t| t.article_id == article.article_id)
                .count();
            assert_eq!(article.total_tasks as usize, owned);
        }
        assert_eq!(batch.articles[0].total_tasks, 3);
        assert_eq!(batch.articles[1].total_tasks, 1);
    }

    #[test]
    fn wrong_field_count_fails_the_batch() {
        let err = normalize_rows(&rows(&[&["ok", "1-1"], &["lonely"]]), 0).unwrap_err();
        assert_eq!(err, FormatError::FieldCount { row: 1, fields: 1 });

        let err = normalize_rows(&rows(&[&["a", "1-1", "extra"]]), 0).unwrap_err();
        assert_eq!(err, FormatError::FieldCount { row: 0, fields: 3 });
    }

    #[test]
    fn compound_index_needs_exactly_one_hyphen() {
        for bad in ["11", "1-2-3", ""] {
            let err = normalize_rows(&rows(&[&["a", bad]]), 0).unwrap_err();
            assert_eq!(
                err,
                FormatError::CompoundIndex {
                    row: 0,
                    index: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn empty_upload_yields_empty_batch() {
        let batch = normalize_rows::<Vec<String>>(&[], 0).unwrap();
        assert_eq!(batch, ImportBatch::default());
    }
}
