mod handler;
mod model;

pub use handler::{get_senti_task_detail, get_senti_tasks, get_task_detail, get_tasks};
pub use model::{
    ArticleTaskView, QA_TASK_TYPE, QaKind, QaPair, QaTask, SENTI_TASK_TYPE, SentiKind, SentiTask,
    SentiTaskDetailView, TaskDetailRequest, TaskDetailView, TaskKind, TaskKindTag, TaskListItem,
    TaskRecord, aggregate, aggregate_task_progress,
};
