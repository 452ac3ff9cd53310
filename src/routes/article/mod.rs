mod handler;
mod model;

pub use handler::{get_articles, get_senti_articles};
pub use model::{Article, ProjectArticlesView, SentiArticle};
