pub mod answer;
pub mod article;
pub mod project;
pub mod task;
pub mod user;
