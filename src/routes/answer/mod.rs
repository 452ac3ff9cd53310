mod handler;
mod model;

pub use handler::{save_answer, save_senti_answer};
pub use model::{AnswerCreated, QaAnswer, SentiAnswer};
