mod handler;
mod model;

pub use handler::{get_users, login};
pub use model::{LoginResponse, User};
