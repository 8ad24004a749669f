mod token;
mod user;

pub use token::OutstandingToken;
pub use user::{Role, Status, User, UserView};
