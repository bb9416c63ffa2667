pub mod common;
pub mod google;
pub mod token;
pub mod user;

pub use common::*;
pub use google::*;
pub use token::*;
pub use user::*;
