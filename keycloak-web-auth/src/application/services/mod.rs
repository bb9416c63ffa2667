pub mod google_federation;
pub mod web_auth;

pub use google_federation::*;
pub use web_auth::*;
