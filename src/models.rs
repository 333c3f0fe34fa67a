pub mod auth;
pub mod interaction;
pub mod kermesse;
pub mod stand;
pub mod tombola;
pub mod user;
