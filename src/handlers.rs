pub mod auth;
pub mod interactions;
pub mod kermesses;
pub mod stands;
pub mod tombolas;
pub mod users;
