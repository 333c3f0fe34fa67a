pub mod auth;
pub mod interaction_service;
pub mod kermesse_service;
pub mod ledger;
pub mod lifecycle;
pub mod membership;
pub mod notification;
pub mod stand_service;
pub mod tombola_service;
pub mod user_service;
