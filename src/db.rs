pub mod user_repo;
pub use user_repo::UserRepository;
pub mod stand_repo;
pub use stand_repo::StandRepository;
pub mod kermesse_repo;
pub use kermesse_repo::KermesseRepository;
pub mod interaction_repo;
pub use interaction_repo::{InteractionRepository, NewInteraction};
pub mod tombola_repo;
pub use tombola_repo::TombolaRepository;
