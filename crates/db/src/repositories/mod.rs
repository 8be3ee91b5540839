pub mod alert_repo;

pub use alert_repo::AlertRepo;
