pub mod assets;
pub mod auth;
pub mod health;
pub mod portfolio;
pub mod users;
pub mod yields;
