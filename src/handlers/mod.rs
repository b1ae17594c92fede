pub mod auth;
pub mod clubs;
pub mod movies;
pub mod posts;
pub mod ratings;
pub mod roles;
pub mod rooms;
pub mod users;
