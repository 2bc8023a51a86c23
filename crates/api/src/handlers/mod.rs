pub mod auth;
pub mod catalog;
pub mod colors;
pub mod fabrics;
pub mod generation;
pub mod generations;
