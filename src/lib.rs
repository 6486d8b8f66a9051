pub mod app;
pub mod favorites;
pub mod models;
pub mod tmdb;
pub mod view;
