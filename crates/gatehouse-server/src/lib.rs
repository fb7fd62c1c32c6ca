pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod state;
pub mod web;
