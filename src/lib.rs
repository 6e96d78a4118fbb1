#![doc = "The `marketboard` library crate."]
#![doc = ""]
#![doc = "Domain models, persistence, authentication, forms and the HTTP routes of the"]
#![doc = "Marketboard listings service. The binary (`main.rs`) wires them into a server."]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod repository;
pub mod routes;
pub mod views;

pub use crate::error::AppError;
