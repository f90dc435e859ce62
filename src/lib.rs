pub mod api;
pub mod charts;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod data_models;
pub mod error;
pub mod events;
pub mod export;
pub mod form;
pub mod history;
pub mod notify;
pub mod render;
pub mod util;
pub mod view;
