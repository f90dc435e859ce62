use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::controller::ControllerSettings;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        api_url: get_env_or_default("DORKSCOPE_API_URL", "http://127.0.0.1:5000"),
        csrf_token: env::var("DORKSCOPE_CSRF_TOKEN").ok(),
        route: get_env_or_default("DORKSCOPE_ROUTE", "/"),
        refresh_delay_ms: get_env_parsed_or("DORKSCOPE_REFRESH_DELAY_MS", 1000),
        notification_ms: get_env_parsed_or("DORKSCOPE_NOTIFICATION_MS", 5000),
        theme: env::var("DORKSCOPE_THEME").ok(),
    }
});

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    /// Only used when the loaded page carries no csrf meta tag.
    pub csrf_token: Option<String>,
    pub route: String,
    pub refresh_delay_ms: u64,
    pub notification_ms: u64,
    pub theme: Option<String>,
}

impl Config {
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            route: self.route.clone(),
            dashboard_refresh_delay: Duration::from_millis(self.refresh_delay_ms),
            notification_duration: Duration::from_millis(self.notification_ms),
        }
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring unparseable {key}={raw}");
            default
        }),
        Err(_) => default,
    }
}
