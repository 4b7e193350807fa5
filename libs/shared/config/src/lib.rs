use std::env;
use std::net::SocketAddr;
use tracing::warn;

pub const DEFAULT_SLOT_INTERVAL_MINUTES: f64 = 20.0;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub slot_interval_minutes: f64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            bind_addr: parse_bind_addr(env::var("BIND_ADDR").ok()),
            slot_interval_minutes: parse_slot_interval(env::var("SLOT_INTERVAL_MINUTES").ok()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Config pointing at a store URL with default server settings. Used by tests.
    pub fn with_store(supabase_url: &str, anon_key: &str, jwt_secret: &str) -> Self {
        Self {
            supabase_url: supabase_url.to_string(),
            supabase_anon_key: anon_key.to_string(),
            supabase_jwt_secret: jwt_secret.to_string(),
            bind_addr: parse_bind_addr(None),
            slot_interval_minutes: DEFAULT_SLOT_INTERVAL_MINUTES,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}

fn parse_bind_addr(raw: Option<String>) -> SocketAddr {
    let default: SocketAddr = SocketAddr::from(([0, 0, 0, 0], 3000));
    match raw {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!("BIND_ADDR '{}' is not a socket address, using {}", value, DEFAULT_BIND_ADDR);
            default
        }),
    }
}

fn parse_slot_interval(raw: Option<String>) -> f64 {
    match raw {
        None => DEFAULT_SLOT_INTERVAL_MINUTES,
        Some(value) => match value.parse::<f64>() {
            Ok(minutes) if (1.0..=1440.0).contains(&minutes) => minutes,
            _ => {
                warn!(
                    "SLOT_INTERVAL_MINUTES '{}' must be between 1 and 1440, using {}",
                    value, DEFAULT_SLOT_INTERVAL_MINUTES
                );
                DEFAULT_SLOT_INTERVAL_MINUTES
            }
        },
    }
}
