/// Shared secret the teacher console logs in with.
pub const TEACHER_PASSWORD: &str = "1234prof";

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    /// Password granting the teacher role. Compiled in; not read from the
    /// environment.
    pub teacher_password: String,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        AppConfig {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3001),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            teacher_password: TEACHER_PASSWORD.to_string(),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 3001,
            host: "0.0.0.0".to_string(),
            teacher_password: TEACHER_PASSWORD.to_string(),
        }
    }
}
