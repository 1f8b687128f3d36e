//! Server configuration.
//!
//! Parsed from command-line flags with environment-variable fallbacks.

use clap::Args;

/// Development-only signing secret. A warning is logged when it is in use.
pub const DEV_JWT_SECRET: &str = "cadence_local_development_jwt_secret_32c";

/// Core server settings
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "CADENCE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "CADENCE_PORT", default_value_t = 3000)]
    pub port: u16,

    /// HS256 secret used to verify access tokens (at least 32 characters)
    #[arg(long, env = "CADENCE_JWT_SECRET", default_value = DEV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
        }
    }
}

impl ServerConfig {
    /// `host:port` to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns true when using the development-only JWT secret.
    pub fn is_dev_jwt_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ServerConfig,
    }

    #[test]
    fn test_defaults() {
        // テスト項目: フラグ無しの場合は既定値になる
        // when (操作):
        let cli = TestCli::try_parse_from(["cadence-server"]).unwrap();

        // then (期待する結果):
        assert_eq!(cli.config.bind_addr(), "127.0.0.1:3000");
        assert!(cli.config.is_dev_jwt_secret());
        assert!(DEV_JWT_SECRET.len() >= 32);
    }

    #[test]
    fn test_flags_override_defaults() {
        // テスト項目: フラグで既定値を上書きできる
        // when (操作):
        let cli = TestCli::try_parse_from([
            "cadence-server",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--jwt-secret",
            "a_production_secret_that_is_long_enough",
        ])
        .unwrap();

        // then (期待する結果):
        assert_eq!(cli.config.bind_addr(), "0.0.0.0:8080");
        assert!(!cli.config.is_dev_jwt_secret());
    }
}
