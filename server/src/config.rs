use clap::Parser;
use tracing::Level;

use crate::backend::opensearch::Credentials;

/// Server configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "todo-server")]
#[command(author, version, about = "REST API for the todo board")]
pub struct ServerConfig {
    /// Server host to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// OpenSearch base URL; the in-memory backend is used when unset
    #[arg(long, env = "OPENSEARCH_URL")]
    pub opensearch_url: Option<String>,

    #[arg(long, env = "OPENSEARCH_USERNAME", requires = "opensearch_password")]
    pub opensearch_username: Option<String>,

    #[arg(long, env = "OPENSEARCH_PASSWORD", hide_env_values = true)]
    pub opensearch_password: Option<String>,

    /// Name of the index holding todo documents
    #[arg(long, env = "TODO_INDEX", default_value = "todos")]
    pub index: String,

    /// Path prefix the todo routes are mounted under
    #[arg(long, env = "BASE_PATH", default_value = crate::DEFAULT_BASE_PATH)]
    pub base_path: String,

    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: Level,
}

impl ServerConfig {
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.opensearch_username, &self.opensearch_password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}
