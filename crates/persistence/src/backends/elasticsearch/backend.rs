//! Elasticsearch backend configuration and client construction.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::Elasticsearch;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Backend, BackendKind};
use crate::error::{BackendError, StorageError, StorageResult};

/// Authentication configuration for Elasticsearch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
    /// API key authentication.
    ApiKey {
        /// The API key id.
        id: String,
        /// The API key secret.
        api_key: String,
    },
}

/// Configuration for the Elasticsearch backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Elasticsearch node URLs (e.g., `["http://localhost:9200"]`).
    /// Currently uses the first node (single-node connection pool).
    pub nodes: Vec<String>,

    /// Number of primary shards per index (default: 1).
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Number of replica shards per index (default: 1).
    #[serde(default = "default_replicas")]
    pub number_of_replicas: u32,

    /// Request timeout (default: `"30s"`).
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_shards() -> u32 {
    1
}

fn default_replicas() -> u32 {
    1
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["http://localhost:9200".to_string()],
            number_of_shards: default_shards(),
            number_of_replicas: default_replicas(),
            request_timeout: default_request_timeout(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

impl ElasticsearchConfig {
    /// Builds a configuration from environment variables.
    ///
    /// | Variable | Default | Meaning |
    /// |----------|---------|---------|
    /// | `ES_HOST` | `localhost` | Node host |
    /// | `ES_PORT` | `9200` | Node port |
    /// | `ES_USE_SSL` | `true` | Use `https` |
    /// | `ES_VERIFY_CERTS` | `true` | Validate server certificates |
    /// | `ES_USER` / `ES_PASS` | unset | Basic auth |
    /// | `ES_API_KEY` | unset | API key as `id:key` |
    /// | `ES_TIMEOUT` | `30s` | Request timeout, e.g. `10s`, `2m` |
    pub fn from_env() -> Self {
        let host = std::env::var("ES_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = std::env::var("ES_PORT").unwrap_or_else(|_| "9200".to_string());
        let scheme = if env_flag("ES_USE_SSL", true) {
            "https"
        } else {
            "http"
        };

        let auth = match (
            std::env::var("ES_USER"),
            std::env::var("ES_PASS"),
            std::env::var("ES_API_KEY"),
        ) {
            (Ok(username), Ok(password), _) => Some(ElasticsearchAuth::Basic { username, password }),
            (_, _, Ok(key)) => key.split_once(':').map(|(id, api_key)| ElasticsearchAuth::ApiKey {
                id: id.to_string(),
                api_key: api_key.to_string(),
            }),
            _ => None,
        };

        let request_timeout = std::env::var("ES_TIMEOUT")
            .ok()
            .and_then(|v| humantime::parse_duration(&v).ok())
            .unwrap_or_else(default_request_timeout);

        Self {
            nodes: vec![format!("{}://{}:{}", scheme, host, port)],
            request_timeout,
            auth,
            disable_certificate_validation: !env_flag("ES_VERIFY_CERTS", true),
            ..Default::default()
        }
    }
}

/// Elasticsearch document engine for the catalog indices.
pub struct ElasticsearchBackend {
    /// The Elasticsearch client.
    client: Elasticsearch,
    /// Configuration.
    config: ElasticsearchConfig,
}

impl Debug for ElasticsearchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchBackend")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchBackend {
    /// Creates a new Elasticsearch backend with the given configuration.
    ///
    /// No request is sent; use [`Backend::health_check`] to verify the cluster.
    pub fn new(config: ElasticsearchConfig) -> StorageResult<Self> {
        let client = Self::build_client(&config)?;
        Ok(Self { client, config })
    }

    /// Builds the Elasticsearch client from configuration.
    fn build_client(config: &ElasticsearchConfig) -> StorageResult<Elasticsearch> {
        let url = config
            .nodes
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url = url.parse().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: "elasticsearch".to_string(),
                message: format!("Invalid URL: {}", e),
            })
        })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool).timeout(config.request_timeout);

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ElasticsearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchAuth::Bearer { token } => {
                    builder.auth(Credentials::Bearer(token.clone()))
                }
                ElasticsearchAuth::ApiKey { id, api_key } => {
                    builder.auth(Credentials::ApiKey(id.clone(), api_key.clone()))
                }
            };
        }

        let transport = builder.build().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: "elasticsearch".to_string(),
                message: format!("Failed to build transport: {}", e),
            })
        })?;

        Ok(Elasticsearch::new(transport))
    }

    /// Returns the Elasticsearch client.
    pub(crate) fn client(&self) -> &Elasticsearch {
        &self.client
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    /// Index settings applied to every index this backend creates.
    pub(crate) fn index_settings(&self) -> Value {
        serde_json::json!({
            "number_of_shards": self.config.number_of_shards,
            "number_of_replicas": self.config.number_of_replicas,
        })
    }
}

#[async_trait]
impl Backend for ElasticsearchBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Elasticsearch
    }

    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .cluster()
            .health(elasticsearch::cluster::ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable {
                backend_name: "elasticsearch".to_string(),
                message: format!("Health check failed: {}", e),
            })?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(BackendError::Unavailable {
                backend_name: "elasticsearch".to_string(),
                message: format!("Cluster health returned status {}", status),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::Internal {
                backend_name: "elasticsearch".to_string(),
                message: format!("Failed to parse health response: {}", e),
                source: None,
            })?;

        let cluster_status = body
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");

        if cluster_status == "red" {
            return Err(BackendError::Unavailable {
                backend_name: "elasticsearch".to_string(),
                message: format!("Cluster status is red: {:?}", body),
            });
        }

        Ok(())
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
