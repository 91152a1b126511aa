use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub credits: CreditConfig,
    pub providers: ProvidersConfig,
    pub content: ContentGeneratorConfig,
    pub logging: LoggingConfig,
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: SecretString,
    pub pool_size: u32,
    pub query_timeout_secs: u64,
}

impl Serialize for DbConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("DbConfig", 3)?;
        state.serialize_field("database_url", "[REDACTED]")?;
        state.serialize_field("pool_size", &self.pool_size)?;
        state.serialize_field("query_timeout_secs", &self.query_timeout_secs)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for DbConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct DbConfigHelper {
            database_url: String,
            pool_size: u32,
            query_timeout_secs: u64,
        }

        let helper = DbConfigHelper::deserialize(deserializer)?;
        Ok(DbConfig {
            database_url: SecretString::from(helper.database_url),
            pool_size: helper.pool_size,
            query_timeout_secs: helper.query_timeout_secs,
        })
    }
}

impl DbConfig {
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let url_str = self.database_url.expose_secret();
        match url::Url::parse(url_str) {
            Ok(mut url) => {
                if url.password().is_some() {
                    url.set_password(Some("***")).ok();
                }
                url.to_string()
            }
            Err(_) => "[INVALID_URL]".to_string(),
        }
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        self.database_url.expose_secret()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditConfig {
    pub store_backend: CreditStoreBackend,
    pub initial_grant: i64,
    pub generation_cost: i64,
    pub transaction_page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CreditStoreBackend {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "postgres")]
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub poll_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub dashscope: DashscopeConfig,
    pub replicate: ReplicateConfig,
}

#[derive(Debug, Clone)]
pub struct DashscopeConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
}

impl DashscopeConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Serialize for DashscopeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("DashscopeConfig", 3)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("model", &self.model)?;
        state.serialize_field(
            "api_key",
            &self.api_key.as_ref().map(|_| "[REDACTED]"),
        )?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for DashscopeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct DashscopeConfigHelper {
            base_url: String,
            model: String,
            api_key: Option<String>,
        }

        let helper = DashscopeConfigHelper::deserialize(deserializer)?;
        Ok(DashscopeConfig {
            base_url: helper.base_url,
            model: helper.model,
            api_key: helper
                .api_key
                .filter(|key| !key.is_empty())
                .map(SecretString::from),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub base_url: String,
    pub model_version: String,
    pub api_token: Option<SecretString>,
}

impl ReplicateConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }
}

impl Serialize for ReplicateConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ReplicateConfig", 3)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("model_version", &self.model_version)?;
        state.serialize_field(
            "api_token",
            &self.api_token.as_ref().map(|_| "[REDACTED]"),
        )?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ReplicateConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ReplicateConfigHelper {
            base_url: String,
            model_version: String,
            api_token: Option<String>,
        }

        let helper = ReplicateConfigHelper::deserialize(deserializer)?;
        Ok(ReplicateConfig {
            base_url: helper.base_url,
            model_version: helper.model_version,
            api_token: helper
                .api_token
                .filter(|token| !token.is_empty())
                .map(SecretString::from),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentGeneratorConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_location: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "pretty")]
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub env: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_origin: None,
            },
            db: DbConfig {
                database_url: SecretString::from("postgresql://localhost/recipegen"),
                pool_size: 10,
                query_timeout_secs: 5,
            },
            credits: CreditConfig {
                store_backend: CreditStoreBackend::Postgres,
                initial_grant: 3,
                generation_cost: 1,
                transaction_page_size: 50,
            },
            providers: ProvidersConfig {
                poll_timeout_secs: 300,
                request_timeout_secs: 30,
                dashscope: DashscopeConfig {
                    base_url: "https://dashscope.aliyuncs.com/api/v1".to_string(),
                    model: "wanx2.1-t2i-turbo".to_string(),
                    api_key: None,
                },
                replicate: ReplicateConfig {
                    base_url: "https://api.replicate.com/v1".to_string(),
                    model_version: "black-forest-labs/flux-schnell".to_string(),
                    api_token: None,
                },
            },
            content: ContentGeneratorConfig {
                base_url: "http://localhost:8080".to_string(),
                request_timeout_secs: 60,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: false,
            },
            environment: EnvironmentConfig {
                env: "development".to_string(),
            },
        }
    }
}

impl Config {
    pub fn validate(&self) -> AppResult<()> {
        if self.db.database_url.expose_secret().is_empty() {
            return Err(AppError::ConfigError {
                message: "database_url cannot be empty".to_string(),
            });
        }

        if self.db.pool_size == 0 {
            return Err(AppError::ConfigError {
                message: "db pool_size must be greater than 0".to_string(),
            });
        }

        if self.db.query_timeout_secs == 0 {
            return Err(AppError::ConfigError {
                message: "query_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.credits.initial_grant < 0 {
            return Err(AppError::ConfigError {
                message: "initial_grant must be greater than or equal to 0".to_string(),
            });
        }

        if self.credits.generation_cost <= 0 {
            return Err(AppError::ConfigError {
                message: "generation_cost must be greater than 0".to_string(),
            });
        }

        if self.credits.transaction_page_size <= 0 {
            return Err(AppError::ConfigError {
                message: "transaction_page_size must be greater than 0".to_string(),
            });
        }

        if self.providers.poll_timeout_secs == 0 {
            return Err(AppError::ConfigError {
                message: "poll_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.providers.request_timeout_secs == 0 {
            return Err(AppError::ConfigError {
                message: "provider request_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.providers.dashscope.base_url.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "dashscope base_url cannot be empty".to_string(),
            });
        }

        if self.providers.replicate.base_url.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "replicate base_url cannot be empty".to_string(),
            });
        }

        if self.content.base_url.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "content generator base_url cannot be empty".to_string(),
            });
        }

        if self.content.request_timeout_secs == 0 {
            return Err(AppError::ConfigError {
                message: "content request_timeout_secs must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
