use std::fmt;

use serde::Deserialize;

use crate::backend::Backend;
use crate::error::MssqlMiddlewareError;

/// Parameters used to open a connection.
///
/// `server` follows the SQL Server conventions: `host`, `host,port`, or `host\instance`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionParameters {
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "windowsauthentication")]
    pub windows_authentication: bool,
    pub database: Option<String>,
    pub charset: Option<String>,
    #[serde(alias = "multipleactiveresultsets")]
    pub multiple_active_result_sets: bool,
    pub trust_server_certificate: bool,
}

impl Default for ConnectionParameters {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            username: None,
            password: None,
            windows_authentication: false,
            database: None,
            charset: None,
            multiple_active_result_sets: true,
            trust_server_certificate: true,
        }
    }
}

impl ConnectionParameters {
    #[must_use]
    pub fn builder(server: impl Into<String>) -> ConnectionParametersBuilder {
        ConnectionParametersBuilder::new(server)
    }

    /// Parse parameters from a JSON document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `MssqlMiddlewareError::ConfigError` if the document is not valid.
    pub fn from_json_str(json: &str) -> Result<Self, MssqlMiddlewareError> {
        let params: ConnectionParameters = serde_json::from_str(json)?;
        if params.server.trim().is_empty() {
            return Err(MssqlMiddlewareError::ConfigError(
                "server must not be empty".to_string(),
            ));
        }
        Ok(params)
    }
}

/// Fluent builder for connection parameters.
#[derive(Debug, Clone)]
pub struct ConnectionParametersBuilder {
    params: ConnectionParameters,
}

impl ConnectionParametersBuilder {
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            params: ConnectionParameters {
                server: server.into(),
                ..ConnectionParameters::default()
            },
        }
    }

    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.params.username = Some(username.into());
        self.params.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn windows_authentication(mut self, enabled: bool) -> Self {
        self.params.windows_authentication = enabled;
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.params.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.params.charset = Some(charset.into());
        self
    }

    #[must_use]
    pub fn multiple_active_result_sets(mut self, enabled: bool) -> Self {
        self.params.multiple_active_result_sets = enabled;
        self
    }

    #[must_use]
    pub fn trust_server_certificate(mut self, trust: bool) -> Self {
        self.params.trust_server_certificate = trust;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionParameters {
        self.params
    }
}

/// Backend-specific connection option set handed to the native driver.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub server: String,
    pub uid: Option<String>,
    pub pwd: Option<String>,
    pub integrated_security: bool,
    pub database: Option<String>,
    pub character_set: Option<String>,
    pub multiple_active_result_sets: bool,
    pub trust_server_certificate: bool,
}

impl ConnectOptions {
    /// Build the option set a backend passes to its native connect call.
    ///
    /// Credentials are left out entirely under windows authentication. The database is
    /// only bound when the caller asks for it and the backend can bind at connect time.
    #[must_use]
    pub fn for_backend(
        backend: Backend,
        params: &ConnectionParameters,
        select_database_at_connect: bool,
    ) -> Self {
        let caps = backend.capabilities();

        let (uid, pwd) = if params.windows_authentication {
            (None, None)
        } else {
            (
                Some(params.username.clone().unwrap_or_default()),
                Some(params.password.clone().unwrap_or_default()),
            )
        };

        let database = if select_database_at_connect && caps.requires_database_at_connect_time {
            params.database.clone().filter(|db| !db.is_empty())
        } else {
            None
        };

        let character_set = match backend {
            Backend::Mssql => {
                if let Some(charset) = &params.charset {
                    tracing::warn!(charset = %charset, "mssql backend ignores charset option");
                }
                None
            }
            Backend::SqlServer | Backend::Azure => Some(
                params
                    .charset
                    .clone()
                    .unwrap_or_else(|| "UTF-8".to_string()),
            ),
        };

        let multiple_active_result_sets =
            caps.supports_multiple_active_result_sets && params.multiple_active_result_sets;

        Self {
            server: params.server.clone(),
            uid,
            pwd,
            integrated_security: params.windows_authentication,
            database,
            character_set,
            multiple_active_result_sets,
            trust_server_certificate: params.trust_server_certificate,
        }
    }

    /// Instance name from a `host\instance` server string.
    #[must_use]
    pub fn instance_name(&self) -> Option<&str> {
        self.server
            .split_once('\\')
            .map(|(_, instance)| instance)
            .filter(|instance| !instance.is_empty())
    }

    /// Render as an ADO.NET style connection string.
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        let mut parts = vec![format!("Server={}", quote_value(&self.server))];
        if let Some(uid) = &self.uid {
            parts.push(format!("UID={}", quote_value(uid)));
        }
        if let Some(pwd) = &self.pwd {
            parts.push(format!("PWD={}", quote_value(pwd)));
        }
        if self.integrated_security {
            parts.push("Integrated Security=true".to_string());
        }
        if let Some(database) = &self.database {
            parts.push(format!("Database={}", quote_value(database)));
        }
        if let Some(charset) = &self.character_set {
            parts.push(format!("CharacterSet={}", quote_value(charset)));
        }
        parts.push(format!(
            "MultipleActiveResultSets={}",
            self.multiple_active_result_sets
        ));
        if self.trust_server_certificate {
            parts.push("TrustServerCertificate=true".to_string());
        }
        parts.join(";")
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("server", &self.server)
            .field("uid", &self.uid)
            .field("pwd", &self.pwd.as_ref().map(|_| "<redacted>"))
            .field("integrated_security", &self.integrated_security)
            .field("database", &self.database)
            .field("character_set", &self.character_set)
            .field("multiple_active_result_sets", &self.multiple_active_result_sets)
            .field("trust_server_certificate", &self.trust_server_certificate)
            .finish()
    }
}

fn quote_value(value: &str) -> String {
    if value.contains(';') || value.starts_with('"') || value.starts_with('\'') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
