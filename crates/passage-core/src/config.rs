/// Failure to deserialize the process environment into a config struct.
#[derive(Debug, thiserror::Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(#[from] envy::Error);

/// Trait for loading service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize` (field names map to upper-case
/// env vars) and call `Config::from_env()` once at startup. A `.env` file in
/// the working directory is read first when present; real env vars win.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case in containers.
        let _ = dotenvy::dotenv();
        Ok(envy::from_env()?)
    }

    /// Load from an explicit key/value iterator. Used by tests.
    fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }
}
