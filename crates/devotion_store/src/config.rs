use crate::StoreError;
use secrecy::SecretString;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: SecretString,
    pub base_url: String,
    pub schema: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function. This avoids mutating global environment in tests and keeps
    /// `from_env()` small and safe.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, StoreError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let api = get("DEVOTION_DB_API_KEY")
            .ok_or_else(|| StoreError::Config("DEVOTION_DB_API_KEY missing".into()))?;
        let base_url = get("DEVOTION_DB_URL")
            .ok_or_else(|| StoreError::Config("DEVOTION_DB_URL missing".into()))?;
        let schema = get("DEVOTION_DB_SCHEMA");
        Ok(Self {
            api_key: SecretString::new(api.into()),
            base_url,
            schema,
        })
    }
}
