use std::{fs, io, path::Path};

use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// A secret could be found neither in the environment nor in its fallback file.
#[derive(Debug, Error)]
pub enum SecretLookupError {
    /// The variable is unset and no fallback file was configured.
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),

    /// The fallback file could not be read.
    #[error("Failed to read secret file {path}: {source}")]
    Unreadable { path: String, source: io::Error },

    /// The fallback file exists but holds nothing after trimming.
    #[error("Secret file {0} is empty")]
    Empty(String),
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Reads a secret from `name`, falling back to the trimmed contents of `file`.
///
/// Empty environment values count as unset.
pub fn env_var_or_file(name: &str, file: Option<&Path>) -> Result<String, SecretLookupError> {
    if let Ok(value) = get_env_var(name) {
        let value = value.trim();
        if !value.is_empty() {
            return Ok(value.to_string());
        }
    }

    let Some(path) = file else {
        return Err(MissingEnvVarError(name.to_string()).into());
    };
    let raw = fs::read_to_string(path).map_err(|source| SecretLookupError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    let secret = raw.trim();
    if secret.is_empty() {
        return Err(SecretLookupError::Empty(path.display().to_string()));
    }
    Ok(secret.to_string())
}
