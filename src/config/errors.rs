use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config error: batch size must be greater than zero")]
    ZeroBatchSize,
    #[error("Config error: worker count must be greater than zero")]
    ZeroWorkers,
    #[error("Config error: unknown extraction strategy [{0}]")]
    UnknownTier(String)
}
