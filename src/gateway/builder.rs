//! Builder for configuring gateway instances

use std::sync::Arc;
use std::time::Duration;

use super::Router;
use crate::cache::{CacheConfig, ResponseCache};
use crate::catalog::ModelCatalog;
use crate::config::{Config, ProviderAuth, Secrets};
use crate::providers::{
    BedrockClient, BedrockSdkClient, DEFAULT_TIMEOUT, ModelProvider, ProviderAdapter,
};
use crate::stats::MetricsAggregator;
use crate::{HermodError, Result};

/// Main entry point for creating gateway instances.
pub struct Hermod;

impl Hermod {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> HermodBuilder {
        HermodBuilder::new()
    }
}

/// Builder for configuring gateway instances.
///
/// ```rust,no_run
/// use hermod::{Hermod, Message};
///
/// # async fn run() -> hermod::Result<()> {
/// let router = Hermod::builder()
///     .bedrock("us-east-1", "bedrock-api-key")
///     .build()?;
///
/// let response = router
///     .route("nova-lite", &[Message::user("Say hello")], 0.7, 50)
///     .await?;
/// println!("{} (${})", response.content, response.estimated_cost_usd);
/// # Ok(())
/// # }
/// ```
pub struct HermodBuilder {
    catalog: Option<ModelCatalog>,
    provider: Option<Arc<dyn ModelProvider>>,
    cache_config: Option<CacheConfig>,
    timeout: Duration,
}

impl Default for HermodBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HermodBuilder {
    pub fn new() -> Self {
        Self {
            catalog: None,
            provider: None,
            cache_config: Some(CacheConfig::default()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builder wired from loaded configuration and secrets.
    ///
    /// `iam` auth builds an AWS SDK client from the configured key pair or
    /// the default credential chain; `api_key` auth builds the bearer-token
    /// client. Fails when `api_key` auth has no key or the configured catalog
    /// cannot be loaded.
    pub async fn from_config(config: &Config, secrets: &Secrets) -> Result<Self> {
        let provider = &config.provider;
        let builder = match provider.auth {
            ProviderAuth::Iam => {
                let credentials = secrets.aws_credentials().map(|c| c.to_credentials());
                Self::new().provider(
                    BedrockSdkClient::connect(
                        &provider.region,
                        credentials,
                        provider.endpoint.as_deref(),
                    )
                    .await,
                )
            }
            ProviderAuth::ApiKey => {
                let api_key = secrets.api_key().ok_or_else(|| {
                    HermodError::Configuration(
                        "no Bedrock API key. Set AWS_BEARER_TOKEN_BEDROCK or add [bedrock] api_key to ~/.hermod/secrets.toml"
                            .to_string(),
                    )
                })?;
                let client = match &provider.endpoint {
                    Some(endpoint) => BedrockClient::with_base_url(api_key, endpoint.clone()),
                    None => BedrockClient::new(&provider.region, api_key),
                };
                Self::new().provider(client)
            }
        };

        let mut builder = builder.timeout(provider.timeout());

        builder = match config.cache.to_cache_config() {
            Some(cache) => builder.response_cache(cache),
            None => builder.disable_response_cache(),
        };

        if let Some(path) = &config.catalog_path {
            builder = builder.catalog(ModelCatalog::from_path(path)?);
        }

        Ok(builder)
    }

    /// Replace the embedded model catalog.
    pub fn catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the model provider.
    pub fn provider(self, provider: impl ModelProvider + 'static) -> Self {
        self.shared_provider(Arc::new(provider))
    }

    /// Set an already shared model provider.
    pub fn shared_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use the Bedrock runtime endpoint for `region` with an API key.
    pub fn bedrock(self, region: &str, api_key: impl Into<String>) -> Self {
        self.provider(BedrockClient::new(region, api_key))
    }

    /// Configure the response cache. The cache is on by default.
    pub fn response_cache(mut self, config: CacheConfig) -> Self {
        self.cache_config = Some(config);
        self
    }

    /// Route every request to the provider.
    pub fn disable_response_cache(mut self) -> Self {
        self.cache_config = None;
        self
    }

    /// Upper bound on a single provider call (default: 60s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the router.
    ///
    /// Returns an error if no provider is configured.
    pub fn build(self) -> Result<Router> {
        let provider = self.provider.ok_or_else(|| {
            HermodError::Configuration("no model provider configured".to_string())
        })?;

        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => ModelCatalog::embedded()?,
        };

        let cache = self
            .cache_config
            .as_ref()
            .map(|config| Arc::new(ResponseCache::new(config)));

        Ok(Router::new(
            Arc::new(catalog),
            cache,
            Arc::new(MetricsAggregator::new()),
            ProviderAdapter::with_timeout(provider, self.timeout),
        ))
    }
}
