//! Planner configuration from environment.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use trail_routing::{
    BRouterProvider, OpenRouteProvider, RoutingProvider, TurnByTurnProvider, BROUTER_DEFAULT_URL,
    CONTROL_TIMEOUT, OPENROUTE_DEFAULT_URL, OSRM_DEFAULT_URL,
};

use crate::surface::DisplaySurface;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("unknown routing provider '{0}' (expected brouter, openroute or osrm)")]
    UnknownProvider(String),

    #[error("no routing providers selected")]
    NoProviders,
}

/// Which backends to put in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    BRouter,
    OpenRoute,
    TurnByTurn,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::BRouter,
        ProviderKind::OpenRoute,
        ProviderKind::TurnByTurn,
    ];
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brouter" => Ok(ProviderKind::BRouter),
            "openroute" | "ors" | "openrouteservice" => Ok(ProviderKind::OpenRoute),
            "osrm" | "turn-by-turn" => Ok(ProviderKind::TurnByTurn),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub brouter_url: String,
    pub openroute_url: String,
    pub openroute_api_key: Option<String>,
    pub osrm_url: String,
    /// Transport timeout for the HTTP routers
    pub http_timeout: Duration,
    /// Pause between surface readiness and the first routing call
    pub settle_delay: Duration,
    /// Hard limit for the surface-bound router
    pub control_timeout: Duration,
    pub providers: Vec<ProviderKind>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            brouter_url: BROUTER_DEFAULT_URL.to_string(),
            openroute_url: OPENROUTE_DEFAULT_URL.to_string(),
            openroute_api_key: None,
            osrm_url: OSRM_DEFAULT_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            control_timeout: CONTROL_TIMEOUT,
            providers: ProviderKind::ALL.to_vec(),
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            brouter_url: env::var("TRAILMAP_BROUTER_URL").unwrap_or(defaults.brouter_url),
            openroute_url: env::var("TRAILMAP_ORS_URL").unwrap_or(defaults.openroute_url),
            openroute_api_key: env::var("TRAILMAP_ORS_API_KEY")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            osrm_url: env::var("TRAILMAP_OSRM_URL").unwrap_or(defaults.osrm_url),
            http_timeout: env::var("TRAILMAP_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            settle_delay: env::var("TRAILMAP_SETTLE_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle_delay),
            control_timeout: env::var("TRAILMAP_CONTROL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.control_timeout),
            providers: defaults.providers,
        }
    }

    /// Replace the provider chain from a comma-separated list.
    pub fn with_provider_list(mut self, list: &str) -> Result<Self, ConfigError> {
        let providers = parse_provider_list(list)?;
        if providers.is_empty() {
            return Err(ConfigError::NoProviders);
        }
        self.providers = providers;
        Ok(self)
    }

    pub fn http_client(&self) -> Result<Client, ConfigError> {
        Ok(Client::builder().timeout(self.http_timeout).build()?)
    }

    /// Build the configured providers. The surface-bound router gets a weak
    /// handle to `surface`.
    pub fn build_providers<S>(
        &self,
        surface: &Arc<S>,
    ) -> Result<Vec<Arc<dyn RoutingProvider>>, ConfigError>
    where
        S: DisplaySurface + ?Sized + 'static,
    {
        if self.providers.is_empty() {
            return Err(ConfigError::NoProviders);
        }
        let client = self.http_client()?;
        let providers = self
            .providers
            .iter()
            .map(|kind| -> Arc<dyn RoutingProvider> {
                match kind {
                    ProviderKind::BRouter => {
                        Arc::new(BRouterProvider::new(client.clone(), self.brouter_url.clone()))
                    }
                    ProviderKind::OpenRoute => Arc::new(OpenRouteProvider::new(
                        client.clone(),
                        self.openroute_url.clone(),
                        self.openroute_api_key.clone(),
                    )),
                    ProviderKind::TurnByTurn => Arc::new(
                        TurnByTurnProvider::new(Arc::downgrade(surface), self.osrm_url.clone())
                            .with_timeout(self.control_timeout),
                    ),
                }
            })
            .collect();
        Ok(providers)
    }
}

fn parse_provider_list(list: &str) -> Result<Vec<ProviderKind>, ConfigError> {
    let mut kinds = Vec::new();
    for item in list.split(',').filter(|item| !item.trim().is_empty()) {
        let kind: ProviderKind = item.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}
