use crate::config::Provider;
use crate::error::GatewayError;
use crate::llm_client::LlmClient;
use crate::models::{CanonicalResult, Completion, PromptRequest};
use crate::request_id::RequestId;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// What one provider produced for one request.
#[derive(Debug)]
pub struct ProviderOutcome {
    pub provider: Provider,
    pub latency: Duration,
    pub result: Result<Completion, GatewayError>,
}

impl ProviderOutcome {
    pub fn latency_ms(&self) -> u64 {
        self.latency.as_millis() as u64
    }

    pub fn to_canonical(&self) -> CanonicalResult {
        CanonicalResult::new(self.provider, &self.result, self.latency_ms())
    }
}

/// Fans a prompt out to the configured providers.
///
/// Each provider call runs in its own task: a slow, failing or panicking
/// adapter cannot delay, cancel or corrupt another provider's outcome.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Arc<LlmClient>,
    providers: Vec<Provider>,
}

impl Dispatcher {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self::with_providers(client, Provider::ALL.to_vec())
    }

    pub fn with_providers(client: Arc<LlmClient>, providers: Vec<Provider>) -> Self {
        Self { client, providers }
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub async fn dispatch(
        &self,
        provider: Provider,
        request: Arc<PromptRequest>,
        request_id: Option<RequestId>,
    ) -> ProviderOutcome {
        let started = Instant::now();
        let client = self.client.clone();
        let task = tokio::spawn(async move {
            client.invoke(provider, &request, request_id.as_ref()).await
        });
        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("{} adapter task failed: {}", provider, e);
                Err(GatewayError::Internal(format!("{} adapter task failed", provider)))
            }
        };
        let outcome = ProviderOutcome { provider, latency: started.elapsed(), result };
        match &outcome.result {
            Ok(_) => info!("{} settled in {} ms", provider, outcome.latency_ms()),
            Err(e) => info!("{} failed after {} ms: {}", provider, outcome.latency_ms(), e),
        }
        outcome
    }

    /// All providers at once; outcomes are yielded in settle order.
    pub fn fan_out_unordered(
        &self,
        request: PromptRequest,
        request_id: Option<RequestId>,
    ) -> FuturesUnordered<BoxFuture<'static, ProviderOutcome>> {
        let request = Arc::new(request);
        self.providers
            .iter()
            .map(|&provider| {
                let this = self.clone();
                let request = request.clone();
                let request_id = request_id.clone();
                let fut: BoxFuture<'static, ProviderOutcome> =
                    Box::pin(async move { this.dispatch(provider, request, request_id).await });
                fut
            })
            .collect()
    }

    /// All providers at once; returns when every one has settled, in provider order.
    pub async fn fan_out(&self, request: PromptRequest, request_id: Option<RequestId>) -> Vec<ProviderOutcome> {
        let mut outcomes: Vec<ProviderOutcome> = self.fan_out_unordered(request, request_id).collect().await;
        outcomes.sort_by_key(|o| o.provider);
        outcomes
    }
}
