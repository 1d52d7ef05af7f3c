use crate::config::Provider;
use crate::converters::helpers::truncate;
use crate::error::GatewayError;
use crate::llm_client::LlmClient;
use crate::models::PromptRequest;
use crate::request_id::RequestId;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub enum CheckOutcome {
    Ok { latency: Duration },
    /// No credential configured, so nothing was sent
    Skipped(String),
    Failed(GatewayError),
}

pub async fn check_provider(client: &LlmClient, provider: Provider) -> CheckOutcome {
    let request = PromptRequest::new("ping").with_temperature(0.0).with_max_tokens(1);
    let req_id = RequestId::generate();
    let started = Instant::now();
    match client.invoke(provider, &request, Some(&req_id)).await {
        Ok(_) => CheckOutcome::Ok { latency: started.elapsed() },
        Err(e @ GatewayError::MissingCredential(_)) => CheckOutcome::Skipped(e.to_string()),
        Err(e) => CheckOutcome::Failed(e),
    }
}

/// Sends a one-token prompt to every provider and prints one line each.
pub async fn perform_provider_checks(llm_client: &Arc<LlmClient>) -> Vec<(Provider, CheckOutcome)> {
    println!("Checking providers ({} total):", Provider::ALL.len());
    let client = llm_client.clone();
    let results: Vec<(Provider, CheckOutcome)> = stream::iter(Provider::ALL)
        .map(|provider| {
            let client = client.clone();
            async move { (provider, check_provider(&client, provider).await) }
        })
        .buffer_unordered(Provider::ALL.len())
        .collect()
        .await;

    for (provider, outcome) in &results {
        let model = &llm_client.config().settings(*provider).model;
        match outcome {
            CheckOutcome::Ok { latency } => {
                println!("[OK] {} -> {} ({} ms)", provider, model, latency.as_millis())
            }
            CheckOutcome::Skipped(reason) => println!("[SKIP] {} -> {}: {}", provider, model, reason),
            CheckOutcome::Failed(e) => {
                println!("[FAIL] {} -> {}\n  {}", provider, model, truncate(&e.to_string(), 500))
            }
        }
    }
    results
}
