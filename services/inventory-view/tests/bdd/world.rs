//! BDD test world for the inventory view

use std::collections::HashMap;
use std::sync::Arc;

use cucumber::World;
use tokio::sync::RwLock;

use inventory_view::io::{HttpClient, HttpResponse};
use inventory_view::{
    InventoryController, InventoryError, MutationReport, RefreshOutcome, Variant,
};

/// A recorded HTTP request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<String>,
}

type Canned = Result<HttpResponse, String>;

/// An HTTP client that answers from canned responses keyed by path and records every request
#[derive(Debug, Default, Clone)]
pub struct ScriptedHttpClient {
    pub responses: Arc<RwLock<HashMap<String, Canned>>>,
    pub requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl ScriptedHttpClient {
    pub async fn respond(&self, path: &str, response: Canned) {
        self.responses
            .write()
            .await
            .insert(path.to_string(), response);
    }

    pub async fn count(&self, method: &str, path: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    async fn answer(
        &self,
        method: &str,
        url: &str,
        body: Option<String>,
    ) -> inventory_view::Result<HttpResponse> {
        let path = url.rsplit('/').next().unwrap_or_default().to_string();
        self.requests.write().await.push(RecordedRequest {
            method: method.to_string(),
            path: path.clone(),
            body,
        });

        match self.responses.read().await.get(&path) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(msg)) => Err(InventoryError::Transport(msg.clone())),
            None => Ok(HttpResponse {
                status: 200,
                body: String::new(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, url: &str) -> inventory_view::Result<HttpResponse> {
        self.answer("GET", url, None).await
    }

    async fn post_body(&self, url: &str, body: String) -> inventory_view::Result<HttpResponse> {
        self.answer("POST", url, Some(body)).await
    }

    async fn delete(&self, url: &str) -> inventory_view::Result<HttpResponse> {
        self.answer("DELETE", url, None).await
    }
}

#[derive(Debug, Default, World)]
pub struct InventoryWorld {
    pub variant: Option<Variant>,
    pub client: ScriptedHttpClient,
    pub controller: Option<Arc<InventoryController>>,
    pub refresh: Option<RefreshOutcome>,
    pub report: Option<MutationReport>,
}

impl InventoryWorld {
    pub fn controller(&self) -> &Arc<InventoryController> {
        self.controller.as_ref().expect("inventory view not set")
    }
}
