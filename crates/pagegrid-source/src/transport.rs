use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::config::{Credentials, TransportConfig};
use crate::error::TransportError;

/// GET-JSON access to the remote resource.
///
/// `segments` are appended to the resource's base URI as path segments and
/// `query` is sent as percent-encoded query parameters.
pub trait Transport: Send + Sync + 'static {
    fn get_json(
        &self,
        segments: &[&str],
        query: Vec<(String, String)>,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// [`Transport`] backed by a blocking `ureq` agent.
///
/// Each request runs on tokio's blocking pool so callers can await it from
/// the async loaders. Cloning shares the agent and its connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    config: Arc<TransportConfig>,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.config.base_url.trim_end_matches('/').to_string();
        for segment in segments {
            url.push('/');
            url.push_str(segment.trim_matches('/'));
        }
        url
    }
}

impl Transport for HttpTransport {
    async fn get_json(
        &self,
        segments: &[&str],
        query: Vec<(String, String)>,
    ) -> Result<Value, TransportError> {
        let url = self.url(segments);
        let agent = self.agent.clone();
        let config = Arc::clone(&self.config);
        trace!(%url, params = query.len(), "GET");

        tokio::task::spawn_blocking(move || {
            let mut request = agent.get(&url).query_pairs(query);
            match &config.credentials {
                Credentials::None => {}
                Credentials::Bearer { token } => {
                    request = request.header("Authorization", format!("Bearer {token}"));
                }
                Credentials::Header { name, value } => {
                    request = request.header(name.as_str(), value.as_str());
                }
            }
            let mut response = request.call()?;
            let body = response.body_mut().read_json::<Value>()?;
            Ok::<_, TransportError>(body)
        })
        .await
        .map_err(|e| TransportError::Join(e.to_string()))?
    }
}
