use crate::Result;
use crate::facts::{BenchmarkSource, DefinitionSource, DistributionPoint, TrendSeries};
use crate::metrics::{MetricDefinition, Timeframe};
use ohno::{IntoAppError, app_err};
use serde::de::DeserializeOwned;
use url::Url;

const LOG_TARGET: &str = "      http";

/// Talks to a benchmark service exposing the catalog, distributions and trends as JSON.
///
/// ```text
/// GET {base}/definitions
/// GET {base}/distributions/{metric_id}/{peer_group_id}
/// GET {base}/trends/{metric_id}/{timeframe}
/// ```
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).into_app_err_with(|| format!("invalid provider URL '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(app_err!("provider URL '{base_url}' cannot be used as a base URL"));
        }

        let client = reqwest::Client::builder()
            .user_agent("peerbench")
            .build()
            .into_app_err("unable to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        let _ = url
            .path_segments_mut()
            .map_err(|()| app_err!("provider URL '{}' cannot be used as a base URL", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        log::debug!(target: LOG_TARGET, "GET {url}");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .into_app_err_with(|| format!("sending HTTP request to {url}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(app_err!("unexpected HTTP status {status} from {url}"));
        }

        response
            .json::<T>()
            .await
            .into_app_err_with(|| format!("decoding response from {url}"))
    }
}

impl DefinitionSource for HttpProvider {
    async fn fetch_definitions(&self) -> Result<Vec<MetricDefinition>> {
        self.get_json(&["definitions"]).await
    }
}

impl BenchmarkSource for HttpProvider {
    async fn fetch_distribution(&self, metric_id: &str, peer_group_id: &str) -> Result<DistributionPoint> {
        self.get_json(&["distributions", metric_id, peer_group_id]).await
    }

    async fn fetch_trend(&self, metric_id: &str, timeframe: Timeframe) -> Result<TrendSeries> {
        let timeframe = timeframe.to_string();
        self.get_json(&["trends", metric_id, &timeframe]).await
    }
}
