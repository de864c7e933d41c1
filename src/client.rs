use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::config::Config;
use crate::model::{Prediction, RiskInput};

/// The `/predict` network boundary. Implementations perform exactly one
/// request per call; there is no retry.
#[async_trait]
pub trait PredictClient {
    async fn predict(&self, input: &RiskInput) -> Result<Prediction>;

    fn endpoint(&self) -> &str;
}

pub struct HttpPredictClient {
    client: Client,
    url: Url,
}

impl HttpPredictClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let url = Url::parse(&cfg.predict_url)
            .with_context(|| format!("invalid PREDICT_URL {}", cfg.predict_url))?;
        let client = Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .context("building http client")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl PredictClient for HttpPredictClient {
    async fn predict(&self, input: &RiskInput) -> Result<Prediction> {
        let resp = self
            .client
            .post(self.url.clone())
            .json(input)
            .send()
            .await
            .with_context(|| format!("POST {}", self.url))?;

        let status = resp.status();
        let bytes = resp.bytes().await.context("reading predict response")?;
        let prediction = Prediction::from_slice(&bytes);

        // The backend reports model failures as HTTP 500 with an `error` body.
        if !status.is_success() && !matches!(prediction, Ok(Prediction::Rejected(_))) {
            return Err(anyhow!("predict failed with HTTP {}", status.as_u16()));
        }
        prediction.with_context(|| format!("decoding predict response (HTTP {})", status.as_u16()))
    }

    fn endpoint(&self) -> &str {
        self.url.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_url() {
        let cfg = Config {
            predict_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(HttpPredictClient::new(&cfg).is_err());
    }

    #[test]
    fn endpoint_reflects_config() {
        let cfg = Config {
            predict_url: "http://localhost:9000/predict".to_string(),
            ..Config::default()
        };
        let client = HttpPredictClient::new(&cfg).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9000/predict");
    }
}
