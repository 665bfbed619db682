use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_PAGES: u32 = 1000;

/// Client for the external fraud verdict feed
pub struct FraudFeedClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FeedPage {
    pub verdicts: Vec<FraudVerdict>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// One classifier decision about an account
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FraudVerdict {
    pub identity: String,
    pub is_fraud: bool,
}

impl FraudFeedClient {
    pub fn new(endpoint: String, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Fetch every verdict, following pages until one comes back empty
    pub async fn fetch_verdicts(&self) -> Result<Vec<FraudVerdict>> {
        let mut verdicts = Vec::new();
        let mut page = 1;

        loop {
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[("api_key", &self.api_key), ("page", &page.to_string())])
                .send()
                .await
                .context("Failed to send request to fraud feed")?;

            if !response.status().is_success() {
                bail!("Fraud feed returned error status: {}", response.status());
            }

            let data = response
                .json::<FeedPage>()
                .await
                .context("Failed to parse JSON response from fraud feed")?;

            if data.verdicts.is_empty() {
                break;
            }
            verdicts.extend(data.verdicts);

            page += 1;
            if page > MAX_PAGES {
                bail!("Too many pages (>{}), possible infinite loop", MAX_PAGES);
            }
        }

        Ok(verdicts)
    }
}
