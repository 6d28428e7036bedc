//! Review harvest command implementation.

use crate::amazon::models::HarvestResponse;
use crate::amazon::{AmazonClient, PageSource};
use crate::config::Config;
use crate::format::Formatter;
use crate::harvest::HarvestWalker;
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Result of a harvest command: the response and its rendering.
#[derive(Debug, Clone)]
pub struct HarvestOutput {
    pub response: HarvestResponse,
    pub rendered: String,
    /// Status line for formats whose rendering leaves it out (CSV)
    pub status_line: Option<String>,
}

/// Harvests the 5-star reviews of one product.
pub struct HarvestCommand {
    config: Config,
}

impl HarvestCommand {
    /// Creates a new harvest command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the harvest and returns formatted output.
    pub async fn execute(&self, product: &str, cancel: CancellationToken) -> Result<HarvestOutput> {
        let client =
            AmazonClient::new(&self.config).await.context("Failed to create HTTP client")?;

        self.execute_with_client(&client, product, cancel).await
    }

    /// Runs the harvest with a provided client (for testing).
    pub async fn execute_with_client(
        &self,
        client: &impl PageSource,
        product: &str,
        cancel: CancellationToken,
    ) -> Result<HarvestOutput> {
        let product_url = product_url(product)?;
        info!("Harvesting 5-star reviews for {}", product_url);

        // Deadline cancels the walk between pages
        let deadline = self.config.timeout().map(|timeout| {
            debug!("Harvest deadline: {:?}", timeout);
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                token.cancel();
            })
        });

        let outcome =
            HarvestWalker::new(client).with_cancellation(cancel).harvest(&product_url).await;

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        let response = HarvestResponse::from_outcome(outcome);
        info!("{}", response.message);

        let formatter = Formatter::new(self.config.format);
        let rendered = formatter.format_response(&response);
        let status_line =
            (!formatter.carries_status()).then(|| formatter.status_line(&response));
        Ok(HarvestOutput { response, rendered, status_line })
    }
}

/// Accepts a product page URL or a bare ASIN.
fn product_url(product: &str) -> Result<String> {
    let product = product.trim();

    if product.starts_with("http://") || product.starts_with("https://") {
        url::Url::parse(product).with_context(|| format!("Invalid product URL: '{}'", product))?;
        return Ok(product.to_string());
    }

    // ASIN: 10 alphanumeric characters
    let asin = product.to_uppercase();
    if asin.len() != 10 || !asin.chars().all(|c| c.is_ascii_alphanumeric()) {
        anyhow::bail!(
            "Invalid product: '{}'. Pass a product page URL or a 10-character ASIN.",
            product
        );
    }

    Ok(format!("https://www.amazon.com/dp/{}", asin))
}
