use crate::catalog::error::CatalogError;
use crate::config::ClientConfig;
use crate::types::catalog::{Catalog, CatalogRecord};
use crate::utils::download;
use log::info;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

const PACKAGE_LIST_ACTION: &str = "current_package_list_with_resources";

/// Pages through the portal's package listing and assembles the [`Catalog`].
pub struct CatalogFetcher {
    client: Client,
    api_base: String,
    page_size: usize,
    page_delay: Duration,
}

impl CatalogFetcher {
    pub fn new(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            // A zero limit would never advance the offset.
            page_size: config.page_size.max(1),
            page_delay: config.page_delay,
        }
    }

    /// Requests pages of `page_size` packages until one comes back empty.
    ///
    /// Pages are fetched strictly one after another with `page_delay` in
    /// between. The first failing page aborts the whole build; nothing fetched
    /// up to that point is kept.
    pub async fn fetch_all(&self) -> Result<Catalog, CatalogError> {
        let mut offset = 0;
        let mut records = Vec::new();

        loop {
            let page = self.fetch_page(offset).await?;
            info!("{} packages retrieved.", page.len());
            if page.is_empty() {
                break;
            }
            records.extend(page);
            offset += self.page_size;
            sleep(self.page_delay).await;
        }

        let catalog = Catalog::from_records(records);
        info!("Catalog assembled with {} datasets", catalog.len());
        Ok(catalog)
    }

    /// Fetches and maps a single page of the listing.
    pub async fn fetch_page(&self, offset: usize) -> Result<Vec<CatalogRecord>, CatalogError> {
        let url = format!("{}/{}", self.api_base, PACKAGE_LIST_ACTION);
        let limit = self.page_size.to_string();
        let offset_param = offset.to_string();

        let body = download::<CatalogError>(
            &self.client,
            &url,
            &[("limit", limit.as_str()), ("offset", offset_param.as_str())],
        )
        .await?;

        let response: Value =
            serde_json::from_slice(&body).map_err(|e| CatalogError::JsonParse(url.clone(), e))?;
        let packages = response
            .get("result")
            .and_then(Value::as_array)
            .ok_or_else(|| CatalogError::MissingResult(url.clone()))?;

        packages
            .iter()
            .enumerate()
            .map(|(index, package)| {
                CatalogRecord::from_package_json(package).map_err(|source| {
                    CatalogError::RecordMapping {
                        offset,
                        index,
                        source,
                    }
                })
            })
            .collect()
    }
}
