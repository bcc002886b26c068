//! This module provides the main entry point for interacting with a CKAN data portal.
//! It lists the portal's datasets, looks single packages up and hands out
//! lazily loaded datasets.

use crate::catalog::fetcher::CatalogFetcher;
use crate::config::ClientConfig;
use crate::error::OpenDataError;
use crate::package::{api_error_message, Package, PackageLookup};
use crate::types::catalog::{Catalog, CatalogView};
use crate::utils::download_unchecked;
use bon::bon;
use log::{debug, error, info};
use polars::prelude::DataFrame;
use reqwest::Client;
use serde_json::Value;
use std::collections::{hash_map::Entry, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

const PACKAGE_SHOW_ACTION: &str = "package_show";

/// The main client for a CKAN open data portal, by default the one of Stadt Zürich.
///
/// The catalog is fetched on first use and kept in memory, as is every derived
/// view ([`OpenDataZh::csv_catalog`], ...). Call [`OpenDataZh::refresh`] to
/// fetch it again or [`OpenDataZh::invalidate`] to just forget it.
///
/// Requests use reqwest's default settings, in particular no request timeout
/// is configured. Pass a preconfigured client to [`OpenDataZh::with_client`]
/// to change that.
///
/// # Examples
///
/// ```no_run
/// # use opendata_zh::{OpenDataZh, OpenDataError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), OpenDataError> {
/// let client = OpenDataZh::new();
///
/// let catalog = client.csv_catalog().await?;
/// println!("{} datasets offer a CSV download", catalog.len());
/// # Ok(())
/// # }
/// ```
pub struct OpenDataZh {
    config: Arc<ClientConfig>,
    client: Client,
    fetcher: CatalogFetcher,
    catalog: Mutex<Option<Arc<Catalog>>>,
    views: Mutex<HashMap<CatalogView, Arc<Catalog>>>,
}

impl Default for OpenDataZh {
    fn default() -> Self {
        Self::new()
    }
}

#[bon]
impl OpenDataZh {
    /// Creates a client for the Stadt Zürich portal with default settings.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client for the portal described by `config`.
    ///
    /// # Examples
    ///
    /// ```
    /// use opendata_zh::{ClientConfig, OpenDataZh};
    ///
    /// let client = OpenDataZh::with_config(
    ///     ClientConfig::builder()
    ///         .api_base("https://ckan.example.org/api/3/action")
    ///         .build(),
    /// );
    /// assert_eq!(client.config().page_size, 500);
    /// ```
    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Creates a client that sends its requests through `client`.
    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        let fetcher = CatalogFetcher::new(client.clone(), &config);
        Self {
            config: Arc::new(config),
            client,
            fetcher,
            catalog: Mutex::new(None),
            views: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Name of the organisation publishing the data.
    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    /// All datasets of the portal, sorted by name.
    ///
    /// The first call pages through the listing endpoint; later calls return
    /// the same `Arc` without any request. A failed build leaves nothing
    /// cached, so the next call starts over.
    ///
    /// # Errors
    ///
    /// Returns [`OpenDataError::Catalog`] if any page fails to download or parse.
    pub async fn catalog(&self) -> Result<Arc<Catalog>, OpenDataError> {
        let mut cached = self.catalog.lock().await;
        if let Some(catalog) = cached.as_ref() {
            debug!("Catalog cache hit ({} datasets)", catalog.len());
            return Ok(catalog.clone());
        }

        info!("Fetching catalog from {}", self.config.api_base);
        let catalog = Arc::new(self.fetcher.fetch_all().await?);
        *cached = Some(catalog.clone());
        Ok(catalog)
    }

    /// Datasets with at least one `CSV` distribution, each limited to those distributions.
    pub async fn csv_catalog(&self) -> Result<Arc<Catalog>, OpenDataError> {
        self.catalog_view(CatalogView::Csv).await
    }

    /// Datasets with at least one `CSV` or `parquet` distribution.
    pub async fn tabular_catalog(&self) -> Result<Arc<Catalog>, OpenDataError> {
        self.catalog_view(CatalogView::Tabular).await
    }

    /// Datasets with at least one `WFS` distribution.
    pub async fn geo_catalog(&self) -> Result<Arc<Catalog>, OpenDataError> {
        self.catalog_view(CatalogView::Geo).await
    }

    /// A filtered view of the catalog, derived once and then served from memory.
    pub async fn catalog_view(&self, view: CatalogView) -> Result<Arc<Catalog>, OpenDataError> {
        {
            let views = self.views.lock().await;
            if let Some(cached) = views.get(&view) {
                debug!("Cache hit for {} catalog view", view);
                return Ok(cached.clone());
            }
        }

        // May fetch; the views lock is not held meanwhile.
        let catalog = self.catalog().await?;
        let filtered = Arc::new(catalog.filtered(view));

        let mut views = self.views.lock().await;
        match views.entry(view) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                info!(
                    "{} of {} datasets kept in {} view",
                    filtered.len(),
                    catalog.len(),
                    view
                );
                // Skip caching a view of a catalog invalidated in the meantime.
                if self.is_current(&catalog).await {
                    entry.insert(filtered.clone());
                }
                Ok(filtered)
            }
        }
    }

    async fn is_current(&self, catalog: &Arc<Catalog>) -> bool {
        self.catalog
            .lock()
            .await
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, catalog))
    }

    /// The catalog as a Polars table, one row per dataset.
    pub async fn catalog_frame(&self) -> Result<DataFrame, OpenDataError> {
        let catalog = self.catalog().await?;
        Ok(catalog.to_frame()?)
    }

    /// Whether a catalog is currently held in memory.
    pub async fn is_catalog_loaded(&self) -> bool {
        self.catalog.lock().await.is_some()
    }

    /// Forgets the catalog and all views; the next access fetches again.
    pub async fn invalidate(&self) {
        self.catalog.lock().await.take();
        self.views.lock().await.clear();
    }

    /// Drops everything cached and fetches the catalog again right away.
    pub async fn refresh(&self) -> Result<Arc<Catalog>, OpenDataError> {
        self.invalidate().await;
        self.catalog().await
    }

    /// Fetches the full metadata of one package by id or name.
    ///
    /// Returns `Ok(None)`, after logging why, when neither `id` nor `name` is
    /// given (no request is made) or when the portal reports a failure. Use
    /// [`OpenDataZh::lookup_package`] to get at the portal's message.
    ///
    /// # Errors
    ///
    /// Transport failures and unparsable responses are returned as [`OpenDataError`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use opendata_zh::{OpenDataZh, OpenDataError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), OpenDataError> {
    /// let client = OpenDataZh::new();
    /// let package = client
    ///     .get_package()
    ///     .name("bau_hae_lima_zuordnung_adr_quartier_bzo16_bzo99_od5143")
    ///     .call()
    ///     .await?;
    ///
    /// if let Some(dataset) = package.and_then(|p| p.tabular_dataset(0)) {
    ///     if let Some(frame) = dataset.frame().await? {
    ///         println!("{}", frame.head(Some(5)));
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn get_package(
        &self,
        id: Option<&str>,
        name: Option<&str>,
    ) -> Result<Option<Package>, OpenDataError> {
        let lookup = self
            .lookup_package()
            .maybe_id(id)
            .maybe_name(name)
            .call()
            .await?;
        Ok(lookup.into_package())
    }

    /// Like [`OpenDataZh::get_package`], but tells apart why no package was returned.
    ///
    /// The id is used when both id and name are given.
    #[builder]
    pub async fn lookup_package(
        &self,
        id: Option<&str>,
        name: Option<&str>,
    ) -> Result<PackageLookup, OpenDataError> {
        let Some(identifier) = id.or(name) else {
            error!("Please provide either an id or a name.");
            return Ok(PackageLookup::MissingIdentifier);
        };

        let url = format!("{}/{}", self.config.api_base, PACKAGE_SHOW_ACTION);
        let body =
            download_unchecked::<OpenDataError>(&self.client, &url, &[("id", identifier)]).await?;
        let response: Value =
            serde_json::from_slice(&body).map_err(|e| OpenDataError::JsonParse(url.clone(), e))?;

        if !response
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            let message = api_error_message(&response);
            error!("Package '{}' could not be retrieved: {}", identifier, message);
            return Ok(PackageLookup::Rejected(message));
        }

        let result = response
            .get("result")
            .ok_or_else(|| OpenDataError::MissingResult(url.clone()))?;
        let package = Package::from_result(result, self.client.clone(), self.config.clone())
            .map_err(|e| OpenDataError::PackageMapping(url, e))?;
        info!(
            "Package '{}' has {} distribution(s)",
            package.name(),
            package.distributions().len()
        );
        Ok(PackageLookup::Found(Box::new(package)))
    }
}
