use crate::dataset::error::DatasetError;
use crate::dataset::resolver::load_dataset;
use crate::types::distribution::Distribution;
use log::debug;
use polars::prelude::DataFrame;
use reqwest::Client;
use tokio::sync::OnceCell;

/// One distribution of a package, loaded into a `DataFrame` on first access.
///
/// The loaded table (or the "no data" outcome for unsupported formats) is kept
/// for the lifetime of the `Dataset`; [`Dataset::invalidate`] forgets it.
#[derive(Debug)]
pub struct Dataset {
    index: usize,
    distribution: Distribution,
    client: Client,
    frame: OnceCell<Option<DataFrame>>,
}

impl Dataset {
    pub(crate) fn new(index: usize, distribution: Distribution, client: Client) -> Self {
        Self {
            index,
            distribution,
            client,
            frame: OnceCell::new(),
        }
    }

    /// Position of the distribution in the list it was selected from.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn url(&self) -> &str {
        &self.distribution.url
    }

    /// The distribution's content, downloaded and parsed on the first call.
    ///
    /// `Ok(None)` means the URL has no csv or parquet extension.
    pub async fn frame(&self) -> Result<Option<&DataFrame>, DatasetError> {
        if self.frame.initialized() {
            debug!("Using loaded frame for {}", self.distribution.url);
        }
        let frame = self
            .frame
            .get_or_try_init(|| load_dataset(&self.client, &self.distribution.url))
            .await?;
        Ok(frame.as_ref())
    }

    /// Drops the loaded frame so the next [`Dataset::frame`] call downloads again.
    pub fn invalidate(&mut self) {
        self.frame.take();
    }
}
