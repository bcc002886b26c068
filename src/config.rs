//! Connection settings for a CKAN data portal.
//!
//! The defaults point at the Stadt Zürich open data portal. Every field can be
//! overridden through [`ClientConfig::builder()`], which is mostly useful for
//! pointing the client at a different CKAN instance (or a local mock server).

use bon::Builder;
use std::time::Duration;

/// Display name of the default data provider.
pub const DEFAULT_PROVIDER: &str = "OpenDataZurich";
/// Base link under which every dataset has a human readable page.
pub const DEFAULT_PORTAL_BASE: &str = "https://data.stadt-zuerich.ch/dataset/";
/// Base of the CKAN action API.
pub const DEFAULT_API_BASE: &str = "https://data.stadt-zuerich.ch/api/3/action";
/// Base of the WFS geoportal serving the geo distributions.
pub const DEFAULT_WFS_BASE: &str = "https://www.ogd.stadt-zuerich.ch/wfs/geoportal";
/// Number of packages requested per catalog page.
pub const DEFAULT_PAGE_SIZE: usize = 500;
/// Pause between two catalog page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(2);

/// Settings used by [`OpenDataZh`](crate::OpenDataZh).
///
/// # Examples
///
/// ```
/// use opendata_zh::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .api_base("http://localhost:5000/api/3/action")
///     .page_size(100)
///     .page_delay(Duration::ZERO)
///     .build();
///
/// assert_eq!(config.page_size, 100);
/// assert_eq!(config.provider, "OpenDataZurich");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct ClientConfig {
    /// Name of the organisation publishing the data.
    #[builder(into, default = DEFAULT_PROVIDER.to_string())]
    pub provider: String,
    /// Prefix for dataset deep links, the dataset name is appended as-is.
    #[builder(into, default = DEFAULT_PORTAL_BASE.to_string())]
    pub portal_base: String,
    /// CKAN action API base, without trailing slash.
    #[builder(into, default = DEFAULT_API_BASE.to_string())]
    pub api_base: String,
    /// WFS geoportal base, without trailing slash.
    #[builder(into, default = DEFAULT_WFS_BASE.to_string())]
    pub wfs_base: String,
    /// Packages per catalog page.
    #[builder(default = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
    /// Fixed delay between catalog page requests. There is no adaptive backoff.
    #[builder(default = DEFAULT_PAGE_DELAY)]
    pub page_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_points_at_zurich() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.portal_base, DEFAULT_PORTAL_BASE);
        assert_eq!(config.wfs_base, DEFAULT_WFS_BASE);
        assert_eq!(config.page_size, 500);
        assert_eq!(config.page_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_builder_overrides_single_fields() {
        let config = ClientConfig::builder()
            .provider("Somewhere Else")
            .page_delay(Duration::ZERO)
            .build();
        assert_eq!(config.provider, "Somewhere Else");
        assert_eq!(config.page_delay, Duration::ZERO);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }
}
