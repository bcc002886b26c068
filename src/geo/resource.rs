use crate::geo::error::GeoError;
use crate::geo::wfs::{geoportal_url, WfsClient};
use crate::types::distribution::Distribution;
use serde_json::Value;
use tokio::sync::OnceCell;

/// A geo distribution (`WFS` or `JSON`) of a package, served by the WFS geoportal.
///
/// The layer list and the first layer's features are fetched on first use and
/// kept for the lifetime of the resource.
#[derive(Debug)]
pub struct GeoResource {
    index: usize,
    distribution: Distribution,
    wfs: WfsClient,
    wfs_base: String,
    layers: OnceCell<Vec<String>>,
    features: OnceCell<Value>,
}

impl GeoResource {
    pub(crate) fn new(
        index: usize,
        distribution: Distribution,
        wfs: WfsClient,
        wfs_base: String,
    ) -> Self {
        Self {
            index,
            distribution,
            wfs,
            wfs_base,
            layers: OnceCell::new(),
            features: OnceCell::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// The WFS endpoint for this resource.
    pub fn service_url(&self) -> Result<String, GeoError> {
        geoportal_url(&self.distribution.url, &self.wfs_base)
            .ok_or_else(|| GeoError::NoGeoportalUrl(self.distribution.url.clone()))
    }

    /// Layers offered by the service.
    pub async fn layers(&self) -> Result<&[String], GeoError> {
        let layers = self
            .layers
            .get_or_try_init(|| async {
                let url = self.service_url()?;
                self.wfs.layers(&url).await
            })
            .await?;
        Ok(layers.as_slice())
    }

    /// Features of the first layer as GeoJSON.
    pub async fn features(&self) -> Result<&Value, GeoError> {
        self.features
            .get_or_try_init(|| async {
                let first = self
                    .layers()
                    .await?
                    .first()
                    .cloned()
                    .ok_or_else(|| GeoError::NoLayers(self.distribution.url.clone()))?;
                self.layer_features(&first).await
            })
            .await
    }

    /// Features of any layer as GeoJSON. Not cached.
    pub async fn layer_features(&self, layer: &str) -> Result<Value, GeoError> {
        let url = self.service_url()?;
        self.wfs.features(&url, layer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::wfs::tests::{feature_collection, CAPABILITIES};
    use reqwest::Client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resource(url: String, server: &MockServer) -> GeoResource {
        let distribution = Distribution {
            url,
            format: "WFS".to_string(),
            ..Default::default()
        };
        GeoResource::new(
            0,
            distribution,
            WfsClient::new(Client::new()),
            format!("{}/wfs/geoportal", server.uri()),
        )
    }

    #[tokio::test]
    async fn test_download_link_is_mapped_to_geoportal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wfs/geoportal/Gaerten"))
            .and(query_param("request", "GetCapabilities"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CAPABILITIES))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wfs/geoportal/Gaerten"))
            .and(query_param("request", "GetFeature"))
            .and(query_param("typename", "ms:gsz_gaerten"))
            .respond_with(ResponseTemplate::new(200).set_body_json(feature_collection()))
            .expect(1)
            .mount(&server)
            .await;
        let resource = resource(
            "https://www.stadt-zuerich.ch/geodaten/download/Gaerten?format=geojson_link".to_string(),
            &server,
        );

        assert_eq!(
            resource.service_url().unwrap(),
            format!("{}/wfs/geoportal/Gaerten", server.uri())
        );
        assert_eq!(resource.layers().await.unwrap(), ["ms:gsz_gaerten", "ms:gsz_anlagen"]);
        // Both are served from memory the second time.
        resource.layers().await.unwrap();
        let features = resource.features().await.unwrap();
        assert_eq!(features["features"][0]["properties"]["name"], "Rieterpark");
        resource.features().await.unwrap();
    }

    #[tokio::test]
    async fn test_service_without_layers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<WFS_Capabilities></WFS_Capabilities>"),
            )
            .mount(&server)
            .await;
        let resource = resource(format!("{}/wfs/geoportal/leer", server.uri()), &server);

        assert!(matches!(
            resource.features().await,
            Err(GeoError::NoLayers(_))
        ));
    }

    #[tokio::test]
    async fn test_unmappable_url() {
        let server = MockServer::start().await;
        let resource = resource("https://x.ch/file.zip".to_string(), &server);

        assert!(matches!(
            resource.layers().await,
            Err(GeoError::NoGeoportalUrl(_))
        ));
    }
}
