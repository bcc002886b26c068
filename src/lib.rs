mod catalog;
mod config;
mod dataset;
mod error;
mod geo;
mod opendata;
mod package;
mod types;
mod utils;

pub use config::*;
pub use error::OpenDataError;
pub use opendata::*;
pub use package::{Package, PackageLookup};

pub use types::catalog::{Catalog, CatalogRecord, CatalogView};
pub use types::distribution::Distribution;
pub use types::localized::{LocalizedText, PREFERRED_LANGUAGES};

pub use catalog::fetcher::CatalogFetcher;
pub use catalog::filter::*;
pub use catalog::flatten::{flatten_object, lookup_path, select_fields, FieldMapping, CATALOG_FIELDS};

pub use dataset::lazy::Dataset;
pub use dataset::resolver::{load_dataset, FileFormat};

pub use geo::resource::GeoResource;
pub use geo::wfs::{geoportal_url, identifier_from_url, parse_feature_type_names, WfsClient};

pub use catalog::error::CatalogError;
pub use dataset::error::DatasetError;
pub use geo::error::GeoError;
