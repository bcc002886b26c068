use opendata_zh::{OpenDataError, OpenDataZh};

#[tokio::main]
async fn main() -> Result<(), OpenDataError> {
    env_logger::init();
    let client = OpenDataZh::new();

    let geo = client.geo_catalog().await?;
    let Some(record) = geo.iter().next() else {
        println!("No geo datasets found");
        return Ok(());
    };
    let title = record.title.as_ref().and_then(|t| t.text()).unwrap_or("-");
    println!("Using {} ({})", record.name, title);

    let Some(package) = client.get_package().name(&record.name).call().await? else {
        return Ok(());
    };
    let Some(resource) = package.geo_resource(0) else {
        println!("{} has no WFS distribution", package.name());
        return Ok(());
    };

    println!("Service: {}", resource.service_url()?);
    for layer in resource.layers().await? {
        println!("  layer {layer}");
    }

    let features = resource.features().await?;
    let count = features["features"].as_array().map_or(0, Vec::len);
    println!("{count} features in the first layer");

    Ok(())
}
