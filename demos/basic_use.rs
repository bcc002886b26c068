use opendata_zh::{OpenDataError, OpenDataZh};
use std::env;

#[tokio::main]
async fn main() -> Result<(), OpenDataError> {
    env_logger::init();
    configure_polars_display();
    let client = OpenDataZh::new();

    let catalog = client.csv_catalog().await?;
    println!("{} datasets with a CSV download", catalog.len());
    for name in catalog.names().take(10) {
        println!("  {name}");
    }

    let Some(package) = client
        .get_package()
        .name("bau_hae_lima_zuordnung_adr_quartier_bzo16_bzo99_od5143")
        .call()
        .await?
    else {
        return Ok(());
    };

    println!("{}", package.portal_url());
    println!("{:#?}", package.resource_summary());

    if let Some(dataset) = package.tabular_dataset(0) {
        if let Some(frame) = dataset.frame().await? {
            println!("{}", frame.head(Some(10)));
        }
    }

    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
