//! Retrieves every row of a FetchXML query.
//!
//! Run with: cargo run --example fetch_xml [path/to/query.xml]
//!
//! Requires the same .env file as the `get_rows` example.

use std::env;
use std::fs;

use d365_lib::D365Client;
use d365_lib::auth::PasswordFlow;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::SimpleLogger;

const DEFAULT_QUERY: &str = r#"<fetch version="1.0" output-format="xml-platform" mapping="logical" distinct="false">
  <entity name="account">
    <attribute name="name" />
    <attribute name="accountid" />
    <order attribute="name" descending="false" />
  </entity>
</fetch>"#;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());

    let query = match env::args().nth(1) {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_QUERY.to_string(),
    };

    let client = D365Client::builder()
        .url(env::var("DATAVERSE_URL")?)
        .token_provider(PasswordFlow::from_env()?)
        .build()?;

    let result = client.fetch_xml(&query).await?;
    match result.records() {
        Some(records) => {
            println!("{} rows", records.len());
            for record in records.iter().take(10) {
                println!(
                    "{}",
                    record
                        .get_formatted("name")
                        .or(record.get_string("name").ok().flatten())
                        .unwrap_or("-")
                );
            }
        }
        None => println!("{}", result.into_json()),
    }

    Ok(())
}
