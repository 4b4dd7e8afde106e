//! Retrieves every row of an OData query.
//!
//! Run with: cargo run --example get_rows -- "accounts?$select=name"
//!
//! Requires .env file with:
//! - DATAVERSE_CLIENT_ID
//! - DATAVERSE_CLIENT_SECRET
//! - DATAVERSE_USERNAME
//! - DATAVERSE_PASSWORD
//! - DATAVERSE_URL

use std::env;

use d365_lib::D365Client;
use d365_lib::QueryResult;
use d365_lib::auth::PasswordFlow;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::SimpleLogger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());

    let query = env::args()
        .nth(1)
        .unwrap_or_else(|| "accounts?$select=name".to_string());

    let client = D365Client::builder()
        .url(env::var("DATAVERSE_URL")?)
        .token_provider(PasswordFlow::from_env()?)
        .build()?;

    match client.get_rows(&query).await? {
        QueryResult::Records(records) => {
            println!("{} rows", records.len());
            for record in records.iter().take(10) {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        QueryResult::Document(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
        QueryResult::Accepted => println!("accepted"),
    }

    Ok(())
}
