use anyhow::{Context, Result};
use beer_catalog_sdk::{Beer, BeerClient, BeerStyle, ListFilter};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::{Value, json};

#[derive(Subcommand)]
pub enum Command {
    /// List beers, optionally filtered and paged
    List(ListArgs),
    /// Show one beer
    Get { id: String },
    /// Create a beer
    Create(BeerArgs),
    /// Replace a beer and print its state afterwards
    Update {
        id: String,
        #[command(flatten)]
        beer: BeerArgs,
    },
    /// Delete a beer
    Delete { id: String },
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    style: Option<BeerStyle>,
    /// Zero-based page index
    #[arg(long)]
    page_number: Option<u32>,
    #[arg(long)]
    page_size: Option<u32>,
}

impl From<ListArgs> for ListFilter {
    fn from(args: ListArgs) -> Self {
        ListFilter {
            beer_name: args.name,
            beer_style: args.style,
            page_number: args.page_number,
            page_size: args.page_size,
        }
    }
}

#[derive(Args)]
pub struct BeerArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    style: BeerStyle,
    #[arg(long)]
    upc: String,
    #[arg(long)]
    price: Decimal,
    #[arg(long)]
    quantity: Option<i32>,
}

impl From<BeerArgs> for Beer {
    fn from(args: BeerArgs) -> Self {
        let beer = Beer::new(args.name, args.style, args.upc, args.price);
        match args.quantity {
            Some(quantity) => beer.with_quantity_on_hand(quantity),
            None => beer,
        }
    }
}

impl Command {
    /// Run against `client` and return what to print.
    pub async fn execute(self, client: &dyn BeerClient) -> Result<Value> {
        let value = match self {
            Command::List(args) => {
                let page = client
                    .list_beers_with(args.into())
                    .await
                    .context("list beers")?;
                serde_json::to_value(page)?
            }
            Command::Get { id } => {
                let beer = client
                    .get_beer_by_id(&id)
                    .await
                    .with_context(|| format!("get beer {id}"))?;
                serde_json::to_value(beer)?
            }
            Command::Create(args) => {
                let beer = client
                    .create_beer(&args.into())
                    .await
                    .context("create beer")?;
                serde_json::to_value(beer)?
            }
            Command::Update { id, beer } => {
                let beer = client
                    .update_beer(&id, &beer.into())
                    .await
                    .with_context(|| format!("update beer {id}"))?;
                serde_json::to_value(beer)?
            }
            Command::Delete { id } => {
                client
                    .delete_beer(&id)
                    .await
                    .with_context(|| format!("delete beer {id}"))?;
                json!({ "id": id, "deleted": true })
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use beer_catalog_sdk::{BeerClientError, BeerPage};
    use clap::Parser;
    use std::sync::Mutex;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        TestCli::try_parse_from(std::iter::once("beer-cli").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    /// Remembers the last call and echoes inputs back.
    #[derive(Default)]
    struct FakeClient {
        last_filter: Mutex<Option<ListFilter>>,
    }

    #[async_trait]
    impl BeerClient for FakeClient {
        async fn list_beers_with(&self, filter: ListFilter) -> Result<BeerPage, BeerClientError> {
            *self.last_filter.lock().unwrap() = Some(filter);
            Ok(BeerPage {
                page_number: 0,
                page_size: 25,
                total_pages: 0,
                total_elements: 0,
                beers: Vec::new(),
            })
        }

        async fn get_beer_by_id(&self, id: &str) -> Result<Beer, BeerClientError> {
            Err(BeerClientError::not_found(id))
        }

        async fn create_beer(&self, beer: &Beer) -> Result<Beer, BeerClientError> {
            Ok(beer.clone())
        }

        async fn update_beer(&self, _id: &str, beer: &Beer) -> Result<Beer, BeerClientError> {
            Ok(beer.clone())
        }

        async fn delete_beer(&self, _id: &str) -> Result<(), BeerClientError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn list_passes_filter() {
        let client = FakeClient::default();
        parse(&["list", "--name", "Stella", "--style", "wheat", "--page-size", "4"])
            .execute(&client)
            .await
            .unwrap();

        let filter = client.last_filter.lock().unwrap().clone().unwrap();
        assert_eq!(
            filter,
            ListFilter::new()
                .with_beer_name("Stella")
                .with_beer_style(BeerStyle::Wheat)
                .with_page_size(4)
        );
    }

    #[tokio::test]
    async fn create_prints_beer_json() {
        let out = parse(&[
            "create", "--name", "Crank", "--style", "PALE_ALE", "--upc", "8380495518",
            "--price", "10.99", "--quantity", "12",
        ])
        .execute(&FakeClient::default())
        .await
        .unwrap();

        assert_eq!(out["beerName"], "Crank");
        assert_eq!(out["beerStyle"], "PALE_ALE");
        assert_eq!(out["quantityOnHand"], 12);
        assert!(out.get("id").is_none());
    }

    #[tokio::test]
    async fn update_takes_id_and_fields() {
        let out = parse(&[
            "update", "some-id", "--name", "Stella", "--style", "ipa", "--upc", "98765432",
            "--price", "12.12",
        ])
        .execute(&FakeClient::default())
        .await
        .unwrap();
        assert_eq!(out["beerStyle"], "IPA");
        assert!(out.get("quantityOnHand").is_none());
    }

    #[tokio::test]
    async fn delete_reports_id() {
        let out = parse(&["delete", "some-id"])
            .execute(&FakeClient::default())
            .await
            .unwrap();
        assert_eq!(out, json!({ "id": "some-id", "deleted": true }));
    }

    #[tokio::test]
    async fn errors_carry_context() {
        let err = parse(&["get", "missing-id"])
            .execute(&FakeClient::default())
            .await
            .unwrap_err();
        assert_eq!(format!("{err:#}"), "get beer missing-id: beer not found: missing-id");
    }

    #[test]
    fn rejects_unknown_style() {
        let result = TestCli::try_parse_from(["beer-cli", "list", "--style", "lambic"]);
        assert!(result.is_err());
    }
}
