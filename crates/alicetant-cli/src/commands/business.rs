use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// List businesses, optionally filtered by a search term
    List {
        #[arg(long, help = "Search name and summary")]
        query: Option<String>,
        #[arg(long, default_value = "50")]
        limit: i64,
        #[arg(long)]
        offset: Option<i64>,
    },
    /// Create a new business (providers only)
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Get business details
    Get {
        #[arg(help = "Business ID")]
        id: Uuid,
    },
    /// Update a business you own
    Update {
        #[arg(help = "Business ID")]
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Delete a business you own, along with all its appointments
    Delete {
        #[arg(help = "Business ID")]
        id: Uuid,
    },
    /// Check whether a slot is free
    Slot {
        #[arg(help = "Business ID")]
        id: Uuid,
        #[arg(long, help = "Date, e.g. 2030-01-01")]
        date: NaiveDate,
        #[arg(long, help = "Time, e.g. 10:00:00")]
        time: NaiveTime,
    },
}

#[derive(Debug, Serialize)]
struct CreateRequest {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub summary: String,
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SlotResponse {
    available: bool,
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::List {
            query,
            limit,
            offset,
        } => {
            let mut url = format!("/v1/businesses?limit={}", limit);
            if let Some(off) = offset {
                url.push_str(&format!("&offset={}", off));
            }
            if let Some(q) = query {
                url.push_str(&format!("&q={}", q));
            }
            let businesses: Vec<Business> = client.get(&url).await?;
            output::print_items(businesses, format);
        }
        Commands::Create {
            name,
            summary,
            description,
            phone,
            email,
            address,
        } => {
            let req = CreateRequest {
                name,
                summary,
                description,
                phone,
                email,
                address,
            };
            let business: Business = client.post("/v1/businesses", &req).await?;
            output::print_created(business, format);
        }
        Commands::Get { id } => {
            let business: Business = client.get(&format!("/v1/businesses/{}", id)).await?;
            output::print_item(business, format);
        }
        Commands::Update {
            id,
            name,
            summary,
            description,
            phone,
            email,
            address,
        } => {
            let req = UpdateRequest {
                name,
                summary,
                description,
                phone,
                email,
                address,
            };
            let business: Business = client.put(&format!("/v1/businesses/{}", id), &req).await?;
            output::print_item(business, format);
        }
        Commands::Delete { id } => {
            client.delete(&format!("/v1/businesses/{}", id)).await?;
            output::print_success("Business deleted");
        }
        Commands::Slot { id, date, time } => {
            let resp: SlotResponse = client
                .get(&format!(
                    "/v1/businesses/{}/slot?date={}&time={}",
                    id, date, time
                ))
                .await?;
            match format {
                Format::Json => output::print_json(&resp),
                Format::Table => {
                    if resp.available {
                        output::print_success(&format!("{} {} is available", date, time));
                    } else {
                        println!("{} {} is already booked", date, time);
                    }
                }
            }
        }
    }

    Ok(())
}
