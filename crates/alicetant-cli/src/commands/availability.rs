use anyhow::Result;
use chrono::NaiveTime;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// List a business's weekly availability windows
    List {
        #[arg(help = "Business ID")]
        business_id: Uuid,
    },
    /// Add a weekly availability window to a business you own
    Add {
        #[arg(long)]
        business_id: Uuid,
        #[arg(long, help = "Day of week: 0=Sunday .. 6=Saturday")]
        day: i32,
        #[arg(long, help = "Start time, e.g. 09:00:00")]
        start: NaiveTime,
        #[arg(long, help = "End time, e.g. 17:00:00")]
        end: NaiveTime,
    },
    /// Update an availability window
    Update {
        #[arg(help = "Availability ID")]
        id: Uuid,
        #[arg(long, help = "Day of week: 0=Sunday .. 6=Saturday")]
        day: Option<i32>,
        #[arg(long, help = "Start time")]
        start: Option<NaiveTime>,
        #[arg(long, help = "End time")]
        end: Option<NaiveTime>,
    },
    /// Remove an availability window
    Remove {
        #[arg(help = "Availability ID")]
        id: Uuid,
    },
}

#[derive(Debug, Serialize)]
struct CreateRequest {
    business_id: Uuid,
    day_of_week: i32,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

#[derive(Debug, Serialize)]
struct UpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    day_of_week: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<NaiveTime>,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct Availability {
    pub id: Uuid,
    pub business_id: Uuid,
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::List { business_id } => {
            let windows: Vec<Availability> = client
                .get(&format!("/v1/businesses/{}/availability", business_id))
                .await?;
            output::print_items(windows, format);
        }
        Commands::Add {
            business_id,
            day,
            start,
            end,
        } => {
            let req = CreateRequest {
                business_id,
                day_of_week: day,
                start_time: start,
                end_time: end,
            };
            let window: Availability = client.post("/v1/availability", &req).await?;
            output::print_created(window, format);
        }
        Commands::Update {
            id,
            day,
            start,
            end,
        } => {
            let req = UpdateRequest {
                day_of_week: day,
                start_time: start,
                end_time: end,
            };
            let window: Availability = client.put(&format!("/v1/availability/{}", id), &req).await?;
            output::print_item(window, format);
        }
        Commands::Remove { id } => {
            client.delete(&format!("/v1/availability/{}", id)).await?;
            output::print_success("Availability window removed");
        }
    }

    Ok(())
}
