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
    /// List your appointments: upcoming first, then past
    List {
        #[arg(long, help = "Providers: restrict to one business")]
        business_id: Option<Uuid>,
        #[arg(long, help = "Providers: start of date range, e.g. 2030-01-01")]
        from: Option<NaiveDate>,
        #[arg(long, help = "Providers: end of date range")]
        to: Option<NaiveDate>,
    },
    /// Book a time slot
    Book {
        #[arg(long)]
        business_id: Uuid,
        #[arg(long, help = "Date, e.g. 2030-01-01")]
        date: NaiveDate,
        #[arg(long, help = "Time, e.g. 10:00:00")]
        time: NaiveTime,
        #[arg(long = "customer", help = "Additional customer IDs (repeatable)")]
        customers: Vec<Uuid>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Get appointment details
    Get {
        #[arg(help = "Appointment ID")]
        id: Uuid,
    },
    /// Cancel an appointment (keeps the record, frees the slot)
    Cancel {
        #[arg(help = "Appointment ID")]
        id: Uuid,
    },
}

#[derive(Debug, Serialize)]
struct BookRequest {
    business_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    customer_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct Appointment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub date: String,
    pub time: String,
    pub status: String,
    pub notes: String,
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::List {
            business_id,
            from,
            to,
        } => {
            let mut url = "/v1/appointments".to_string();
            let mut params = vec![];
            if let Some(id) = business_id {
                params.push(format!("business_id={}", id));
            }
            if let Some(from) = from {
                params.push(format!("from={}", from));
            }
            if let Some(to) = to {
                params.push(format!("to={}", to));
            }
            if !params.is_empty() {
                url.push_str(&format!("?{}", params.join("&")));
            }
            let appointments: Vec<Appointment> = client.get(&url).await?;
            output::print_items(appointments, format);
        }
        Commands::Book {
            business_id,
            date,
            time,
            customers,
            notes,
        } => {
            let req = BookRequest {
                business_id,
                date,
                time,
                customer_ids: customers,
                notes,
            };
            let appointment: Appointment = client.post("/v1/appointments", &req).await?;
            output::print_created(appointment, format);
        }
        Commands::Get { id } => {
            let appointment: Appointment = client.get(&format!("/v1/appointments/{}", id)).await?;
            output::print_item(appointment, format);
        }
        Commands::Cancel { id } => {
            let appointment: Appointment = client
                .post_empty(&format!("/v1/appointments/{}/cancel", id))
                .await?;
            match format {
                Format::Json => output::print_json(&appointment),
                Format::Table => {
                    output::print_success("Appointment cancelled");
                    output::print_single(appointment);
                }
            }
        }
    }

    Ok(())
}
