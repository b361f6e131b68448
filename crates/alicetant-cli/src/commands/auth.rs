use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and store the issued token
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, help = "Account role: provider or customer")]
        role: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Log in and store a fresh token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Show the currently authenticated account
    Whoami,
}

#[derive(Debug, Serialize)]
struct SignupRequest {
    email: String,
    password: String,
    role: String,
    full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct IssuedToken {
    id: Uuid,
    token: String,
    prefix: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthResponse {
    user: User,
    token: IssuedToken,
}

pub async fn run(cmd: Commands, config: &mut Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::Signup {
            email,
            password,
            role,
            full_name,
            phone,
        } => {
            let req = SignupRequest {
                email,
                password,
                role,
                full_name,
                phone,
            };
            let resp: AuthResponse = client.post_no_auth("/v1/auth/signup", &req).await?;
            store_token(config, resp, format, "Account created")?;
        }
        Commands::Login { email, password } => {
            let req = LoginRequest { email, password };
            let resp: AuthResponse = client.post_no_auth("/v1/auth/login", &req).await?;
            store_token(config, resp, format, "Logged in")?;
        }
        Commands::Whoami => {
            let user: User = client.get("/v1/me").await?;
            output::print_item(user, format);
        }
    }

    Ok(())
}

fn store_token(config: &mut Config, resp: AuthResponse, format: Format, msg: &str) -> Result<()> {
    config.token = Some(resp.token.token.clone());
    config.save()?;

    match format {
        Format::Json => output::print_json(&resp),
        Format::Table => {
            output::print_success(msg);
            output::print_single(resp.user);
            println!();
            println!("Token saved to the CLI config (shown once by the server):");
            println!("  {}", resp.token.token);
        }
    }
    Ok(())
}
