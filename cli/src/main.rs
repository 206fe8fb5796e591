use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use domain::money::{MoneyError, format_money, parse_money};
use domain::permissions::{Action, Module, PermissionParseError, Role, RoleTemplate};
use domain::pipeline::{PipelineStage, QuoteStatus, TransitionError};
use domain::pricing::{LineInput, PricingError, PricingPolicy, QuoteTotals, compute_totals, line_total};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing session token; run `login` and pass --session-token or set STONECRM_SESSION_TOKEN")]
    MissingSessionToken,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid line `{0}`; expected QTY@PRICE, e.g. 42.5@65")]
    InvalidLine(String),
    #[error(transparent)]
    Money(#[from] MoneyError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Permission(#[from] PermissionParseError),
    #[error(transparent)]
    Pipeline(#[from] TransitionError),
}

#[derive(Parser, Debug)]
#[command(name = "stonecrm-cli", about = "Stone distribution CRM terminal client")]
struct Cli {
    #[arg(long, env = "STONECRM_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "STONECRM_SESSION_TOKEN")]
    session_token: Option<String>,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    session_token: Option<String>,
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    /// Log in and print a session token.
    Login {
        username: String,
        #[arg(long, env = "STONECRM_PASSWORD")]
        password: String,
    },
    Inventory(InventoryCommand),
    Quotes(QuotesCommand),
    Users(UsersCommand),
    /// The caller's sales dashboard.
    Dashboard,
    /// Check a role template offline: `can sales_rep quotes approve`.
    Can {
        role: String,
        module: String,
        action: String,
    },
}

#[derive(Args, Debug)]
struct InventoryCommand {
    #[command(subcommand)]
    command: InventorySubcommand,
}

#[derive(Subcommand, Debug)]
enum InventorySubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        grade: Option<String>,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long, default_value_t = false)]
        include_inactive: bool,
    },
    Show {
        product_id: Uuid,
    },
    Summary,
}

#[derive(Args, Debug)]
struct QuotesCommand {
    #[command(subcommand)]
    command: QuotesSubcommand,
}

#[derive(Subcommand, Debug)]
enum QuotesSubcommand {
    List {
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    Show {
        quote_id: Uuid,
    },
    /// Move a quote along the pipeline.
    Stage {
        quote_id: Uuid,
        stage: String,
    },
    /// Price lines offline with the shared pricing rules.
    Price(PriceArgs),
}

#[derive(Args, Debug)]
struct PriceArgs {
    #[arg(long = "line", required = true, help = "QTY@PRICE, repeatable")]
    lines: Vec<String>,

    #[arg(long, default_value_t = false, help = "Apply the card processing fee")]
    fee: bool,

    #[arg(long, help = "Override the tax rate, e.g. 0.0725")]
    tax_rate: Option<Decimal>,
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    Role { user_id: Uuid, role: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = CliContext { base_url: cli.base_url, session_token: cli.session_token, json: cli.json };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Login { username, password } => run_login(&ctx, &username, &password).await,
        Command::Inventory(inventory) => run_inventory(&ctx, inventory).await,
        Command::Quotes(quotes) => run_quotes(&ctx, quotes).await,
        Command::Users(users) => run_users(&ctx, users).await,
        Command::Dashboard => {
            let json = api_request(&ctx, reqwest::Method::GET, "/api/sales-dashboard/stats", &[], None).await?;
            if ctx.json {
                return print_json(&json);
            }
            print_dashboard(&json);
            Ok(())
        }
        Command::Can { role, module, action } => {
            let allowed = role_allows(&role, &module, &action)?;
            println!("{}", if allowed { "allowed" } else { "denied" });
            Ok(())
        }
    }
}

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}/healthz", cli.base_url.trim_end_matches('/'));
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

async fn run_login(cli: &CliContext, username: &str, password: &str) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}/api/auth/login", cli.base_url.trim_end_matches('/'));
    let response = client
        .post(url)
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await?;
    let value = read_response(response).await?;
    if cli.json {
        return print_json(&value);
    }
    let token = value.get("token").and_then(Value::as_str).ok_or(CliError::MissingField("token"))?;
    println!("{token}");
    Ok(())
}

async fn run_inventory(cli: &CliContext, inventory: InventoryCommand) -> Result<(), CliError> {
    match inventory.command {
        InventorySubcommand::List { search, category, grade, supplier, include_inactive } => {
            let mut query = Vec::new();
            push_query(&mut query, "search", search);
            push_query(&mut query, "category", category);
            push_query(&mut query, "grade", grade);
            push_query(&mut query, "supplier", supplier);
            if include_inactive {
                query.push(("include_inactive", "true".to_owned()));
            }
            let json = api_request(cli, reqwest::Method::GET, "/api/products", &query, None).await?;
            if cli.json {
                return print_json(&json);
            }
            print_rows(&json, &[("bundle_id", 10), ("name", 24), ("category", 12), ("grade", 10), ("price", 10)]);
            Ok(())
        }
        InventorySubcommand::Show { product_id } => {
            let path = format!("/api/products/{product_id}");
            let json = api_request(cli, reqwest::Method::GET, &path, &[], None).await?;
            print_json(&json)
        }
        InventorySubcommand::Summary => {
            let json = api_request(cli, reqwest::Method::GET, "/api/inventory/summary", &[], None).await?;
            print_json(&json)
        }
    }
}

async fn run_quotes(cli: &CliContext, quotes: QuotesCommand) -> Result<(), CliError> {
    match quotes.command {
        QuotesSubcommand::List { stage, status } => {
            let mut query = Vec::new();
            if let Some(stage) = stage {
                query.push(("stage", PipelineStage::from_str(&stage)?.label().to_owned()));
            }
            if let Some(status) = status {
                query.push(("status", QuoteStatus::from_str(&status)?.as_str().to_owned()));
            }
            let json = api_request(cli, reqwest::Method::GET, "/api/quotes", &query, None).await?;
            if cli.json {
                return print_json(&json);
            }
            print_rows(
                &json,
                &[("quote_number", 12), ("project_name", 24), ("status", 10), ("pipeline_stage", 10), ("total", 12)],
            );
            Ok(())
        }
        QuotesSubcommand::Show { quote_id } => {
            let path = format!("/api/quotes/{quote_id}");
            let json = api_request(cli, reqwest::Method::GET, &path, &[], None).await?;
            print_json(&json)
        }
        QuotesSubcommand::Stage { quote_id, stage } => {
            let stage = PipelineStage::from_str(&stage)?;
            let path = format!("/api/quotes/{quote_id}/stage");
            let body = serde_json::json!({ "stage": stage.label() });
            let json = api_request(cli, reqwest::Method::PATCH, &path, &[], Some(body)).await?;
            if cli.json {
                return print_json(&json);
            }
            let number = json.get("quote_number").and_then(Value::as_str).unwrap_or("quote");
            println!("{number} -> {stage}");
            Ok(())
        }
        QuotesSubcommand::Price(args) => {
            let lines = args.lines.iter().map(|raw| parse_line(raw)).collect::<Result<Vec<_>, _>>()?;
            let policy = match args.tax_rate {
                Some(rate) => PricingPolicy::default().with_tax_rate(rate)?,
                None => PricingPolicy::default(),
            };
            let totals = compute_totals(&lines, args.fee, policy)?;
            if cli.json {
                return print_json(&serde_json::to_value(totals)?);
            }
            for line in &lines {
                let total = line_total(line.quantity, line.unit_price)?;
                println!("{:>10} x {:>12} = {:>14}", line.quantity, format_money(line.unit_price), format_money(total));
            }
            print!("{}", render_totals(&totals, policy, args.fee));
            Ok(())
        }
    }
}

async fn run_users(cli: &CliContext, users: UsersCommand) -> Result<(), CliError> {
    match users.command {
        UsersSubcommand::List => {
            let json = api_request(cli, reqwest::Method::GET, "/api/users", &[], None).await?;
            if cli.json {
                return print_json(&json);
            }
            print_rows(&json, &[("username", 16), ("email", 28), ("role", 22), ("is_active", 9)]);
            Ok(())
        }
        UsersSubcommand::Role { user_id, role } => {
            let role = Role::from_str(&role)?;
            let path = format!("/api/users/{user_id}/role");
            let body = serde_json::json!({ "role": role.as_str() });
            let json = api_request(cli, reqwest::Method::PUT, &path, &[], Some(body)).await?;
            print_json(&json)
        }
    }
}

async fn api_request(
    cli: &CliContext,
    method: reqwest::Method,
    path: &str,
    query: &[(&str, String)],
    body: Option<Value>,
) -> Result<Value, CliError> {
    let session_token = cli.session_token.as_deref().ok_or(CliError::MissingSessionToken)?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {session_token}"))?);

    let client = reqwest::Client::builder().default_headers(headers).build()?;
    let url = format!("{}{}", cli.base_url.trim_end_matches('/'), path);

    let request = client.request(method, &url).query(query);
    let request = if let Some(json) = body { request.json(&json) } else { request };

    read_response(request.send().await?).await
}

async fn read_response(response: reqwest::Response) -> Result<Value, CliError> {
    let status = response.status();
    let value = response.json::<Value>().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let message = value.get("error").and_then(Value::as_str).map_or_else(|| value.to_string(), ToOwned::to_owned);
        return Err(CliError::ServerError { status: status.as_u16(), message });
    }

    Ok(value)
}

fn push_query(query: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        query.push((key, value));
    }
}

/// `QTY@PRICE`, e.g. `42.5@$65.00`.
fn parse_line(raw: &str) -> Result<LineInput, CliError> {
    let (qty, price) = raw.split_once('@').ok_or_else(|| CliError::InvalidLine(raw.to_owned()))?;
    let quantity = Decimal::from_str(qty.trim()).map_err(|_| CliError::InvalidLine(raw.to_owned()))?;
    let unit_price = parse_money(price)?;
    Ok(LineInput { quantity, unit_price })
}

fn role_allows(role: &str, module: &str, action: &str) -> Result<bool, CliError> {
    let role = Role::from_str(role)?;
    let module = Module::from_str(module)?;
    let action = Action::from_str(action)?;
    Ok(RoleTemplate::for_role(role).permissions.allows(module, action))
}

fn render_totals(totals: &QuoteTotals, policy: PricingPolicy, fee: bool) -> String {
    let mut out = format!("{:<24}{:>14}\n", "Subtotal", format_money(totals.subtotal));
    if fee {
        let label = format!("Processing fee ({}%)", (policy.processing_fee_rate * Decimal::ONE_HUNDRED).normalize());
        out.push_str(&format!("{label:<24}{:>14}\n", format_money(totals.processing_fee)));
    }
    let label = format!("Tax ({}%)", (policy.tax_rate * Decimal::ONE_HUNDRED).normalize());
    out.push_str(&format!("{label:<24}{:>14}\n", format_money(totals.tax_amount)));
    out.push_str(&format!("{:<24}{:>14}\n", "Total", format_money(totals.total)));
    out
}

fn print_dashboard(json: &Value) {
    let field = |key: &str| json.get(key).map_or_else(String::new, cell);
    println!("Quotes:            {} ({} open, {} won)", field("total_quotes"), field("open_quotes"), field("won_quotes"));
    println!("Awaiting approval: {}", field("awaiting_approval"));
    println!("Pipeline value:    {}", field("pipeline_value"));
    println!("Won revenue:       {}", field("won_revenue"));
    println!("Conversion rate:   {}%", field("conversion_rate"));
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn render_rows(json: &Value, columns: &[(&str, usize)]) -> String {
    let mut out = String::new();
    for &(name, width) in columns {
        out.push_str(&format!("{name:<width$} "));
    }
    out = out.trim_end().to_owned();
    out.push('\n');

    let empty = Vec::new();
    let rows = json.as_array().unwrap_or(&empty);
    for row in rows {
        let mut line = String::new();
        for &(name, width) in columns {
            let mut text = row.get(name).map_or_else(String::new, cell);
            if text.chars().count() > width {
                text = text.chars().take(width.saturating_sub(1)).collect::<String>() + "…";
            }
            line.push_str(&format!("{text:<width$} "));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn print_rows(json: &Value, columns: &[(&str, usize)]) {
    print!("{}", render_rows(json, columns));
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
