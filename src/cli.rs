use std::error::Error;
use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use zidian_rs::config::{RawSettings, ServiceConfig};
use zidian_rs::lookup::{LookupClient, LookupQuery, LookupSource};
use zidian_rs::model::LookupResponse;
use zidian_rs::search::DEFAULT_PAGE_SIZE;

#[derive(Parser, Debug)]
#[command(name = "zidian", about = "Chinese dictionary lookup and vocabulary service", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP front-end.
    Serve(ServeArgs),
    /// Query the lookup backend once and print the results.
    Lookup {
        /// Chinese characters, pinyin or English.
        text: String,
        /// One-based results page.
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Results per page.
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
        #[arg(long, env = "BACKEND_URL")]
        backend_url: String,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Socket address to bind.
    #[arg(long, env = "ZIDIAN_ADDR")]
    addr: Option<SocketAddr>,
    /// Public origin used in absolute links.
    #[arg(long, env = "ZIDIAN_BASE_URL")]
    base_url: Option<String>,
    /// Base URL of the dictionary lookup backend.
    #[arg(long, env = "BACKEND_URL")]
    backend_url: Option<String>,
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    supabase_anon_key: Option<String>,
    /// `TOKEN=USER_ID` pair accepted by the in-memory store. Repeatable.
    #[arg(long = "dev-token", env = "ZIDIAN_DEV_TOKEN", value_delimiter = ',')]
    dev_tokens: Vec<String>,
}

impl From<ServeArgs> for RawSettings {
    fn from(args: ServeArgs) -> Self {
        RawSettings {
            addr: args.addr,
            base_url: args.base_url,
            backend_url: args.backend_url,
            supabase_url: args.supabase_url,
            supabase_anon_key: args.supabase_anon_key,
            dev_tokens: args.dev_tokens,
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => handle_serve(args),
        Command::Lookup {
            text,
            page,
            page_size,
            backend_url,
        } => handle_lookup(text, page, page_size, backend_url, cli.json),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn Error>> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn handle_serve(args: ServeArgs) -> Result<(), Box<dyn Error>> {
    let config = ServiceConfig::validate(args.into())?;
    runtime()?.block_on(zidian_rs::web::serve(config))?;
    Ok(())
}

fn handle_lookup(
    text: String,
    page: u32,
    page_size: u32,
    backend_url: String,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if text.trim().is_empty() {
        return Err("Lookup text cannot be empty".into());
    }
    let client = LookupClient::new(backend_url);
    let query = LookupQuery::new(text.trim()).page(page.max(1)).page_size(page_size.max(1));
    let response = runtime()?.block_on(client.lookup(&query))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_results_table(&query.text, &response);
    }
    Ok(())
}

fn print_results_table(text: &str, response: &LookupResponse) {
    if response.results.is_empty() {
        println!("No results found for \"{text}\".");
        return;
    }
    let width = response
        .results
        .iter()
        .map(|hit| hit.simplified.chars().count())
        .max()
        .unwrap_or(4)
        .max("WORD".len());
    let pinyin_width = response
        .results
        .iter()
        .map(|hit| hit.pinyin.chars().count())
        .max()
        .unwrap_or(6)
        .max("PINYIN".len());
    println!("Results for \"{text}\" ({}):", response.input_type);
    println!(
        "{:<width$}  {:<pinyin_width$}  {}",
        "WORD",
        "PINYIN",
        "DEFINITION",
        width = width,
        pinyin_width = pinyin_width
    );
    println!(
        "{:-<width$}  {:-<pinyin_width$}  {}",
        "",
        "",
        "----------",
        width = width,
        pinyin_width = pinyin_width
    );
    for hit in &response.results {
        let word = match hit.distinct_traditional() {
            Some(traditional) => format!("{} ({traditional})", hit.simplified),
            None => hit.simplified.clone(),
        };
        println!(
            "{:<width$}  {:<pinyin_width$}  {}",
            word,
            hit.pinyin,
            hit.definition,
            width = width,
            pinyin_width = pinyin_width
        );
    }
    let pagination = response.pagination;
    println!(
        "\nPage {} of {} ({} results)",
        pagination.page, pagination.total_pages, pagination.total_count
    );
}
