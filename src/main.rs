use std::fs::{self, File};
use std::path::PathBuf;

use clap::Parser;
use postfeed::api::ApiClient;
use postfeed::app::App;
use postfeed::config::{self, Overrides};
use postfeed::error::Result;
use postfeed::store::Store;
use simplelog::{ConfigBuilder, WriteLogger};

#[derive(Parser)]
#[command(name = "postfeed", about = "Browse posts and their authors in the terminal")]
struct Args {
    /// Config file to read instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the posts API
    #[arg(long)]
    base_url: Option<String>,

    /// Artificial delay added to every response, in milliseconds
    #[arg(long)]
    response_delay_ms: Option<u64>,

    /// Log level (error, warn, info, debug, trace, off)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    let resolved = file_config.resolve(&Overrides {
        base_url: args.base_url,
        response_delay_ms: args.response_delay_ms,
        log_level: args.log_level,
    });

    // Initialize file logger; the terminal belongs to the UI.
    if let Some(path) = &resolved.log_file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
        if let Ok(log_file) = File::create(path) {
            let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
        }
    }

    log::info!(
        "Postfeed starting up against {} (stale after {:?})",
        resolved.base_url,
        resolved.stale_after
    );

    let store = Store::default().with_stale_after(resolved.stale_after);
    let client = ApiClient::new(resolved.base_url)?.with_response_delay(resolved.response_delay);
    let mut app = App::new(store, client, resolved.transition);

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    log::info!("Postfeed shutting down");
    result?;
    Ok(())
}
