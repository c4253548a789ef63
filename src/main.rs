use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

use desfire_keysearch::nfc::{nfc_reader, Framing};
use desfire_keysearch::report::{colon_hex, SearchReport};
use desfire_keysearch::search::progress::{DotProgress, DEFAULT_PROGRESS_WIDTH};
use desfire_keysearch::{
    ApplicationId, AuthScheme, CancelToken, CandidateSource, KeyNumber, KeySearch, SearchError,
    SearchOutcome, SearchResult, SearchTarget,
};

/// Exit status when the material holds no working key
const EXIT_NOT_FOUND: u8 = 1;
const EXIT_CANCELLED: u8 = 130;

#[derive(Debug, Parser)]
#[command(
    name = "desfire-keysearch",
    version,
    about = "Try every window of a file as a DESFire application key"
)]
struct Cli {
    /// Application id, decimal or hex with leading 0x
    aid: ApplicationId,

    /// Key number inside the application (0-13)
    key_no: KeyNumber,

    /// One of AUTH_DES, AUTH_3DES, AUTH_3K3DES, AUTH_AES
    auth_type: AuthScheme,

    /// File whose bytes are tried as keys
    source: PathBuf,

    /// Only use readers whose name contains this text
    #[arg(short, long, env = "DESFIRE_READER")]
    reader: Option<String>,

    /// Command framing: native or wrapped (ISO 7816-4)
    #[arg(long, env = "DESFIRE_FRAMING", default_value = "native")]
    framing: Framing,

    /// Attempts per line of progress dots
    #[arg(long, env = "DESFIRE_PROGRESS_WIDTH", default_value_t = DEFAULT_PROGRESS_WIDTH)]
    progress_width: usize,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Debug output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: &Cli) -> SearchResult<(Option<String>, SearchOutcome)> {
    let source = CandidateSource::load(&cli.source)?;
    let target = SearchTarget::new(cli.aid, cli.key_no);
    let search = KeySearch::new(&source, target, cli.auth_type)?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Cannot install Ctrl-C handler: {}", e);
    }
    let search = search.with_cancel_token(cancel);

    let (reader, mut card) = nfc_reader::connect_desfire(cli.reader.as_deref(), cli.framing)
        .map_err(|e| SearchError::SessionFault("connect", e))?;
    info!("Using reader {}", reader);

    let mut progress = DotProgress::new(io::stderr(), cli.progress_width);
    let outcome = search.run(&mut card, &mut progress)?;

    Ok((Some(reader), outcome))
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (reader, outcome) = match run(&cli) {
        Ok(result) => result,
        Err(e) => {
            error!("{:?}", e);
            eprintln!("ERROR: {}", e);
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    let target = SearchTarget::new(cli.aid, cli.key_no);
    if cli.json {
        let report = SearchReport::new(reader, target, cli.auth_type, &outcome);
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Cannot serialize report: {}", e),
        }
    }

    match outcome {
        SearchOutcome::Found { key, .. } => {
            if !cli.json {
                println!(
                    "Authentication AID {} with key {} returned success!",
                    cli.aid, cli.key_no
                );
                println!("{}", colon_hex(&key));
            }
            ExitCode::SUCCESS
        }
        SearchOutcome::Exhausted { attempts } => {
            eprintln!("Key not found after {} attempts.", attempts);
            ExitCode::from(EXIT_NOT_FOUND)
        }
        SearchOutcome::Cancelled { attempts } => {
            eprintln!("Search cancelled after {} attempts.", attempts);
            ExitCode::from(EXIT_CANCELLED)
        }
    }
}
