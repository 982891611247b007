use clap::{crate_version, App, AppSettings, Arg, SubCommand};
use filmfeed::build::{build_site, rebuild_listings};
use filmfeed::config::Config;
use filmfeed::ingest::HttpFetcher;
use std::error::Error;
use std::path::Path;

fn main() {
    init_tracing();

    let matches = App::new("filmfeed")
        .version(crate_version!())
        .about("Turns film-news feeds into a static article site")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("project")
                .short("p")
                .long("project")
                .takes_value(true)
                .value_name("FILE")
                .help("The project file (defaults to the nearest filmfeed.yaml)"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Fetches the feeds, renders new articles, and regenerates the listings"),
        )
        .subcommand(
            SubCommand::with_name("index")
                .about("Regenerates the article index and the homepage without fetching"),
        )
        .get_matches();

    // `SubcommandRequiredElseHelp` leaves only the two subcommands above.
    let command = match matches.subcommand_name() {
        Some("index") => Command::Index,
        _ => Command::Build,
    };

    if let Err(e) = run(matches.value_of("project"), command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs to stderr at `info` unless `RUST_LOG` says otherwise.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

enum Command {
    Build,
    Index,
}

fn run(project: Option<&str>, command: Command) -> Result<(), Box<dyn Error>> {
    let config = match project {
        Some(path) => Config::from_project_file(Path::new(path))?,
        None => Config::from_directory(&std::env::current_dir()?)?,
    };

    match command {
        Command::Build => {
            let fetcher = HttpFetcher::new(config.fetch_timeout)?;
            build_site(&config, &fetcher)?;
        }
        Command::Index => rebuild_listings(&config)?,
    }
    Ok(())
}
