use clap::Parser;
use miette::Result;
use spoolr::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` exits quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(global.verbose);

    match cli.command {
        Commands::Vendor(cmd) => spoolr::cli::commands::vendor::run(cmd, &global),
        Commands::Filament(cmd) => spoolr::cli::commands::filament::run(cmd, &global),
        Commands::Purchase(cmd) => spoolr::cli::commands::purchase::run(cmd, &global),
        Commands::Item(cmd) => spoolr::cli::commands::item::run(cmd, &global),
        Commands::Spool(cmd) => spoolr::cli::commands::spool::run(cmd, &global),
        Commands::Inventory(args) => spoolr::cli::commands::inventory::run(args, &global),
        Commands::Import(args) => spoolr::cli::commands::import::run(args, &global),
        Commands::Config(cmd) => spoolr::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => spoolr::cli::commands::completions::run(args),
    }
}

/// `SPOOLR_LOG` wins; otherwise warn, or debug with `--verbose`
fn init_logging(verbose: bool) {
    let fallback = if verbose { "spoolr=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SPOOLR_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
