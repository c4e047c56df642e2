use carton_ledger::cli::{commands, Cli, Commands};
use clap::Parser;
use miette::Result;

/// Environment variable holding the log filter (e.g. `debug`, `carton_ledger=trace`)
const LOG_ENV: &str = "CARTONS_LOG";

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
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

    // Logs go to stderr so stdout stays pipeable
    let default_level = if global.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Reserve(args) => commands::reserve::run(args, &global),
        Commands::Last(args) => commands::last::run(args, &global),
        Commands::History(args) => commands::history::run(args, &global),
        Commands::Packages(args) => commands::packages::run(args, &global),
        Commands::Recent(args) => commands::recent::run(args, &global),
        Commands::Labels(args) => commands::labels::run(args, &global),
        Commands::Export(args) => commands::export::run(args, &global),
        Commands::Verify(args) => commands::verify::run(args, &global),
        Commands::Status(args) => commands::status::run(args, &global),
        Commands::Config(cmd) => commands::config::run(cmd),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
