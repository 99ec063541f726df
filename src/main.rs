use anyhow::Result;
use shiplog::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = shiplog::logger::init() {
        eprintln!("Warning: failed to initialize logging: {e}");
    }
    cli.execute()
}
