use anyhow::Result;
use clap::Parser;
use rollcall::cli::Cli;
use rollcall::roster::{AssumeYes, Confirm, Prompt};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut app = rollcall::create_default_app()?;

    let mut confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(Prompt)
    };

    if let Some(page) = app.run(cli.command, confirm.as_mut()) {
        print!("{page}");
    }

    Ok(())
}
