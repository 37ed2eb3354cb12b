use clap::Parser;
use fastresize::{Cli, ResizeOutput};
use log::LevelFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let output = fastresize::resize(&cli.input, cli.width, cli.height, cli.options())?;
    let path = match output {
        ResizeOutput::File(path) => path,
        // Generated temp outputs are kept; the caller asked for a file,
        // just not at a particular path.
        ResizeOutput::Temp(temp) => temp.into_temp_path().keep()?,
    };
    println!("Resized image saved to: {}", path.display());

    Ok(())
}
