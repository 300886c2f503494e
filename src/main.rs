use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = graceful_worker::cli::parse();
    let code = app::run(args)?;
    if code != 0 {
        // Do not wait on anything still running; an abandoned worker dies with us.
        std::process::exit(code);
    }
    Ok(())
}
