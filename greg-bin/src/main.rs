use clap::Parser;
use greg_cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.run().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("❌ Error: {e}");
            if e.needs_reconfiguration() {
                eprintln!("{}", greg_cli::ui::SETUP_HINT);
            }
            std::process::exit(1);
        }
    }
}
