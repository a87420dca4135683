#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = qpaper_rust::run().await {
        eprintln!("qpaper-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
