#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = qpaper_rust::run_generate().await {
        eprintln!("generate_questions fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
