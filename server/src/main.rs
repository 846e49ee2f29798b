#[tokio::main]
async fn main() {
    if let Err(e) = briefing_lib::run().await {
        eprintln!("briefingd: {}", e);
        std::process::exit(1);
    }
}
