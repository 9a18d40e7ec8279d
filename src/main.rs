#[tokio::main]
async fn main() -> anyhow::Result<()> {
    yalla::gateway::run_cli().await
}
