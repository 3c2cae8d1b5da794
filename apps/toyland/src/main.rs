#[tokio::main]
async fn main() -> anyhow::Result<()> {
    toyland_server::run_server().await
}
