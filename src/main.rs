#[tokio::main]
async fn main() -> anyhow::Result<()> {
    godo_server::run().await
}
