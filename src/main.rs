#[tokio::main]
async fn main() -> anyhow::Result<()> {
    chefbot::run().await
}
