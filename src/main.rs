#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shelfd::run().await
}
