#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lokiprobe_ui_terminal::run().await
}
