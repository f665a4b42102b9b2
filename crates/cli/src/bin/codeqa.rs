use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    codeqa_cli::main_entry().await
}
