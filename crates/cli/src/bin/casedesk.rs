use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    casedesk_cli::main_entry().await
}
