use anyhow::Result;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        anyhow::bail!("usage: {} <url> <api-key>", args[0]);
    }

    let client = octoprint::Client::new(&args[1], &args[2], None, None, Duration::from_secs(10))?;
    let status = client.job().await?;
    eprintln!("{}: {}", client.url_base(), status.state);
    if let Some(name) = status.job.file.name {
        eprintln!("file: {}", name);
    }
    if let Some(completion) = status.progress.completion {
        eprintln!("progress: {:.1}%", completion);
    }

    Ok(())
}
