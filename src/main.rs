mod cli;

use anyhow::{anyhow, bail};
use datadog_api::{Client, Config, RequestContext};
use log::info;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::build_cli();
    let matches = cmd.get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();
    let version_flag = matches.get_flag("version");

    cli::init_logging(log_level.as_deref());

    if version_flag {
        println!("datadog-api {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::from_env().map_err(|e| anyhow!(e))?;
    let client = Client::from_config(config)?;
    let mut ctx = RequestContext::background();
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        ctx = ctx.with_timeout(Duration::from_secs(*secs));
    }

    match matches.subcommand() {
        Some(("validate", _)) => {
            let validation = client.validate(&ctx).await?;
            if !validation.is_valid {
                bail!("keys rejected: {}", validation.errors.join("; "));
            }
            println!("valid");
        }
        Some(("get", sub)) => {
            let path = sub
                .get_one::<String>("path")
                .ok_or_else(|| anyhow!("missing path"))?;
            let resp = client.get::<serde_json::Value>(&ctx, path).await?;
            let rate = resp.meta.rate_limit;
            info!(
                "rate limit: {}/{} remaining, period {:?}, resets in {:?}",
                rate.remaining, rate.limit, rate.period, rate.reset
            );
            println!("{}", serde_json::to_string_pretty(&resp.value)?);
        }
        _ => bail!("no command given; try --help"),
    }
    Ok(())
}
