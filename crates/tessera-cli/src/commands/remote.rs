use super::{json_pretty, EXIT_SUCCESS};
use console::style;
use tessera_remote::RemoteConfig;

/// Persist the service endpoint used by future invocations.
pub fn run(url: &str, token: Option<&str>, json: bool) -> Result<u8, String> {
    let mut config = RemoteConfig::new(url);
    if let Some(token) = token {
        config = config.with_token(token);
    }
    let path = config
        .save_default()
        .map_err(|e| format!("remote error: {e}"))?;

    if json {
        let payload = serde_json::json!({
            "url": config.url,
            "path": path.display().to_string(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{} {} -> {}",
            style("saved").green(),
            config.url,
            path.display()
        );
    }
    Ok(EXIT_SUCCESS)
}
