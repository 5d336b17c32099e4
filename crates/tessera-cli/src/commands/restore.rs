use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use console::style;
use std::path::Path;
use tessera_core::Engine;

pub fn run(engine: &Engine, project: &Path, json: bool) -> Result<u8, String> {
    let pb = if json {
        None
    } else {
        Some(spinner("restoring packages..."))
    };

    match engine.restore(project) {
        Ok(()) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "restore complete");
            }
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "restore failed");
            }
            return Err(e.to_string());
        }
    }

    if json {
        let payload = serde_json::json!({
            "project": project.display().to_string(),
            "lock": project.join(tessera_schema::LOCK_FILE_NAME).display().to_string(),
            "status": "restored"
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{} {}",
            style("restored").green(),
            project.display()
        );
    }
    Ok(EXIT_SUCCESS)
}
