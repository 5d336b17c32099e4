use super::{json_pretty, EXIT_SUCCESS};
use std::path::Path;
use tessera_schema::{PackageLock, LOCK_FILE_NAME};

/// Display the lock document of a project.
pub fn run(project: &Path, json: bool) -> Result<u8, String> {
    let lock_path = project.join(LOCK_FILE_NAME);
    if !lock_path.is_file() {
        return Err(format!(
            "no lock document at {}; run 'tessera restore' first",
            lock_path.display()
        ));
    }

    let lock = PackageLock::read_from_file(&lock_path).map_err(|e| format!("lock error: {e}"))?;
    if json {
        println!("{}", json_pretty(&lock)?);
    } else {
        print!("{}", lock.to_toml_string().map_err(|e| format!("lock error: {e}"))?);
    }
    Ok(EXIT_SUCCESS)
}
