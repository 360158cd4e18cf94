// ABOUTME: Per-user configuration paths and atomic file writes
// ABOUTME: Holds the token and client-secret locations with owner-only permissions

use crate::{Error, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Paths {
    pub config_dir: PathBuf,
    pub token_path: PathBuf,
    pub client_secret_path: PathBuf,
}

impl Paths {
    pub fn new(config_dir_override: Option<PathBuf>) -> Result<Self> {
        let config_dir = if let Some(dir) = config_dir_override {
            dir
        } else {
            ProjectDirs::from("", "", "drivectl")
                .ok_or_else(|| {
                    Error::Filesystem(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "Could not determine config directory",
                    ))
                })?
                .config_dir()
                .to_path_buf()
        };

        Ok(Paths {
            token_path: config_dir.join("token.json"),
            client_secret_path: config_dir.join("credentials.json"),
            config_dir,
        })
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(&self.config_dir, perms)?;
        }
        Ok(())
    }
}

/// Write via a temp file in the same directory, then rename into place.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    use rand::Rng;

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let random: u32 = rand::thread_rng().gen();
    let tmp_path = parent.join(format!(".{:x}.part", random));

    fs::write(&tmp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(&tmp_path, perms)?;
    }

    fs::rename(&tmp_path, path)?;

    Ok(())
}
