//! SSH key files of a local document.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use cfgvault_common::{Error, Result, SensitiveString};
use cfgvault_store::SshKeyPaths;

const PRIVATE_KEY_FILE: &str = "id";
const PUBLIC_KEY_FILE: &str = "id.pub";

/// Contents of an SSH key pair.
#[derive(Debug, Clone)]
pub struct SshKeyMaterial {
    /// Private key.
    pub private_key: SensitiveString,
    /// Public key, when one exists.
    pub public_key: Option<String>,
}

/// Read the key pair a document points at.
///
/// # Errors
/// - `Error::Validation` if the private key file does not exist
pub async fn read_key_pair(paths: &SshKeyPaths) -> Result<SshKeyMaterial> {
    let private_key = match fs::read_to_string(&paths.private_key_path).await {
        Ok(text) => SensitiveString::new(text),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::Validation(format!(
                "SSH key not found: {}",
                paths.private_key_path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let public_key = match fs::read_to_string(paths.public_key_path_or_default()).await {
        Ok(text) => Some(text),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    Ok(SshKeyMaterial {
        private_key,
        public_key,
    })
}

/// Write a key pair into `dir` with owner-only permissions.
///
/// Returns the paths to record in the document.
pub async fn write_key_pair(dir: &Path, material: &SshKeyMaterial) -> Result<SshKeyPaths> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(dir).await?;

    let private_key_path = dir.join(PRIVATE_KEY_FILE);
    write_private_file(&private_key_path, material.private_key.expose()).await?;

    let public_key_path = match &material.public_key {
        Some(public_key) => {
            let path = dir.join(PUBLIC_KEY_FILE);
            write_private_file(&path, public_key).await?;
            Some(path)
        }
        None => None,
    };

    Ok(SshKeyPaths {
        private_key_path,
        public_key_path,
    })
}

async fn write_private_file(path: &Path, contents: &str) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;

    // An existing file keeps its old mode on open.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    Ok(())
}
