use anyhow::Context;
use directories::ProjectDirs;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::models::session::Session;

/// JSON file holding the persisted session.
#[derive(Clone, Debug)]
pub struct SessionRepository {
    path: PathBuf,
}

impl SessionRepository {
    pub fn new(path: PathBuf) -> Self {
        SessionRepository { path }
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("lat", "epiroc", "epiroc-client")
            .map(|dirs| dirs.data_dir().join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty session.
    pub fn load(&self) -> Result<Session, anyhow::Error> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Session::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Could not read {}", self.path.display()))
            }
        };

        serde_json::from_str(&contents)
            .with_context(|| format!("Malformed session file {}", self.path.display()))
    }

    pub fn save(&self, session: &Session) -> Result<(), anyhow::Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)
            .with_context(|| format!("Could not write {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<(), anyhow::Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Could not remove {}", self.path.display())),
        }
    }
}

#[cfg(test)]
pub fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("epiroc-client-{}-{}", std::process::id(), name))
        .join("session.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear_cycle() {
        let repository = SessionRepository::new(scratch_path("repository-cycle"));
        assert_eq!(repository.load().unwrap(), Session::default());

        let session = Session::new("tkn".to_string(), "42".to_string());
        repository.save(&session).unwrap();
        assert_eq!(repository.load().unwrap(), session);

        repository.clear().unwrap();
        assert_eq!(repository.load().unwrap(), Session::default());
        repository.clear().unwrap();
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = scratch_path("repository-malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        assert!(SessionRepository::new(path).load().is_err());
    }
}
