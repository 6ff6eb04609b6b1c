use std::path::PathBuf;

/// Environment variable overriding the database location.
pub const DB_PATH_ENV: &str = "VCONTEXT_DB_PATH";

const DB_FILE_NAME: &str = "vcontext.db";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
}

impl ServerConfig {
    /// Resolve configuration from an optional CLI override and the environment.
    ///
    /// - `db_override` (the `--db` flag) wins when set
    /// - `VCONTEXT_DB_PATH` next, if non-blank
    /// - otherwise `<config dir>/vcontext/vcontext.db`, or `./vcontext.db`
    ///   when the platform has no config directory
    pub fn resolve(db_override: Option<PathBuf>) -> Self {
        let env = std::env::var(DB_PATH_ENV).ok();
        Self::resolve_with(db_override, env.as_deref(), dirs::config_dir())
    }

    fn resolve_with(
        db_override: Option<PathBuf>,
        env: Option<&str>,
        config_dir: Option<PathBuf>,
    ) -> Self {
        let db_path = db_override
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| {
                env.map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| match config_dir {
                Some(dir) => dir.join("vcontext").join(DB_FILE_NAME),
                None => PathBuf::from(DB_FILE_NAME),
            });

        Self { db_path }
    }
}
