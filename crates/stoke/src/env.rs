//! Process environment resolved once at startup.
//!
//! Components receive this value instead of reading process env themselves,
//! so there is exactly one place where the variables are interpreted.

use std::path::Path;

use crate::urls::Protocol;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Variables the tooling consumes, resolved with their defaults.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Desired port (`PORT`, default 3000)
    pub port: u16,

    /// Bind address (`HOST`, default wildcard)
    pub host: String,

    /// URL scheme (`HTTPS=true` selects https)
    pub protocol: Protocol,
}

impl Environment {
    /// Force `NODE_ENV`, load `.env` dotfiles, and resolve the variables.
    ///
    /// Dotfiles are read in priority order; dotenv loading never overrides
    /// a variable that is already set, so earlier files win.
    pub fn load(env_name: &str) -> Self {
        std::env::set_var("NODE_ENV", env_name);
        load_dotfiles(Path::new("."), env_name);
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|raw| raw.parse().ok())
            .filter(|&p| p != 0)
            .unwrap_or(DEFAULT_PORT);
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let protocol = if lookup("HTTPS").as_deref() == Some("true") {
            Protocol::Https
        } else {
            Protocol::Http
        };

        Self {
            port,
            host,
            protocol,
        }
    }
}

/// Dotfiles in priority order, most specific first.
fn dotenv_files(env_name: &str) -> [String; 4] {
    [
        format!(".env.{env_name}.local"),
        format!(".env.{env_name}"),
        ".env.local".to_string(),
        ".env".to_string(),
    ]
}

fn load_dotfiles(root: &Path, env_name: &str) {
    for file in dotenv_files(env_name) {
        let _ = dotenvy::from_path(root.join(file));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let env = Environment::from_lookup(|_| None);

        assert_eq!(env.port, 3000);
        assert_eq!(env.host, "0.0.0.0");
        assert_eq!(env.protocol, Protocol::Http);
    }

    #[test]
    fn reads_overrides() {
        let env = Environment::from_lookup(lookup_in(&[
            ("PORT", "4000"),
            ("HOST", "10.0.0.5"),
            ("HTTPS", "true"),
        ]));

        assert_eq!(env.port, 4000);
        assert_eq!(env.host, "10.0.0.5");
        assert_eq!(env.protocol, Protocol::Https);
    }

    #[test]
    fn non_numeric_port_falls_back() {
        let env = Environment::from_lookup(lookup_in(&[("PORT", "not-a-port")]));
        assert_eq!(env.port, 3000);
    }

    #[test]
    fn port_zero_falls_back() {
        let env = Environment::from_lookup(lookup_in(&[("PORT", "0")]));
        assert_eq!(env.port, 3000);
    }

    #[test]
    fn dotfiles_are_ordered_most_specific_first() {
        let files = dotenv_files("development");

        assert_eq!(files[0], ".env.development.local");
        assert_eq!(files[1], ".env.development");
        assert_eq!(files[2], ".env.local");
        assert_eq!(files[3], ".env");
    }

    #[test]
    fn earlier_dotfile_wins() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(
            temp.path().join(".env.development.local"),
            "STOKE_DOTFILE_PRECEDENCE=local\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join(".env.development"),
            "STOKE_DOTFILE_PRECEDENCE=development\n",
        )
        .unwrap();
        std::fs::write(temp.path().join(".env"), "STOKE_DOTFILE_PRECEDENCE=base\n").unwrap();

        // Dotenv loading never overrides a variable that is already set,
        // so the first file read is the one that sticks.
        std::env::remove_var("STOKE_DOTFILE_PRECEDENCE");
        load_dotfiles(temp.path(), "development");

        assert_eq!(
            std::env::var("STOKE_DOTFILE_PRECEDENCE").unwrap(),
            "local"
        );
        std::env::remove_var("STOKE_DOTFILE_PRECEDENCE");
    }

    #[test]
    fn https_requires_literal_true() {
        let env = Environment::from_lookup(lookup_in(&[("HTTPS", "1")]));
        assert_eq!(env.protocol, Protocol::Http);
    }
}
