use std::env;
use std::fs;

/// Deployment environment, decided by the machine name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Test,
    Development,
    Local,
}

impl Environment {
    /// Map a host name to its environment. Comparison ignores ASCII case but not
    /// whitespace; unknown hosts are `Local`.
    #[must_use]
    pub fn from_host(host: &str) -> Self {
        match host.to_ascii_lowercase().as_str() {
            "mycampus2" => Environment::Production,
            "mycampus2test" => Environment::Test,
            "mycampus2dev" => Environment::Development,
            _ => Environment::Local,
        }
    }
}

/// The machine name of the running host, or an empty string when it cannot be read.
#[must_use]
pub fn host_identity() -> String {
    for var in ["COMPUTERNAME", "HOSTNAME"] {
        if let Ok(name) = env::var(var) {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }
    }
    fs::read_to_string("/etc/hostname")
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Bootstrap connection strings, one per environment.
///
/// Fixed for the life of the process; adding an environment means redeploying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConnections {
    pub production: String,
    pub test: String,
    pub development: String,
    pub local: String,
}

impl BootstrapConnections {
    /// Connection string used when nothing else is configured.
    pub const LOCAL_DEFAULT: &'static str =
        "Server=localhost;Database=ICS_NET;Integrated Security=true;TrustServerCertificate=true";

    #[must_use]
    pub fn new(
        production: impl Into<String>,
        test: impl Into<String>,
        development: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            production: production.into(),
            test: test.into(),
            development: development.into(),
            local: local.into(),
        }
    }

    /// Read the four strings from `SQL_CURRY_BOOTSTRAP_{PRODUCTION,TEST,DEVELOPMENT,LOCAL}`.
    /// Missing variables fall back to [`Self::LOCAL_DEFAULT`].
    #[must_use]
    pub fn from_env() -> Self {
        let read = |suffix: &str| {
            env::var(format!("SQL_CURRY_BOOTSTRAP_{suffix}"))
                .unwrap_or_else(|_| Self::LOCAL_DEFAULT.to_string())
        };
        Self::new(
            read("PRODUCTION"),
            read("TEST"),
            read("DEVELOPMENT"),
            read("LOCAL"),
        )
    }

    #[must_use]
    pub fn for_environment(&self, environment: Environment) -> &str {
        match environment {
            Environment::Production => &self.production,
            Environment::Test => &self.test,
            Environment::Development => &self.development,
            Environment::Local => &self.local,
        }
    }

    /// Bootstrap connection string for the given host.
    #[must_use]
    pub fn resolve(&self, host: &str) -> &str {
        self.for_environment(Environment::from_host(host))
    }

    /// Bootstrap connection string for the running host.
    #[must_use]
    pub fn current(&self) -> &str {
        self.resolve(&host_identity())
    }
}

impl Default for BootstrapConnections {
    fn default() -> Self {
        Self::new(
            Self::LOCAL_DEFAULT,
            Self::LOCAL_DEFAULT,
            Self::LOCAL_DEFAULT,
            Self::LOCAL_DEFAULT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conns() -> BootstrapConnections {
        BootstrapConnections::new("prod", "test", "dev", "local")
    }

    #[test]
    fn known_hosts_map_to_their_strings() {
        let c = conns();
        assert_eq!(c.resolve("mycampus2"), "prod");
        assert_eq!(c.resolve("MyCampus2Test"), "test");
        assert_eq!(c.resolve("MYCAMPUS2DEV"), "dev");
    }

    #[test]
    fn unknown_hosts_fall_back_to_local() {
        let c = conns();
        assert_eq!(c.resolve("laptop-42"), "local");
        assert_eq!(c.resolve(""), "local");
        assert_eq!(c.resolve("mycampus2prod"), "local");
    }

    #[test]
    fn host_names_are_not_trimmed() {
        assert_eq!(Environment::from_host("MyCampus2"), Environment::Production);
        assert_eq!(Environment::from_host(" mycampus2"), Environment::Local);
        assert_eq!(Environment::from_host("mycampus2dev\n"), Environment::Local);
    }
}
