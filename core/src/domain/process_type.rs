//! Process categorisation by name.

use serde::{Deserialize, Serialize};

/// Category of process based on its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ProcessType {
    /// Web servers (nginx, apache, caddy, etc.)
    WebServer,
    /// Database servers (postgres, mysql, redis, etc.)
    Database,
    /// Development tools (node, python, vite, etc.)
    Development,
    /// System processes (launchd, systemd, etc.)
    System,
    /// Anything the keyword tables do not recognise.
    #[default]
    Other,
}

const WEB_SERVERS: &[&str] = &[
    "nginx", "apache", "httpd", "caddy", "traefik", "lighttpd", "envoy",
];

const DATABASES: &[&str] = &[
    "postgres",
    "mysql",
    "mariadb",
    "redis",
    "mongo",
    "sqlite",
    "cockroach",
    "clickhouse",
    "cassandra",
    "elasticsearch",
    "memcached",
];

const DEV_TOOLS: &[&str] = &[
    "node", "npm", "yarn", "pnpm", "bun", "deno", "python", "ruby", "php", "java", "go", "cargo",
    "rustc", "swift", "vite", "webpack", "esbuild", "next", "nuxt", "remix", "astro", "turbo",
    "parcel",
];

const SYSTEM_PROCS: &[&str] = &[
    "launchd",
    "rapportd",
    "sharingd",
    "airplay",
    "control",
    "kernel",
    "mds",
    "spotlight",
    "systemd",
    "init",
    "dbus",
    "udev",
];

/// Keyword tables in match priority order. The first table with a hit wins,
/// so `mysql-node-wrapper` is a database and not a development tool.
const KEYWORD_TABLES: [(ProcessType, &[&str]); 4] = [
    (ProcessType::WebServer, WEB_SERVERS),
    (ProcessType::Database, DATABASES),
    (ProcessType::Development, DEV_TOOLS),
    (ProcessType::System, SYSTEM_PROCS),
];

impl ProcessType {
    /// All available process types.
    pub const ALL: [ProcessType; 5] = [
        ProcessType::WebServer,
        ProcessType::Database,
        ProcessType::Development,
        ProcessType::System,
        ProcessType::Other,
    ];

    /// Classify a process by name.
    ///
    /// Case-insensitive substring match against the keyword tables; never fails,
    /// unmatched names are [`ProcessType::Other`].
    ///
    /// # Examples
    /// ```
    /// use portwatch_core::ProcessType;
    ///
    /// assert_eq!(ProcessType::detect("nginx"), ProcessType::WebServer);
    /// assert_eq!(ProcessType::detect("mysql-node-wrapper"), ProcessType::Database);
    /// assert_eq!(ProcessType::detect("launchd"), ProcessType::System);
    /// assert_eq!(ProcessType::detect("my-daemon"), ProcessType::Other);
    /// ```
    pub fn detect(process_name: &str) -> Self {
        let name = process_name.to_lowercase();

        KEYWORD_TABLES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k)))
            .map(|(kind, _)| *kind)
            .unwrap_or(ProcessType::Other)
    }

    /// Get the display name for this process type.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProcessType::WebServer => "Web Server",
            ProcessType::Database => "Database",
            ProcessType::Development => "Development",
            ProcessType::System => "System",
            ProcessType::Other => "Other",
        }
    }

    /// Get an icon identifier for this process type.
    pub fn icon(&self) -> &'static str {
        match self {
            ProcessType::WebServer => "globe",
            ProcessType::Database => "cylinder",
            ProcessType::Development => "hammer",
            ProcessType::System => "gearshape",
            ProcessType::Other => "powerplug",
        }
    }
}

impl std::fmt::Display for ProcessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for ProcessType {
    type Err = String;

    /// Parse either the serde name (`webServer`) or a loose form (`web`, `db`, `dev`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "webserver" | "web" => Ok(ProcessType::WebServer),
            "database" | "db" => Ok(ProcessType::Database),
            "development" | "dev" => Ok(ProcessType::Development),
            "system" | "sys" => Ok(ProcessType::System),
            "other" => Ok(ProcessType::Other),
            _ => Err(format!("unknown process type: {}", s)),
        }
    }
}
