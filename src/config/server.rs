use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Name of the site that placements resolve against by default.
    /// Placements in categories belonging to other sites get absolute URLs.
    pub default_site: String,
    /// Domain used when the default site has to be created on first start.
    pub default_domain: String,
    /// Scheme used for absolute (cross-site) URLs.
    pub public_scheme: String,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("masthead.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            default_site: "default".to_string(),
            default_domain: "localhost".to_string(),
            public_scheme: "http".to_string(),
        }
    }
}
