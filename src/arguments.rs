//! Program arguments.
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Command line arguments.
#[derive(Parser, Debug, Clone)]
#[clap(about, version, author)]
pub struct ProgramArgs {
    #[clap(long, default_value = "127.0.0.1:8443")]
    #[clap(help = "socket address to listen on")]
    pub listen_addr: SocketAddr,
    #[clap(long, requires = "server_tls_cert_file")]
    #[clap(help = "ssl tls key file")]
    pub server_tls_key_file: Option<PathBuf>,
    #[clap(long, requires = "server_tls_key_file")]
    #[clap(help = "ssl tls certificate file")]
    pub server_tls_cert_file: Option<PathBuf>,
}

impl ProgramArgs {
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// TLS certificate and key files, when both are supplied.
    pub fn tls_files(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.server_tls_cert_file
            .as_ref()
            .zip(self.server_tls_key_file.as_ref())
    }
}
