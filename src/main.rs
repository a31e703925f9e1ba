use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use opc_trace::{arguments::ProgramArgs, build_app, TRACE_TARGET};
use std::error::Error;
use tracing::{event, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .pretty()
        // .json()
        // .flatten_event(true)
        .init();

    let program_opts = ProgramArgs::parse();
    let app = build_app();
    let addr = program_opts.listen_addr();

    event!(target: TRACE_TARGET, Level::INFO, "listening on {addr}");

    match program_opts.tls_files() {
        Some((cert_file, key_file)) => {
            let config = RustlsConfig::from_pem_file(cert_file, key_file).await?;
            axum_server::bind_rustls(addr, config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            axum_server::bind(addr)
                .serve(app.into_make_service())
                .await?;
        }
    }

    Ok(())
}
