//! `wirepipe` binary: relay bytes between stdio and the fixed target
//! endpoint until end-of-stream or a termination signal.

use tracing::{error, info};

use wirepipe::RelayConfig;

#[tokio::main]
async fn main() {
    wirepipe::tracing_init::init_tracing("wirepipe=info");

    let config = RelayConfig::default();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        "Starting wirepipe"
    );

    let code = match wirepipe::run(&config, tokio::io::stdin(), tokio::io::stdout()).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "Fatal relay error");
            #[allow(clippy::print_stderr)]
            {
                eprintln!("wirepipe: {e}");
            }
            i32::from(e.exit_code())
        }
    };

    // Exit without tearing the runtime down: a stdin read parked on the
    // blocking pool would otherwise stall process exit after the socket
    // side has already closed.
    std::process::exit(code);
}
