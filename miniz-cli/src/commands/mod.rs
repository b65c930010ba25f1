pub mod benchmark;
pub mod mine;

use tokio_util::sync::CancellationToken;

/// Token cancelled on the first Ctrl-C
pub fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping");
            trigger.cancel();
        }
    });
    token
}
