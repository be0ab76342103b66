use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{config, error, info, spotify, types::PkceToken};

pub async fn auth(shared_state: Arc<Mutex<Option<PkceToken>>>, read_only: bool) {
    let scope = config::spotify_scope(read_only);
    info!("Requesting scope: {}", scope);

    if let Err(e) = spotify::auth::auth(shared_state, &scope).await {
        error!("Authentication failed: {}", e);
    }
}
