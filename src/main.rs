use std::io::BufRead;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;

use tubedeck::clipboard::Pasteboard;
use tubedeck::config::{self, AppConfig};
use tubedeck::storage::SqliteKeyValueStore;
use tubedeck::App;

/// Line-based stand-in for the OS pasteboard in headless operation: every
/// line arriving on stdin bumps the change count, the way a paste would.
#[derive(Clone, Default)]
struct LinePasteboard {
    state: Arc<Mutex<(u64, Option<String>)>>,
}

impl LinePasteboard {
    fn push(&self, text: String) {
        let mut state = self.state.lock();
        state.0 += 1;
        state.1 = Some(text);
    }
}

impl Pasteboard for LinePasteboard {
    fn change_count(&self) -> u64 {
        self.state.lock().0
    }

    fn contents(&self) -> Option<String> {
        self.state.lock().1.clone()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::default();
    let kv = Arc::new(SqliteKeyValueStore::open(&config::database_path()).await?);
    let app = App::bootstrap(config, kv).await?;

    if !app.channels.channels().is_empty() && app.config.is_api_configured() {
        app.refresh_channels().await;
    }

    let pasteboard = LinePasteboard::default();
    let feeder = pasteboard.clone();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines().map_while(|line| line.ok()) {
            if !line.trim().is_empty() {
                feeder.push(line);
            }
        }
    });

    log::info!("Paste a YouTube link (or pipe one in) to start a session");

    tokio::select! {
        _ = app.run_watch_loop(Box::new(pasteboard)) => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutting down");
        }
    }

    Ok(())
}
