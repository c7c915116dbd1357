//! WebSocket channel that tells connected browsers to reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Messages sent to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Connection established
    Connected,

    /// Full page reload
    Reload,

    /// A rebuild failed; the page stays up, the console gets the error
    BuildFailed { message: String },
}

/// Hub for broadcasting reload messages to all connected clients.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: ReloadMessage) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(msg);
    }

    /// Subscribe to reload messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Client-side script served at `/__livereload.js`. Connects back to the
/// host the page was loaded from, so it works for localhost and LAN alike.
pub fn reload_client_script() -> &'static str {
    r#"
(function () {
  'use strict';

  var scheme = location.protocol === 'https:' ? 'wss:' : 'ws:';
  var ws = new WebSocket(scheme + '//' + location.host + '/__livereload');

  ws.onmessage = function (event) {
    var msg = JSON.parse(event.data);
    switch (msg.type) {
      case 'reload':
        location.reload();
        break;
      case 'build_failed':
        console.error('[stoke] Build failed:\n' + msg.message);
        break;
      case 'connected':
        console.log('[stoke] Live reload connected');
        break;
    }
  };

  ws.onclose = function () {
    setTimeout(function () {
      location.reload();
    }, 1000);
  };
})();
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_broadcasts_messages() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        hub.send(ReloadMessage::Reload);

        match rx.try_recv() {
            Ok(ReloadMessage::Reload) => {}
            other => panic!("expected Reload, got {:?}", other),
        }
    }

    #[test]
    fn send_without_subscribers_is_fine() {
        let hub = ReloadHub::new();
        assert_eq!(hub.client_count(), 0);
        hub.send(ReloadMessage::Reload);
    }

    #[test]
    fn serializes_messages() {
        let msg = ReloadMessage::BuildFailed {
            message: "syntax error".to_string(),
        };

        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains("build_failed"));
        assert!(json.contains("syntax error"));
    }
}
