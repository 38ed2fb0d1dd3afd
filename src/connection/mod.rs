//! Connection management for MongoDB
//!
//! This module provides connection management functionality including:
//! - Connection establishment with a ping-based liveness check
//! - Database handle access
//! - Guaranteed termination on every exit path
//!
//! The connection is a scoped resource: acquired once at the start of a
//! run and released exactly once, whether the run succeeds or fails.

use mongodb::bson::doc;
use mongodb::{Client, Database, options::ClientOptions};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ConnectionError, Result};

/// MongoDB connection manager
///
/// Owns the driver client for the duration of a run. There is no pooling
/// configuration, reconnection, or retry here; the first failure is final.
pub struct ConnectionManager {
    /// MongoDB client instance
    client: Option<Client>,

    /// Connection URI
    uri: String,

    /// Database name
    database: String,

    /// Server selection timeout
    timeout: std::time::Duration,

    /// Current connection state
    state: Arc<RwLock<ConnectionState>>,
}

/// Connection state information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,

    /// Currently connecting
    Connecting,

    /// Connected and ready
    Connected,

    /// Connection failed
    Failed(String),
}

impl ConnectionManager {
    /// Create a new connection manager from the run configuration.
    ///
    /// # Arguments
    /// * `config` - Run configuration holding URI, database, and timeout
    ///
    /// # Returns
    /// * `Result<Self>` - New manager, or a config error if no URI is set
    pub fn from_config(config: &Config) -> Result<Self> {
        let uri = config.require_uri()?.to_string();
        Ok(Self {
            client: None,
            uri,
            database: config.connection.database.clone(),
            timeout: config.timeout(),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        })
    }

    /// Establish the connection and verify it with a ping.
    ///
    /// # Returns
    /// * `Result<()>` - Success or connection error
    pub async fn connect(&mut self) -> Result<()> {
        self.set_state(ConnectionState::Connecting).await;

        let mut options = ClientOptions::parse(&self.uri).await.map_err(|e| {
            ConnectionError::InvalidUri(e.to_string())
        })?;
        options.server_selection_timeout = Some(self.timeout);
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let client = match Client::with_options(options) {
            Ok(c) => c,
            Err(e) => {
                let msg = e.to_string();
                self.set_state(ConnectionState::Failed(msg.clone())).await;
                return Err(ConnectionError::ConnectionFailed(msg).into());
            }
        };

        // The driver connects lazily; a ping forces server selection so
        // failures surface here instead of on the first read.
        debug!("Pinging database '{}'", self.database);
        if let Err(e) = client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
        {
            let msg = e.to_string();
            self.set_state(ConnectionState::Failed(msg.clone())).await;
            return Err(ConnectionError::PingFailed(msg).into());
        }

        self.client = Some(client);
        self.set_state(ConnectionState::Connected).await;
        info!("Connected to MongoDB ({})", self.database);
        Ok(())
    }

    /// Get a handle to the configured database.
    ///
    /// # Returns
    /// * `Result<Database>` - Database handle, or error when not connected
    pub fn database(&self) -> Result<Database> {
        self.client
            .as_ref()
            .map(|c| c.database(&self.database))
            .ok_or_else(|| ConnectionError::NotConnected.into())
    }

    /// Name of the configured database.
    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// Close the connection and release driver resources.
    ///
    /// Idempotent; safe to call on an unconnected manager, which makes it
    /// usable from failure paths without tracking whether connect ran.
    pub async fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
            info!("MongoDB connection closed");
        }
        self.set_state(ConnectionState::Disconnected).await;
    }

    /// Get current connection state
    pub async fn state(&self) -> ConnectionState {
        self.state.read().await.clone()
    }

    /// Check if currently connected
    pub async fn is_connected(&self) -> bool {
        matches!(*self.state.read().await, ConnectionState::Connected)
    }

    /// Update connection state
    async fn set_state(&self, new_state: ConnectionState) {
        *self.state.write().await = new_state;
    }
}
