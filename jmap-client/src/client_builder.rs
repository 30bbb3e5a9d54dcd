//! Client builder for configuring endpoints, decoders and observability
//!
//! The `ClientBuilder` provides a fluent API for configuring a [`Client`]
//! before first use. It allows you to:
//! - Set the session endpoint and the authorization header value
//! - Register argument decoders for the capabilities in use
//! - Configure observability (OpenTelemetry) and client metrics
//!
//! # Examples
//!
//! ```rust,no_run
//! use jmap_client::{ClientBuilder, Transport};
//! use jmap_core::Registry;
//! use serde_json::{Map, Value};
//!
//! # async fn example(transport: impl Transport) -> jmap_core::Result<()> {
//! let mut mail: Registry<Map<String, Value>> = Registry::new();
//! mail.register_object("Mailbox/get");
//!
//! let client = ClientBuilder::new(transport)
//!     .session_endpoint("https://jmap.example.com/.well-known/jmap")
//!     .authorization("Bearer secret")
//!     .with_registry(mail)
//!     .with_default_observability()
//!     .service_name("mail-sync")
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::{Client, ClientMetrics, Transport};
use jmap_core::{Error, ObservabilityConfig, Registry, Result};
use std::sync::Arc;

/// Builder for configuring and creating a [`Client`]
pub struct ClientBuilder<T, A> {
    transport: T,
    session_endpoint: String,
    authorization: String,
    registry: Registry<A>,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
    metrics: bool,
}

impl<T: Transport, A> ClientBuilder<T, A> {
    /// Create a new client builder around a transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            session_endpoint: String::new(),
            authorization: String::new(),
            registry: Registry::new(),
            observability_config: None,
            service_name: None,
            metrics: false,
        }
    }

    /// Set the URL of the session resource
    pub fn session_endpoint(mut self, url: impl Into<String>) -> Self {
        self.session_endpoint = url.into();
        self
    }

    /// Set the `Authorization` header value sent with every request
    pub fn authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = value.into();
        self
    }

    /// Add argument decoders; later registrations win on name clashes
    pub fn with_registry(mut self, registry: Registry<A>) -> Self {
        self.registry.merge(&registry);
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    ///
    /// Also turns on client metrics.
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self.metrics = true;
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(self) -> Self {
        self.with_observability(ObservabilityConfig::default())
    }

    /// Record client metrics on the global meter provider without
    /// installing one
    pub fn with_metrics(mut self) -> Self {
        self.metrics = true;
        self
    }

    /// Set service name for observability and metrics
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the client without contacting the server
    pub fn build(self) -> Result<Client<T, A>> {
        let mut service_name = self.service_name.clone();

        // Initialize observability if configured
        if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }
            service_name = Some(config.service_name.clone());

            jmap_core::init_observability(config).map_err(|e| {
                Error::Internal(format!("Failed to initialize observability: {}", e))
            })?;
        }

        let metrics = self.metrics.then(|| {
            let name = service_name.unwrap_or_else(|| "jmap-client".to_string());
            Arc::new(ClientMetrics::new(name))
        });

        let mut client =
            Client::new(self.transport, self.session_endpoint, self.authorization).with_metrics(metrics);
        client.enable(&self.registry);

        tracing::debug!(
            endpoint = %client.session_endpoint(),
            methods = client.registry().len(),
            "Client built"
        );
        Ok(client)
    }

    /// Build the client and fetch the session object
    pub async fn connect(self) -> Result<Client<T, A>> {
        let client = self.build()?;
        client.update_session().await?;
        Ok(client)
    }
}
