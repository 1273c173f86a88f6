//! Connection parameters.
use crate::codec::ArakoonBytes;
use crate::error::{ArakoonError, ArakoonResult};

/// Everything needed to open and authenticate a connection to one
/// Arakoon node.
///
/// Built through [`ConnectParamsBuilder`] rather than constructed
/// directly, so that required fields are checked once, in one place,
/// before any socket is opened.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectParams {
    pub(crate) cluster_id: ArakoonBytes,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) client_id: ArakoonBytes,
}

impl ConnectParams {
    #[must_use]
    pub fn builder() -> ConnectParamsBuilder {
        ConnectParamsBuilder::default()
    }

    #[must_use]
    pub fn cluster_id(&self) -> &[u8] {
        &self.cluster_id.0
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn client_id(&self) -> &[u8] {
        &self.client_id.0
    }

    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Fallible builder for [`ConnectParams`]. `cluster_id` and `host` have
/// no sensible default and must be set explicitly; `port` defaults to
/// Arakoon's conventional `4922`, and `client_id` defaults to an empty
/// identifier, which the reference client also accepts.
#[derive(Clone, Debug, Default)]
pub struct ConnectParamsBuilder {
    cluster_id: Option<ArakoonBytes>,
    host: Option<String>,
    port: Option<u16>,
    client_id: Option<ArakoonBytes>,
}

const DEFAULT_PORT: u16 = 4922;

impl ConnectParamsBuilder {
    #[must_use]
    pub fn cluster_id(mut self, cluster_id: impl Into<ArakoonBytes>) -> Self {
        self.cluster_id = Some(cluster_id.into());
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<ArakoonBytes>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn build(self) -> ArakoonResult<ConnectParams> {
        let cluster_id = self
            .cluster_id
            .ok_or(ArakoonError::Validation("cluster_id is required"))?;
        let host = self
            .host
            .ok_or(ArakoonError::Validation("host is required"))?;
        if host.is_empty() {
            return Err(ArakoonError::Validation("host must not be empty"));
        }
        Ok(ConnectParams {
            cluster_id,
            host,
            port: self.port.unwrap_or(DEFAULT_PORT),
            client_id: self.client_id.unwrap_or_default(),
        })
    }
}
