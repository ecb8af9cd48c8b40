//! Upstream research-infrastructure API clients
//!
//! All upstream calls are read-only JSON GETs with a per-service timeout and
//! the optional configured proxy. Clients only report what happened (HTTP
//! status, transport error, unparsable body); the pipeline step that owns
//! the call decides whether that means "badge not available" or "failure".

pub mod doaj_client;
pub mod geonames_client;
pub mod o2r_client;

pub use doaj_client::{DoajClient, DoajError};
pub use geonames_client::{GeoNamesClient, GeoNamesError};
pub use o2r_client::{O2rClient, O2rError};

use badger_common::TomlConfig;
use std::time::Duration;

const USER_AGENT: &str = concat!("badger/", env!("CARGO_PKG_VERSION"));

/// Build an HTTP client with the given timeout and optional proxy
pub fn http_client(timeout: Duration, proxy: Option<&str>) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout);

    if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }

    builder.build()
}

/// The set of upstream clients used by the badge families
#[derive(Debug, Clone)]
pub struct Upstream {
    pub o2r: O2rClient,
    pub doaj: DoajClient,
    pub geonames: GeoNamesClient,
}

impl Upstream {
    pub fn from_config(config: &TomlConfig) -> Result<Self, reqwest::Error> {
        let proxy = config.net.proxy.as_deref();

        Ok(Self {
            o2r: O2rClient::new(
                http_client(config.timeout.o2r(), proxy)?,
                &config.ext.o2r,
            ),
            doaj: DoajClient::new(
                http_client(config.timeout.doaj(), proxy)?,
                &config.ext.doaj_articles,
                &config.ext.doaj_journals,
            ),
            geonames: GeoNamesClient::new(
                http_client(config.timeout.geonames(), proxy)?,
                &config.ext.geonames,
                &config.ext.geonames_ocean,
                &config.ext.geonames_username,
            ),
        })
    }
}
