#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! This crate implements support for talking to an OctoPrint server over its
//! REST api, including the handful of plugins the dashboard knows about.

mod job;
mod layer;
pub mod relay;

use std::time::Duration;

use anyhow::Result;
pub use job::{JobFile, JobInfo, JobProgress, JobStatus};
pub use layer::LayerProgress;
pub use relay::Relay;

/// Client is a handle to a single OctoPrint server.
#[derive(Clone, Debug)]
pub struct Client {
    pub(crate) url_base: String,
    api_key: String,
    username: Option<String>,
    password: Option<String>,
    http: reqwest::Client,
}

impl Client {
    /// Create a new Client to talk to the OctoPrint server at `url_base`
    /// (for example `http://octopi.local`). Requests give up after `timeout`.
    pub fn new(
        url_base: &str,
        api_key: &str,
        username: Option<&str>,
        password: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            url_base: url_base.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            username: username.map(str::to_owned),
            password: password.map(str::to_owned),
            http: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    /// Base url of the server, without a trailing slash.
    pub fn url_base(&self) -> &str {
        &self.url_base
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.get(format!("{}{}", self.url_base, path)))
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.post(format!("{}{}", self.url_base, path)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("X-Api-Key", &self.api_key);
        match &self.username {
            // OctoPrint behind a reverse proxy with http basic auth.
            Some(username) if !username.is_empty() => request.basic_auth(username, self.password.as_ref()),
            _ => request,
        }
    }
}
