//! Shared HTTP client configuration.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};

use crate::{Error, Result};

/// Every outbound request gives up after this long.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub fn build_client() -> Result<Client> {
  Ok(Client::builder().timeout(HTTP_TIMEOUT).build()?)
}

/// Send `req` and turn any non-2xx status into [`Error::Status`].
pub(crate) async fn send_checked(req: RequestBuilder) -> Result<Response> {
  let resp = req.send().await?;
  let status = resp.status();
  if !status.is_success() {
    return Err(Error::Status {
      path: resp.url().path().to_owned(),
      status,
    });
  }
  Ok(resp)
}

/// `base` without a trailing slash, so paths can be appended directly.
pub(crate) fn trim_base(base: &str) -> String { base.trim_end_matches('/').to_owned() }
