//! JSON file loading shared by the file-backed repositories.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{Error, Result};

pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
  let raw = tokio::fs::read_to_string(path)
    .await
    .map_err(|source| Error::Io { path: path.to_owned(), source })?;
  Ok(serde_json::from_str(&raw)?)
}
