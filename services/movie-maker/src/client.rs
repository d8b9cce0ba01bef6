//! HTTP client for the JSOC archive.
//!
//! Two operations, matching the two external surfaces the pipeline needs:
//! record-set listing through the `jsoc_info` CGI endpoint, and segment
//! file download. The client handle is constructed once and passed to
//! every pipeline function; nothing here keeps global state.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, instrument};

use drms_protocol::{RecordSet, RecordSetQuery, SegmentPath};
use sharp_common::{SharpError, SharpResult};

/// Default archive endpoint.
pub const DEFAULT_BASE_URL: &str = "http://jsoc.stanford.edu";

/// Path of the record-set listing CGI.
const RS_LIST_PATH: &str = "/cgi-bin/ajax/jsoc_info";

/// Handle to the archive: base URL plus a configured HTTP client.
#[derive(Debug, Clone)]
pub struct DrmsClient {
    base_url: String,
    client: Client,
}

impl DrmsClient {
    /// Create a client against the given archive base URL.
    pub fn new(base_url: impl Into<String>) -> SharpResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| SharpError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the records matching a query, with the given keyword and
    /// segment columns.
    #[instrument(skip(self), fields(ds = %query))]
    pub async fn list_records(
        &self,
        query: &RecordSetQuery,
        keys: &[&str],
        segments: &[&str],
    ) -> SharpResult<RecordSet> {
        let url = format!("{}{}", self.base_url, RS_LIST_PATH);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("op", "rs_list".to_string()),
                ("ds", query.to_query_string()),
                ("key", keys.join(",")),
                ("seg", segments.join(",")),
            ])
            .send()
            .await
            .map_err(|e| SharpError::Http(format!("rs_list request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SharpError::Http(format!(
                "rs_list returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SharpError::Http(format!("failed to read rs_list body: {}", e)))?;

        let set = RecordSet::from_json(&body)?;
        debug!(records = set.count, "record listing complete");
        Ok(set)
    }

    /// Download one segment file.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn fetch_segment(&self, path: &SegmentPath) -> SharpResult<Bytes> {
        let url = path.to_url(&self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SharpError::Http(format!("segment request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SharpError::Http(format!(
                "segment {} returned HTTP {}",
                path,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SharpError::Http(format!("failed to read segment body: {}", e)))?;

        debug!(bytes = bytes.len(), "segment downloaded");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = DrmsClient::new("http://jsoc.stanford.edu/").unwrap();
        assert_eq!(client.base_url(), "http://jsoc.stanford.edu");
    }
}
