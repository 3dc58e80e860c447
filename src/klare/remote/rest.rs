use serde_json::Value;
use tracing::debug;

use super::{Filter, RemoteStore};
use crate::error::{KlareError, Result};

/// REST implementation of [`RemoteStore`] against a PostgREST-style
/// endpoint: `{base}/rest/v1/{table}` with `col=eq.value` query
/// parameters and api-key headers. Row-level access control is enforced
/// server-side; this client only ever adds equality filters.
pub struct RestRemote {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl RestRemote {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: &str, table: &str, filters: &[Filter]) -> ureq::Request {
        let mut req = self
            .agent
            .request(method, &self.endpoint(table))
            .set("apikey", &self.api_key)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Prefer", "return=representation");
        for f in filters {
            req = req.query(&f.column, &format!("eq.{}", f.value));
        }
        req
    }

    fn rows_from(table: &str, response: ureq::Response) -> Result<Vec<Value>> {
        response
            .into_json::<Vec<Value>>()
            .map_err(|e| KlareError::Remote(format!("{table}: invalid response body: {e}")))
    }
}

fn call_error(table: &str, err: ureq::Error) -> KlareError {
    match err {
        ureq::Error::Status(code, _) => KlareError::Remote(format!("{table}: HTTP {code}")),
        ureq::Error::Transport(t) => KlareError::Remote(format!("{table}: {t}")),
    }
}

impl RemoteStore for RestRemote {
    fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        debug!(table, "remote select");
        let response = self
            .request("GET", table, filters)
            .call()
            .map_err(|e| call_error(table, e))?;
        Self::rows_from(table, response)
    }

    fn insert(&self, table: &str, row: Value) -> Result<Value> {
        debug!(table, "remote insert");
        let response = self
            .request("POST", table, &[])
            .send_json(row)
            .map_err(|e| call_error(table, e))?;
        let mut rows = Self::rows_from(table, response)?;
        rows.pop()
            .ok_or_else(|| KlareError::Remote(format!("{table}: insert returned no row")))
    }

    fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<usize> {
        debug!(table, "remote update");
        let response = self
            .request("PATCH", table, filters)
            .send_json(patch)
            .map_err(|e| call_error(table, e))?;
        Ok(Self::rows_from(table, response)?.len())
    }

    fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize> {
        debug!(table, "remote delete");
        let response = self
            .request("DELETE", table, filters)
            .call()
            .map_err(|e| call_error(table, e))?;
        Ok(Self::rows_from(table, response)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalizes_trailing_slash() {
        let remote = RestRemote::new("https://example.test/", "key");
        assert_eq!(
            remote.endpoint("life_wheel_areas"),
            "https://example.test/rest/v1/life_wheel_areas"
        );
    }
}
