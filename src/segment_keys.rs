//! Keys manually assigned to a segment within one environment.
//!
//! Updating the key set is a two-phase operation: the previous keys are
//! removed, then the desired keys are uploaded with `replace`. The phases
//! are separate requests, so a failure in between leaves the segment with
//! neither set. The authoritative list is re-read after every write, and
//! running the reconciliation again converges.

use async_trait::async_trait;
use split_api::{ApiError, SegmentKeysRequest, SplitClient};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info};

use crate::import::parse_composite_id;
use crate::{ProviderError, Result};

/// Change comment attached to every key upload and removal.
pub const SEGMENT_KEYS_COMMENT: &str = "modified by split-provider";

/// Largest key set the resource manages.
pub const MAX_SEGMENT_KEYS: usize = 10_000;

const IMPORT_ID_FORMAT: &str = "<environment_id>:<segment_name>";

/// The segment key primitives reconciliation is built on.
#[async_trait]
pub trait SegmentKeysApi: Send + Sync {
    /// Current keys of a segment in an environment.
    async fn get_segment_keys(
        &self,
        environment_id: &str,
        segment_name: &str,
    ) -> split_api::Result<Vec<String>>;

    async fn remove_segment_keys(
        &self,
        environment_id: &str,
        segment_name: &str,
        keys: &[String],
        comment: &str,
    ) -> split_api::Result<()>;

    async fn add_segment_keys(
        &self,
        environment_id: &str,
        segment_name: &str,
        keys: &[String],
        replace: bool,
        comment: &str,
    ) -> split_api::Result<()>;
}

#[async_trait]
impl SegmentKeysApi for SplitClient {
    async fn get_segment_keys(
        &self,
        environment_id: &str,
        segment_name: &str,
    ) -> split_api::Result<Vec<String>> {
        let response = self
            .environments()
            .get_all_segment_keys(environment_id, segment_name)
            .await?;
        Ok(response.data.into_iter().map(|k| k.key).collect())
    }

    async fn remove_segment_keys(
        &self,
        environment_id: &str,
        segment_name: &str,
        keys: &[String],
        comment: &str,
    ) -> split_api::Result<()> {
        let request = SegmentKeysRequest {
            keys: keys.to_vec(),
            comment: Some(comment.to_string()),
        };
        self.environments()
            .remove_segment_keys(environment_id, segment_name, &request)
            .await?;
        Ok(())
    }

    async fn add_segment_keys(
        &self,
        environment_id: &str,
        segment_name: &str,
        keys: &[String],
        replace: bool,
        comment: &str,
    ) -> split_api::Result<()> {
        let request = SegmentKeysRequest {
            keys: keys.to_vec(),
            comment: Some(comment.to_string()),
        };
        self.environments()
            .add_segment_keys(environment_id, segment_name, replace, &request)
            .await?;
        Ok(())
    }
}

/// A reconciliation phase that failed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("unable to remove keys from environment {environment_id} segment {segment}: {source}")]
    Remove {
        environment_id: String,
        segment: String,
        #[source]
        source: ApiError,
    },

    #[error("unable to add keys to environment {environment_id} segment {segment}: {source}")]
    Add {
        environment_id: String,
        segment: String,
        #[source]
        source: ApiError,
    },

    #[error("unable to fetch keys of environment {environment_id} segment {segment}: {source}")]
    Read {
        environment_id: String,
        segment: String,
        #[source]
        source: ApiError,
    },
}

impl ReconcileError {
    /// The API failure behind this error.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Remove { source, .. } | Self::Add { source, .. } | Self::Read { source, .. } => {
                Some(source)
            }
        }
    }
}

/// Move a segment from `previous` to `desired` keys and return the keys the server now holds.
///
/// Phase one removes exactly `previous` when it is non-empty; phase two
/// uploads exactly `desired` with `replace` when it is non-empty.
pub async fn reconcile<A>(
    api: &A,
    environment_id: &str,
    segment_name: &str,
    previous: &BTreeSet<String>,
    desired: &BTreeSet<String>,
) -> std::result::Result<BTreeSet<String>, ReconcileError>
where
    A: SegmentKeysApi + ?Sized,
{
    if !previous.is_empty() {
        let keys: Vec<String> = previous.iter().cloned().collect();
        info!(
            environment_id,
            segment = segment_name,
            count = keys.len(),
            "removing previous segment keys"
        );
        api.remove_segment_keys(environment_id, segment_name, &keys, SEGMENT_KEYS_COMMENT)
            .await
            .map_err(|source| ReconcileError::Remove {
                environment_id: environment_id.to_string(),
                segment: segment_name.to_string(),
                source,
            })?;
    }

    if !desired.is_empty() {
        let keys: Vec<String> = desired.iter().cloned().collect();
        info!(
            environment_id,
            segment = segment_name,
            count = keys.len(),
            "adding desired segment keys"
        );
        api.add_segment_keys(environment_id, segment_name, &keys, true, SEGMENT_KEYS_COMMENT)
            .await
            .map_err(|source| ReconcileError::Add {
                environment_id: environment_id.to_string(),
                segment: segment_name.to_string(),
                source,
            })?;
    }

    read_keys(api, environment_id, segment_name).await
}

async fn read_keys<A>(
    api: &A,
    environment_id: &str,
    segment_name: &str,
) -> std::result::Result<BTreeSet<String>, ReconcileError>
where
    A: SegmentKeysApi + ?Sized,
{
    let keys = api
        .get_segment_keys(environment_id, segment_name)
        .await
        .map_err(|source| ReconcileError::Read {
            environment_id: environment_id.to_string(),
            segment: segment_name.to_string(),
            source,
        })?;
    Ok(keys.into_iter().collect())
}

/// State of a managed segment key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentKeysState {
    /// `<environment_id>:<segment_name>`.
    pub id: String,
    pub environment_id: String,
    pub segment_name: String,
    pub keys: BTreeSet<String>,
}

impl SegmentKeysState {
    fn new(environment_id: &str, segment_name: &str, keys: BTreeSet<String>) -> Self {
        Self {
            id: format!("{}:{}", environment_id, segment_name),
            environment_id: environment_id.to_string(),
            segment_name: segment_name.to_string(),
            keys,
        }
    }
}

/// Lifecycle of the keys assigned to one segment in one environment.
pub struct SegmentKeysResource<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A> SegmentKeysResource<'a, A>
where
    A: SegmentKeysApi + ?Sized,
{
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Upload `keys` as the full key set of the segment.
    pub async fn create(
        &self,
        environment_id: &str,
        segment_name: &str,
        keys: &BTreeSet<String>,
    ) -> Result<SegmentKeysState> {
        validate_key_count(segment_name, keys)?;
        let held = reconcile(self.api, environment_id, segment_name, &BTreeSet::new(), keys).await?;
        Ok(SegmentKeysState::new(environment_id, segment_name, held))
    }

    /// Fetch the keys the server holds.
    pub async fn read(&self, environment_id: &str, segment_name: &str) -> Result<SegmentKeysState> {
        let keys = read_keys(self.api, environment_id, segment_name).await?;
        debug!(environment_id, segment = segment_name, count = keys.len(), "read segment keys");
        Ok(SegmentKeysState::new(environment_id, segment_name, keys))
    }

    /// Replace the keys recorded in `state` with `desired`.
    pub async fn update(
        &self,
        state: &SegmentKeysState,
        desired: &BTreeSet<String>,
    ) -> Result<SegmentKeysState> {
        validate_key_count(&state.segment_name, desired)?;
        let keys = reconcile(
            self.api,
            &state.environment_id,
            &state.segment_name,
            &state.keys,
            desired,
        )
        .await?;
        Ok(SegmentKeysState::new(&state.environment_id, &state.segment_name, keys))
    }

    /// Remove every key recorded in `state`.
    pub async fn delete(&self, state: &SegmentKeysState) -> Result<()> {
        let [environment_id, segment_name] = parse_composite_id::<2>(&state.id, IMPORT_ID_FORMAT)?;
        if state.keys.is_empty() {
            return Ok(());
        }

        info!(environment_id, segment = segment_name, "removing all segment keys");
        let keys: Vec<String> = state.keys.iter().cloned().collect();
        self.api
            .remove_segment_keys(environment_id, segment_name, &keys, SEGMENT_KEYS_COMMENT)
            .await
            .map_err(|source| ReconcileError::Remove {
                environment_id: environment_id.to_string(),
                segment: segment_name.to_string(),
                source,
            })?;
        Ok(())
    }

    /// Adopt an existing key set by `<environment_id>:<segment_name>`.
    pub async fn import(&self, id: &str) -> Result<SegmentKeysState> {
        let [environment_id, segment_name] = parse_composite_id::<2>(id, IMPORT_ID_FORMAT)?;
        self.read(environment_id, segment_name).await
    }
}

fn validate_key_count(segment_name: &str, keys: &BTreeSet<String>) -> Result<()> {
    if keys.is_empty() || keys.len() > MAX_SEGMENT_KEYS {
        return Err(ProviderError::invalid(
            "keys",
            segment_name,
            format!("between 1 and {} keys are required, got {}", MAX_SEGMENT_KEYS, keys.len()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use split_http_client::HttpClientError;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Get,
        Remove(Vec<String>, String),
        Add(Vec<String>, bool, String),
    }

    /// Records calls and serves a key set that follows them.
    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<Call>>,
        keys: Mutex<BTreeSet<String>>,
        fail_add: bool,
    }

    impl RecordingApi {
        fn with_keys(keys: &[&str]) -> Self {
            Self {
                keys: Mutex::new(set(keys)),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn writes(&self) -> Vec<Call> {
            self.calls().into_iter().filter(|c| *c != Call::Get).collect()
        }
    }

    fn server_error() -> ApiError {
        ApiError::from(HttpClientError::Status {
            method: Method::PUT,
            url: "https://api.split.io/internal/api/v2/segments/env-1/beta/uploadKeys".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        })
    }

    #[async_trait]
    impl SegmentKeysApi for RecordingApi {
        async fn get_segment_keys(&self, _: &str, _: &str) -> split_api::Result<Vec<String>> {
            self.calls.lock().unwrap().push(Call::Get);
            Ok(self.keys.lock().unwrap().iter().cloned().collect())
        }

        async fn remove_segment_keys(
            &self,
            _: &str,
            _: &str,
            keys: &[String],
            comment: &str,
        ) -> split_api::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Remove(keys.to_vec(), comment.to_string()));
            let mut held = self.keys.lock().unwrap();
            for key in keys {
                held.remove(key);
            }
            Ok(())
        }

        async fn add_segment_keys(
            &self,
            _: &str,
            _: &str,
            keys: &[String],
            replace: bool,
            comment: &str,
        ) -> split_api::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Add(keys.to_vec(), replace, comment.to_string()));
            if self.fail_add {
                return Err(server_error());
            }
            let mut held = self.keys.lock().unwrap();
            if replace {
                held.clear();
            }
            held.extend(keys.iter().cloned());
            Ok(())
        }
    }

    fn set(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn strings(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[tokio::test]
    async fn test_remove_then_add() {
        let api = RecordingApi::with_keys(&["a", "b"]);
        let keys = reconcile(&api, "env-1", "beta", &set(&["a", "b"]), &set(&["b", "c", "d"]))
            .await
            .unwrap();

        assert_eq!(
            api.writes(),
            vec![
                Call::Remove(strings(&["a", "b"]), SEGMENT_KEYS_COMMENT.to_string()),
                Call::Add(strings(&["b", "c", "d"]), true, SEGMENT_KEYS_COMMENT.to_string()),
            ]
        );
        assert_eq!(keys, set(&["b", "c", "d"]));
        assert_eq!(api.calls().last(), Some(&Call::Get));
    }

    #[tokio::test]
    async fn test_empty_desired_skips_add() {
        let api = RecordingApi::with_keys(&["a"]);
        let keys = reconcile(&api, "env-1", "beta", &set(&["a"]), &BTreeSet::new())
            .await
            .unwrap();

        assert_eq!(
            api.writes(),
            vec![Call::Remove(strings(&["a"]), SEGMENT_KEYS_COMMENT.to_string())]
        );
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_empty_previous_skips_remove() {
        let api = RecordingApi::default();
        reconcile(&api, "env-1", "beta", &BTreeSet::new(), &set(&["x"]))
            .await
            .unwrap();

        assert_eq!(
            api.writes(),
            vec![Call::Add(strings(&["x"]), true, SEGMENT_KEYS_COMMENT.to_string())]
        );
    }

    #[tokio::test]
    async fn test_failed_add_leaves_neither_set_and_retry_converges() {
        let api = RecordingApi {
            keys: Mutex::new(set(&["a", "b"])),
            fail_add: true,
            ..Default::default()
        };

        let err = reconcile(&api, "env-1", "beta", &set(&["a", "b"]), &set(&["c"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Add { .. }));
        assert!(err.to_string().contains("env-1"));
        assert!(api.keys.lock().unwrap().is_empty());

        let healthy = RecordingApi::default();
        let resource = SegmentKeysResource::new(&healthy);
        let state = resource.read("env-1", "beta").await.unwrap();
        let state = resource.update(&state, &set(&["c"])).await.unwrap();
        assert_eq!(state.keys, set(&["c"]));
    }

    #[tokio::test]
    async fn test_resource_lifecycle() {
        let api = RecordingApi::default();
        let resource = SegmentKeysResource::new(&api);

        let state = resource.create("env-1", "beta", &set(&["a", "b"])).await.unwrap();
        assert_eq!(state.id, "env-1:beta");
        assert_eq!(state.keys, set(&["a", "b"]));

        let state = resource.update(&state, &set(&["b", "c"])).await.unwrap();
        assert_eq!(state.keys, set(&["b", "c"]));

        let imported = resource.import("env-1:beta").await.unwrap();
        assert_eq!(imported, state);

        resource.delete(&state).await.unwrap();
        assert!(api.keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_reads_keys_once() {
        let api = RecordingApi::default();
        let resource = SegmentKeysResource::new(&api);

        let state = resource.create("env-1", "beta", &set(&["a"])).await.unwrap();
        assert_eq!(state.keys, set(&["a"]));
        assert_eq!(
            api.calls(),
            vec![
                Call::Add(strings(&["a"]), true, SEGMENT_KEYS_COMMENT.to_string()),
                Call::Get,
            ]
        );
    }

    #[tokio::test]
    async fn test_resource_rejects_empty_key_set() {
        let api = RecordingApi::default();
        let resource = SegmentKeysResource::new(&api);

        let err = resource.create("env-1", "beta", &BTreeSet::new()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidArgument { field: "keys", .. }));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_import_requires_two_parts() {
        let api = RecordingApi::default();
        let resource = SegmentKeysResource::new(&api);
        assert!(matches!(
            resource.import("env-1").await.unwrap_err(),
            ProviderError::InvalidImportId { expected: 2, .. }
        ));
    }
}
