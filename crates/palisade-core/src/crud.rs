// ── CRUD orchestrator ──
//
// Short-lived per-request pipeline composing the resolver, validator,
// cache, diff engine, and backend: validate → resolve → check existence
// (cache-aware) → diff-or-create → mutate-or-skip → invalidate cache →
// outcome. Every operation is atomic from the caller's perspective:
// either the backend call completed and the cache entry was dropped, or
// neither happened.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};

use palisade_api::{ConfigBackend, RetryPolicy, with_retry};

use crate::cache::{ConfigCache, DEFAULT_TTL};
use crate::context::DeviceContext;
use crate::diff::{ConfigDiff, diff};
use crate::error::EngineError;
use crate::payload::{self, Payload};
use crate::resolver::{ConfigPath, resolve, resolve_all};
use crate::schema::ObjectType;
use crate::validate::{validate_fields, validate_identity};

// ── Request ────────────────────────────────────────────────────────

/// Requested operation kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CrudOp {
    Create,
    Read,
    Update,
    Delete,
    List,
}

/// One object operation against a context.
#[derive(Debug, Clone)]
pub struct CrudRequest {
    pub operation: CrudOp,
    pub object_type: ObjectType,
    pub identity: Option<String>,
    pub payload: Option<Payload>,
    pub context: DeviceContext,
}

impl CrudRequest {
    pub fn create(
        object_type: ObjectType,
        identity: impl Into<String>,
        payload: Payload,
        context: DeviceContext,
    ) -> Self {
        Self {
            operation: CrudOp::Create,
            object_type,
            identity: Some(identity.into()),
            payload: Some(payload),
            context,
        }
    }

    pub fn update(
        object_type: ObjectType,
        identity: impl Into<String>,
        payload: Payload,
        context: DeviceContext,
    ) -> Self {
        Self {
            operation: CrudOp::Update,
            object_type,
            identity: Some(identity.into()),
            payload: Some(payload),
            context,
        }
    }

    pub fn read(
        object_type: ObjectType,
        identity: impl Into<String>,
        context: DeviceContext,
    ) -> Self {
        Self {
            operation: CrudOp::Read,
            object_type,
            identity: Some(identity.into()),
            payload: None,
            context,
        }
    }

    pub fn delete(
        object_type: ObjectType,
        identity: impl Into<String>,
        context: DeviceContext,
    ) -> Self {
        Self {
            operation: CrudOp::Delete,
            object_type,
            identity: Some(identity.into()),
            payload: None,
            context,
        }
    }

    pub fn list(object_type: ObjectType, context: DeviceContext) -> Self {
        Self {
            operation: CrudOp::List,
            object_type,
            identity: None,
            payload: None,
            context,
        }
    }
}

// ── Outcome ────────────────────────────────────────────────────────

/// Why an operation was skipped rather than executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Desired state already matches stored state; nothing was mutated.
    Unchanged,
    /// A create hit an existing object with differing fields; the
    /// caller (or approval layer) decides whether to update instead.
    ExistsWithChanges,
}

/// Structured result of one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum CrudOutcome {
    Created {
        path: String,
    },
    Updated {
        path: String,
        diff: ConfigDiff,
    },
    Deleted {
        path: String,
    },
    Read {
        path: String,
        payload: Payload,
    },
    Listed {
        path: String,
        items: Vec<Payload>,
    },
    Skipped {
        path: String,
        reason: SkipReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        diff: Option<ConfigDiff>,
        #[serde(skip_serializing_if = "Option::is_none")]
        existing: Option<Payload>,
    },
}

// ── Engine ─────────────────────────────────────────────────────────

/// The CRUD orchestrator. Owns its cache and retry policy by explicit
/// injection so concurrent runs and tests can use isolated instances.
pub struct ConfigEngine {
    backend: Arc<dyn ConfigBackend>,
    cache: Arc<ConfigCache>,
    retry: RetryPolicy,
    cache_ttl: Duration,
}

impl ConfigEngine {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self {
            backend,
            cache: Arc::new(ConfigCache::new()),
            retry: RetryPolicy::default(),
            cache_ttl: DEFAULT_TTL,
        }
    }

    /// Share a cache across engines (e.g. concurrent sequencer runs).
    pub fn with_cache(mut self, cache: Arc<ConfigCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn cache(&self) -> &Arc<ConfigCache> {
        &self.cache
    }

    /// Execute one operation end to end.
    pub async fn perform(&self, request: CrudRequest) -> Result<CrudOutcome, EngineError> {
        let CrudRequest {
            operation,
            object_type,
            identity,
            payload,
            context,
        } = request;

        if operation == CrudOp::List {
            let path = resolve_all(object_type, &context);
            return self.list(&path).await;
        }

        let identity = identity.ok_or_else(|| {
            EngineError::validation("name", format!("required for {operation} operations"))
        })?;
        validate_identity(&identity)?;

        let path = resolve(object_type, &identity, &context);
        debug!(%operation, %object_type, identity, xpath = %path.xpath, "resolved request");

        match operation {
            CrudOp::Create => {
                let desired = payload.ok_or_else(|| {
                    EngineError::validation("payload", "required for create operations")
                })?;
                validate_fields(object_type, &desired)?;
                self.create(object_type, &path, desired).await
            }
            CrudOp::Update => {
                let desired = payload.ok_or_else(|| {
                    EngineError::validation("payload", "required for update operations")
                })?;
                validate_fields(object_type, &desired)?;
                self.update(object_type, &identity, &path, desired).await
            }
            CrudOp::Read => self.read(object_type, &identity, &path).await,
            CrudOp::Delete => self.delete(object_type, &identity, &path).await,
            CrudOp::List => unreachable!("handled above"),
        }
    }

    // ── Operation arms ───────────────────────────────────────────────

    async fn create(
        &self,
        object_type: ObjectType,
        path: &ConfigPath,
        desired: Payload,
    ) -> Result<CrudOutcome, EngineError> {
        if let Some(actual) = self.fetch_existing(path).await? {
            let d = diff(&desired, &actual, object_type);
            return if d.identical {
                // Desired state already holds: success, not an error.
                Ok(CrudOutcome::Skipped {
                    path: path.xpath.clone(),
                    reason: SkipReason::Unchanged,
                    diff: None,
                    existing: Some(actual),
                })
            } else {
                Ok(CrudOutcome::Skipped {
                    path: path.xpath.clone(),
                    reason: SkipReason::ExistsWithChanges,
                    diff: Some(d),
                    existing: Some(actual),
                })
            };
        }

        let element = payload::to_json(&desired);
        with_retry(self.retry, || self.backend.set(&path.xpath, &element)).await?;
        self.cache.invalidate(&path.xpath);
        info!(xpath = %path.xpath, "created object");
        Ok(CrudOutcome::Created {
            path: path.xpath.clone(),
        })
    }

    async fn update(
        &self,
        object_type: ObjectType,
        identity: &str,
        path: &ConfigPath,
        desired: Payload,
    ) -> Result<CrudOutcome, EngineError> {
        let Some(actual) = self.fetch_existing(path).await? else {
            return Err(EngineError::NotFound {
                object_type: object_type.to_string(),
                identity: identity.to_owned(),
            });
        };

        let d = diff(&desired, &actual, object_type);
        if d.identical {
            // Avoid needless backend load: zero mutation calls.
            return Ok(CrudOutcome::Skipped {
                path: path.xpath.clone(),
                reason: SkipReason::Unchanged,
                diff: None,
                existing: Some(actual),
            });
        }

        let element = payload::to_json(&desired);
        with_retry(self.retry, || self.backend.edit(&path.xpath, &element)).await?;
        self.cache.invalidate(&path.xpath);
        info!(xpath = %path.xpath, changes = d.changes.len(), "updated object");
        Ok(CrudOutcome::Updated {
            path: path.xpath.clone(),
            diff: d,
        })
    }

    async fn read(
        &self,
        object_type: ObjectType,
        identity: &str,
        path: &ConfigPath,
    ) -> Result<CrudOutcome, EngineError> {
        match self.fetch_existing(path).await? {
            Some(payload) => Ok(CrudOutcome::Read {
                path: path.xpath.clone(),
                payload,
            }),
            None => Err(EngineError::NotFound {
                object_type: object_type.to_string(),
                identity: identity.to_owned(),
            }),
        }
    }

    async fn delete(
        &self,
        object_type: ObjectType,
        identity: &str,
        path: &ConfigPath,
    ) -> Result<CrudOutcome, EngineError> {
        let result = with_retry(self.retry, || self.backend.delete(&path.xpath)).await;
        match result {
            Ok(()) => {
                self.cache.invalidate(&path.xpath);
                info!(xpath = %path.xpath, "deleted object");
                Ok(CrudOutcome::Deleted {
                    path: path.xpath.clone(),
                })
            }
            Err(e) if e.is_not_found() => Err(EngineError::NotFound {
                object_type: object_type.to_string(),
                identity: identity.to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Listing reads the aggregate address; it never touches the
    /// single-object cache keys.
    async fn list(&self, path: &ConfigPath) -> Result<CrudOutcome, EngineError> {
        let raw = with_retry(self.retry, || self.backend.get(&path.xpath)).await?;
        let items = match raw {
            None => Vec::new(),
            Some(serde_json::Value::Array(entries)) => entries
                .iter()
                .map(payload::from_json)
                .collect::<Result<Vec<_>, _>>()?,
            Some(single) => vec![payload::from_json(&single)?],
        };
        Ok(CrudOutcome::Listed {
            path: path.xpath.clone(),
            items,
        })
    }

    // ── Existence check ──────────────────────────────────────────────

    /// Cache-first single-object lookup; backend misses that hit the
    /// wire populate the cache on success.
    async fn fetch_existing(&self, path: &ConfigPath) -> Result<Option<Payload>, EngineError> {
        if let Some(cached) = self.cache.get(&path.xpath) {
            return Ok(Some(cached));
        }

        let raw = with_retry(self.retry, || self.backend.get(&path.xpath)).await?;
        match raw {
            Some(value) => {
                let parsed = payload::from_json(&value)?;
                self.cache.put_with_ttl(
                    &path.xpath,
                    &path.scope_label(),
                    parsed.clone(),
                    self.cache_ttl,
                );
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }
}
