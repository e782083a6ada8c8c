//! Typed access to the `supportarchives.k8s.cloudogu.com` resource.
//!
//! Plain CRUD calls are delegated verbatim to the API server. Status writes
//! go through a conflict-retry loop so that concurrent reconcilers cannot
//! lose each other's updates; finalizer writes deliberately do not (see
//! [`SupportArchiveClient::add_finalizer`]).

pub mod retry;

use futures_util::Stream;
use kube::api::{
    Api, DeleteParams, ListParams, Patch, PatchParams, PostParams, WatchParams,
};
use kube::core::{ObjectList, WatchEvent};
use kube::{Client, ResourceExt};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::crd::{StatusPhase, SupportArchive, SupportArchiveStatus};
use crate::error::Error;
use retry::{DEFAULT_MAX_ATTEMPTS, retry_on_conflict};

/// Entry point exposing clients for the custom resources of this library,
/// one namespace at a time.
#[derive(Clone)]
pub struct SupportArchiveClientSet {
    client: Client,
}

impl SupportArchiveClientSet {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Infer the cluster connection from the local kubeconfig or the
    /// in-cluster service account.
    pub async fn try_default() -> Result<Self, Error> {
        Ok(Self::new(Client::try_default().await?))
    }

    pub fn support_archives(&self, namespace: &str) -> SupportArchiveClient {
        SupportArchiveClient::namespaced(self.client.clone(), namespace)
    }

    /// Namespace and retry bound taken from [`ClientConfig`].
    pub fn support_archives_from_config(
        &self,
        config: &ClientConfig,
    ) -> SupportArchiveClient {
        self.support_archives(&config.namespace)
            .with_max_attempts(config.max_conflict_retries)
    }
}

/// Client for `SupportArchive` objects in a single namespace.
#[derive(Clone)]
pub struct SupportArchiveClient {
    api: Api<SupportArchive>,
    max_attempts: u32,
}

impl SupportArchiveClient {
    pub fn namespaced(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the conflict retry bound for status updates.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub async fn get(&self, name: &str) -> Result<SupportArchive, Error> {
        Ok(self.api.get(name).await?)
    }

    pub async fn list(
        &self,
        params: &ListParams,
    ) -> Result<ObjectList<SupportArchive>, Error> {
        Ok(self.api.list(params).await?)
    }

    pub async fn watch(
        &self,
        params: &WatchParams,
        resource_version: &str,
    ) -> Result<
        impl Stream<Item = kube::Result<WatchEvent<SupportArchive>>> + use<>,
        Error,
    > {
        Ok(self.api.watch(params, resource_version).await?)
    }

    pub async fn create(
        &self,
        archive: &SupportArchive,
    ) -> Result<SupportArchive, Error> {
        Ok(self.api.create(&PostParams::default(), archive).await?)
    }

    /// Replace the whole object. The server rejects the write with a conflict
    /// when the supplied resourceVersion is stale.
    pub async fn update(
        &self,
        archive: &SupportArchive,
    ) -> Result<SupportArchive, Error> {
        Ok(self
            .api
            .replace(&archive.name_any(), &PostParams::default(), archive)
            .await?)
    }

    /// Replace only the status sub-resource.
    pub async fn update_status(
        &self,
        archive: &SupportArchive,
    ) -> Result<SupportArchive, Error> {
        let data = serde_json::to_vec(archive)?;
        Ok(self
            .api
            .replace_status(&archive.name_any(), &PostParams::default(), data)
            .await?)
    }

    pub async fn delete(
        &self,
        name: &str,
        params: &DeleteParams,
    ) -> Result<(), Error> {
        self.api.delete(name, params).await?;
        Ok(())
    }

    pub async fn delete_collection(
        &self,
        params: &DeleteParams,
        list_params: &ListParams,
    ) -> Result<(), Error> {
        self.api.delete_collection(params, list_params).await?;
        Ok(())
    }

    pub async fn patch<P: serde::Serialize + std::fmt::Debug>(
        &self,
        name: &str,
        params: &PatchParams,
        patch: &Patch<P>,
    ) -> Result<SupportArchive, Error> {
        Ok(self.api.patch(name, params, patch).await?)
    }

    pub async fn patch_status<P: serde::Serialize + std::fmt::Debug>(
        &self,
        name: &str,
        params: &PatchParams,
        patch: &Patch<P>,
    ) -> Result<SupportArchive, Error> {
        Ok(self.api.patch_status(name, params, patch).await?)
    }

    /// Set the phase of the support archive status to "creating".
    pub async fn update_status_creating(
        &self,
        archive: &SupportArchive,
    ) -> Result<SupportArchive, Error> {
        self.update_status_phase_with_retry(archive, StatusPhase::Creating)
            .await
    }

    /// Set the phase of the support archive status to "created".
    pub async fn update_status_created(
        &self,
        archive: &SupportArchive,
    ) -> Result<SupportArchive, Error> {
        self.update_status_phase_with_retry(archive, StatusPhase::Created)
            .await
    }

    /// Set the phase of the support archive status to "deleting".
    pub async fn update_status_deleting(
        &self,
        archive: &SupportArchive,
    ) -> Result<SupportArchive, Error> {
        self.update_status_phase_with_retry(archive, StatusPhase::Deleting)
            .await
    }

    /// Set the phase of the support archive status to "failed".
    pub async fn update_status_failed(
        &self,
        archive: &SupportArchive,
    ) -> Result<SupportArchive, Error> {
        self.update_status_phase_with_retry(archive, StatusPhase::Failed)
            .await
    }

    /// Fetch the latest version of the object, overwrite only the phase and
    /// write the status back, retrying the whole cycle on conflict. Every
    /// other status field is taken from the fetch, so errors, conditions and
    /// the download path set by concurrent writers survive.
    #[instrument(skip_all, fields(name = %archive.name_any(), phase = ?phase))]
    async fn update_status_phase_with_retry(
        &self,
        archive: &SupportArchive,
        phase: StatusPhase,
    ) -> Result<SupportArchive, Error> {
        let name = archive.name_any();
        retry_on_conflict(self.max_attempts, async || {
            let mut latest = self.api.get(&name).await.map_err(Error::Kube)?;
            let mut status = latest.status.take().unwrap_or_default();
            status.phase = Some(phase);
            latest.status = Some(status);
            self.update_status(&latest).await
        })
        .await
    }

    /// Apply `modify_status` to the current status and write the result back,
    /// retrying on conflict.
    ///
    /// The first attempt runs against the caller's in-memory copy to save a
    /// round trip; after a conflict the object is re-fetched and the function
    /// is applied to the fresh status instead. `modify_status` may therefore
    /// run more than once and must not have side effects beyond computing the
    /// new status value.
    #[instrument(skip_all, fields(name = %archive.name_any()))]
    pub async fn update_status_with_retry<F>(
        &self,
        archive: &SupportArchive,
        modify_status: F,
    ) -> Result<SupportArchive, Error>
    where
        F: Fn(SupportArchiveStatus) -> SupportArchiveStatus,
    {
        let name = archive.name_any();
        let mut first_try = true;
        retry_on_conflict(self.max_attempts, async || {
            let mut current = if first_try {
                first_try = false;
                archive.clone()
            } else {
                debug!(%name, "re-fetching after conflict");
                self.api.get(&name).await.map_err(Error::Kube)?
            };
            let status = current.status.take().unwrap_or_default();
            current.status = Some(modify_status(status));
            self.update_status(&current).await
        })
        .await
    }

    /// Add the given finalizer and update the object.
    ///
    /// This issues a single whole-object write and does not retry on
    /// conflict: finalizers are normally touched by one reconciler per
    /// resource generation, so a racing writer surfaces as an error instead
    /// of being papered over. Callers needing strict conflict-safety must
    /// wrap the call themselves.
    #[instrument(skip_all, fields(name = %archive.name_any(), finalizer))]
    pub async fn add_finalizer(
        &self,
        archive: &SupportArchive,
        finalizer: &str,
    ) -> Result<SupportArchive, Error> {
        let mut archive = archive.clone();
        insert_finalizer(&mut archive, finalizer);
        self.update(&archive).await.map_err(|err| match err {
            Error::Kube(source) => Error::AddFinalizer {
                finalizer: finalizer.to_string(),
                source,
            },
            other => other,
        })
    }

    /// Remove the given finalizer and update the object. Same non-retrying
    /// contract as [`SupportArchiveClient::add_finalizer`].
    #[instrument(skip_all, fields(name = %archive.name_any(), finalizer))]
    pub async fn remove_finalizer(
        &self,
        archive: &SupportArchive,
        finalizer: &str,
    ) -> Result<SupportArchive, Error> {
        let mut archive = archive.clone();
        strip_finalizer(&mut archive, finalizer);
        self.update(&archive).await.map_err(|err| match err {
            Error::Kube(source) => Error::RemoveFinalizer {
                finalizer: finalizer.to_string(),
                source,
            },
            other => other,
        })
    }
}

/// Idempotent set insert on the object's finalizer list.
fn insert_finalizer(archive: &mut SupportArchive, finalizer: &str) {
    let finalizers = archive.finalizers_mut();
    if !finalizers.iter().any(|f| f == finalizer) {
        finalizers.push(finalizer.to_string());
    }
}

/// Idempotent set removal on the object's finalizer list.
fn strip_finalizer(archive: &mut SupportArchive, finalizer: &str) {
    archive.finalizers_mut().retain(|f| f != finalizer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::SupportArchiveSpec;

    fn archive() -> SupportArchive {
        SupportArchive::new("my-archive", SupportArchiveSpec::default())
    }

    #[test]
    fn insert_finalizer_is_idempotent() {
        let mut obj = archive();
        insert_finalizer(&mut obj, "finalizer1");
        insert_finalizer(&mut obj, "finalizer1");
        assert_eq!(obj.finalizers(), &["finalizer1".to_string()]);
    }

    #[test]
    fn strip_finalizer_is_idempotent() {
        let mut obj = archive();
        insert_finalizer(&mut obj, "finalizer1");
        insert_finalizer(&mut obj, "finalizer2");

        strip_finalizer(&mut obj, "finalizer1");
        strip_finalizer(&mut obj, "finalizer1");
        assert_eq!(obj.finalizers(), &["finalizer2".to_string()]);

        strip_finalizer(&mut obj, "does-not-exist");
        assert_eq!(obj.finalizers(), &["finalizer2".to_string()]);
    }
}
