use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Any failure reported by the API server or the underlying transport
    /// (not found, forbidden, connection errors, ...). Surfaced unchanged.
    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error("failed to serialize support archive: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The conflict retry bound was reached without a successful write.
    #[error(
        "giving up after {attempts} attempts: every write conflicted with a concurrent update"
    )]
    RetryExhausted { attempts: u32 },

    #[error("failed to add finalizer {finalizer} to support archive: {source}")]
    AddFinalizer {
        finalizer: String,
        #[source]
        source: kube::Error,
    },

    #[error(
        "failed to remove finalizer {finalizer} from support archive: {source}"
    )]
    RemoveFinalizer {
        finalizer: String,
        #[source]
        source: kube::Error,
    },
}

/// Whether a store error is an optimistic-concurrency conflict, i.e. the
/// write carried a stale resourceVersion and is safe to retry after a fresh
/// read.
pub fn is_conflict(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(resp) => resp.code == 409 || resp.reason == "Conflict",
        _ => false,
    }
}
