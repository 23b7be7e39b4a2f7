use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    Unknown,
}

/// Handle to remote media, passed through to the caller for rendering.
/// The concrete track type depends on the engine; use [`RemoteStream::downcast`].
#[derive(Clone)]
pub struct RemoteStream {
    pub track_id: String,
    pub kind: MediaKind,
    handle: Arc<dyn Any + Send + Sync>,
}

impl RemoteStream {
    pub fn new<T: Any + Send + Sync>(track_id: String, kind: MediaKind, handle: Arc<T>) -> Self {
        Self {
            track_id,
            kind,
            handle,
        }
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.handle.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStream")
            .field("track_id", &self.track_id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
