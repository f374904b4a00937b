use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Network-availability signal supplied by the host.
///
/// Clones share one flag, so the host can flip it while queries run.
#[derive(Debug, Clone)]
pub struct NetworkStatus(Arc<AtomicBool>);

impl NetworkStatus {
    #[must_use]
    pub fn online() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    #[must_use]
    pub fn offline() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::Relaxed);
    }
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self::online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let status = NetworkStatus::online();
        let observer = status.clone();
        status.set_online(false);
        assert!(!observer.is_online());
    }
}
