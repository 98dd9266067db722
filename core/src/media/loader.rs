use std::sync::Arc;

use log::{debug, info};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::media::EmbedService;

static GLOBAL_APIS: Lazy<EmbedApis> = Lazy::new(EmbedApis::new);

struct LoaderInner {
    service: EmbedService,
    injected: Mutex<bool>,
    ready: watch::Sender<bool>,
}

/// Page-wide loader for one embed service's script.
///
/// Clones share state: the script is injected at most once no matter how many
/// controllers ask, and readiness is a one-shot notification every subscriber
/// observes.
#[derive(Clone)]
pub struct ApiLoader {
    inner: Arc<LoaderInner>,
}

impl ApiLoader {
    pub fn new(service: EmbedService) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            inner: Arc::new(LoaderInner {
                service,
                injected: Mutex::new(false),
                ready,
            }),
        }
    }

    pub fn service(&self) -> EmbedService {
        self.inner.service
    }

    /// Inject the service script through `inject` unless it already happened
    /// or the API is already available. Returns true when `inject` ran.
    pub fn ensure_injected(&self, inject: impl FnOnce(&str)) -> bool {
        if self.is_ready() {
            debug!("{:?} API already loaded", self.inner.service);
            return false;
        }

        let mut injected = self.inner.injected.lock();
        if *injected {
            return false;
        }

        info!("Loading {:?} API", self.inner.service);
        inject(self.inner.service.script_src());
        *injected = true;
        true
    }

    pub fn is_injected(&self) -> bool {
        *self.inner.injected.lock()
    }

    /// Signal that the service API is available. Returns true on the first call.
    pub fn mark_ready(&self) -> bool {
        let was_ready = self.inner.ready.send_replace(true);
        if !was_ready {
            info!("{:?} API ready", self.inner.service);
        }
        !was_ready
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.borrow()
    }

    /// Subscribe to the readiness notification
    pub fn subscribe(&self) -> ApiReadiness {
        ApiReadiness {
            rx: self.inner.ready.subscribe(),
        }
    }
}

impl std::fmt::Debug for ApiLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiLoader")
            .field("service", &self.inner.service)
            .field("injected", &self.is_injected())
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// A subscriber's view of an [`ApiLoader`]'s readiness
#[derive(Debug)]
pub struct ApiReadiness {
    rx: watch::Receiver<bool>,
}

impl ApiReadiness {
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }
}

/// The loaders for every supported embed service
#[derive(Debug, Clone)]
pub struct EmbedApis {
    youtube: ApiLoader,
    vimeo: ApiLoader,
}

impl Default for EmbedApis {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbedApis {
    /// Independent set of loaders (tests, isolated pages)
    pub fn new() -> Self {
        Self {
            youtube: ApiLoader::new(EmbedService::YouTube),
            vimeo: ApiLoader::new(EmbedService::Vimeo),
        }
    }

    /// The process-wide loaders
    pub fn global() -> Self {
        GLOBAL_APIS.clone()
    }

    pub fn loader(&self, service: EmbedService) -> &ApiLoader {
        match service {
            EmbedService::YouTube => &self.youtube,
            EmbedService::Vimeo => &self.vimeo,
        }
    }
}
