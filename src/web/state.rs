//! # Estado da Aplicação Web
//!
//! Structs compartilhadas entre todos os handlers Axum.
//!
//! ```text
//! AppState (Clone, tudo atrás de Arc)
//!  ├── settings      configuração carregada no início
//!  ├── generator     extrator + resolvedor (imutável)
//!  ├── protocols     dyn ProtocolStore (JSON em disco)
//!  ├── drafts        minutas em edição (memória)
//!  ├── sessions      cache por cabeçalho x-sessao
//!  └── events_tx     broadcast → GET /events
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::config::Settings;
use crate::core::Draft;
use crate::extraction::FieldExtractor;
use crate::generator::DraftGenerator;
use crate::placeholder::{AliasMap, PlaceholderResolver};
use crate::protocol::ProtocolStore;
use crate::session::SessionStore;
use crate::web::events::GenerationEvent;

/// Capacidade do canal de eventos; assinantes atrasados perdem eventos.
const EVENT_CAPACITY: usize = 256;

/// Minutas em edição, indexadas pelo id. Guarda no máximo `capacity`;
/// ao passar disso a minuta criada há mais tempo é descartada.
pub struct DraftStore {
    inner: RwLock<DraftSlots>,
    capacity: usize,
}

#[derive(Default)]
struct DraftSlots {
    drafts: HashMap<Uuid, Draft>,
    order: VecDeque<Uuid>,
}

impl DraftStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(DraftSlots::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&self, draft: Draft) {
        let mut slots = self.inner.write();
        let id = draft.id;
        if slots.drafts.insert(id, draft).is_none() {
            slots.order.push_back(id);
        }
        while slots.order.len() > self.capacity {
            if let Some(oldest) = slots.order.pop_front() {
                slots.drafts.remove(&oldest);
                debug!(minuta = %oldest, "minuta antiga descartada da memória");
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Draft> {
        self.inner.read().drafts.get(&id).cloned()
    }

    /// Aplica `f` à minuta sob trava de escrita.
    pub fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut Draft) -> R) -> Option<R> {
        self.inner.write().drafts.get_mut(&id).map(f)
    }

    pub fn len(&self) -> usize {
        self.inner.read().drafts.len()
    }
}

/// Estado compartilhado da aplicação Axum.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub generator: Arc<DraftGenerator>,
    pub protocols: Arc<dyn ProtocolStore>,
    pub drafts: Arc<DraftStore>,
    pub sessions: Arc<SessionStore>,
    /// Canal broadcast para eventos SSE de geração.
    pub events_tx: Arc<broadcast::Sender<GenerationEvent>>,
}

impl AppState {
    pub fn new(settings: Settings, protocols: Arc<dyn ProtocolStore>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let drafts = DraftStore::new(settings.max_drafts);
        let sessions = SessionStore::new(settings.max_sessions);
        let generator = DraftGenerator::new(
            FieldExtractor::new(settings.extraction.clone()),
            PlaceholderResolver::new(AliasMap::builtin()),
        );
        Self {
            settings: Arc::new(settings),
            generator: Arc::new(generator),
            protocols,
            drafts: Arc::new(drafts),
            sessions: Arc::new(sessions),
            events_tx: Arc::new(events_tx),
        }
    }
}
