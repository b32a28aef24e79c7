//! Cache de sessão: rascunho chave → valor por sessão do navegador.
//!
//! A sessão é identificada pelo cabeçalho `x-sessao`. O resolvedor só lê
//! uma cópia ([`SessionStore::snapshot`]); quem escreve é o cadastro de
//! protocolo, que guarda a última qualificação composta. O front-end
//! descarta a sessão com `DELETE /sessao`.
//!
//! O número de sessões é limitado: passando de `capacity`, a sessão
//! criada há mais tempo é esquecida.

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use tracing::debug;

use crate::core::FieldMap;

/// Cabeçalho HTTP com o identificador da sessão.
pub const SESSION_HEADER: &str = "x-sessao";

pub struct SessionStore {
    inner: RwLock<Sessions>,
    capacity: usize,
}

#[derive(Default)]
struct Sessions {
    values: HashMap<String, FieldMap>,
    order: VecDeque<String>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Sessions::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn put(&self, session: &str, key: &str, value: &str) {
        let mut sessions = self.inner.write();
        if !sessions.values.contains_key(session) {
            sessions.order.push_back(session.to_string());
        }
        sessions
            .values
            .entry(session.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());

        while sessions.order.len() > self.capacity {
            if let Some(oldest) = sessions.order.pop_front() {
                sessions.values.remove(&oldest);
                debug!(sessao = %oldest, "sessão antiga descartada");
            }
        }
    }

    /// Cópia dos valores da sessão; `None` se ela nunca gravou nada.
    pub fn snapshot(&self, session: &str) -> Option<FieldMap> {
        self.inner.read().values.get(session).cloned()
    }

    /// Esquece a sessão. Retorna `true` se ela existia.
    pub fn clear(&self, session: &str) -> bool {
        let mut sessions = self.inner.write();
        sessions.order.retain(|s| s != session);
        sessions.values.remove(session).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new(8);
        store.put("a", "documentoGeradoTexto", "Q");
        assert_eq!(store.snapshot("a").unwrap()["documentoGeradoTexto"], "Q");
        assert!(store.snapshot("b").is_none());
    }

    #[test]
    fn clear_forgets_session() {
        let store = SessionStore::new(8);
        store.put("a", "k", "v");
        assert!(store.clear("a"));
        assert!(!store.clear("a"));
        assert!(store.snapshot("a").is_none());
    }

    #[test]
    fn oldest_session_is_dropped_past_capacity() {
        let store = SessionStore::new(2);
        store.put("a", "k", "1");
        store.put("b", "k", "2");
        store.put("a", "k", "3");
        store.put("c", "k", "4");

        assert!(store.snapshot("a").is_none());
        assert_eq!(store.snapshot("b").unwrap()["k"], "2");
        assert_eq!(store.snapshot("c").unwrap()["k"], "4");
    }
}
