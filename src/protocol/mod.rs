//! # Protocolos: Numeração e Armazenamento
//!
//! Um protocolo é o cadastro finalizado de uma pessoa (ou casal), gravado
//! uma única vez com número único `C-XXXXXXXX` e consultado depois para
//! reaproveitar a qualificação numa minuta.
//!
//! ## Fronteira de Armazenamento
//!
//! O núcleo só conhece o trait [`ProtocolStore`]:
//!
//! | Operação | Contrato |
//! |----------|----------|
//! | `get_by_number` | protocolo ou `None` |
//! | `save` | acrescenta; número repetido é recusado |
//! | `list_all` | todos, na ordem de gravação |
//! | `generate_unique_number` | número ausente da lista atual |
//!
//! A implementação em disco é [`store::JsonProtocolStore`].

/// Armazenamento em arquivo JSON.
pub mod store;

use std::collections::HashSet;

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::core::{ProtocolRecord, RegistrationData};
use crate::qualification;

pub use store::JsonProtocolStore;

/// Prefixo de todo número de protocolo.
pub const PROTOCOL_PREFIX: &str = "C-";

const SUFFIX_LEN: usize = 8;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Falhas reais do armazenamento de protocolos.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("falha de E/S no armazenamento de protocolos: {0}")]
    Io(#[from] std::io::Error),
    #[error("arquivo de protocolos inválido: {0}")]
    Json(#[from] serde_json::Error),
    #[error("protocolo {0} já existe")]
    Duplicate(String),
}

/// Fronteira de armazenamento de protocolos, injetada no núcleo.
pub trait ProtocolStore: Send + Sync {
    fn get_by_number(&self, numero: &str) -> Option<ProtocolRecord>;

    fn save(&self, record: ProtocolRecord) -> Result<(), StoreError>;

    fn list_all(&self) -> Vec<ProtocolRecord>;

    fn generate_unique_number(&self) -> String {
        let existing: HashSet<String> = self.list_all().into_iter().map(|r| r.numero).collect();
        generate_protocol_number(&existing)
    }

    /// Protocolos cujo número, nome ou CPF contém `query`.
    fn search(&self, query: &str) -> Vec<ProtocolRecord> {
        self.list_all()
            .into_iter()
            .filter(|r| r.matches(query))
            .collect()
    }
}

/// Gera `C-` + 8 caracteres `[A-Z0-9]` fora de `existing`.
pub fn generate_protocol_number(existing: &HashSet<String>) -> String {
    generate_with(&mut rand::thread_rng(), |candidate| existing.contains(candidate))
}

/// Sorteia números com `rng` até `taken` recusar.
pub fn generate_with<R: Rng>(rng: &mut R, taken: impl Fn(&str) -> bool) -> String {
    loop {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        let candidate = format!("{PROTOCOL_PREFIX}{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
    }
}

/// Finaliza um cadastro: compõe a qualificação, numera e grava.
///
/// Nada é gravado se a composição ou a numeração falharem; o protocolo só
/// existe depois que todas as etapas anteriores terminaram.
pub fn register(
    store: &dyn ProtocolStore,
    data: RegistrationData,
    conteudo: Option<String>,
) -> Result<ProtocolRecord, StoreError> {
    let qualification = qualification::compose_registration(&data);
    let record = ProtocolRecord {
        numero: store.generate_unique_number(),
        data_geracao: Utc::now(),
        nome: data.personal_info.name.trim().to_string(),
        cpf: data.personal_info.cpf.trim().to_string(),
        conteudo: conteudo.unwrap_or_default(),
        registration_data: Some(data),
        texto_qualificacao: Some(qualification),
    };
    store.save(record.clone())?;
    info!(numero = %record.numero, "protocolo registrado");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PersonRecord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn number_has_prefix_and_uppercase_suffix() {
        let n = generate_protocol_number(&HashSet::new());
        assert!(n.starts_with("C-"));
        let suffix = &n[2..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn never_repeats_against_accumulating_set() {
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let n = generate_protocol_number(&seen);
            assert!(seen.insert(n));
        }
    }

    #[test]
    fn retries_until_free() {
        let mut rng = StdRng::seed_from_u64(7);
        let first = generate_with(&mut StdRng::seed_from_u64(7), |_| false);
        let again = generate_with(&mut rng, |c| c == first);
        assert_ne!(again, first);
    }

    #[test]
    fn register_persists_qualification() {
        let store = JsonProtocolStore::in_memory();
        let data = RegistrationData {
            personal_info: PersonRecord {
                name: " Ana Lima ".into(),
                cpf: "123.456.789-00".into(),
                ..PersonRecord::default()
            },
            ..RegistrationData::default()
        };
        let record = register(&store, data, None).unwrap();
        assert_eq!(record.nome, "Ana Lima");
        assert_eq!(
            record.texto_qualificacao.as_deref(),
            Some("Ana Lima, brasileiro(a), inscrito(a) no CPF/MF sob o nº 123.456.789-00;")
        );
        assert_eq!(store.get_by_number(&record.numero), Some(record));
    }

    #[test]
    fn search_filters_by_query() {
        let store = JsonProtocolStore::in_memory();
        for name in ["Ana Lima", "Bruno Souza"] {
            let data = RegistrationData {
                personal_info: PersonRecord {
                    name: name.into(),
                    ..PersonRecord::default()
                },
                ..RegistrationData::default()
            };
            register(&store, data, None).unwrap();
        }
        let found = store.search("souza");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nome, "Bruno Souza");
    }
}
