//! # Armazenamento de Protocolos em JSON
//!
//! Lista de protocolos gravada em `<data_dir>/protocolos.json`, em JSON
//! "pretty-printed" para inspeção manual. A lista inteira é reescrita a
//! cada `save`.
//!
//! ## ⚠️ Concorrência
//!
//! Um escritor por vez (o `RwLock` serializa as gravações do processo).
//! Dois processos gravando no mesmo arquivo: vence a última escrita.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::info;

use super::{ProtocolStore, StoreError};
use crate::core::ProtocolRecord;

/// Nome do arquivo dentro do diretório de dados.
pub const PROTOCOLS_FILE: &str = "protocolos.json";

pub struct JsonProtocolStore {
    /// `None` mantém os protocolos só em memória.
    path: Option<PathBuf>,
    records: RwLock<Vec<ProtocolRecord>>,
}

impl JsonProtocolStore {
    /// Abre (ou inicia vazio) o arquivo de protocolos em `data_dir`.
    ///
    /// # Erros
    ///
    /// Retorna erro se o arquivo existir mas não puder ser lido ou
    /// estiver corrompido.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let path = data_dir.join(PROTOCOLS_FILE);
        let records = if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            serde_json::from_str(&json)?
        } else {
            info!("Nenhum {} encontrado, iniciando lista vazia", path.display());
            Vec::new()
        };
        info!(protocolos = records.len(), "protocolos carregados");
        Ok(Self {
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    /// Armazenamento sem arquivo, para testes.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: RwLock::new(Vec::new()),
        }
    }

    fn persist(&self, records: &[ProtocolRecord]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(records)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl ProtocolStore for JsonProtocolStore {
    fn get_by_number(&self, numero: &str) -> Option<ProtocolRecord> {
        let numero = numero.trim();
        self.records
            .read()
            .iter()
            .find(|r| r.numero.eq_ignore_ascii_case(numero))
            .cloned()
    }

    fn save(&self, record: ProtocolRecord) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if records.iter().any(|r| r.numero == record.numero) {
            return Err(StoreError::Duplicate(record.numero));
        }
        records.push(record);
        if let Err(e) = self.persist(&records) {
            records.pop();
            return Err(e);
        }
        Ok(())
    }

    fn list_all(&self) -> Vec<ProtocolRecord> {
        self.records.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(numero: &str) -> ProtocolRecord {
        ProtocolRecord {
            numero: numero.into(),
            data_geracao: Utc::now(),
            nome: "Ana Lima".into(),
            cpf: "123".into(),
            conteudo: String::new(),
            registration_data: None,
            texto_qualificacao: Some("Ana Lima, brasileiro(a);".into()),
        }
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProtocolStore::open(dir.path()).unwrap();
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn saved_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProtocolStore::open(dir.path()).unwrap();
        store.save(record("C-AAAA1111")).unwrap();
        store.save(record("C-BBBB2222")).unwrap();

        let reopened = JsonProtocolStore::open(dir.path()).unwrap();
        let numbers: Vec<_> = reopened.list_all().into_iter().map(|r| r.numero).collect();
        assert_eq!(numbers, vec!["C-AAAA1111", "C-BBBB2222"]);
        assert!(dir.path().join(PROTOCOLS_FILE).exists());
    }

    #[test]
    fn file_uses_camel_case_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProtocolStore::open(dir.path()).unwrap();
        store.save(record("C-AAAA1111")).unwrap();
        let json = std::fs::read_to_string(dir.path().join(PROTOCOLS_FILE)).unwrap();
        assert!(json.contains("\"dataGeracao\""));
        assert!(json.contains("\"textoQualificacao\""));
    }

    #[test]
    fn duplicate_number_is_rejected() {
        let store = JsonProtocolStore::in_memory();
        store.save(record("C-AAAA1111")).unwrap();
        let err = store.save(record("C-AAAA1111")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(n) if n == "C-AAAA1111"));
        assert_eq!(store.list_all().len(), 1);
    }

    #[test]
    fn lookup_ignores_case_and_spaces() {
        let store = JsonProtocolStore::in_memory();
        store.save(record("C-AAAA1111")).unwrap();
        assert!(store.get_by_number(" c-aaaa1111 ").is_some());
        assert!(store.get_by_number("C-ZZZZ9999").is_none());
    }

    #[test]
    fn corrupted_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROTOCOLS_FILE), "{ not json").unwrap();
        assert!(matches!(
            JsonProtocolStore::open(dir.path()),
            Err(StoreError::Json(_))
        ));
    }
}
