//! # Módulo Core: Tipos Fundamentais do Domínio
//!
//! Tipos compartilhados por todos os componentes do gerador de minutas:
//!
//! - [`FieldMap`]: mapa chave → valor sem esquema fixo, com regras de sentinela
//! - [`PersonRecord`]: atributos civis de uma pessoa (transitório)
//! - [`RegistrationData`]: cadastro de pessoa solteira ou casal
//! - [`ProtocolRecord`]: cadastro finalizado, numerado e imutável
//! - [`Draft`] e [`DocumentType`]: minuta em edição e seu tipo
//!
//! ## Fluxo dos Dados
//!
//! ```text
//! arquivos ─► FieldMap (por arquivo) ─► FieldMap (fundido) ─┐
//! RegistrationData ─► qualificação ─► ProtocolRecord ───────┼─► Draft.content
//! modelo com ¿placeholders> ────────────────────────────────┘
//! ```

/// Mapa de campos e detecção de sentinelas.
pub mod field_map;

/// Pessoa, cônjuge, cadastro e regime de bens.
pub mod person;

/// Registro de protocolo.
pub mod protocol;

/// Minuta e tipos de documento.
pub mod draft;

/// Utilitários de texto (acentos, fatiamento seguro).
pub mod text;

pub use draft::{DocumentType, Draft, ProtocolRef};
pub use field_map::FieldMap;
pub use person::{MarriageInfo, PersonRecord, PropertyRegime, RegistrationData, SpouseInfo};
pub use protocol::ProtocolRecord;
