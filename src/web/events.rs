//! # Eventos SSE de Geração de Minuta
//!
//! Define o enum [`GenerationEvent`], emitido durante a leitura dos
//! arquivos e a montagem da minuta e enviado ao navegador via
//! Server-Sent Events (`GET /events`).
//!
//! ## Ciclo de Vida dos Eventos
//!
//! ```text
//! Started → [FileDecoded | FileSkipped]* → ChunkCompleted×N
//!         → ExtractionCompleted → Completed
//!                             ou → Cancelled | Error
//! ```
//!
//! ## Serialização
//!
//! `#[serde(tag = "type")]` produz JSON com discriminador:
//!
//! ```json
//! { "type": "FileDecoded", "file": "obito.pdf", "chars": 5120, "elapsed_ms": 42 }
//! ```

use serde::Serialize;

/// Evento de progresso de uma geração.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GenerationEvent {
    /// Geração iniciada.
    Started {
        /// Rótulo do tipo de documento.
        doc_type: String,
        files: usize,
    },

    /// Arquivo decodificado em texto.
    FileDecoded {
        file: String,
        /// Caracteres mantidos após o corte por arquivo.
        chars: usize,
        elapsed_ms: u64,
    },

    /// Arquivo ignorado (falha de decodificação ou tempo esgotado).
    /// A geração continua com conteúdo vazio para ele.
    FileSkipped { file: String, reason: String },

    /// Lote de arquivos concluído.
    ChunkCompleted {
        /// Número do lote (1-indexed).
        chunk: usize,
        total: usize,
    },

    /// Extração heurística concluída.
    ExtractionCompleted {
        fields: usize,
        truncated: bool,
    },

    /// Minuta pronta.
    Completed {
        draft_id: String,
        /// Placeholders `¿…>` que sobraram no texto.
        remaining_placeholders: usize,
    },

    /// Geração interrompida pelo sinal de cancelamento.
    Cancelled,

    /// Falha inesperada.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(GenerationEvent::FileDecoded {
            file: "obito.pdf".into(),
            chars: 10,
            elapsed_ms: 3,
        })
        .unwrap();
        assert_eq!(json["type"], "FileDecoded");
        assert_eq!(json["file"], "obito.pdf");
    }

    #[test]
    fn unit_variant_has_only_tag() {
        let json = serde_json::to_string(&GenerationEvent::Cancelled).unwrap();
        assert_eq!(json, r#"{"type":"Cancelled"}"#);
    }
}
