//! # Leitura de Arquivos: Dos Bytes ao Texto
//!
//! Converte os arquivos enviados (certidões, matrículas, RGs...) em
//! [`SourceDocument`]s prontos para a extração.
//!
//! ## Pipeline de Leitura
//!
//! ```text
//! Upload (nome + bytes)
//!   ├── 1. PDF? → pdf_extract      senão → UTF-8 (com perdas)
//!   ├── 2. Normalizar → NFC (+ sílabas partidas, só em PDF)
//!   ├── 3. Cortar em max_chars_per_file caracteres
//!   └── 4. SourceDocument
//! ```
//!
//! ## Limites
//!
//! | Limite | Efeito |
//! |--------|--------|
//! | `file_read_timeout_ms` | decodificação lenta vira conteúdo vazio |
//! | `read_budget_ms` | arquivos restantes ficam de fora (`truncated`) |
//! | `chunk_size` | arquivos por lote; `yield_now` entre lotes |
//! | [`CancellationFlag`] | verificado antes de cada arquivo |
//!
//! Falha de leitura nunca derruba a geração: o arquivo entra com texto
//! vazio, um `warn!` é registrado e um evento `FileSkipped` é emitido.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use regex::Regex;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::ExtractionLimits;
use crate::core::text::{char_prefix, nfc};
use crate::extraction::{CancellationFlag, SourceDocument, TimeBudget};
use crate::web::events::GenerationEvent;

/// Sufixos que a extração de PDF costuma separar da palavra ("condi ção").
static SPLIT_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-zà-ú]+)[ \t]+(ção|ções|ência|ância|mente|dade|ável|ível)\b").unwrap()
});

/// Arquivo recebido, ainda em bytes.
#[derive(Clone, Debug)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Documentos lidos e se a leitura foi interrompida.
#[derive(Debug, Default)]
pub struct ReadOutcome {
    pub documents: Vec<SourceDocument>,
    pub cancelled: bool,
    /// O orçamento de leitura se esgotou antes do último arquivo.
    pub truncated: bool,
}

/// PDF pela extensão ou pela assinatura `%PDF`.
pub fn is_pdf(name: &str, bytes: &[u8]) -> bool {
    name.to_lowercase().ends_with(".pdf") || bytes.starts_with(b"%PDF")
}

/// NFC; em texto vindo de PDF, também junta sufixos separados.
pub fn normalize_text(text: &str, from_pdf: bool) -> String {
    let normalized = nfc(text);
    if from_pdf {
        SPLIT_SUFFIX_RE.replace_all(&normalized, "$1$2").into_owned()
    } else {
        normalized
    }
}

/// Decodifica um arquivo e corta o texto em `max_chars` caracteres.
///
/// # Erros
///
/// Retorna erro quando o PDF não pode ser lido.
pub fn decode_upload(name: &str, bytes: &[u8], max_chars: usize) -> Result<String> {
    let pdf = is_pdf(name, bytes);
    let raw = if pdf {
        pdf_extract::extract_text_from_mem(bytes)
            .with_context(|| format!("falha ao extrair texto do PDF {name}"))?
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    };
    let text = normalize_text(&raw, pdf);
    Ok(char_prefix(&text, max_chars).to_string())
}

/// Lê todos os arquivos em lotes de `chunk_size`, cedendo o executor
/// entre lotes.
///
/// O timeout de cada arquivo nunca passa do que resta do orçamento de
/// leitura; esgotado o orçamento, os arquivos restantes não são lidos.
pub async fn read_documents(
    uploads: Vec<Upload>,
    limits: &ExtractionLimits,
    cancel: &CancellationFlag,
    tx: &broadcast::Sender<GenerationEvent>,
) -> ReadOutcome {
    let chunk_size = limits.chunk_size.max(1);
    let total = uploads.len().div_ceil(chunk_size);
    let files = uploads.len();
    let budget = TimeBudget::start(limits.read_budget());
    let mut outcome = ReadOutcome::default();
    let mut pending = uploads.into_iter();
    let mut chunk = 0;

    'chunks: loop {
        let batch: Vec<Upload> = pending.by_ref().take(chunk_size).collect();
        if batch.is_empty() {
            break;
        }
        chunk += 1;
        for upload in batch {
            if cancel.is_cancelled() {
                info!(arquivo = %upload.name, "leitura cancelada");
                outcome.cancelled = true;
                break 'chunks;
            }
            if budget.exhausted() {
                info!(
                    elapsed_ms = budget.elapsed_ms(),
                    restantes = files - outcome.documents.len(),
                    "orçamento de leitura esgotado, seguindo com dados parciais"
                );
                outcome.truncated = true;
                break 'chunks;
            }
            let timeout = limits.file_read_timeout().min(budget.remaining());
            outcome.documents.push(read_one(upload, timeout, limits, tx).await);
        }
        let _ = tx.send(GenerationEvent::ChunkCompleted { chunk, total });
        tokio::task::yield_now().await;
    }

    outcome
}

/// Decodifica um arquivo numa thread bloqueante, limitado pelo timeout.
async fn read_one(
    upload: Upload,
    timeout: Duration,
    limits: &ExtractionLimits,
    tx: &broadcast::Sender<GenerationEvent>,
) -> SourceDocument {
    let started = Instant::now();
    let name = upload.name.clone();
    let max_chars = limits.max_chars_per_file;
    let task =
        tokio::task::spawn_blocking(move || decode_upload(&upload.name, &upload.bytes, max_chars));

    let failure = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(text))) => {
            let chars = text.chars().count();
            let elapsed_ms = started.elapsed().as_millis() as u64;
            info!(arquivo = %name, chars, elapsed_ms, "arquivo decodificado");
            let _ = tx.send(GenerationEvent::FileDecoded {
                file: name.clone(),
                chars,
                elapsed_ms,
            });
            return SourceDocument::new(name, text);
        }
        Ok(Ok(Err(e))) => format!("{e:#}"),
        Ok(Err(e)) => format!("decodificador abortou: {e}"),
        Err(_) => format!("tempo de leitura esgotado ({} ms)", timeout.as_millis()),
    };

    warn!(arquivo = %name, motivo = %failure, "arquivo ignorado, seguindo sem conteúdo");
    let _ = tx.send(GenerationEvent::FileSkipped {
        file: name.clone(),
        reason: failure,
    });
    SourceDocument::new(name, String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut broadcast::Receiver<GenerationEvent>) -> Vec<GenerationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    // ─── decodificação ──────────────────────────────────────────

    #[test]
    fn detects_pdf_by_extension_or_magic() {
        assert!(is_pdf("CERTIDAO.PDF", b""));
        assert!(is_pdf("sem_extensao", b"%PDF-1.7"));
        assert!(!is_pdf("obito.txt", b"Certidao"));
    }

    #[test]
    fn plain_text_is_normalized_and_capped() {
        // "ã" decomposto (a + til combinante)
        let text = decode_upload("obito.txt", "Joa\u{0303}o Pereira".as_bytes(), 4).unwrap();
        assert_eq!(text, "João");
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let text = decode_upload("x.txt", &[b'A', 0xFF, b'B'], 100).unwrap();
        assert_eq!(text, "A\u{FFFD}B");
    }

    #[test]
    fn split_suffixes_are_joined_only_for_pdf() {
        assert_eq!(normalize_text("a condi ção do bem", true), "a condição do bem");
        assert_eq!(normalize_text("a condi ção do bem", false), "a condi ção do bem");
    }

    // ─── leitura em lotes ───────────────────────────────────────

    #[tokio::test]
    async fn reads_in_chunks_and_reports_progress() {
        let (tx, mut rx) = broadcast::channel(64);
        let limits = ExtractionLimits {
            chunk_size: 2,
            ..ExtractionLimits::default()
        };
        let uploads = vec![
            Upload::new("a.txt", "Alfa"),
            Upload::new("b.txt", "Beta"),
            Upload::new("c.txt", "Gama"),
        ];

        let outcome = read_documents(uploads, &limits, &CancellationFlag::new(), &tx).await;

        assert!(!outcome.cancelled);
        let texts: Vec<_> = outcome.documents.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["Alfa", "Beta", "Gama"]);
        let chunks: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, GenerationEvent::ChunkCompleted { .. }))
            .collect();
        assert_eq!(
            chunks,
            vec![
                GenerationEvent::ChunkCompleted { chunk: 1, total: 2 },
                GenerationEvent::ChunkCompleted { chunk: 2, total: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn failed_file_becomes_empty_document() {
        let (tx, mut rx) = broadcast::channel(16);
        let uploads = vec![
            Upload::new("quebrado.pdf", b"%PDF-1.4 lixo".to_vec()),
            Upload::new("ok.txt", "Texto"),
        ];

        let outcome = read_documents(
            uploads,
            &ExtractionLimits::default(),
            &CancellationFlag::new(),
            &tx,
        )
        .await;

        assert_eq!(outcome.documents.len(), 2);
        assert_eq!(outcome.documents[0].text, "");
        assert_eq!(outcome.documents[1].text, "Texto");
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, GenerationEvent::FileSkipped { file, .. } if file == "quebrado.pdf")));
    }

    #[tokio::test]
    async fn cancelled_flag_stops_before_reading() {
        let (tx, _rx) = broadcast::channel(16);
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let outcome = read_documents(
            vec![Upload::new("a.txt", "Alfa")],
            &ExtractionLimits::default(),
            &cancel,
            &tx,
        )
        .await;

        assert!(outcome.cancelled);
        assert!(outcome.documents.is_empty());
    }

    #[tokio::test]
    async fn exhausted_read_budget_skips_remaining_files() {
        let (tx, _rx) = broadcast::channel(16);
        let limits = ExtractionLimits {
            read_budget_ms: 0,
            ..ExtractionLimits::default()
        };
        let uploads = vec![Upload::new("a.txt", "Alfa"), Upload::new("b.txt", "Beta")];

        let outcome = read_documents(uploads, &limits, &CancellationFlag::new(), &tx).await;

        assert!(outcome.truncated);
        assert!(!outcome.cancelled);
        assert!(outcome.documents.is_empty());
    }
}
