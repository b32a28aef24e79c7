#![allow(rustdoc::broken_intra_doc_links)]
//! # Gerador de Minutas
//!
//! **Ponto de entrada** do serviço que monta minutas de escrituras
//! (inventário, compra e venda, doação...) a partir de modelos com
//! placeholders `¿id>` e dos documentos enviados pelo cartório.
//!
//! ## Fluxo de Inicialização
//!
//! ```text
//! main()
//!   ├── Configura tracing/logging (RUST_LOG, padrão "info")
//!   ├── Carrega Settings (gerador.toml + GERADOR_*)
//!   ├── Abre o armazenamento de protocolos (data_dir/protocolos.json)
//!   ├── Monta AppState e Router
//!   └── Inicia servidor TCP em settings.bind
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```bash
//! # Executar com logs padrão (info)
//! cargo run
//!
//! # Logs detalhados e outra porta
//! RUST_LOG=debug GERADOR_BIND=127.0.0.1:8080 cargo run
//! ```

/// Módulo `core`: tipos do domínio: FieldMap, pessoas, protocolos, minutas.
mod core;

/// Módulo `config`: configuração em camadas (arquivo + ambiente).
mod config;

/// Módulo `extraction`: extração heurística de partes e valores.
mod extraction;

/// Módulo `fusion`: fusão de lotes e chaves compostas.
mod fusion;

/// Módulo `qualification`: texto de qualificação civil.
mod qualification;

/// Módulo `placeholder`: resolução de `¿id>` em camadas.
mod placeholder;

/// Módulo `protocol`: numeração e armazenamento de protocolos.
mod protocol;

/// Módulo `session`: cache por sessão do navegador.
mod session;

/// Módulo `ingest`: decodificação dos arquivos enviados.
mod ingest;

/// Módulo `generator`: orquestra o pipeline completo.
mod generator;

/// Módulo `web`: servidor axum, handlers HTTP e SSE.
mod web;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::protocol::JsonProtocolStore;
use crate::web::state::AppState;

/// Função principal assíncrona.
///
/// # Erros
///
/// Retorna erro se a configuração for inválida, se o arquivo de
/// protocolos estiver corrompido, ou se o bind falhar.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Gerador de Minutas: iniciando...");

    let settings = config::load()?;
    let store = JsonProtocolStore::open(&settings.data_dir)
        .with_context(|| format!("falha ao abrir protocolos em {}", settings.data_dir.display()))?;

    let bind = settings.bind.clone();
    let state = AppState::new(settings, Arc::new(store));
    let app = web::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("falha no bind em {bind}"))?;
    tracing::info!("Servidor em http://{bind}");

    axum::serve(listener, app).await?;

    Ok(())
}
