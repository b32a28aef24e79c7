//! # Módulo Web: A Interface HTTP do Gerador
//!
//! Camada web construída com **Axum** + **SSE**, servindo JSON para o
//! front-end do cartório.
//!
//! ## Arquitetura Web
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Front-end (navegador)                                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Axum Router (este módulo)                                   │
//! │  ├── GET   /status                  → JSON: contagens       │
//! │  ├── GET   /events                  → SSE stream (geração)  │
//! │  ├── POST  /minutas                 → multipart → minuta    │
//! │  ├── GET   /minutas/{id}            → minuta                │
//! │  ├── PATCH /minutas/{id}            → edita título          │
//! │  ├── POST  /minutas/{id}/resolver   → novo passe            │
//! │  ├── POST  /protocolos              → cadastra protocolo    │
//! │  ├── GET   /protocolos?busca=       → lista                 │
//! │  ├── GET   /protocolos/{numero}     → protocolo             │
//! │  ├── DELETE /sessao                 → limpa cache da sessão │
//! │  └── POST  /gerar-minuta            → texto final (anexo)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │ CorsLayer permissivo · DefaultBodyLimit (upload_limit_bytes)│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submódulos
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | [`state`] | Estado compartilhado (`AppState`, `DraftStore`) |
//! | [`events`] | Enum de eventos SSE da geração |
//! | [`handlers`] | Handlers Axum para cada rota |
//! | [`error`] | `ApiError` → status + `{ "erro": … }` |

pub mod error;
pub mod events;
pub mod handlers;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use state::AppState;

/// Cria o router Axum com todas as rotas da aplicação.
///
/// O limite de corpo vale para as duas rotas multipart.
pub fn create_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.settings.upload_limit_bytes);

    Router::new()
        // ── Infra ─────────────────────────────────────────────
        .route("/status", get(handlers::status))
        .route("/events", get(handlers::sse_events))
        // ── Minutas ───────────────────────────────────────────
        .route(
            "/minutas",
            post(handlers::create_draft).layer(upload_limit.clone()),
        )
        .route(
            "/minutas/{id}",
            get(handlers::get_draft).patch(handlers::rename_draft),
        )
        .route("/minutas/{id}/resolver", post(handlers::resolve_draft))
        // ── Protocolos ────────────────────────────────────────
        .route(
            "/protocolos",
            post(handlers::create_protocol).get(handlers::list_protocols),
        )
        .route("/protocolos/{numero}", get(handlers::get_protocol))
        .route("/sessao", delete(handlers::clear_session))
        // ── Rota simples ──────────────────────────────────────
        .route(
            "/gerar-minuta",
            post(handlers::generate_text).layer(upload_limit),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
