//! # Handlers HTTP: Os Endpoints da Aplicação
//!
//! Cada função pública é um handler Axum, mapeado a uma rota em
//! [`super::create_router()`]. Todas as respostas são JSON, exceto o SSE
//! e o texto final de `/gerar-minuta`.
//!
//! ## Rotas
//!
//! | Handler | Método | Retorno |
//! |---------|--------|---------|
//! | `status` | GET | JSON com contagens |
//! | `sse_events` | GET | SSE stream de [`GenerationEvent`](super::events::GenerationEvent) |
//! | `create_draft` | POST multipart | minuta + relatório |
//! | `get_draft` | GET | minuta |
//! | `rename_draft` | PATCH | minuta |
//! | `resolve_draft` | POST | minuta + relatório |
//! | `create_protocol` | POST | protocolo (201) |
//! | `list_protocols` | GET | lista filtrada por `?busca=` |
//! | `get_protocol` | GET | protocolo |
//! | `generate_text` | POST multipart | `text/plain` em anexo |
//! | `clear_session` | DELETE | 204 |
//!
//! ## Sessão
//!
//! O cabeçalho `x-sessao` identifica o cache de sessão. Sem cabeçalho, a
//! requisição segue sem cache.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::stream::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use super::error::ApiError;
use super::state::AppState;
use crate::core::{DocumentType, Draft, FieldMap, ProtocolRecord, RegistrationData};
use crate::extraction::CancellationFlag;
use crate::generator::{GenerationReport, GenerationRequest, ResolveOptions};
use crate::ingest::Upload;
use crate::placeholder::SESSION_QUALIFICATION_KEY;
use crate::protocol;
use crate::session::SESSION_HEADER;

/// Resposta do endpoint `/status`.
#[derive(Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub protocolos: usize,
    pub minutas: usize,
}

/// Minuta e relatório da última resolução.
#[derive(Serialize)]
pub struct DraftResponse {
    pub minuta: Draft,
    /// Placeholders `¿…>` que sobraram.
    pub remaining_placeholders: usize,
    pub truncated: bool,
    /// Arquivos varridos pelo extrator; zero numa nova resolução.
    pub documents_scanned: usize,
}

impl From<GenerationReport> for DraftResponse {
    fn from(report: GenerationReport) -> Self {
        Self {
            minuta: report.draft,
            remaining_placeholders: report.remaining_placeholders,
            truncated: report.truncated,
            documents_scanned: report.documents_scanned,
        }
    }
}

#[derive(Deserialize)]
pub struct RenameBody {
    pub titulo: String,
}

/// Corpo de `POST /minutas/{id}/resolver`.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ResolveBody {
    pub valores: FieldMap,
    pub qualificacao: Option<String>,
    pub preencher_faltantes: bool,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub busca: Option<String>,
}

/// Campos reconhecidos nos formulários multipart.
#[derive(Default)]
struct DraftForm {
    tipo: Option<String>,
    modelo: Option<String>,
    protocolo: Option<String>,
    preencher_faltantes: bool,
    uploads: Vec<Upload>,
}

/// Levanta o sinal de cancelamento quando a requisição é abandonada.
struct CancelOnDrop(CancellationFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// GET `/status`
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ok: true,
        protocolos: state.protocols.list_all().len(),
        minutas: state.drafts.len(),
    })
}

/// GET `/events`: Stream SSE dos eventos de geração.
///
/// ## Keep-Alive
///
/// Envia keep-alive a cada 15s; proxies costumam fechar conexões
/// ociosas.
///
/// ## Lagged Messages
///
/// Assinante atrasado perde eventos (filter_map devolve `None`).
pub async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl futures_util::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.events_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok(SseEvent::default().data(data)))
            }
            Err(_) => None,
        }
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// POST `/minutas`: gera uma minuta a partir de arquivos e modelo.
///
/// ## Fluxo
///
/// ```text
/// 1. Lê o formulário multipart (tipo, modelo, protocolo, arquivos)
/// 2. Busca o protocolo, se informado (404 se não existir)
/// 3. Copia o cache da sessão
/// 4. Roda o pipeline do gerador
/// 5. Guarda a minuta e devolve minuta + relatório
/// ```
pub async fn create_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<DraftResponse>, ApiError> {
    let form = read_form(multipart).await?;
    let protocol = form
        .protocolo
        .as_deref()
        .map(|numero| find_protocol(&state, numero))
        .transpose()?;

    let request = GenerationRequest {
        doc_type: form
            .tipo
            .as_deref()
            .map(DocumentType::from_label)
            .unwrap_or_default(),
        template: form.modelo,
        protocol,
        overrides: FieldMap::new(),
        heir_qualification: None,
        session: session_id(&headers).and_then(|id| state.sessions.snapshot(id)),
        fill_missing: form.preencher_faltantes,
    };

    let report = run_generation(&state, request, form.uploads).await?;
    state.drafts.insert(report.draft.clone());
    Ok(Json(report.into()))
}

/// GET `/minutas/{id}`
pub async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Draft>, ApiError> {
    state
        .drafts
        .get(id)
        .map(Json)
        .ok_or(ApiError::DraftNotFound(id))
}

/// PATCH `/minutas/{id}`: edita o título.
pub async fn rename_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RenameBody>,
) -> Result<Json<Draft>, ApiError> {
    if body.titulo.trim().is_empty() {
        return Err(ApiError::BadRequest("título vazio".into()));
    }
    state
        .drafts
        .update(id, |draft| {
            draft.rename(&body.titulo);
            draft.clone()
        })
        .map(Json)
        .ok_or(ApiError::DraftNotFound(id))
}

/// POST `/minutas/{id}/resolver`: novo passe de resolução sobre o
/// conteúdo atual, com valores opcionais do usuário.
pub async fn resolve_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<ResolveBody>,
) -> Result<Json<DraftResponse>, ApiError> {
    let current = state.drafts.get(id).ok_or(ApiError::DraftNotFound(id))?;
    let protocol = current
        .protocolo_info
        .as_ref()
        .and_then(|p| state.protocols.get_by_number(&p.numero));
    let session = session_id(&headers).and_then(|sid| state.sessions.snapshot(sid));

    let options = ResolveOptions {
        overrides: Some(&body.valores),
        heir_qualification: body.qualificacao.as_deref(),
        protocol: protocol.as_ref(),
        session: session.as_ref(),
        fill_missing: body.preencher_faltantes,
    };
    let generator = state.generator.clone();
    let (draft, remaining) = state
        .drafts
        .update(id, |draft| {
            let remaining = generator.resolve_draft(draft, &options);
            (draft.clone(), remaining)
        })
        .ok_or(ApiError::DraftNotFound(id))?;

    Ok(Json(DraftResponse {
        minuta: draft,
        remaining_placeholders: remaining,
        truncated: false,
        documents_scanned: 0,
    }))
}

/// POST `/protocolos`: finaliza um cadastro.
///
/// A qualificação composta também vai para o cache da sessão
/// (`documentoGeradoTexto`), de onde o resolvedor a lê como último
/// recurso.
pub async fn create_protocol(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(data): Json<RegistrationData>,
) -> Result<(StatusCode, Json<ProtocolRecord>), ApiError> {
    let record = protocol::register(state.protocols.as_ref(), data, None)?;
    if let (Some(sid), Some(qualification)) = (session_id(&headers), record.qualification()) {
        state
            .sessions
            .put(sid, SESSION_QUALIFICATION_KEY, qualification);
    }
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET `/protocolos?busca=`
pub async fn list_protocols(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<ProtocolRecord>> {
    Json(state.protocols.search(params.busca.as_deref().unwrap_or("")))
}

/// GET `/protocolos/{numero}`
pub async fn get_protocol(
    State(state): State<AppState>,
    Path(numero): Path<String>,
) -> Result<Json<ProtocolRecord>, ApiError> {
    find_protocol(&state, &numero).map(Json)
}

/// DELETE `/sessao`: descarta o cache da sessão do cabeçalho `x-sessao`.
pub async fn clear_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let sid = session_id(&headers)
        .ok_or_else(|| ApiError::BadRequest(format!("cabeçalho {SESSION_HEADER} ausente")))?;
    if state.sessions.clear(sid) {
        tracing::info!(sessao = %sid, "sessão descartada");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/gerar-minuta`: variante sem estado: arquivos + modelo, texto
/// final com os faltantes preenchidos.
pub async fn generate_text(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_form(multipart).await?;
    let request = GenerationRequest {
        doc_type: form
            .tipo
            .as_deref()
            .map(DocumentType::from_label)
            .unwrap_or(DocumentType::Inventario),
        template: form.modelo,
        fill_missing: true,
        ..GenerationRequest::default()
    };

    let report = run_generation(&state, request, form.uploads).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"minuta_final.txt\"",
            ),
        ],
        report.draft.content,
    ))
}

// ─── auxiliares ─────────────────────────────────────────────────

async fn run_generation(
    state: &AppState,
    request: GenerationRequest,
    uploads: Vec<Upload>,
) -> Result<GenerationReport, ApiError> {
    let guard = CancelOnDrop(CancellationFlag::new());
    let report = state
        .generator
        .clone()
        .generate_from_uploads(
            request,
            uploads,
            guard.0.clone(),
            state.events_tx.as_ref().clone(),
        )
        .await?;
    Ok(report)
}

fn find_protocol(state: &AppState, numero: &str) -> Result<ProtocolRecord, ApiError> {
    state
        .protocols
        .get_by_number(numero)
        .ok_or_else(|| ApiError::ProtocolNotFound(numero.trim().to_string()))
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Lê o formulário multipart. Aceita os nomes do formulário de minutas
/// (`arquivos`, `modelo`) e os da rota simples (`files`, `modelo_minuta`).
async fn read_form(mut multipart: Multipart) -> Result<DraftForm, ApiError> {
    let mut form = DraftForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "arquivos" | "files" => {
                let filename = field.file_name().unwrap_or("documento").to_string();
                let bytes = field.bytes().await?;
                tracing::info!(size_bytes = bytes.len(), filename = %filename, "arquivo recebido");
                form.uploads.push(Upload::new(filename, bytes.to_vec()));
            }
            "tipo" => form.tipo = Some(field.text().await?),
            "modelo" | "modelo_minuta" => form.modelo = Some(field.text().await?),
            "protocolo" => {
                let numero = field.text().await?;
                form.protocolo = Some(numero).filter(|n| !n.trim().is_empty());
            }
            "preencher_faltantes" => {
                form.preencher_faltantes = field.text().await?.trim().eq_ignore_ascii_case("true");
            }
            other => tracing::debug!(campo = other, "campo multipart ignorado"),
        }
    }
    Ok(form)
}
