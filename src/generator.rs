//! # Gerador de Minutas: A Linha de Montagem
//!
//! O [`DraftGenerator`] coordena todos os componentes para transformar
//! arquivos enviados e um modelo com placeholders numa [`Draft`].
//!
//! ## Fluxo de Geração
//!
//! ```text
//! Uploads
//!   │
//!   ├── 1. LEITURA      ingest::read_documents (lotes, timeout e orçamento)
//!   │
//!   ├── 2. EXTRAÇÃO     FieldExtractor → FieldMap fundido
//!   │
//!   ├── 3. COMPOSTOS    DataFuser::derive_composites + substitutos
//!   │                   + dataLavratura (hoje, dd/mm/aaaa)
//!   │
//!   ├── 4. RESOLUÇÃO    PlaceholderResolver::resolve_with
//!   │                   (overrides → compostos → protocolo → extraídos → sessão)
//!   │
//!   └── 5. PREENCHIMENTO opcional: fill_unresolved
//! ```
//!
//! ## Pools de Valores
//!
//! | Pool | Conteúdo |
//! |------|----------|
//! | `extracted` | saída bruta do extrator (com sentinelas) |
//! | `composite` | só o que a etapa 3 acrescentou ou trocou |
//!
//! Manter os compostos separados deixa os substitutos (ex.: "Autor da
//! Herança") à frente das sentinelas do extrator.

use std::sync::Arc;

use chrono::Local;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, info_span, warn};

use crate::core::{DocumentType, Draft, FieldMap, ProtocolRecord, ProtocolRef};
use crate::extraction::{CancellationFlag, FieldExtractor, SourceDocument};
use crate::fusion::DataFuser;
use crate::ingest::{self, Upload};
use crate::placeholder::{count_unresolved, fill_unresolved, PlaceholderResolver, ResolutionSources};
use crate::web::events::GenerationEvent;

/// Chave composta com a data da lavratura.
pub const DATA_LAVRATURA: &str = "dataLavratura";

/// Falhas que impedem a geração de uma minuta.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("geração cancelada")]
    Cancelled,
    #[error("falha no processamento em segundo plano: {0}")]
    Worker(String),
}

/// Parâmetros de uma geração.
#[derive(Clone, Debug, Default)]
pub struct GenerationRequest {
    pub doc_type: DocumentType,
    /// Modelo com placeholders; `None` usa o modelo embutido do tipo.
    pub template: Option<String>,
    pub protocol: Option<ProtocolRecord>,
    /// Valores explícitos, de maior prioridade.
    pub overrides: FieldMap,
    pub heir_qualification: Option<String>,
    /// Cópia do cache da sessão do usuário.
    pub session: Option<FieldMap>,
    /// Troca placeholders restantes por `DADO NÃO ENCONTRADO`.
    pub fill_missing: bool,
}

/// Minuta gerada e o relatório da geração.
#[derive(Clone, Debug)]
pub struct GenerationReport {
    pub draft: Draft,
    pub remaining_placeholders: usize,
    /// Algum orçamento de tempo se esgotou na leitura ou na extração.
    pub truncated: bool,
    pub documents_scanned: usize,
}

/// Valores de uma nova resolução sobre uma minuta existente.
#[derive(Clone, Debug, Default)]
pub struct ResolveOptions<'a> {
    pub overrides: Option<&'a FieldMap>,
    pub heir_qualification: Option<&'a str>,
    pub protocol: Option<&'a ProtocolRecord>,
    pub session: Option<&'a FieldMap>,
    pub fill_missing: bool,
}

/// Coordena extração, fusão e resolução. Imutável após criado e
/// compartilhado entre requisições via `Arc`.
pub struct DraftGenerator {
    extractor: FieldExtractor,
    resolver: PlaceholderResolver,
}

impl DraftGenerator {
    pub fn new(extractor: FieldExtractor, resolver: PlaceholderResolver) -> Self {
        Self {
            extractor,
            resolver,
        }
    }

    /// Pipeline completo a partir dos arquivos enviados.
    ///
    /// A leitura roda no executor (com `spawn_blocking` por arquivo); a
    /// extração, que é só CPU, roda numa thread bloqueante.
    ///
    /// # Erros
    ///
    /// [`GenerationError::Cancelled`] se o sinal for levantado durante a
    /// leitura ou a extração.
    pub async fn generate_from_uploads(
        self: Arc<Self>,
        request: GenerationRequest,
        uploads: Vec<Upload>,
        cancel: CancellationFlag,
        tx: broadcast::Sender<GenerationEvent>,
    ) -> Result<GenerationReport, GenerationError> {
        let _ = tx.send(GenerationEvent::Started {
            doc_type: request.doc_type.label().to_string(),
            files: uploads.len(),
        });

        let read = ingest::read_documents(uploads, self.extractor.limits(), &cancel, &tx).await;
        if read.cancelled {
            let _ = tx.send(GenerationEvent::Cancelled);
            return Err(GenerationError::Cancelled);
        }

        let read_truncated = read.truncated;
        let worker_tx = tx.clone();
        let result = tokio::task::spawn_blocking(move || {
            self.generate(&request, &read.documents, &cancel, &worker_tx)
        })
        .await
        .map_err(|e| GenerationError::Worker(e.to_string()));

        match result {
            Ok(Ok(mut report)) => {
                report.truncated |= read_truncated;
                Ok(report)
            }
            Ok(Err(GenerationError::Cancelled)) => {
                let _ = tx.send(GenerationEvent::Cancelled);
                Err(GenerationError::Cancelled)
            }
            Ok(Err(e)) | Err(e) => {
                warn!(erro = %e, "geração falhou");
                let _ = tx.send(GenerationEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Extrai, deriva compostos e resolve o modelo. Síncrono.
    pub fn generate(
        &self,
        request: &GenerationRequest,
        documents: &[SourceDocument],
        cancel: &CancellationFlag,
        tx: &broadcast::Sender<GenerationEvent>,
    ) -> Result<GenerationReport, GenerationError> {
        let span = info_span!("geracao", tipo = request.doc_type.label());
        let _guard = span.enter();

        let outcome = self
            .extractor
            .extract_fields(documents, request.doc_type, cancel);
        if outcome.cancelled {
            return Err(GenerationError::Cancelled);
        }
        let _ = tx.send(GenerationEvent::ExtractionCompleted {
            fields: outcome.fields.len(),
            truncated: outcome.truncated,
        });

        let template = request
            .template
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| builtin_template(request.doc_type).to_string());

        let mut draft = Draft::new(request.doc_type, template);
        draft.protocolo_info = request.protocol.as_ref().map(ProtocolRef::from);
        draft.extracted_data = Some(outcome.fields);

        let remaining = self.resolve_draft(
            &mut draft,
            &ResolveOptions {
                overrides: Some(&request.overrides),
                heir_qualification: request.heir_qualification.as_deref(),
                protocol: request.protocol.as_ref(),
                session: request.session.as_ref(),
                fill_missing: request.fill_missing,
            },
        );

        info!(
            minuta = %draft.id,
            documentos = outcome.documents_scanned,
            pendentes = remaining,
            truncado = outcome.truncated,
            "minuta gerada"
        );
        let _ = tx.send(GenerationEvent::Completed {
            draft_id: draft.id.to_string(),
            remaining_placeholders: remaining,
        });

        Ok(GenerationReport {
            draft,
            remaining_placeholders: remaining,
            truncated: outcome.truncated,
            documents_scanned: outcome.documents_scanned,
        })
    }

    /// Resolve o conteúdo atual da minuta no lugar, usando os dados
    /// extraídos guardados nela. Retorna quantos placeholders sobraram.
    pub fn resolve_draft(&self, draft: &mut Draft, options: &ResolveOptions<'_>) -> usize {
        let extracted = draft.extracted_data.clone().unwrap_or_default();
        let composite = composite_pool(&extracted, draft.kind);

        let sources = ResolutionSources {
            overrides: options.overrides,
            heir_qualification: options.heir_qualification,
            composite: Some(&composite),
            protocol: options.protocol,
            extracted: Some(&extracted),
            session: options.session,
        };
        let mut content = self.resolver.resolve_with(&draft.content, &sources);
        if options.fill_missing {
            content = fill_unresolved(&content);
        }
        let remaining = count_unresolved(&content);
        draft.replace_content(content);
        remaining
    }
}

/// Valores que a etapa de compostos acrescentou ou alterou, mais a data
/// da lavratura.
pub fn composite_pool(extracted: &FieldMap, doc_type: DocumentType) -> FieldMap {
    let mut enriched = DataFuser::fuse(std::slice::from_ref(extracted));
    DataFuser::apply_stand_ins(&mut enriched, doc_type);

    let mut composite: FieldMap = enriched
        .into_iter()
        .filter(|(key, value)| extracted.get(key) != Some(value))
        .collect();
    composite.insert(
        DATA_LAVRATURA.into(),
        Local::now().format("%d/%m/%Y").to_string(),
    );
    composite
}

/// Modelo padrão de cada tipo de documento.
pub fn builtin_template(doc_type: DocumentType) -> &'static str {
    match doc_type {
        DocumentType::Inventario => INVENTARIO,
        DocumentType::CompraEVenda => COMPRA_E_VENDA,
        DocumentType::Doacao => DOACAO,
        DocumentType::UniaoEstavel => UNIAO_ESTAVEL,
        DocumentType::Procuracao => PROCURACAO,
        DocumentType::Testamento => TESTAMENTO,
        DocumentType::ContratoAluguel => CONTRATO_ALUGUEL,
        DocumentType::ContratoSocial => CONTRATO_SOCIAL,
        DocumentType::Outro => OUTRO,
    }
}

const INVENTARIO: &str = "\
ESCRITURA PÚBLICA DE INVENTÁRIO E PARTILHA DOS BENS DEIXADOS POR ¿falecido>

Aos ¿Data_lav1>, compareceram as partes: como viúvo(a)-meeiro(a), ¿qualificacao_do(a)_viuvo(a)>; \
como herdeiros, ¿qualificacao_do(a)(s)_herdeiro(a)(s)>

DO AUTOR DA HERANÇA: ¿qualificacao_do_autor_da_heranca>, falecido em ¿data_do_falecimento>, \
no ¿nome_do_hospital>, na cidade de ¿cidade>. Era casado com ¿nome_do(a)_viuvo(a)> desde \
¿data_do_casamento>, sob o regime da ¿regime>.

DOS HERDEIROS: o autor da herança deixou ¿quantidade_de_filhos> filho(s): ¿nome_dos_filhos>.

DA INVENTARIANTE: fica nomeado(a) inventariante ¿nome_do_inventariante>.

DOS BENS: imóvel objeto da matrícula nº ¿MATRICULA_Nº>. Monte-mor: ¿monte_mor>.

DA PARTILHA: ao(à) viúvo(a)-meeiro(a) cabe a meação no valor de ¿valor_da_meacao>; \
a cada herdeiro cabe ¿incluir_o_percentual> do patrimônio, correspondente a \
¿incluir_valor_que_pertence_a_cada_herdeiro>.

Assistidos pelo(a) advogado(a) ¿nome_do_advogado>.
";

const COMPRA_E_VENDA: &str = "\
ESCRITURA PÚBLICA DE COMPRA E VENDA

Aos ¿Data_lav1>, de um lado, como VENDEDOR(A), ¿vendedor>, inscrito(a) no CPF sob o nº \
¿cpfVendedor>, residente à ¿enderecoVendedor>; e de outro, como COMPRADOR(A), ¿comprador>, \
inscrito(a) no CPF sob o nº ¿cpfComprador>.

DO OBJETO: imóvel objeto da matrícula nº ¿matriculaImovel>, pelo preço certo e ajustado de \
¿valorImovel>.
";

const DOACAO: &str = "\
ESCRITURA PÚBLICA DE DOAÇÃO

Aos ¿Data_lav1>, como DOADOR(A), ¿doador>, CPF nº ¿cpfDoador>, e como DONATÁRIO(A), \
¿donatario>, CPF nº ¿cpfDonatario>.

DO OBJETO: imóvel objeto da matrícula nº ¿matriculaImovel>, avaliado em ¿valorImovel>.
";

const UNIAO_ESTAVEL: &str = "\
ESCRITURA PÚBLICA DECLARATÓRIA DE UNIÃO ESTÁVEL

Aos ¿Data_lav1>, compareceram ¿companheiro1> e ¿companheiro2>, declarando que convivem em \
união estável desde ¿dataInicioUniao>, sob o regime da ¿regimeBens>.
";

const PROCURACAO: &str = "\
PROCURAÇÃO PÚBLICA

Aos ¿Data_lav1>, OUTORGANTE: ¿outorgante>, CPF nº ¿cpfOutorgante>. \
PROCURADOR(A): ¿procurador>, CPF nº ¿cpfProcurador>.
";

const TESTAMENTO: &str = "\
TESTAMENTO PÚBLICO

Aos ¿Data_lav1>, compareceu o(a) TESTADOR(A) ¿testador>, CPF nº ¿cpfTestador>, que declarou \
como beneficiário(s) ¿beneficiario1>.
";

const CONTRATO_ALUGUEL: &str = "\
CONTRATO DE LOCAÇÃO

LOCADOR(A): ¿locador>, CPF nº ¿cpfLocador>. LOCATÁRIO(A): ¿locatario>, CPF nº ¿cpfLocatario>. \
FIADOR(A): ¿fiador>.

DO IMÓVEL: matrícula nº ¿matriculaImovel>, aluguel de ¿valorImovel>.
";

const CONTRATO_SOCIAL: &str = "\
CONTRATO SOCIAL

Sócios: ¿socio1> e ¿socio2>. Administrador(a): ¿administrador>.
";

const OUTRO: &str = "\
Aos ¿Data_lav1>, compareceu ¿nome>, CPF nº ¿cpf>.
";
