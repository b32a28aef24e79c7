//! # Extrator de Campos: Varredura Heurística por Papéis
//!
//! Recebe o texto já decodificado de cada arquivo e produz um [`FieldMap`]
//! com os papéis encontrados (falecido, cônjuge, herdeiros...) e campos
//! secundários (datas, regime de bens, documentos, valores).
//!
//! ## Pipeline por Documento
//!
//! ```text
//! texto ──► prefixo limitado (scan_prefix_chars)
//!             │
//!             ▼
//!   para cada papel do perfil, para cada padrão:
//!     até N ocorrências ──► janela simétrica ──► NameFinder
//!             │
//!             ▼
//!   regras auxiliares (só nas janelas do papel encontrado)
//!             │
//!             ▼
//!   extração patrimonial (inventário / imóvel)
//! ```
//!
//! Um nome atribuído a um papel único não é aceito pelos papéis seguintes;
//! nomes enumerados (herdeiros) podem reaparecer, por exemplo como
//! inventariante.
//!
//! Depois de todos os documentos, os lotes são fundidos (ver [`DataFuser`]:
//! papéis enumerados são reunidos e renumerados), a partilha é derivada e
//! papéis obrigatórios ausentes recebem sentinelas.
//!
//! ## Orçamentos
//!
//! | Orçamento | Escopo | Ao esgotar |
//! |-----------|--------|------------|
//! | `overall_budget_ms` | todos os arquivos | arquivos restantes são ignorados |
//! | `pattern_budget_ms` | padrões de um documento | papéis restantes são ignorados |
//!
//! Esgotar um orçamento não é erro: o resultado parcial é devolvido com
//! `truncated = true`. A extração nunca falha.

/// Orçamentos de tempo e cancelamento.
pub mod budget;

/// Localizador de nomes próprios.
pub mod names;

/// Tabela de papéis por tipo de documento.
pub mod profiles;

/// Matrícula, valores e partilha.
pub mod estate;

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::config::ExtractionLimits;
use crate::core::field_map::{has_valid, set_if_weaker, FieldMap};
use crate::core::text::char_prefix;
use crate::core::DocumentType;
use crate::fusion::DataFuser;

pub use budget::{CancellationFlag, TimeBudget};
use estate::EstatePatterns;
use names::{name_key, NameFinder};
pub use profiles::{Cardinality, EstateMode, ExtractionProfile, ProfileTable};

/// Arquivo já decodificado: nome original e texto.
#[derive(Clone, Debug, Default)]
pub struct SourceDocument {
    pub name: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Resultado de uma extração.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExtractionOutcome {
    /// Campos fundidos de todos os documentos varridos.
    pub fields: FieldMap,
    pub documents_scanned: usize,
    /// Algum orçamento de tempo se esgotou.
    pub truncated: bool,
    /// O sinal de cancelamento foi levantado.
    pub cancelled: bool,
}

/// Extrator de campos. Compila padrões uma vez e é reutilizado entre
/// requisições.
pub struct FieldExtractor {
    limits: ExtractionLimits,
    profiles: ProfileTable,
    names: NameFinder,
    estate: EstatePatterns,
}

impl FieldExtractor {
    pub fn new(limits: ExtractionLimits) -> Self {
        Self::with_profiles(limits, ProfileTable::builtin())
    }

    pub fn with_profiles(limits: ExtractionLimits, profiles: ProfileTable) -> Self {
        Self {
            limits,
            profiles,
            names: NameFinder::new(),
            estate: EstatePatterns::new(),
        }
    }

    pub fn limits(&self) -> &ExtractionLimits {
        &self.limits
    }

    /// Extrai campos usando o perfil registrado para `doc_type`.
    pub fn extract_fields(
        &self,
        documents: &[SourceDocument],
        doc_type: DocumentType,
        cancel: &CancellationFlag,
    ) -> ExtractionOutcome {
        self.extract_with_profile(documents, self.profiles.get(doc_type), cancel)
    }

    /// Extrai campos com um perfil explícito.
    pub fn extract_with_profile(
        &self,
        documents: &[SourceDocument],
        profile: &ExtractionProfile,
        cancel: &CancellationFlag,
    ) -> ExtractionOutcome {
        let span = info_span!(
            "extracao",
            tipo = profile.doc_type.label(),
            arquivos = documents.len()
        );
        let _guard = span.enter();

        let overall = TimeBudget::start(self.limits.overall_budget());
        let mut outcome = ExtractionOutcome::default();
        let mut batches = Vec::with_capacity(documents.len());

        for doc in documents {
            if cancel.is_cancelled() {
                info!(arquivo = %doc.name, "extração cancelada");
                outcome.cancelled = true;
                break;
            }
            if overall.exhausted() {
                info!(
                    elapsed_ms = overall.elapsed_ms(),
                    restantes = documents.len() - outcome.documents_scanned,
                    "orçamento total esgotado, seguindo com dados parciais"
                );
                outcome.truncated = true;
                break;
            }
            let (batch, partial) = self.extract_document(doc, profile);
            outcome.truncated |= partial;
            outcome.documents_scanned += 1;
            batches.push(batch);
        }

        let mut fields = DataFuser::merge(&batches);
        if profile.estate == EstateMode::Inventory {
            estate::derive_inventory_shares(&mut fields, self.limits.assumed_heir_count);
        }
        for (key, sentinel) in &profile.required {
            set_if_weaker(&mut fields, key, sentinel);
        }

        info!(
            campos = fields.len(),
            documentos = outcome.documents_scanned,
            truncado = outcome.truncated,
            elapsed_ms = overall.elapsed_ms(),
            "extração concluída"
        );
        outcome.fields = fields;
        outcome
    }

    /// Varre um documento. Retorna o lote e se o orçamento de padrões
    /// se esgotou no meio.
    pub fn extract_document(
        &self,
        doc: &SourceDocument,
        profile: &ExtractionProfile,
    ) -> (FieldMap, bool) {
        let text = char_prefix(&doc.text, self.limits.scan_prefix_chars);
        let budget = TimeBudget::start(self.limits.pattern_budget());
        let half = self.limits.context_window / 2;

        let mut fields = FieldMap::new();
        let mut contexts: HashMap<&str, Vec<Range<usize>>> = HashMap::new();
        let mut claimed: HashSet<String> = HashSet::new();
        let mut partial = false;

        for rule in &profile.roles {
            let mut found: Vec<String> = Vec::new();

            for pattern in &rule.patterns {
                if budget.exhausted() {
                    partial = true;
                    break;
                }
                for m in pattern.find_iter(text).take(self.limits.max_matches_per_pattern) {
                    let window = window_bounds(text, m.start(), m.end(), half);
                    contexts.entry(rule.role).or_default().push(window.clone());

                    for name in self.names.find_near(text, window, m.range()) {
                        let key = name_key(&name);
                        if claimed.contains(&key) || found.iter().any(|f| name_key(f) == key) {
                            continue;
                        }
                        found.push(name);
                        if rule.cardinality == Cardinality::Single
                            || found.len() >= self.limits.max_names_per_role
                        {
                            break;
                        }
                    }
                    if found.len() >= self.limits.max_names_per_role {
                        break;
                    }
                }
            }

            match rule.cardinality {
                Cardinality::Single => {
                    if let Some(name) = found.first() {
                        claimed.insert(name_key(name));
                        fields.insert(rule.role.to_string(), name.clone());
                    }
                }
                Cardinality::Enumerated => {
                    for (i, name) in found.iter().enumerate() {
                        fields.insert(format!("{}{}", rule.role, i + 1), name.clone());
                    }
                }
            }
            debug!(arquivo = %doc.name, papel = rule.role, nomes = found.len(), "papel varrido");
            if partial {
                break;
            }
        }

        for rule in &profile.auxiliaries {
            if !role_found(&fields, rule.anchor) {
                continue;
            }
            let windows = contexts.get(rule.anchor).map(Vec::as_slice).unwrap_or(&[]);
            let captured = windows.iter().find_map(|w| {
                rule.pattern
                    .captures(&text[w.clone()])
                    .and_then(|c| c.get(1))
                    .map(|g| clean_capture(g.as_str()))
            });
            if let Some(value) = captured {
                set_if_weaker(&mut fields, &rule.key, &value);
            }
        }

        match profile.estate {
            EstateMode::Inventory => self.estate.scan_inventory(text, &mut fields),
            EstateMode::Property => self.estate.scan_property(text, &mut fields),
            EstateMode::None => {}
        }

        if partial {
            info!(arquivo = %doc.name, elapsed_ms = budget.elapsed_ms(), "orçamento de padrões esgotado");
        }
        (fields, partial)
    }
}

/// Papel único (`falecido`) ou enumerado (`herdeiro1`) presente.
fn role_found(fields: &FieldMap, role: &str) -> bool {
    has_valid(fields, role) || has_valid(fields, &format!("{role}1"))
}

/// Janela de até `half` caracteres de cada lado da ocorrência.
fn window_bounds(text: &str, start: usize, end: usize, half: usize) -> Range<usize> {
    let left = if half == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .take(half)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(start)
    };
    let right = text[end..]
        .char_indices()
        .nth(half)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    left..right
}

fn clean_capture(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', ','])
        .to_string()
}
