//! # Resolvedor de Placeholders
//!
//! Substitui os `¿identificador>` de um modelo por valores vindos de várias
//! fontes, em ordem de prioridade:
//!
//! | # | Fonte | Exemplo |
//! |---|-------|---------|
//! | 1 | valores explícitos da chamada | edição manual do usuário |
//! | 2 | compostos derivados | `qualificacaoFalecido`, `dataLavratura` |
//! | 3 | protocolo consultado | `nome`, `cpf`, `qualificacao` |
//! | 4 | dados extraídos dos arquivos | `falecido`, `herdeiro1` |
//! | 5 | cache da sessão | `documentoGeradoTexto` |
//!
//! ## Camadas de Busca
//!
//! ```text
//! ¿identificador>
//!   1. chave direta em cada fonte, na ordem        → achou? substitui
//!   2. apelido → chave canônica, em cada fonte     → achou? substitui
//!   3. casamento aproximado (sem ( ) " ' - _ , minúsculas,
//!      um contém o outro)                          → achou? substitui
//!   4. nada: o placeholder fica intacto
//! ```
//!
//! Um placeholder não resolvido permanece byte a byte igual ao original,
//! então resolver de novo o resultado não muda nada. A troca por
//! `DADO NÃO ENCONTRADO` é um passe separado ([`fill_unresolved`]),
//! chamado só quando o resultado é final.
//!
//! ## Qualificação dos Herdeiros
//!
//! O marcador `qualificacao_do(a)(s)_herdeiro(a)(s)` é tratado antes do
//! passe geral, com sua própria ordem de fontes, e é substituído junto com
//! o delimitador que o envolver (`¿…>`, `§…§`, `===…===` ou nenhum).
//! Sem delimitador, o marcador colado a outro identificador
//! (`¿qualificacao_do(a)(s)_herdeiro(a)(s)_extra>`) não conta.
//! Fora desse marcador, os delimitadores `§…§` e `===…===` não são tocados.

/// Tabela de apelidos.
pub mod alias;

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, NoExpand, Regex};
use tracing::debug;

use crate::core::field_map::{FieldMap, DADO_NAO_ENCONTRADO};
use crate::core::ProtocolRecord;

pub use alias::AliasMap;

/// Marcador literal da qualificação dos herdeiros.
pub const HEIR_QUALIFICATION_MARKER: &str = "qualificacao_do(a)(s)_herdeiro(a)(s)";

/// Chave do cache de sessão com a última qualificação composta.
pub const SESSION_QUALIFICATION_KEY: &str = "documentoGeradoTexto";

/// Chaves genéricas de qualificação consultadas nos mapas de campos.
const QUALIFICATION_KEYS: &[&str] = &["qualificacaoCompleta", "qualificacaoHerdeiros"];

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"¿([^>]+)>").unwrap());

static HEIR_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let marker = regex::escape(HEIR_QUALIFICATION_MARKER);
    Regex::new(&format!(
        r"¿\s*{marker}\s*>|§\s*{marker}\s*§|===\s*{marker}\s*===|{marker}"
    ))
    .unwrap()
});

/// Fontes de valores de uma resolução. Todas opcionais.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResolutionSources<'a> {
    /// Valores explícitos da chamada.
    pub overrides: Option<&'a FieldMap>,
    /// Qualificação dos herdeiros informada explicitamente.
    pub heir_qualification: Option<&'a str>,
    /// Compostos derivados (qualificações, data de lavratura...).
    pub composite: Option<&'a FieldMap>,
    pub protocol: Option<&'a ProtocolRecord>,
    pub extracted: Option<&'a FieldMap>,
    /// Cache da sessão, somente leitura.
    pub session: Option<&'a FieldMap>,
}

/// Campos de um protocolo expostos como fonte de valores.
pub fn protocol_pool(record: &ProtocolRecord) -> FieldMap {
    let mut pool = FieldMap::new();
    pool.insert("numeroProtocolo".into(), record.numero.clone());
    pool.insert("nome".into(), record.nome.clone());
    pool.insert("cpf".into(), record.cpf.clone());
    if let Some(q) = record.qualification() {
        pool.insert("qualificacao".into(), q.to_string());
    }
    pool
}

/// Resolvedor de placeholders. Sem estado além do mapa de apelidos.
#[derive(Clone, Debug, Default)]
pub struct PlaceholderResolver {
    aliases: AliasMap,
}

impl PlaceholderResolver {
    pub fn new(aliases: AliasMap) -> Self {
        Self { aliases }
    }

    /// Resolução completa: marcador dos herdeiros, depois o passe geral
    /// sobre as cinco fontes em ordem.
    pub fn resolve_with(&self, template: &str, sources: &ResolutionSources<'_>) -> String {
        let with_heirs = self.resolve_heir_qualification(template, sources);

        let protocol = sources.protocol.map(protocol_pool);
        let pools: Vec<&FieldMap> = [
            sources.overrides,
            sources.composite,
            protocol.as_ref(),
            sources.extracted,
            sources.session,
        ]
        .into_iter()
        .flatten()
        .collect();

        self.resolve(&with_heirs, &pools)
    }

    /// Passe geral sobre `pools`, na ordem dada.
    pub fn resolve(&self, template: &str, pools: &[&FieldMap]) -> String {
        let mut resolved = 0usize;
        let mut pending = 0usize;
        let out = PLACEHOLDER_RE.replace_all(template, |caps: &Captures<'_>| {
            match self.lookup(caps[1].trim(), pools) {
                Some(value) => {
                    resolved += 1;
                    value.to_string()
                }
                None => {
                    pending += 1;
                    caps[0].to_string()
                }
            }
        });
        debug!(resolvidos = resolved, pendentes = pending, "passe de placeholders");
        out.into_owned()
    }

    /// Substitui o marcador da qualificação dos herdeiros pela primeira
    /// fonte não vazia. Sem marcador ou sem fonte, devolve o modelo intacto.
    pub fn resolve_heir_qualification<'t>(
        &self,
        template: &'t str,
        sources: &ResolutionSources<'_>,
    ) -> Cow<'t, str> {
        if !template.contains(HEIR_QUALIFICATION_MARKER) {
            return Cow::Borrowed(template);
        }
        match heir_qualification(sources) {
            Some(text) => {
                debug!(chars = text.chars().count(), "qualificação dos herdeiros aplicada");
                HEIR_MARKER_RE.replace_all(template, |caps: &Captures<'_>| match caps.get(0) {
                    Some(m)
                        if m.as_str() == HEIR_QUALIFICATION_MARKER
                            && embedded_in_identifier(template, m.start(), m.end()) =>
                    {
                        m.as_str().to_string()
                    }
                    _ => text.to_string(),
                })
            }
            None => Cow::Borrowed(template),
        }
    }

    /// Camadas 1 a 3 para um identificador.
    fn lookup<'p>(&self, id: &str, pools: &[&'p FieldMap]) -> Option<&'p str> {
        direct(id, pools)
            .or_else(|| {
                self.aliases
                    .canonical(id)
                    .and_then(|canonical| direct(canonical, pools))
            })
            .or_else(|| fuzzy(id, pools))
    }
}

/// O trecho `start..end` está grudado em `¿` ou em outro identificador.
fn embedded_in_identifier(template: &str, start: usize, end: usize) -> bool {
    let joins = |c: char| c == '_' || c.is_alphanumeric();
    let before = template[..start].chars().next_back();
    let after = template[end..].chars().next();
    before.is_some_and(|c| c == '¿' || joins(c)) || after.is_some_and(joins)
}

/// Primeira fonte não vazia para a qualificação dos herdeiros.
fn heir_qualification<'a>(sources: &ResolutionSources<'a>) -> Option<&'a str> {
    let from_map = |map: Option<&'a FieldMap>| {
        map.and_then(|m| {
            QUALIFICATION_KEYS
                .iter()
                .find_map(|key| m.get(*key).map(|v| v.trim()).filter(|v| !v.is_empty()))
        })
    };

    sources
        .heir_qualification
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .or_else(|| from_map(sources.overrides))
        .or_else(|| from_map(sources.composite))
        .or_else(|| sources.protocol.and_then(ProtocolRecord::qualification))
        .or_else(|| from_map(sources.extracted))
        .or_else(|| {
            sources
                .session
                .and_then(|s| s.get(SESSION_QUALIFICATION_KEY))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        })
}

/// Chave presente com valor não vazio, na primeira fonte que a tiver.
fn direct<'p>(key: &str, pools: &[&'p FieldMap]) -> Option<&'p str> {
    pools
        .iter()
        .find_map(|pool| pool.get(key).map(String::as_str).filter(|v| !v.trim().is_empty()))
}

/// Remove `( ) " ' - _` e passa para minúsculas.
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '(' | ')' | '"' | '\'' | '-' | '_'))
        .collect::<String>()
        .to_lowercase()
}

/// Primeira entrada (fontes em ordem, chaves em ordem lexicográfica) cuja
/// chave normalizada contém o identificador normalizado, ou vice-versa.
fn fuzzy<'p>(id: &str, pools: &[&'p FieldMap]) -> Option<&'p str> {
    let wanted = normalize_key(id);
    if wanted.is_empty() {
        return None;
    }
    pools.iter().find_map(|pool| {
        pool.iter().find_map(|(key, value)| {
            if value.trim().is_empty() {
                return None;
            }
            let candidate = normalize_key(key);
            let hit = !candidate.is_empty()
                && (candidate.contains(&wanted) || wanted.contains(&candidate));
            hit.then_some(value.as_str())
        })
    })
}

/// Troca todo placeholder restante pelo marcador `DADO NÃO ENCONTRADO`.
pub fn fill_unresolved(text: &str) -> String {
    PLACEHOLDER_RE
        .replace_all(text, NoExpand(DADO_NAO_ENCONTRADO))
        .into_owned()
}

/// Quantos placeholders ainda existem no texto.
pub fn count_unresolved(text: &str) -> usize {
    PLACEHOLDER_RE.find_iter(text).count()
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn map(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolver() -> PlaceholderResolver {
        PlaceholderResolver::default()
    }

    fn protocol(qualification: Option<&str>) -> ProtocolRecord {
        ProtocolRecord {
            numero: "C-ABCD1234".into(),
            data_geracao: Utc::now(),
            nome: "Maria Silva".into(),
            cpf: "123".into(),
            conteudo: String::new(),
            registration_data: None,
            texto_qualificacao: qualification.map(str::to_string),
        }
    }

    // ─── Camadas de busca ───────────────────────────────────────

    #[test]
    fn direct_lookup_round_trip() {
        let pool = map(&[("nome_do_inventariante", "Maria Silva"), ("Data_lav1", "01/01/2024")]);
        let out = resolver().resolve(
            "Herdeiro: ¿nome_do_inventariante>, Data: ¿Data_lav1>",
            &[&pool],
        );
        assert_eq!(out, "Herdeiro: Maria Silva, Data: 01/01/2024");
    }

    #[test]
    fn alias_fallback() {
        let pool = map(&[("regimeBens", "comunhao_parcial")]);
        let aliases: AliasMap = [("regime", "regimeBens")].into_iter().collect();
        let out = PlaceholderResolver::new(aliases).resolve("¿regime>", &[&pool]);
        assert_eq!(out, "comunhao_parcial");
    }

    #[test]
    fn fuzzy_match_ignores_punctuation_and_case() {
        let pool = map(&[("nomeDoBanco", "Banco do Brasil")]);
        let out = PlaceholderResolver::new(AliasMap::empty()).resolve("¿Nome_do_(banco)>", &[&pool]);
        assert_eq!(out, "Banco do Brasil");
    }

    #[test]
    fn earlier_pool_wins() {
        let first = map(&[("falecido", "João")]);
        let second = map(&[("falecido", "Pedro")]);
        assert_eq!(resolver().resolve("¿falecido>", &[&first, &second]), "João");
        assert_eq!(resolver().resolve("¿falecido>", &[&second, &first]), "Pedro");
    }

    #[test]
    fn empty_value_is_not_a_hit() {
        let first = map(&[("falecido", "  ")]);
        let second = map(&[("falecido", "Pedro")]);
        assert_eq!(resolver().resolve("¿falecido>", &[&first, &second]), "Pedro");
    }

    #[test]
    fn punctuation_in_identifier_is_preserved() {
        let pool = map(&[("nome_do(a)_viuva(o)-meeira(o)", "Ana")]);
        let out = resolver().resolve("viúva: ¿nome_do(a)_viuva(o)-meeira(o)>.", &[&pool]);
        assert_eq!(out, "viúva: Ana.");
    }

    // ─── Não resolvidos ─────────────────────────────────────────

    #[test]
    fn unresolved_placeholder_is_left_unchanged() {
        let empty = FieldMap::new();
        let template = "Campo: ¿campo_inexistente>";
        assert_eq!(resolver().resolve(template, &[&empty]), template);
    }

    #[test]
    fn sentinel_fill_replaces_leftovers() {
        let empty = FieldMap::new();
        let resolved = resolver().resolve("¿campo_inexistente>", &[&empty]);
        assert_eq!(fill_unresolved(&resolved), "DADO NÃO ENCONTRADO");
    }

    #[test]
    fn resolution_is_idempotent() {
        let pool = map(&[("falecido", "João")]);
        let template = "¿falecido> deixou ¿xyz_desconhecido> e ¿nome_do_autor_da_heranca>";
        let once = resolver().resolve(template, &[&pool]);
        assert_eq!(resolver().resolve(&once, &[&pool]), once);
        assert_eq!(count_unresolved(&once), 1);
    }

    #[test]
    fn alternate_delimiters_are_untouched() {
        let pool = map(&[("falecido", "João")]);
        let template = "§falecido§ e ===falecido===";
        assert_eq!(resolver().resolve(template, &[&pool]), template);
    }

    #[test]
    fn identifier_is_trimmed_before_lookup() {
        let pool = map(&[("falecido", "João")]);
        assert_eq!(resolver().resolve("De cujus: ¿ falecido >.", &[&pool]), "De cujus: João.");
    }


    // ─── Qualificação dos herdeiros ─────────────────────────────

    #[test]
    fn heir_marker_uses_priority_order() {
        let extracted = map(&[("qualificacaoCompleta", "EXTRAÍDA")]);
        let session = map(&[(SESSION_QUALIFICATION_KEY, "SESSÃO")]);
        let record = protocol(Some("PROTOCOLO"));
        let template = "Herdeiros: ¿qualificacao_do(a)(s)_herdeiro(a)(s)>";

        let mut sources = ResolutionSources {
            extracted: Some(&extracted),
            session: Some(&session),
            protocol: Some(&record),
            ..Default::default()
        };
        assert_eq!(resolver().resolve_with(template, &sources), "Herdeiros: PROTOCOLO");

        sources.heir_qualification = Some("EXPLÍCITA");
        assert_eq!(resolver().resolve_with(template, &sources), "Herdeiros: EXPLÍCITA");

        sources.heir_qualification = None;
        sources.protocol = None;
        assert_eq!(resolver().resolve_with(template, &sources), "Herdeiros: EXTRAÍDA");

        sources.extracted = None;
        assert_eq!(resolver().resolve_with(template, &sources), "Herdeiros: SESSÃO");
    }

    #[test]
    fn heir_marker_is_replaced_with_any_delimiter() {
        let session = map(&[(SESSION_QUALIFICATION_KEY, "Q")]);
        let sources = ResolutionSources {
            session: Some(&session),
            ..Default::default()
        };
        let template = "a §qualificacao_do(a)(s)_herdeiro(a)(s)§ b ===qualificacao_do(a)(s)_herdeiro(a)(s)=== c qualificacao_do(a)(s)_herdeiro(a)(s)";
        assert_eq!(resolver().resolve_with(template, &sources), "a Q b Q c Q");
    }

    #[test]
    fn heir_marker_inside_longer_identifier_is_untouched() {
        let sources = ResolutionSources {
            heir_qualification: Some("Q"),
            ..Default::default()
        };
        let template = "¿qualificacao_do(a)(s)_herdeiro(a)(s)_x> e qualificacao_do(a)(s)_herdeiro(a)(s)";
        assert_eq!(
            resolver().resolve_heir_qualification(template, &sources),
            "¿qualificacao_do(a)(s)_herdeiro(a)(s)_x> e Q"
        );
        let prefixed = "¿anexo_qualificacao_do(a)(s)_herdeiro(a)(s)>";
        assert_eq!(resolver().resolve_heir_qualification(prefixed, &sources), prefixed);
    }

    #[test]
    fn heir_marker_without_source_stays() {
        let template = "¿qualificacao_do(a)(s)_herdeiro(a)(s)>";
        assert_eq!(
            resolver().resolve_with(template, &ResolutionSources::default()),
            template
        );
    }

    #[test]
    fn protocol_fields_are_a_pool() {
        let record = protocol(None);
        let sources = ResolutionSources {
            protocol: Some(&record),
            ..Default::default()
        };
        assert_eq!(
            resolver().resolve_with("¿numeroProtocolo> / ¿cpf>", &sources),
            "C-ABCD1234 / 123"
        );
    }

    #[test]
    fn overrides_beat_extracted_data() {
        let overrides = map(&[("falecido", "Editado")]);
        let extracted = map(&[("falecido", "Extraído")]);
        let sources = ResolutionSources {
            overrides: Some(&overrides),
            extracted: Some(&extracted),
            ..Default::default()
        };
        assert_eq!(resolver().resolve_with("¿falecido>", &sources), "Editado");
    }
}
