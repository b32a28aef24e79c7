//! # Perfis de Extração: Tabela de Papéis por Tipo de Documento
//!
//! Cada [`DocumentType`] tem um [`ExtractionProfile`]: a lista ordenada de
//! papéis a procurar, as regras auxiliares ancoradas em cada papel e o modo
//! de extração patrimonial. Acrescentar um tipo de documento é registrar
//! um perfil novo; o motor de varredura não muda.
//!
//! ## Papéis do Inventário
//!
//! | Papel | Cardinalidade | Palavras-chave | Obrigatório |
//! |-------|---------------|----------------|-------------|
//! | `falecido` | única | falecido(a), de cujus, autor da herança, óbito | sim |
//! | `conjuge` | única | cônjuge, viúvo(a), meeiro(a) | sim |
//! | `herdeiro` | enumerada | herdeiro(s), filho(s), sucessor(es) | não |
//! | `inventariante` | única | inventariante | sim |
//! | `advogado` | única | advogado(a), OAB | não |
//!
//! A ordem importa: um nome atribuído a um papel único anterior não é
//! reaproveitado pelos seguintes.
//!
//! ## Regras Auxiliares
//!
//! Buscadas apenas dentro das janelas de contexto do papel âncora e apenas
//! quando o papel foi encontrado. Para cada papel de cardinalidade única
//! são geradas as regras de pessoa: `cpf<Papel>`, `rg<Papel>`,
//! `estadoCivil<Papel>`, `nacionalidade<Papel>`, `endereco<Papel>`.

use std::collections::HashMap;

use regex::Regex;

use crate::core::field_map::{DATA_NAO_IDENTIFICADA, NAO_IDENTIFICADO};
use crate::core::DocumentType;

/// Quantos valores um papel aceita.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    /// Um valor, gravado na própria chave (`falecido`).
    Single,
    /// Vários valores numerados a partir de 1 (`herdeiro1`, `herdeiro2`...).
    Enumerated,
}

/// Papel a identificar e os padrões que o anunciam.
pub struct RoleRule {
    pub role: &'static str,
    pub cardinality: Cardinality,
    pub patterns: Vec<Regex>,
}

/// Campo secundário extraído do contexto de um papel (grupo de captura 1).
pub struct AuxRule {
    pub anchor: &'static str,
    pub key: String,
    pub pattern: Regex,
}

/// Extração patrimonial aplicada ao documento.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EstateMode {
    None,
    /// Monte-mor, matrícula e partilha (meação, quinhões).
    Inventory,
    /// Matrícula e valor de um imóvel negociado.
    Property,
}

pub struct ExtractionProfile {
    pub doc_type: DocumentType,
    pub roles: Vec<RoleRule>,
    pub auxiliaries: Vec<AuxRule>,
    pub estate: EstateMode,
    /// Chaves preenchidas com sentinela quando não encontradas.
    pub required: Vec<(&'static str, &'static str)>,
}

/// Perfis registrados, indexados pelo tipo de documento.
pub struct ProfileTable {
    profiles: HashMap<DocumentType, ExtractionProfile>,
    fallback: ExtractionProfile,
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileTable {
    /// Tabela com os perfis de todos os tipos conhecidos.
    pub fn builtin() -> Self {
        let mut table = Self {
            profiles: HashMap::new(),
            fallback: generic(),
        };
        for profile in [
            inventory(),
            purchase_and_sale(),
            donation(),
            stable_union(),
            power_of_attorney(),
            will(),
            lease(),
            articles_of_association(),
            generic(),
        ] {
            table.register(profile);
        }
        table
    }

    /// Registra (ou substitui) o perfil de um tipo.
    pub fn register(&mut self, profile: ExtractionProfile) {
        self.profiles.insert(profile.doc_type, profile);
    }

    /// Perfil do tipo; tipos sem perfil usam o genérico.
    pub fn get(&self, doc_type: DocumentType) -> &ExtractionProfile {
        self.profiles.get(&doc_type).unwrap_or(&self.fallback)
    }
}

// ─── Padrões compartilhados ──────────────────────────────────────

const DATE: &str = r"(\d{1,2}/\d{1,2}/\d{4}|\d{1,2}\s+de\s+[a-zç]+\s+de\s+\d{4})";
const CPF: &str = r"(\d{3}\.?\d{3}\.?\d{3}-?\d{2})";
const RG: &str = r"(?i)\b(?:rg|c[ée]dula\s+de\s+identidade)\s*(?:n[º°o.]*)?\s*:?\s*(\d[\d.\-xX]*\d|\d)";
const CIVIL_STATUS: &str =
    r"(?i)\b(solteir[oa]|casad[oa]|vi[úu]v[oa]|divorciad[oa]|separad[oa]\s+judicialmente)\b";
const NATIONALITY: &str = r"(?i)\b(brasileir[oa]|portugu[êe]sa?|italian[oa]|espanhola?|argentin[oa]|estrangeir[oa])\b";
const ADDRESS: &str = r"(?i)residente\s+e\s+domiciliad[oa]\s+(?:na|no|à|em)\s+([^;\n]{5,120}?)(?:[;\n]|\.\s|$)";
const REGIME: &str = r"(?i)regime\s+d[ae]\s+((?:comunh[ãa]o\s+(?:parcial|universal)|separa[çc][ãa]o\s+(?:total|obrigat[óo]ria|convencional|legal)|participa[çc][ãa]o\s+final\s+n?os\s+aquestos)(?:\s+de\s+bens)?)";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

fn role(role: &'static str, cardinality: Cardinality, patterns: &[&str]) -> RoleRule {
    RoleRule {
        role,
        cardinality,
        patterns: patterns.iter().map(|p| re(p)).collect(),
    }
}

fn aux(anchor: &'static str, key: &str, pattern: &str) -> AuxRule {
    AuxRule {
        anchor,
        key: key.to_string(),
        pattern: re(pattern),
    }
}

/// `falecido` → `Falecido`, usado como sufixo das chaves de pessoa.
fn suffix(role: &str) -> String {
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Regras de pessoa (`cpf<Papel>`, `rg<Papel>`...) para os papéis únicos.
fn person_attributes(roles: &[RoleRule]) -> Vec<AuxRule> {
    roles
        .iter()
        .filter(|r| r.cardinality == Cardinality::Single)
        .flat_map(|r| {
            let s = suffix(r.role);
            [
                aux(r.role, &format!("cpf{s}"), CPF),
                aux(r.role, &format!("rg{s}"), RG),
                aux(r.role, &format!("estadoCivil{s}"), CIVIL_STATUS),
                aux(r.role, &format!("nacionalidade{s}"), NATIONALITY),
                aux(r.role, &format!("endereco{s}"), ADDRESS),
            ]
        })
        .collect()
}

fn profile(
    doc_type: DocumentType,
    roles: Vec<RoleRule>,
    mut extra: Vec<AuxRule>,
    estate: EstateMode,
    required: Vec<(&'static str, &'static str)>,
) -> ExtractionProfile {
    let mut auxiliaries = person_attributes(&roles);
    auxiliaries.append(&mut extra);
    ExtractionProfile {
        doc_type,
        roles,
        auxiliaries,
        estate,
        required,
    }
}

// ─── Perfis ──────────────────────────────────────────────────────

fn inventory() -> ExtractionProfile {
    use Cardinality::*;
    profile(
        DocumentType::Inventario,
        vec![
            role(
                "falecido",
                Single,
                &[
                    r"(?i)\bfalecid[oa]\b",
                    r"(?i)\bde\s+cujus\b",
                    r"(?i)\bautor[a]?\s+da\s+heran[çc]a\b",
                    r"(?i)\b[óo]bito\b",
                ],
            ),
            role(
                "conjuge",
                Single,
                &[r"(?i)\bc[ôo]njuge\b", r"(?i)\bvi[úu]v[oa]\b", r"(?i)\bmeeir[oa]\b"],
            ),
            role(
                "herdeiro",
                Enumerated,
                &[
                    r"(?i)\bherdeir[oa]s?\b",
                    r"(?i)\bfilh[oa]s?\b",
                    r"(?i)\bsucessor(?:a|es)?\b",
                ],
            ),
            role("inventariante", Single, &[r"(?i)\binventariante\b"]),
            role(
                "advogado",
                Single,
                &[r"(?i)\badvogad[oa]\b", r"\bOAB\b"],
            ),
        ],
        vec![
            aux(
                "falecido",
                "dataFalecimento",
                &format!(r"(?i)(?:falec\w*|[óo]bito)[^\n]{{0,60}}?{DATE}"),
            ),
            aux(
                "conjuge",
                "dataCasamento",
                &format!(r"(?i)casa(?:d[oa]s?|mento)[^\n]{{0,60}}?{DATE}"),
            ),
            aux("conjuge", "regimeBens", REGIME),
            aux("falecido", "regimeBens", REGIME),
            aux(
                "falecido",
                "hospitalFalecimento",
                r"(?i)\b(hospital\s+[^,;\n]{2,60}?)(?:[,;\n]|\.\s|$)",
            ),
            aux(
                "falecido",
                "cidadeFalecimento",
                r"(?i)\bcidade\s+de\s+([^,;\n\d]{3,40}?)(?:[,;\n]|\s+-|\.\s|$)",
            ),
        ],
        EstateMode::Inventory,
        vec![
            ("falecido", NAO_IDENTIFICADO),
            ("conjuge", NAO_IDENTIFICADO),
            ("inventariante", NAO_IDENTIFICADO),
            ("dataFalecimento", DATA_NAO_IDENTIFICADA),
        ],
    )
}

fn purchase_and_sale() -> ExtractionProfile {
    use Cardinality::*;
    profile(
        DocumentType::CompraEVenda,
        vec![
            role(
                "vendedor",
                Single,
                &[r"(?i)\bvendedor(?:a|es)?\b", r"(?i)\boutorgantes?\b"],
            ),
            role(
                "comprador",
                Single,
                &[r"(?i)\bcompradora?s?\b", r"(?i)\bcompradores\b", r"(?i)\boutorgad[oa]s?\b"],
            ),
        ],
        vec![],
        EstateMode::Property,
        vec![],
    )
}

fn donation() -> ExtractionProfile {
    use Cardinality::*;
    profile(
        DocumentType::Doacao,
        vec![
            role("doador", Single, &[r"(?i)\bdoador(?:a|es)?\b"]),
            role("donatario", Single, &[r"(?i)\bdonat[áa]ri[oa]s?\b"]),
        ],
        vec![],
        EstateMode::Property,
        vec![],
    )
}

fn stable_union() -> ExtractionProfile {
    use Cardinality::*;
    profile(
        DocumentType::UniaoEstavel,
        vec![role(
            "companheiro",
            Enumerated,
            &[r"(?i)\bcompanheir[oa]s?\b", r"(?i)\bconviventes?\b"],
        )],
        vec![
            aux("companheiro", "regimeBens", REGIME),
            aux(
                "companheiro",
                "dataInicioUniao",
                &format!(r"(?i)(?:desde|in[íi]cio)[^\n]{{0,40}}?{DATE}"),
            ),
        ],
        EstateMode::None,
        vec![],
    )
}

fn power_of_attorney() -> ExtractionProfile {
    use Cardinality::*;
    profile(
        DocumentType::Procuracao,
        vec![
            role("outorgante", Single, &[r"(?i)\boutorgantes?\b"]),
            role(
                "procurador",
                Single,
                &[r"(?i)\bprocurador(?:a|es)?\b", r"(?i)\boutorgad[oa]s?\b"],
            ),
        ],
        vec![],
        EstateMode::None,
        vec![],
    )
}

fn will() -> ExtractionProfile {
    use Cardinality::*;
    profile(
        DocumentType::Testamento,
        vec![
            role("testador", Single, &[r"(?i)\btestador(?:a)?\b"]),
            role(
                "beneficiario",
                Enumerated,
                &[
                    r"(?i)\bbenefici[áa]ri[oa]s?\b",
                    r"(?i)\blegat[áa]ri[oa]s?\b",
                    r"(?i)\bherdeir[oa]s?\b",
                ],
            ),
        ],
        vec![],
        EstateMode::None,
        vec![],
    )
}

fn lease() -> ExtractionProfile {
    use Cardinality::*;
    profile(
        DocumentType::ContratoAluguel,
        vec![
            role("locador", Single, &[r"(?i)\blocador(?:a|es)?\b"]),
            role("locatario", Single, &[r"(?i)\blocat[áa]ri[oa]s?\b"]),
            role("fiador", Single, &[r"(?i)\bfiador(?:a|es)?\b"]),
        ],
        vec![],
        EstateMode::Property,
        vec![],
    )
}

fn articles_of_association() -> ExtractionProfile {
    use Cardinality::*;
    profile(
        DocumentType::ContratoSocial,
        vec![
            role(
                "administrador",
                Single,
                &[r"(?i)\badministrador(?:a|es)?\b"],
            ),
            role("socio", Enumerated, &[r"(?i)\bs[óo]ci[oa]s?\b"]),
        ],
        vec![],
        EstateMode::None,
        vec![],
    )
}

fn generic() -> ExtractionProfile {
    use Cardinality::*;
    profile(
        DocumentType::Outro,
        vec![
            role("nome", Single, &[r"(?i)\bnome\s*:"]),
            role("parte", Enumerated, &[r"(?i)\bpartes?\b"]),
        ],
        vec![],
        EstateMode::None,
        vec![],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_document_type_has_a_profile() {
        let table = ProfileTable::builtin();
        for kind in DocumentType::ALL {
            assert_eq!(table.get(kind).doc_type, kind);
        }
    }

    #[test]
    fn inventory_role_order_is_fixed() {
        let table = ProfileTable::builtin();
        let roles: Vec<_> = table
            .get(DocumentType::Inventario)
            .roles
            .iter()
            .map(|r| r.role)
            .collect();
        assert_eq!(
            roles,
            vec!["falecido", "conjuge", "herdeiro", "inventariante", "advogado"]
        );
    }

    #[test]
    fn person_attributes_only_for_single_roles() {
        let table = ProfileTable::builtin();
        let keys: Vec<_> = table
            .get(DocumentType::Inventario)
            .auxiliaries
            .iter()
            .map(|a| a.key.as_str())
            .collect();
        assert!(keys.contains(&"cpfFalecido"));
        assert!(keys.contains(&"estadoCivilConjuge"));
        assert!(!keys.iter().any(|k| k.ends_with("Herdeiro")));
    }

    #[test]
    fn auxiliary_patterns_capture_values() {
        let table = ProfileTable::builtin();
        let profile = table.get(DocumentType::Inventario);
        let find = |key: &str, text: &str| {
            profile
                .auxiliaries
                .iter()
                .find(|a| a.key == key)
                .and_then(|a| a.pattern.captures(text))
                .map(|c| c[1].to_string())
        };
        assert_eq!(
            find("dataFalecimento", "faleceu em 15/03/2023 no hospital").as_deref(),
            Some("15/03/2023")
        );
        assert_eq!(
            find("cpfFalecido", "inscrito no CPF sob o nº 123.456.789-00").as_deref(),
            Some("123.456.789-00")
        );
        assert_eq!(
            find("regimeBens", "casados sob o regime de comunhão parcial de bens").as_deref(),
            Some("comunhão parcial de bens")
        );
        assert_eq!(
            find("rgFalecido", "portador do RG nº 1.234.567 SSP/DF").as_deref(),
            Some("1.234.567")
        );
    }

    #[test]
    fn registering_replaces_existing_profile() {
        let mut table = ProfileTable::builtin();
        table.register(ExtractionProfile {
            doc_type: DocumentType::Doacao,
            roles: vec![],
            auxiliaries: vec![],
            estate: EstateMode::None,
            required: vec![],
        });
        assert!(table.get(DocumentType::Doacao).roles.is_empty());
    }
}
