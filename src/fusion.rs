//! # Fusor de Dados: Combinação de Lotes Parciais
//!
//! Cada arquivo enviado produz um [`FieldMap`] parcial. O [`DataFuser`]
//! acumula esses lotes em ordem e depois deriva as chaves compostas.
//!
//! ## Regra de Confiança
//!
//! "Primeiro valor válido vence": um lote posterior só substitui o valor
//! acumulado se este estiver ausente ou for sentinela (ver
//! [`crate::core::field_map`]).
//!
//! | Acumulado | Lote seguinte | Resultado |
//! |-----------|---------------|-----------|
//! | ausente | `Ana` | `Ana` |
//! | `Não identificado` | `Ana` | `Ana` |
//! | `Ana` | `N/A` | `Ana` |
//! | `Ana` | `Bia` | `Ana` |
//!
//! Duas exceções:
//!
//! - **Papéis enumerados** (`herdeiro1`, `socio2`...): cada arquivo numera
//!   a partir de 1, então os nomes de todos os lotes são reunidos em ordem,
//!   sem repetir o mesmo nome, e renumerados.
//! - **Quantias** (`valorTotalBens`, `valorImovel`): vale a maior entre os
//!   lotes, já que cada arquivo só enxerga parte do patrimônio.
//!
//! ## Chaves Compostas
//!
//! | Chave | Origem |
//! |-------|--------|
//! | `nomesFilhos`, `incluir_o_nome_dos_herdeiros` | `herdeiro1..N` unidos por `, ` |
//! | `qualificacaoFalecido`, `qualificacao_do_autor_da_heranca` | atributos `*Falecido` |
//! | `qualificacaoConjuge`, `qualificacao_do(a)_viuvo(a)` | atributos `*Conjuge` |
//! | `qualificacaoHerdeiros` | `qualificacaoHerdeiro1..N` unidos por `;\n` |
//!
//! Todas as derivações usam a mesma regra de confiança, então fundir de
//! novo o próprio resultado não altera nada.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::core::field_map::{
    indexed_values, is_valid, set_if_weaker, split_index, valid_value, FieldMap,
};
use crate::core::DocumentType;
use crate::extraction::estate::Cents;
use crate::extraction::names::name_key;

/// Nome usado quando o falecido não foi identificado.
pub const DECEASED_STAND_IN: &str = "Autor da Herança";

/// Fragmentos da qualificação resumida, em ordem fixa.
/// `(prefixo da chave, texto antes do valor)`.
const SUMMARY_FRAGMENTS: &[(&str, &str)] = &[
    ("nacionalidade", ""),
    ("estadoCivil", ""),
    ("profissao", ""),
    ("rg", "RG nº "),
    ("cpf", "CPF nº "),
    ("endereco", "residente e domiciliado à "),
];

/// Papéis com qualificação resumida: `(papel, sufixo, chaves de destino)`.
const SUMMARY_ROLES: &[(&str, &str, &[&str])] = &[
    (
        "falecido",
        "Falecido",
        &["qualificacaoFalecido", "qualificacao_do_autor_da_heranca"],
    ),
    (
        "conjuge",
        "Conjuge",
        &["qualificacaoConjuge", "qualificacao_do(a)_viuvo(a)"],
    ),
];

/// Chaves monetárias em que o maior valor entre lotes vence.
const LARGEST_AMOUNT_KEYS: &[&str] = &["valorTotalBens", "valorImovel"];

pub struct DataFuser;

impl DataFuser {
    /// Acumula os lotes pela regra de confiança, sem derivar compostos.
    pub fn merge(batches: &[FieldMap]) -> FieldMap {
        let mut merged = FieldMap::new();
        let mut rosters: BTreeMap<&str, Roster> = BTreeMap::new();

        for batch in batches {
            let mut prefixes = BTreeSet::new();
            for (key, value) in batch {
                match split_index(key) {
                    Some((prefix, _)) => {
                        prefixes.insert(prefix);
                    }
                    None if LARGEST_AMOUNT_KEYS.contains(&key.as_str()) => {
                        keep_largest(&mut merged, key, value);
                    }
                    None => {
                        set_if_weaker(&mut merged, key, value);
                    }
                }
            }
            for prefix in prefixes {
                let roster = rosters.entry(prefix).or_default();
                for (_, value) in indexed_values(batch, prefix) {
                    roster.push(value);
                }
            }
        }

        for (prefix, roster) in rosters {
            roster.write_into(&mut merged, prefix);
        }
        merged
    }

    /// Acumula os lotes e deriva as chaves compostas.
    pub fn fuse(batches: &[FieldMap]) -> FieldMap {
        let mut fused = Self::merge(batches);
        Self::derive_composites(&mut fused);
        fused
    }

    /// Deriva as chaves compostas a partir das singulares presentes.
    pub fn derive_composites(fields: &mut FieldMap) {
        let children = enumerated_values(fields, "herdeiro");
        if !children.is_empty() {
            let joined = children.join(", ");
            set_if_weaker(fields, "nomesFilhos", &joined);
            set_if_weaker(fields, "incluir_o_nome_dos_herdeiros", &joined);
        }

        for (role, suffix, targets) in SUMMARY_ROLES {
            if let Some(summary) = summary_qualification(fields, role, suffix) {
                for target in *targets {
                    set_if_weaker(fields, target, &summary);
                }
            }
        }

        let heirs = enumerated_values(fields, "qualificacaoHerdeiro");
        if !heirs.is_empty() {
            let trimmed: Vec<&str> = heirs.iter().map(|h| h.trim_end_matches(';')).collect();
            set_if_weaker(fields, "qualificacaoHerdeiros", &format!("{};", trimmed.join(";\n")));
        }

        debug!(campos = fields.len(), "chaves compostas derivadas");
    }

    /// Substitutos legíveis para campos críticos ausentes.
    pub fn apply_stand_ins(fields: &mut FieldMap, doc_type: DocumentType) {
        if doc_type.is_inventory() && set_if_weaker(fields, "falecido", DECEASED_STAND_IN) {
            debug!("falecido não identificado, usando substituto");
        }
    }
}

/// Nomes de um papel enumerado reunidos de vários lotes.
#[derive(Default)]
struct Roster {
    names: Vec<String>,
    seen: HashSet<String>,
    sentinel: Option<String>,
}

impl Roster {
    fn push(&mut self, value: &str) {
        let value = value.trim();
        if is_valid(value) {
            if self.seen.insert(name_key(value)) {
                self.names.push(value.to_string());
            }
        } else if !value.is_empty() && self.sentinel.is_none() {
            self.sentinel = Some(value.to_string());
        }
    }

    /// Grava `prefix1..N`. Sem nome válido, só o primeiro sentinela fica.
    fn write_into(self, fields: &mut FieldMap, prefix: &str) {
        if self.names.is_empty() {
            if let Some(sentinel) = self.sentinel {
                fields.insert(format!("{prefix}1"), sentinel);
            }
            return;
        }
        for (i, name) in self.names.into_iter().enumerate() {
            fields.insert(format!("{prefix}{}", i + 1), name);
        }
    }
}

fn keep_largest(acc: &mut FieldMap, key: &str, value: &str) {
    let candidate = Some(value).filter(|v| is_valid(v)).and_then(Cents::parse_brl);
    let current = valid_value(acc, key).and_then(Cents::parse_brl);
    match (candidate, current) {
        (Some(new), Some(old)) if new > old => {
            acc.insert(key.to_string(), value.trim().to_string());
        }
        (Some(_), Some(_)) => {}
        _ => {
            set_if_weaker(acc, key, value);
        }
    }
}

/// Valores válidos de todas as chaves `prefixN`, em ordem numérica.
fn enumerated_values(fields: &FieldMap, prefix: &str) -> Vec<String> {
    indexed_values(fields, prefix)
        .into_iter()
        .map(|(_, value)| value.trim())
        .filter(|value| is_valid(value))
        .map(str::to_string)
        .collect()
}

fn summary_qualification(fields: &FieldMap, role: &str, suffix: &str) -> Option<String> {
    let name = valid_value(fields, role)?;
    let mut parts = vec![name.to_string()];
    for (prefix, lead) in SUMMARY_FRAGMENTS {
        if let Some(value) = valid_value(fields, &format!("{prefix}{suffix}")) {
            parts.push(format!("{lead}{value}"));
        }
    }
    Some(parts.join(", "))
}
