//! # Mapa de Campos: Chave → Valor sem Esquema Fixo
//!
//! O [`FieldMap`] é a moeda comum entre todos os componentes do gerador:
//! o extrator produz mapas, o fusor os combina, o resolvedor os consulta.
//!
//! ## Ordem Determinística
//!
//! O mapa é um `BTreeMap`, portanto a iteração segue a ordem lexicográfica
//! das chaves. O casamento aproximado do resolvedor percorre as chaves
//! nessa ordem, o que torna o resultado reprodutível entre execuções.
//!
//! ## Valores Sentinela
//!
//! Alguns valores significam "sem dado real" e são tratados como ausência
//! durante a fusão:
//!
//! | Sentinela | Origem |
//! |-----------|--------|
//! | `N/A`, `NA`, `-`, `=====` | formulários e modelos antigos |
//! | `undefined`, `null` | serialização do front-end |
//! | `Não identificado` | papel obrigatório não encontrado pelo extrator |
//! | `Data não identificada` | data obrigatória não encontrada |
//! | `Valor não informado` | valor monetário não encontrado |
//! | `DADO NÃO ENCONTRADO` | preenchimento final de placeholders |

use std::collections::BTreeMap;

/// Mapa chave → valor usado em todo o pipeline.
pub type FieldMap = BTreeMap<String, String>;

/// Papel obrigatório não identificado nos documentos.
pub const NAO_IDENTIFICADO: &str = "Não identificado";

/// Data obrigatória não identificada nos documentos.
pub const DATA_NAO_IDENTIFICADA: &str = "Data não identificada";

/// Valor monetário não encontrado nos documentos.
pub const VALOR_NAO_INFORMADO: &str = "Valor não informado";

/// Marcador que substitui placeholders não resolvidos no passe final.
pub const DADO_NAO_ENCONTRADO: &str = "DADO NÃO ENCONTRADO";

const SENTINELS: &[&str] = &[
    "n/a",
    "na",
    "-",
    "=====",
    "undefined",
    "null",
    "não identificado",
    "não identificada",
    "data não identificada",
    "valor não informado",
    "não informado",
    "não informada",
    "dado não encontrado",
];

/// Indica se o valor é um sentinela conhecido (comparação sem caixa, com trim).
pub fn is_sentinel(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    SENTINELS.contains(&lower.as_str())
}

/// Um valor é "válido" quando não é vazio nem sentinela.
pub fn is_valid(value: &str) -> bool {
    !value.trim().is_empty() && !is_sentinel(value)
}

/// Indica se a chave já contém um valor válido.
pub fn has_valid(map: &FieldMap, key: &str) -> bool {
    map.get(key).is_some_and(|v| is_valid(v))
}

/// Grava `value` em `key` somente se o valor atual estiver ausente ou for
/// sentinela. Retorna `true` se gravou.
///
/// É a regra "primeiro valor válido vence": um valor válido nunca é
/// sobrescrito, e um sentinela só entra se não houver nada melhor.
pub fn set_if_weaker(map: &mut FieldMap, key: &str, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    match map.get(key) {
        Some(current) if is_valid(current) => false,
        // Sentinela não substitui sentinela: a primeira ocorrência fica.
        Some(current) if !current.trim().is_empty() && !is_valid(value) => false,
        _ => {
            map.insert(key.to_string(), value.to_string());
            true
        }
    }
}

/// Retorna o valor da chave apenas se for válido.
pub fn valid_value<'a>(map: &'a FieldMap, key: &str) -> Option<&'a str> {
    map.get(key).map(|v| v.trim()).filter(|v| is_valid(v))
}

/// Separa o índice de uma chave enumerada: `herdeiro12` → `("herdeiro", 12)`.
pub fn split_index(key: &str) -> Option<(&str, u32)> {
    let prefix = key.trim_end_matches(|c: char| c.is_ascii_digit());
    if prefix.is_empty() || prefix.len() == key.len() {
        return None;
    }
    key[prefix.len()..].parse().ok().map(|i| (prefix, i))
}

/// Todas as entradas `prefixN` do mapa, em ordem numérica de `N`.
/// Índices ausentes no meio não interrompem a busca.
pub fn indexed_values<'a>(map: &'a FieldMap, prefix: &str) -> Vec<(u32, &'a str)> {
    let mut found: Vec<(u32, &str)> = map
        .range(prefix.to_string()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .filter_map(|(key, value)| match split_index(key) {
            Some((p, i)) if p == prefix => Some((i, value.as_str())),
            _ => None,
        })
        .collect();
    found.sort_by_key(|(i, _)| *i);
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_case_insensitive() {
        assert!(is_sentinel("N/A"));
        assert!(is_sentinel("  não identificado "));
        assert!(is_sentinel("NÃO IDENTIFICADO"));
        assert!(is_sentinel("====="));
        assert!(!is_sentinel("Maria Silva"));
    }

    #[test]
    fn valid_value_rejects_empty_and_sentinel() {
        assert!(!is_valid(""));
        assert!(!is_valid("   "));
        assert!(!is_valid("undefined"));
        assert!(is_valid("01/01/2024"));
    }

    #[test]
    fn set_if_weaker_keeps_first_valid() {
        let mut map = FieldMap::new();
        assert!(set_if_weaker(&mut map, "falecido", "João da Silva"));
        assert!(!set_if_weaker(&mut map, "falecido", "Pedro Souza"));
        assert_eq!(map["falecido"], "João da Silva");
    }

    #[test]
    fn set_if_weaker_replaces_sentinel() {
        let mut map = FieldMap::new();
        map.insert("conjuge".into(), NAO_IDENTIFICADO.into());
        assert!(set_if_weaker(&mut map, "conjuge", "Ana Souza"));
        assert_eq!(map["conjuge"], "Ana Souza");
    }

    #[test]
    fn split_index_needs_prefix_and_digits() {
        assert_eq!(split_index("herdeiro12"), Some(("herdeiro", 12)));
        assert_eq!(split_index("falecido"), None);
        assert_eq!(split_index("123"), None);
    }

    #[test]
    fn indexed_values_skip_gaps_and_sort_numerically() {
        let map: FieldMap = [
            ("herdeiro10", "Joana"),
            ("herdeiro2", "Bruno"),
            ("herdeiro3", "Carla"),
            ("herdeiros", "todos"),
            ("qualificacaoHerdeiro1", "ANA"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(
            indexed_values(&map, "herdeiro"),
            vec![(2, "Bruno"), (3, "Carla"), (10, "Joana")]
        );
    }

    #[test]
    fn set_if_weaker_never_downgrades() {
        let mut map = FieldMap::new();
        map.insert("regime".into(), "comunhão parcial de bens".into());
        assert!(!set_if_weaker(&mut map, "regime", "N/A"));
        assert_eq!(map["regime"], "comunhão parcial de bens");
    }
}
