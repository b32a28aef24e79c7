//! # Localizador de Nomes: Heurística de Nomes Próprios em PT-BR
//!
//! Dentro de uma janela de contexto, procura sequências de palavras que
//! parecem nomes de pessoa: duas ou mais palavras capitalizadas (ou em
//! caixa alta, como nas certidões), opcionalmente ligadas por `de`, `da`,
//! `do`, `dos`, `das`.
//!
//! ```text
//! "Certidão de Óbito de JOÃO DA SILVA, falecido em..."
//!  └──────────── sequência capitalizada ─────────┘
//!  corta em termos jurídicos  ──►  "JOÃO DA SILVA"
//! ```
//!
//! ## Filtros
//!
//! | Filtro | Exemplo descartado |
//! |--------|--------------------|
//! | Termos jurídicos e de cartório | `Certidão`, `Cartório`, `Registro Civil` |
//! | Conectivos nas bordas | `de JOÃO` → `JOÃO` |
//! | Menos de duas palavras plenas | `Maria` |
//!
//! A conjunção `e` nunca liga nomes: "Pedro Alves e Ana Lima" são dois.

use std::ops::Range;

use regex::Regex;

use crate::core::text::fold_accents;

/// Palavras (sem acento, minúsculas) que nunca fazem parte de um nome.
/// Uma sequência capitalizada é cortada em cada ocorrência.
const LEGAL_TERMS: &[&str] = &[
    "certidao", "obito", "nascimento", "casamento", "republica", "federativa", "brasil",
    "cartorio", "registro", "civil", "oficial", "oficio", "tabeliao", "tabelionato", "notas",
    "estado", "comarca", "distrito", "federal", "escritura", "publica", "livro", "folha",
    "folhas", "termo", "matricula", "cpf", "rg", "ssp", "oab", "cedula", "identidade",
    "inventario", "partilha", "arrolamento", "herdeiro", "herdeira", "herdeiros", "falecido",
    "falecida", "conjuge", "viuva", "viuvo", "meeira", "meeiro", "inventariante", "advogado",
    "advogada", "declarante", "filiacao", "nome", "data", "hospital", "rua", "avenida",
    "quadra", "lote", "bairro", "cidade", "regime", "bens", "comunhao", "parcial", "universal",
    "separacao", "lei", "codigo", "outorgante", "outorgado", "outorgada", "vendedor",
    "vendedora", "comprador", "compradora", "doador", "doadora", "donatario", "donataria",
    "locador", "locadora", "locatario", "locataria", "fiador", "fiadora", "procurador",
    "procuradora", "testador", "testadora", "companheiro", "companheira", "socio", "socia",
    "administrador", "administradora", "contrato", "imovel", "valor", "autor", "heranca",
    "cujus", "sr", "sra", "dr", "dra",
];

const CONNECTIVES: &[&str] = &["de", "da", "do", "dos", "das"];

/// Localizador de nomes de pessoa em texto jurídico.
pub struct NameFinder {
    /// Sequências de palavras capitalizadas ou em caixa alta.
    name_re: Regex,
}

impl Default for NameFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl NameFinder {
    pub fn new() -> Self {
        let upper = "A-ZÁÀÂÃÉÈÊÍÏÓÔÕÖÚÜÇÑ";
        let lower = "a-záàâãéèêíïóôõöúüçñ";
        let word = format!(r"[{upper}](?:[{lower}]+|[{upper}]+)");
        let connective = r"(?:d[aeo]s?|D[AEO]S?)";
        let pattern = format!(r"\b{word}(?:[ \t]+(?:{connective}[ \t]+)?{word})+\b");
        Self {
            name_re: Regex::new(&pattern).unwrap(),
        }
    }

    /// Nomes dentro de `window`, ordenados pela distância até `anchor`
    /// (a ocorrência da palavra-chave). Empates preservam a ordem do texto.
    ///
    /// Os intervalos são índices de byte em `text` e precisam cair em
    /// fronteiras de caractere.
    pub fn find_near(&self, text: &str, window: Range<usize>, anchor: Range<usize>) -> Vec<String> {
        let slice = &text[window.clone()];
        let mut found: Vec<(usize, String)> = Vec::new();

        for m in self.name_re.find_iter(slice) {
            let start = window.start + m.start();
            let end = window.start + m.end();
            let distance = if start >= anchor.end {
                start - anchor.end
            } else if end <= anchor.start {
                anchor.start - end
            } else {
                0
            };
            for name in clean_segments(m.as_str()) {
                found.push((distance, name));
            }
        }

        found.sort_by_key(|(distance, _)| *distance);
        found.into_iter().map(|(_, name)| name).collect()
    }
}

/// Chave de comparação de nomes: sem acento, minúscula, espaços simples.
pub fn name_key(name: &str) -> String {
    fold_accents(name)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_legal_term(word: &str) -> bool {
    let key = fold_accents(word).to_lowercase();
    LEGAL_TERMS.contains(&key.as_str())
}

fn is_connective(word: &str) -> bool {
    CONNECTIVES.contains(&word.to_lowercase().as_str())
}

/// Corta a sequência nos termos jurídicos e devolve os trechos que ainda
/// parecem nomes (duas ou mais palavras plenas).
fn clean_segments(candidate: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in candidate.split_whitespace() {
        if is_legal_term(word) {
            segments.extend(finish_segment(&current));
            current.clear();
        } else {
            current.push(word);
        }
    }
    segments.extend(finish_segment(&current));
    segments
}

fn finish_segment(words: &[&str]) -> Option<String> {
    let start = words.iter().position(|w| !is_connective(w))?;
    let end = words.iter().rposition(|w| !is_connective(w))?;
    let trimmed = &words[start..=end];
    let full_words = trimmed.iter().filter(|w| !is_connective(w)).count();
    (full_words >= 2).then(|| trimmed.join(" "))
}
