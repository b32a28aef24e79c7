//! Utilitários de texto compartilhados (Unicode e fatiamento seguro).

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Remove acentos: decompõe em NFD e descarta as marcas combinantes.
///
/// ```text
/// "Cônjuge Meeira" → "Conjuge Meeira"
/// "separação"      → "separacao"
/// ```
pub fn fold_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Recompõe o texto em NFC para comparação consistente.
pub fn nfc(text: &str) -> String {
    text.nfc().collect()
}

/// Retorna o prefixo com no máximo `max_chars` caracteres, sem quebrar
/// um caractere multibyte.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
