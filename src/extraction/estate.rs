//! # Extração Patrimonial
//!
//! Localiza matrícula de imóvel e valores em reais, e deriva a partilha
//! de um inventário depois da fusão:
//!
//! ```text
//! valorTotalBens  R$ 300.000,00
//!   └─ meação (50%)         → valorTotalMeacao   R$ 150.000,00
//!   └─ meação ÷ herdeiros   → valorPorHerdeiro   R$ 50.000,00   (3 herdeiros)
//!      50% ÷ herdeiros      → percentualHerdeiro 16,67%
//! ```
//!
//! Valores são guardados em centavos inteiros para não acumular erro de
//! ponto flutuante na divisão.

use std::fmt;

use regex::Regex;

use crate::core::field_map::{
    indexed_values, is_valid, set_if_weaker, valid_value, FieldMap, VALOR_NAO_INFORMADO,
};

/// Quantia em centavos de real.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cents(pub i64);

impl Cents {
    /// Interpreta "1.234,56", "R$ 1.234,56" ou "1234". Ignora o que não
    /// for dígito, ponto ou vírgula.
    pub fn parse_brl(raw: &str) -> Option<Self> {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
            .collect();
        let (int_part, frac_part) = match cleaned.rsplit_once(',') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (cleaned.clone(), String::new()),
        };
        let int_digits: String = int_part.chars().filter(char::is_ascii_digit).collect();
        if int_digits.is_empty() && frac_part.is_empty() {
            return None;
        }
        let reais: i64 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().ok()?
        };
        let cents: i64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().ok()? * 10,
            _ => frac_part[..2].parse().ok()?,
        };
        reais.checked_mul(100)?.checked_add(cents).map(Cents)
    }

    pub fn half(self) -> Self {
        Cents((self.0 + 1) / 2)
    }

    pub fn divide(self, parts: u32) -> Self {
        Cents(self.0 / i64::from(parts.max(1)))
    }
}

impl fmt::Display for Cents {
    /// Formato brasileiro: `R$ 1.234,56`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let reais = (abs / 100).to_string();
        let mut grouped = String::new();
        for (i, ch) in reais.chars().enumerate() {
            if i > 0 && (reais.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        write!(f, "{sign}R$ {grouped},{:02}", abs % 100)
    }
}

/// Percentual de cada herdeiro sobre o total (metade dividida por `heirs`),
/// com até duas casas e vírgula decimal: `50%`, `25%`, `16,67%`.
pub fn heir_percentage(heirs: u32) -> String {
    let hundredths = (5_000 + u64::from(heirs.max(1)) / 2) / u64::from(heirs.max(1));
    let whole = hundredths / 100;
    let frac = hundredths % 100;
    match frac {
        0 => format!("{whole}%"),
        f if f % 10 == 0 => format!("{whole},{}%", f / 10),
        f => format!("{whole},{f:02}%"),
    }
}

/// Padrões patrimoniais compilados uma vez.
pub struct EstatePatterns {
    matricula_re: Regex,
    money_re: Regex,
}

impl Default for EstatePatterns {
    fn default() -> Self {
        Self::new()
    }
}

impl EstatePatterns {
    pub fn new() -> Self {
        Self {
            matricula_re: Regex::new(
                r"(?i)\bmatr[íi]cula\s*(?:n[º°o.]*|n[úu]mero)?\s*:?\s*(\d[\d.]*\d|\d)",
            )
            .unwrap(),
            money_re: Regex::new(r"R\$\s*(\d{1,3}(?:\.\d{3})+(?:,\d{2})?|\d+(?:,\d{2})?)").unwrap(),
        }
    }

    pub fn matricula(&self, text: &str) -> Option<String> {
        self.matricula_re
            .captures(text)
            .map(|c| c[1].to_string())
    }

    /// Maior quantia em reais do texto; num inventário é o monte-mor.
    pub fn largest_amount(&self, text: &str) -> Option<Cents> {
        self.money_re
            .captures_iter(text)
            .filter_map(|c| Cents::parse_brl(&c[1]))
            .max()
    }

    /// Campos patrimoniais de um documento de inventário.
    pub fn scan_inventory(&self, text: &str, fields: &mut FieldMap) {
        if let Some(m) = self.matricula(text) {
            set_if_weaker(fields, "matriculaImovel", &m);
        }
        if let Some(total) = self.largest_amount(text) {
            set_if_weaker(fields, "valorTotalBens", &total.to_string());
        }
    }

    /// Campos de um imóvel negociado (compra e venda, doação, locação).
    pub fn scan_property(&self, text: &str, fields: &mut FieldMap) {
        if let Some(m) = self.matricula(text) {
            set_if_weaker(fields, "matriculaImovel", &m);
        }
        if let Some(value) = self.largest_amount(text) {
            set_if_weaker(fields, "valorImovel", &value.to_string());
        }
    }
}

/// Quantos `herdeiroN` válidos existem no mapa, com ou sem lacunas.
pub fn count_heirs(fields: &FieldMap) -> u32 {
    indexed_values(fields, "herdeiro")
        .iter()
        .filter(|(_, name)| is_valid(name))
        .count() as u32
}

/// Deriva meação, quinhão e percentual a partir do monte-mor fundido.
///
/// Sem herdeiros identificados usa `assumed_heirs`. Sem monte-mor válido
/// os três valores recebem o sentinela de valor não informado.
pub fn derive_inventory_shares(fields: &mut FieldMap, assumed_heirs: u32) {
    let found = count_heirs(fields);
    let heirs = if found > 0 { found } else { assumed_heirs.max(1) };

    set_if_weaker(fields, "numeroFilhos", &heirs.to_string());
    set_if_weaker(fields, "percentualHerdeiro", &heir_percentage(heirs));

    match valid_value(fields, "valorTotalBens").and_then(Cents::parse_brl) {
        Some(total) => {
            let meacao = total.half();
            set_if_weaker(fields, "valorTotalMeacao", &meacao.to_string());
            set_if_weaker(fields, "valorPorHerdeiro", &meacao.divide(heirs).to_string());
        }
        None => {
            for key in ["valorTotalBens", "valorTotalMeacao", "valorPorHerdeiro"] {
                set_if_weaker(fields, key, VALOR_NAO_INFORMADO);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_brazilian_amounts() {
        assert_eq!(Cents::parse_brl("1.234,56"), Some(Cents(123_456)));
        assert_eq!(Cents::parse_brl("R$ 300.000,00"), Some(Cents(30_000_000)));
        assert_eq!(Cents::parse_brl("1500"), Some(Cents(150_000)));
        assert_eq!(Cents::parse_brl("abc"), None);
    }

    #[test]
    fn formats_with_thousand_separators() {
        assert_eq!(Cents(123_456).to_string(), "R$ 1.234,56");
        assert_eq!(Cents(5).to_string(), "R$ 0,05");
        assert_eq!(Cents(100_000_000).to_string(), "R$ 1.000.000,00");
    }

    #[test]
    fn percentage_per_heir() {
        assert_eq!(heir_percentage(1), "50%");
        assert_eq!(heir_percentage(2), "25%");
        assert_eq!(heir_percentage(3), "16,67%");
        assert_eq!(heir_percentage(4), "12,5%");
    }

    #[test]
    fn largest_amount_is_the_estate_total() {
        let patterns = EstatePatterns::new();
        let text = "Imóvel avaliado em R$ 250.000,00; veículo R$ 50.000,00. Total R$ 300.000,00";
        assert_eq!(patterns.largest_amount(text), Some(Cents(30_000_000)));
    }

    #[test]
    fn scans_matricula() {
        let patterns = EstatePatterns::new();
        let mut fields = FieldMap::new();
        patterns.scan_inventory("registrado sob a matrícula nº 12.345 do 1º Ofício", &mut fields);
        assert_eq!(fields["matriculaImovel"], "12.345");
        assert!(!fields.contains_key("valorTotalBens"));
    }

    #[test]
    fn derives_shares_from_heirs_found() {
        let mut fields = FieldMap::new();
        fields.insert("valorTotalBens".into(), "R$ 300.000,00".into());
        for (i, name) in ["Ana Lima", "Bruno Lima", "Carla Lima"].iter().enumerate() {
            fields.insert(format!("herdeiro{}", i + 1), name.to_string());
        }
        derive_inventory_shares(&mut fields, 1);
        assert_eq!(fields["valorTotalMeacao"], "R$ 150.000,00");
        assert_eq!(fields["valorPorHerdeiro"], "R$ 50.000,00");
        assert_eq!(fields["percentualHerdeiro"], "16,67%");
        assert_eq!(fields["numeroFilhos"], "3");
    }

    #[test]
    fn heirs_are_counted_across_index_gaps() {
        let mut fields = FieldMap::new();
        fields.insert("valorTotalBens".into(), "R$ 100.000,00".into());
        fields.insert("herdeiro2".into(), "Bruno Lima".into());
        fields.insert("herdeiro3".into(), "Carla Souza".into());
        fields.insert("herdeiro4".into(), "N/A".into());
        assert_eq!(count_heirs(&fields), 2);

        derive_inventory_shares(&mut fields, 1);
        assert_eq!(fields["numeroFilhos"], "2");
        assert_eq!(fields["percentualHerdeiro"], "25%");
        assert_eq!(fields["valorPorHerdeiro"], "R$ 25.000,00");
    }

    #[test]
    fn missing_total_yields_sentinels_and_assumed_heirs() {
        let mut fields = FieldMap::new();
        derive_inventory_shares(&mut fields, 2);
        assert_eq!(fields["valorTotalBens"], VALOR_NAO_INFORMADO);
        assert_eq!(fields["valorPorHerdeiro"], VALOR_NAO_INFORMADO);
        assert_eq!(fields["numeroFilhos"], "2");
        assert_eq!(fields["percentualHerdeiro"], "25%");
    }
}
