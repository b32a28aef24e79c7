//! # Compositor de Qualificação
//!
//! Gera a frase de qualificação jurídica de uma pessoa (ou de um casal) a
//! partir de um [`PersonRecord`]. Duas gramáticas fixas:
//!
//! | Gramática | Quando | Campos ausentes |
//! |-----------|--------|-----------------|
//! | individual | sem cônjuge | a cláusula inteira é omitida |
//! | casal | com cônjuge | o valor vira "Não informado" |
//!
//! ## Gramática Individual
//!
//! Tabela de pares (extrator de atributo, modelo da cláusula) dobrada da
//! esquerda para a direita. Cada cláusula só entra se o atributo existir:
//!
//! ```text
//! {nome}, {nacionalidade|brasileiro(a)}, natural de {cidade}-{UF},
//! nascido(a) aos {data por extenso}, filho(a) de {filiação},
//! profissão {profissão}, estado civil {estado civil},
//! portador(a) da Cédula de Identidade nº {RG}-{órgão} e inscrito(a)
//! no CPF/MF sob o nº {CPF}, endereço eletrônico: {e-mail},
//! residente e domiciliado(a) na {endereço};
//! ```
//!
//! ## Gramática de Casal
//!
//! Posicional: os atributos do titular e do cônjuge (no feminino) são
//! interpolados na mesma frase, com a data do casamento em `dd/mm/aaaa`
//! e o regime de bens por extenso.
//!
//! A saída é determinística: a mesma entrada gera a mesma frase byte a byte.

use chrono::{DateTime, Locale, NaiveDate, TimeZone, Utc};

use crate::core::person::DEFAULT_NATIONALITY;
use crate::core::{MarriageInfo, PersonRecord, RegistrationData, SpouseInfo};

const NOT_INFORMED: &str = "Não informado";
const DATE_NOT_INFORMED: &str = "Não informada";

/// Extrai o valor de uma cláusula; `None` omite a cláusula.
type Getter = fn(&PersonRecord) -> Option<String>;

/// Cláusulas da gramática individual, em ordem fixa. `{}` recebe o valor.
const SINGLE_CLAUSES: &[(Getter, &str)] = &[
    (name, "{}"),
    (nationality, "{}"),
    (naturality, "natural de {}"),
    (birth_extended, "nascido(a) aos {}"),
    (filiation, "filho(a) de {}"),
    (profession, "profissão {}"),
    (civil_status, "estado civil {}"),
    (documents, "{}"),
    (email, "endereço eletrônico: {}"),
    (address, "residente e domiciliado(a) na {}"),
];

/// Qualificação de uma pessoa, ou do casal quando há cônjuge.
///
/// Sem `marriage`, o casamento entra com data "Não informada" e o regime
/// padrão.
pub fn compose(
    person: &PersonRecord,
    spouse: Option<&PersonRecord>,
    marriage: Option<&MarriageInfo>,
) -> String {
    match spouse {
        Some(spouse) => compose_married(person, spouse, &marriage.cloned().unwrap_or_default()),
        None => compose_single(person),
    }
}

/// Qualificação a partir do cadastro finalizado.
pub fn compose_registration(data: &RegistrationData) -> String {
    let spouse = data.spouse();
    compose(
        &data.personal_info,
        spouse.map(|s| &s.person),
        spouse.map(SpouseInfo::marriage).as_ref(),
    )
}

/// Gramática individual.
pub fn compose_single(person: &PersonRecord) -> String {
    let text = SINGLE_CLAUSES
        .iter()
        .filter_map(|(get, template)| get(person).map(|v| template.replace("{}", &v)))
        .collect::<Vec<_>>()
        .join(", ");
    terminate(text)
}

/// Gramática de casal.
pub fn compose_married(person: &PersonRecord, spouse: &PersonRecord, marriage: &MarriageInfo) -> String {
    let address = present(&person.address)
        .or_else(|| present(&spouse.address))
        .unwrap_or_else(|| NOT_INFORMED.to_string());

    let text = format!(
        "{holder}, casado, desde {date}, sob o regime da {regime}, na vigência da Lei nº 6.515/77, \
         com {partner}, residentes e domiciliados na {address}",
        holder = married_fragment(person, Gender::Masculine),
        date = compact_date(&marriage.date).unwrap_or_else(|| DATE_NOT_INFORMED.to_string()),
        regime = marriage.regime.description(),
        partner = married_fragment(spouse, Gender::Feminine),
    );
    terminate(text)
}

#[derive(Clone, Copy)]
enum Gender {
    Masculine,
    Feminine,
}

impl Gender {
    fn suffix(self) -> &'static str {
        match self {
            Self::Masculine => "o",
            Self::Feminine => "a",
        }
    }
}

fn married_fragment(p: &PersonRecord, gender: Gender) -> String {
    let g = gender.suffix();
    let portador = match gender {
        Gender::Masculine => "portador",
        Gender::Feminine => "portadora",
    };
    format!(
        "{name}, {nationality}, nascid{g} na cidade de {naturality}, aos {birth}, \
         filh{g} de {filiation}, profissão {profession}, {portador} da Cédula de Identidade \
         nº {rg} e inscrit{g} no CPF/MF sob o nº {cpf}, endereço eletrônico: {email}",
        name = or_not_informed(&p.name),
        nationality = present(&p.nationality).unwrap_or_else(|| DEFAULT_NATIONALITY.to_string()),
        naturality = naturality(p).unwrap_or_else(|| NOT_INFORMED.to_string()),
        birth = compact_date(&p.birth_date).unwrap_or_else(|| DATE_NOT_INFORMED.to_string()),
        filiation = or_not_informed(&p.filiation),
        profession = or_not_informed(&p.profession),
        rg = rg_with_issuer(p).unwrap_or_else(|| NOT_INFORMED.to_string()),
        cpf = or_not_informed(&p.cpf),
        email = or_not_informed(&p.email),
    )
}

// ─── Extratores de atributo ──────────────────────────────────────

fn present(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn or_not_informed(value: &str) -> String {
    present(value).unwrap_or_else(|| NOT_INFORMED.to_string())
}

fn name(p: &PersonRecord) -> Option<String> {
    present(&p.name)
}

fn nationality(p: &PersonRecord) -> Option<String> {
    Some(present(&p.nationality).unwrap_or_else(|| DEFAULT_NATIONALITY.to_string()))
}

fn naturality(p: &PersonRecord) -> Option<String> {
    let city = present(&p.naturality)?;
    Some(match present(&p.uf) {
        Some(uf) => format!("{city}-{uf}"),
        None => city,
    })
}

fn birth_extended(p: &PersonRecord) -> Option<String> {
    extended_date(&p.birth_date)
}

fn filiation(p: &PersonRecord) -> Option<String> {
    present(&p.filiation)
}

fn profession(p: &PersonRecord) -> Option<String> {
    present(&p.profession)
}

fn civil_status(p: &PersonRecord) -> Option<String> {
    present(&p.civil_status)
}

fn rg_with_issuer(p: &PersonRecord) -> Option<String> {
    let rg = present(&p.rg)?;
    Some(match present(&p.issuer) {
        Some(issuer) => format!("{rg}-{issuer}"),
        None => rg,
    })
}

/// RG e CPF formam uma cláusula só, ligada por " e " quando há os dois.
fn documents(p: &PersonRecord) -> Option<String> {
    let rg = rg_with_issuer(p).map(|rg| format!("portador(a) da Cédula de Identidade nº {rg}"));
    let cpf = present(&p.cpf).map(|cpf| format!("inscrito(a) no CPF/MF sob o nº {cpf}"));
    match (rg, cpf) {
        (Some(rg), Some(cpf)) => Some(format!("{rg} e {cpf}")),
        (rg, cpf) => rg.or(cpf),
    }
}

fn email(p: &PersonRecord) -> Option<String> {
    present(&p.email)
}

fn address(p: &PersonRecord) -> Option<String> {
    present(&p.address)
}

fn terminate(mut text: String) -> String {
    if !text.ends_with(';') && !text.ends_with('.') {
        text.push(';');
    }
    text
}

// ─── Datas ───────────────────────────────────────────────────────

/// Aceita `aaaa-mm-dd`, `dd/mm/aaaa` ou RFC 3339. Datas zeradas
/// (`00/00/0000`) e vazias não são datas.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// `dd/mm/aaaa`.
pub fn compact_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|d| d.format("%d/%m/%Y").to_string())
}

/// `dd de <mês> de aaaa`, mês em português.
pub fn extended_date(raw: &str) -> Option<String> {
    let date = parse_date(raw)?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(
        Utc.from_utc_datetime(&midnight)
            .format_localized("%d de %B de %Y", Locale::pt_BR)
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::person::{RegistrationType, SpouseInfo};
    use crate::core::PropertyRegime;

    fn joao() -> PersonRecord {
        PersonRecord {
            name: "João".into(),
            nationality: "brasileiro".into(),
            naturality: "Brasília".into(),
            uf: "DF".into(),
            birth_date: "1980-01-01".into(),
            filiation: "X e Y".into(),
            profession: "Advogado".into(),
            civil_status: "solteiro".into(),
            rg: "123".into(),
            issuer: "SSP".into(),
            cpf: "000.000.000-00".into(),
            email: "a@a.com".into(),
            address: "Rua A".into(),
            phone: String::new(),
        }
    }

    fn maria() -> PersonRecord {
        PersonRecord {
            name: "Maria".into(),
            cpf: "111.111.111-11".into(),
            birth_date: "12/05/1982".into(),
            ..PersonRecord::default()
        }
    }

    // ─── Gramática individual ───────────────────────────────────

    #[test]
    fn single_full_sentence() {
        assert_eq!(
            compose(&joao(), None, None),
            "João, brasileiro, natural de Brasília-DF, nascido(a) aos 01 de janeiro de 1980, \
             filho(a) de X e Y, profissão Advogado, estado civil solteiro, portador(a) da \
             Cédula de Identidade nº 123-SSP e inscrito(a) no CPF/MF sob o nº 000.000.000-00, \
             endereço eletrônico: a@a.com, residente e domiciliado(a) na Rua A;"
        );
    }

    #[test]
    fn omitting_one_attribute_removes_only_its_clause() {
        type Clear = fn(&mut PersonRecord);
        let cases: &[(&str, Clear, &str)] = &[
            ("naturalidade", |p| p.naturality.clear(), ", natural de Brasília-DF"),
            ("nascimento", |p| p.birth_date.clear(), ", nascido(a) aos 01 de janeiro de 1980"),
            ("filiação", |p| p.filiation.clear(), ", filho(a) de X e Y"),
            ("profissão", |p| p.profession.clear(), ", profissão Advogado"),
            ("estado civil", |p| p.civil_status.clear(), ", estado civil solteiro"),
            ("rg", |p| p.rg.clear(), "portador(a) da Cédula de Identidade nº 123-SSP e "),
            ("cpf", |p| p.cpf.clear(), " e inscrito(a) no CPF/MF sob o nº 000.000.000-00"),
            ("e-mail", |p| p.email.clear(), ", endereço eletrônico: a@a.com"),
            ("endereço", |p| p.address.clear(), ", residente e domiciliado(a) na Rua A"),
        ];

        let full = compose_single(&joao());
        for (label, clear, clause) in cases {
            assert!(full.contains(clause), "{label}: cláusula ausente na frase completa");
            let mut person = joao();
            clear(&mut person);
            assert_eq!(compose_single(&person), full.replacen(clause, "", 1), "{label}");
        }
    }

    #[test]
    fn issuer_and_uf_only_shorten_their_clause() {
        let full = compose_single(&joao());
        let without_issuer = compose_single(&PersonRecord {
            issuer: String::new(),
            ..joao()
        });
        assert_eq!(without_issuer, full.replacen("nº 123-SSP", "nº 123", 1));
        let without_uf = compose_single(&PersonRecord {
            uf: String::new(),
            ..joao()
        });
        assert_eq!(without_uf, full.replacen("Brasília-DF", "Brasília", 1));
    }

    #[test]
    fn phone_never_enters_the_sentence() {
        let with_phone = compose_single(&PersonRecord {
            phone: "(61) 99999-0000".into(),
            ..joao()
        });
        assert_eq!(with_phone, compose_single(&joao()));
    }

    #[test]
    fn cpf_without_rg_uses_comma_joiner() {
        let text = compose_single(&PersonRecord {
            rg: String::new(),
            ..joao()
        });
        assert!(text.contains("estado civil solteiro, inscrito(a) no CPF/MF sob o nº 000.000.000-00"));
        assert!(!text.contains("Cédula"));
    }

    #[test]
    fn missing_nationality_defaults_and_bad_date_is_omitted() {
        let text = compose_single(&PersonRecord {
            name: "Ana".into(),
            birth_date: "00/00/0000".into(),
            ..PersonRecord::default()
        });
        assert_eq!(text, "Ana, brasileiro(a);");
    }

    #[test]
    fn existing_terminator_is_kept() {
        let text = compose_single(&PersonRecord {
            name: "Ana".into(),
            address: "Rua B, nº 5.".into(),
            ..PersonRecord::default()
        });
        assert!(text.ends_with("na Rua B, nº 5."));
    }

    #[test]
    fn composition_is_deterministic() {
        assert_eq!(compose_single(&joao()), compose_single(&joao()));
    }

    // ─── Gramática de casal ─────────────────────────────────────

    #[test]
    fn married_sentence_contains_both_cpfs_and_regime() {
        let marriage = MarriageInfo {
            date: "2005-06-10".into(),
            regime: PropertyRegime::parse("comunhao_parcial"),
        };
        let text = compose(&joao(), Some(&maria()), Some(&marriage));
        assert!(text.contains("000.000.000-00"));
        assert!(text.contains("111.111.111-11"));
        assert!(text.contains("comunhão parcial de bens"));
        assert!(text.contains("casado, desde 10/06/2005"));
        assert!(text.contains("nascido na cidade de Brasília-DF, aos 01/01/1980"));
        assert!(text.contains("Maria, brasileiro(a), nascida na cidade de Não informado, aos 12/05/1982"));
        assert!(text.ends_with("residentes e domiciliados na Rua A;"));
        assert_eq!(text.matches(';').count(), 1);
    }

    #[test]
    fn married_without_marriage_info_uses_defaults() {
        let text = compose(&joao(), Some(&maria()), None);
        assert!(text.contains("desde Não informada, sob o regime da comunhão parcial de bens"));
    }

    #[test]
    fn registration_selects_grammar_by_type() {
        let mut data = RegistrationData {
            kind: RegistrationType::Casado,
            personal_info: joao(),
            spouse_info: Some(SpouseInfo {
                person: maria(),
                marriage_date: "10/06/2005".into(),
                property_regime: "comunhao_universal".into(),
            }),
        };
        assert!(compose_registration(&data).contains("comunhão universal de bens"));
        data.kind = RegistrationType::Solteiro;
        assert!(compose_registration(&data).contains("estado civil solteiro"));
    }

    // ─── Datas ──────────────────────────────────────────────────

    #[test]
    fn parses_supported_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(parse_date("2024-03-05"), expected);
        assert_eq!(parse_date("05/03/2024"), expected);
        assert_eq!(parse_date("2024-03-05T10:00:00Z"), expected);
        assert_eq!(parse_date("00/00/0000"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn extended_date_uses_portuguese_month() {
        assert_eq!(extended_date("2024-03-05").as_deref(), Some("05 de março de 2024"));
    }
}
