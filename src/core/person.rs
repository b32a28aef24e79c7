//! # Pessoa e Dados de Cadastro
//!
//! [`PersonRecord`] reúne os atributos civis de uma pessoa usados para
//! compor a qualificação jurídica. Não é persistido sozinho: vive dentro
//! de [`RegistrationData`], que por sua vez é gravado no protocolo.
//!
//! O formato JSON (camelCase) é o mesmo enviado pelo formulário de cadastro:
//!
//! ```json
//! {
//!   "type": "casado",
//!   "personalInfo": { "name": "João", "cpf": "000.000.000-00", ... },
//!   "spouseInfo": { "name": "Maria", "marriageDate": "2005-06-10",
//!                   "propertyRegime": "comunhao_parcial", ... }
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::text::fold_accents;

/// Nacionalidade usada quando o cadastro não informa nenhuma.
pub const DEFAULT_NATIONALITY: &str = "brasileiro(a)";

/// Atributos civis de uma pessoa. Campos ausentes ficam como string vazia.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonRecord {
    pub name: String,
    pub nationality: String,
    pub naturality: String,
    pub uf: String,
    pub birth_date: String,
    pub filiation: String,
    pub profession: String,
    pub civil_status: String,
    pub rg: String,
    pub issuer: String,
    pub cpf: String,
    pub email: String,
    pub address: String,
    pub phone: String,
}

/// Data e regime do casamento, usados na gramática de casal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarriageInfo {
    pub date: String,
    pub regime: PropertyRegime,
}

/// Dados do cônjuge como vêm do formulário: a pessoa mais os dados do casamento.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpouseInfo {
    #[serde(flatten)]
    pub person: PersonRecord,
    pub marriage_date: String,
    pub property_regime: String,
}

impl SpouseInfo {
    pub fn marriage(&self) -> MarriageInfo {
        MarriageInfo {
            date: self.marriage_date.clone(),
            regime: PropertyRegime::parse(&self.property_regime),
        }
    }
}

/// Tipo de cadastro: pessoa solteira (gramática individual) ou casal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationType {
    #[default]
    Solteiro,
    Casado,
}

/// Cadastro finalizado pelo usuário; origem de um protocolo.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    #[serde(rename = "type", default)]
    pub kind: RegistrationType,
    pub personal_info: PersonRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spouse_info: Option<SpouseInfo>,
}

impl RegistrationData {
    /// Cônjuge efetivo: só existe em cadastros do tipo casal.
    pub fn spouse(&self) -> Option<&SpouseInfo> {
        match self.kind {
            RegistrationType::Casado => self.spouse_info.as_ref(),
            RegistrationType::Solteiro => None,
        }
    }
}

/// Regime de bens do casamento.
///
/// Aceita tanto os códigos do formulário (`comunhao_parcial`) quanto a
/// forma por extenso (`Comunhão Universal de Bens`). Qualquer coisa não
/// reconhecida cai no regime legal supletivo, comunhão parcial.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PropertyRegime {
    #[default]
    ComunhaoParcial,
    ComunhaoUniversal,
    SeparacaoTotal,
    SeparacaoObrigatoria,
    ParticipacaoFinalAquestos,
}

impl PropertyRegime {
    pub fn parse(input: &str) -> Self {
        let key = fold_accents(input.trim())
            .to_lowercase()
            .replace(['_', '-'], " ");
        let key = key.split_whitespace().collect::<Vec<_>>().join(" ");

        if key.contains("comunhao universal") {
            Self::ComunhaoUniversal
        } else if key.contains("separacao obrigatoria") || key.contains("separacao legal") {
            Self::SeparacaoObrigatoria
        } else if key.contains("separacao total") || key.contains("separacao convencional") {
            Self::SeparacaoTotal
        } else if key.contains("participacao final") {
            Self::ParticipacaoFinalAquestos
        } else {
            Self::ComunhaoParcial
        }
    }

    /// Forma usada no texto da escritura.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ComunhaoParcial => "comunhão parcial de bens",
            Self::ComunhaoUniversal => "comunhão universal de bens",
            Self::SeparacaoTotal => "separação total de bens",
            Self::SeparacaoObrigatoria => "separação obrigatória de bens",
            Self::ParticipacaoFinalAquestos => "participação final nos aquestos",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regime_codes_are_translated() {
        assert_eq!(
            PropertyRegime::parse("comunhao_parcial").description(),
            "comunhão parcial de bens"
        );
        assert_eq!(
            PropertyRegime::parse("comunhao_universal"),
            PropertyRegime::ComunhaoUniversal
        );
        assert_eq!(
            PropertyRegime::parse("participacao_final"),
            PropertyRegime::ParticipacaoFinalAquestos
        );
        assert_eq!(
            PropertyRegime::parse("Separação Obrigatória de Bens"),
            PropertyRegime::SeparacaoObrigatoria
        );
    }

    #[test]
    fn unknown_regime_defaults_to_partial_communion() {
        assert_eq!(PropertyRegime::parse(""), PropertyRegime::ComunhaoParcial);
        assert_eq!(PropertyRegime::parse("xyz"), PropertyRegime::ComunhaoParcial);
    }

    #[test]
    fn registration_json_uses_form_field_names() {
        let json = r#"{
            "type": "casado",
            "personalInfo": { "name": "João", "cpf": "111" },
            "spouseInfo": { "name": "Maria", "cpf": "222",
                            "marriageDate": "2005-06-10",
                            "propertyRegime": "comunhao_universal" }
        }"#;
        let data: RegistrationData = serde_json::from_str(json).unwrap();
        assert_eq!(data.kind, RegistrationType::Casado);
        let spouse = data.spouse().unwrap();
        assert_eq!(spouse.person.name, "Maria");
        assert_eq!(spouse.marriage().regime, PropertyRegime::ComunhaoUniversal);
    }

    #[test]
    fn single_registration_ignores_spouse() {
        let data = RegistrationData {
            kind: RegistrationType::Solteiro,
            personal_info: PersonRecord::default(),
            spouse_info: Some(SpouseInfo::default()),
        };
        assert!(data.spouse().is_none());
    }
}
