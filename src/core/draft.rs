//! # Minuta (Draft) e Tipos de Documento
//!
//! Uma [`Draft`] é criada quando o usuário envia um tipo de documento mais
//! arquivos (ou um número de protocolo). O conteúdo começa como modelo e é
//! mutado no lugar a cada passe de resolução; o título pode ser editado.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::field_map::FieldMap;
use super::protocol::ProtocolRecord;
use super::text::fold_accents;

/// Tipos de minuta suportados. O rótulo serializado é o texto exibido ao usuário.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "Inventário")]
    Inventario,
    #[default]
    #[serde(rename = "Escritura de Compra e Venda")]
    CompraEVenda,
    #[serde(rename = "Doação")]
    Doacao,
    #[serde(rename = "União Estável")]
    UniaoEstavel,
    #[serde(rename = "Procuração")]
    Procuracao,
    #[serde(rename = "Testamento")]
    Testamento,
    #[serde(rename = "Contrato de Aluguel")]
    ContratoAluguel,
    #[serde(rename = "Contrato Social")]
    ContratoSocial,
    #[serde(rename = "Outro")]
    Outro,
}

impl DocumentType {
    pub const ALL: [DocumentType; 9] = [
        Self::Inventario,
        Self::CompraEVenda,
        Self::Doacao,
        Self::UniaoEstavel,
        Self::Procuracao,
        Self::Testamento,
        Self::ContratoAluguel,
        Self::ContratoSocial,
        Self::Outro,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Inventario => "Inventário",
            Self::CompraEVenda => "Escritura de Compra e Venda",
            Self::Doacao => "Doação",
            Self::UniaoEstavel => "União Estável",
            Self::Procuracao => "Procuração",
            Self::Testamento => "Testamento",
            Self::ContratoAluguel => "Contrato de Aluguel",
            Self::ContratoSocial => "Contrato Social",
            Self::Outro => "Outro",
        }
    }

    /// Interpreta o rótulo vindo do formulário, tolerando acentos e caixa.
    /// Rótulos desconhecidos viram [`DocumentType::Outro`].
    pub fn from_label(label: &str) -> Self {
        let wanted = fold_accents(label.trim()).to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| fold_accents(t.label()).to_lowercase() == wanted)
            .unwrap_or(Self::Outro)
    }

    /// Inventários ganham extração patrimonial e papéis obrigatórios.
    pub fn is_inventory(&self) -> bool {
        matches!(self, Self::Inventario)
    }
}

/// Referência ao protocolo que originou a minuta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolRef {
    pub numero: String,
    pub data_geracao: DateTime<Utc>,
    pub nome: String,
    pub cpf: String,
}

impl From<&ProtocolRecord> for ProtocolRef {
    fn from(record: &ProtocolRecord) -> Self {
        Self {
            numero: record.numero.clone(),
            data_geracao: record.data_geracao,
            nome: record.nome.clone(),
            cpf: record.cpf.clone(),
        }
    }
}

/// Minuta em edição.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: DocumentType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<FieldMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocolo_info: Option<ProtocolRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    /// Cria uma minuta nova com título padrão "<tipo> - Gerado em dd/mm/aaaa".
    pub fn new(kind: DocumentType, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: format!("{} - Gerado em {}", kind.label(), now.format("%d/%m/%Y")),
            kind,
            content,
            extracted_data: None,
            protocolo_info: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, title: &str) {
        self.title = title.trim().to_string();
        self.updated_at = Utc::now();
    }

    /// Substitui o conteúdo pelo resultado de um passe de resolução.
    pub fn replace_content(&mut self, content: String) {
        self.content = content;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_label() {
        for kind in DocumentType::ALL {
            assert_eq!(DocumentType::from_label(kind.label()), kind);
        }
        assert_eq!(DocumentType::from_label("inventario"), DocumentType::Inventario);
        assert_eq!(DocumentType::from_label("Certidão"), DocumentType::Outro);
    }

    #[test]
    fn draft_serializes_type_label() {
        let draft = Draft::new(DocumentType::Inventario, "¿falecido>".into());
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["type"], "Inventário");
        assert!(json["title"].as_str().unwrap().starts_with("Inventário - Gerado em"));
    }

    #[test]
    fn rename_trims_and_touches_timestamp() {
        let mut draft = Draft::new(DocumentType::Doacao, String::new());
        let before = draft.updated_at;
        draft.rename("  Doação do apartamento ");
        assert_eq!(draft.title, "Doação do apartamento");
        assert!(draft.updated_at >= before);
    }
}
