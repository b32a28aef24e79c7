//! Registro de protocolo: cadastro finalizado, numerado e imutável.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::person::RegistrationData;

/// Protocolo persistido. Criado uma vez ao finalizar o cadastro e nunca
/// mais alterado; consultado depois pelo número para reaproveitar a
/// qualificação em uma minuta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolRecord {
    /// Número único no formato `C-XXXXXXXX`.
    pub numero: String,
    pub data_geracao: DateTime<Utc>,
    /// Nome do titular.
    pub nome: String,
    /// CPF do titular.
    pub cpf: String,
    /// Conteúdo completo do documento gerado, quando houver.
    #[serde(default)]
    pub conteudo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_data: Option<RegistrationData>,
    /// Qualificação pré-composta, reaproveitada pelo resolvedor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texto_qualificacao: Option<String>,
}

impl ProtocolRecord {
    /// Busca textual usada pela listagem: número, nome ou CPF contém o termo
    /// (sem diferenciar caixa). Termo vazio casa com tudo.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&self.numero, &self.nome, &self.cpf]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }

    /// Qualificação não vazia, se existir.
    pub fn qualification(&self) -> Option<&str> {
        self.texto_qualificacao
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
