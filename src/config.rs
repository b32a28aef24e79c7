//! # Configuração
//!
//! Camadas, da menor para a maior prioridade:
//!
//! 1. valores padrão ([`Settings::default`])
//! 2. arquivo TOML opcional (`gerador.toml`, ou o caminho em `GERADOR_CONFIG`)
//! 3. variáveis de ambiente com prefixo `GERADOR` (`__` separa níveis)
//!
//! ```bash
//! GERADOR_BIND=0.0.0.0:8080 \
//! GERADOR_EXTRACTION__OVERALL_BUDGET_MS=3000 \
//! cargo run
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Configuração do processo.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Endereço de escuta do servidor HTTP.
    pub bind: String,
    /// Diretório onde `protocolos.json` é gravado.
    pub data_dir: PathBuf,
    /// Limite de tamanho do corpo multipart.
    pub upload_limit_bytes: usize,
    /// Minutas mantidas em memória; a mais antiga sai primeiro.
    pub max_drafts: usize,
    /// Sessões mantidas em memória; a mais antiga sai primeiro.
    pub max_sessions: usize,
    pub extraction: ExtractionLimits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".into(),
            data_dir: PathBuf::from("data"),
            upload_limit_bytes: 50 * 1024 * 1024,
            max_drafts: 1_000,
            max_sessions: 1_000,
            extraction: ExtractionLimits::default(),
        }
    }
}

/// Limites de custo da extração heurística.
///
/// Os orçamentos de tempo são cooperativos: verificados entre arquivos e
/// entre padrões, nunca interrompem uma regex no meio.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ExtractionLimits {
    /// Caracteres decodificados mantidos por arquivo.
    pub max_chars_per_file: usize,
    /// Prefixo de cada documento varrido pelos padrões de papel.
    pub scan_prefix_chars: usize,
    pub max_matches_per_pattern: usize,
    /// Largura total da janela de contexto em volta de cada ocorrência.
    pub context_window: usize,
    pub max_names_per_role: usize,
    /// Orçamento da varredura de todos os arquivos.
    pub overall_budget_ms: u64,
    /// Orçamento da varredura de padrões de um documento.
    pub pattern_budget_ms: u64,
    /// Tempo máximo de decodificação de um arquivo.
    pub file_read_timeout_ms: u64,
    /// Orçamento da leitura de todos os arquivos enviados.
    pub read_budget_ms: u64,
    /// Arquivos processados entre dois pontos de cessão.
    pub chunk_size: usize,
    /// Herdeiros assumidos quando nenhum é identificado.
    pub assumed_heir_count: u32,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_chars_per_file: 100_000,
            scan_prefix_chars: 50_000,
            max_matches_per_pattern: 3,
            context_window: 400,
            max_names_per_role: 4,
            overall_budget_ms: 8_000,
            pattern_budget_ms: 2_000,
            file_read_timeout_ms: 5_000,
            read_budget_ms: 20_000,
            chunk_size: 4,
            assumed_heir_count: 1,
        }
    }
}

impl ExtractionLimits {
    pub fn overall_budget(&self) -> Duration {
        Duration::from_millis(self.overall_budget_ms)
    }

    pub fn pattern_budget(&self) -> Duration {
        Duration::from_millis(self.pattern_budget_ms)
    }

    pub fn file_read_timeout(&self) -> Duration {
        Duration::from_millis(self.file_read_timeout_ms)
    }

    pub fn read_budget(&self) -> Duration {
        Duration::from_millis(self.read_budget_ms)
    }
}

/// Carrega a configuração a partir do arquivo opcional e do ambiente.
pub fn load() -> Result<Settings> {
    let path = std::env::var("GERADOR_CONFIG").unwrap_or_else(|_| "gerador.toml".into());
    let settings = config::Config::builder()
        .add_source(config::File::with_name(&path).required(false))
        .add_source(
            config::Environment::with_prefix("GERADOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("falha ao ler a configuração")?;
    settings
        .try_deserialize()
        .context("configuração inválida")
}
