//! # Mapa de Apelidos: Placeholder → Chave Canônica
//!
//! Os modelos de cartório usam nomes de placeholder longos, acentuados e
//! cheios de pontuação (`¿nome_do(a)_viuva(o)-meeira(o)>`). O extrator e o
//! fusor produzem chaves curtas em camelCase (`conjuge`). Esta tabela liga
//! os dois mundos e é a segunda camada de busca do resolvedor.
//!
//! | Grupo | Exemplo |
//! |-------|---------|
//! | Partes | `nome_do_autor_da_heranca` → `falecido` |
//! | Casamento e óbito | `regime` → `regimeBens` |
//! | Partilha | `monte_mor` → `valorTotalBens` |
//! | Certidões e impostos | `nº_da_guia` → `numeroITCMD` |
//! | Veículos, contas, imóveis rurais | `placa` → `veiculoPlaca` |

use std::collections::HashMap;

/// Pares (placeholder, chave canônica).
const BUILTIN: &[(&str, &str)] = &[
    // Partes
    ("nome_do_\"de_cujus\"", "falecido"),
    ("nome_do_autor_da_heranca", "falecido"),
    ("nome_do(a)_viuva(o)-meeira(o)", "conjuge"),
    ("nome_do(a)_viuvo(a)", "conjuge"),
    ("viuvo(a)-meeiro(a)", "conjuge"),
    ("nome_do_inventariante", "inventariante"),
    ("nome_do_advogado", "advogado"),
    ("quantidade_de_filhos", "numeroFilhos"),
    ("nome_dos_filhos", "nomesFilhos"),
    // Qualificações
    ("qualificacao_do(a)(s)_herdeiro(a)(s)", "qualificacaoCompleta"),
    ("qualificacao_do_autor_da_heranca", "qualificacaoFalecido"),
    ("qualificacao_do(a)_viuvo(a)", "qualificacaoConjuge"),
    // Casamento e óbito
    ("regime", "regimeBens"),
    ("data_do_casamento", "dataCasamento"),
    ("data_do_falecimento", "dataFalecimento"),
    ("nome_do_hospital", "hospitalFalecimento"),
    ("cidade", "cidadeFalecimento"),
    ("cidade]", "cidade"),
    ("nº_da_matricula_da_cert._obito", "matriculaObito"),
    ("oficio_do_cartorio", "cartorioObito"),
    ("cartorio", "cartorioObito"),
    ("nº_do_termo", "numeroTermoObito"),
    ("livro", "livroObito"),
    ("fls", "folhasObito"),
    ("data_de_expedicao", "dataExpedicaoCertidao"),
    ("data_de_expedicao_obito", "dataExpedicaoObito"),
    ("data_de_expedicao_casamento", "dataExpedicaoCasamento"),
    // Bens e partilha
    ("DESCRICAO_DO(S)_BEM(NS)", "descricaoAdicionalImovel"),
    ("MATRICULA_Nº", "matriculaImovel"),
    ("MATRICULA-", "matriculaImovel"),
    ("nº_do_cartorio", "cartorioImovel"),
    ("modo_de_aquisicao", "modoAquisicaoImovel"),
    ("REGISTRO_Nº", "numeroRegistroImovel"),
    ("VALOR_R$", "valorImovel"),
    ("monte_mor", "valorTotalBens"),
    ("valor_da_meacao", "valorTotalMeacao"),
    ("incluir_o_nome_dos_herdeiros", "nomesFilhos"),
    ("incluir_o_percentual", "percentualHerdeiro"),
    ("incluir_valor_que_pertence_a_cada_herdeiro", "valorPorHerdeiro"),
    // Certidões e impostos
    ("nº_da_guia", "numeroITCMD"),
    ("valor", "valorITCMD"),
    ("data_de_pagamento", "dataPagamentoITCMD"),
    ("valor_tributavel", "valorTributavelITCMD"),
    ("nº__da_certidao", "numeroCertidao"),
    ("nº__da_certidao_receita_federal", "numeroCertidaoReceita"),
    ("data_da_emissao", "dataEmissaoCertidao"),
    ("incluir_hora_de_emissao", "horaEmissaoCertidao"),
    ("hora_da_emissao", "horaEmissao"),
    ("validade", "validadeCertidao"),
    ("cnd_de_iptu", "numeroCertidaoIPTU"),
    ("inscricao_do_GDF", "inscricaoGDF"),
    ("item_do_imovel", "itemImovel"),
    ("codigo_hash", "hashCNIB"),
    ("resultado", "resultadoCNIB"),
    ("citar_demais_orgaos", "demaissOrgaos"),
    ("quando_feito_por_procuracao", "infoProcuracao"),
    // Lavratura
    ("Data_lav1", "dataLavratura"),
    // Veículos
    ("marca", "veiculoMarca"),
    ("cor", "veiculoCor"),
    ("categoria", "veiculoCategoria"),
    ("alcool/gasolina", "veiculoCombustivel"),
    ("placa", "veiculoPlaca"),
    ("chassi", "veiculoChassi"),
    ("ano", "veiculoAno"),
    ("modelo", "veiculoModelo"),
    ("renavam", "veiculoRenavam"),
    // Contas bancárias
    ("corrente_ou_poupanca", "tipoConta"),
    ("numero", "numeroConta"),
    ("agencia", "agenciaConta"),
    ("nome_do_banco", "bancoConta"),
    // Imóveis rurais
    ("numero_rural", "numeroRural"),
    ("codigo_rural", "codigoRural"),
    ("numero_do_exercicio", "numeroExercicio"),
    ("area_total", "areaTotal"),
    ("nome_da_fazenda", "nomeFazenda"),
    ("fracao_minima", "fracaoMinima"),
    ("area_registrada", "areaRegistrada"),
    ("nirf", "numeroNIRF"),
    ("nº", "numeroModuloFiscal"),
];

/// Tabela de apelidos consultada pelo resolvedor.
#[derive(Clone, Debug)]
pub struct AliasMap {
    entries: HashMap<String, String>,
}

impl Default for AliasMap {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AliasMap {
    /// Tabela vazia, útil para testar camadas isoladas.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Tabela embutida com os placeholders dos modelos de cartório.
    pub fn builtin() -> Self {
        let mut map = Self::empty();
        for (placeholder, canonical) in BUILTIN {
            map.insert(placeholder, canonical);
        }
        map
    }

    pub fn insert(&mut self, placeholder: &str, canonical: &str) {
        self.entries
            .insert(placeholder.to_string(), canonical.to_string());
    }

    /// Chave canônica do placeholder (busca exata).
    pub fn canonical(&self, placeholder: &str) -> Option<&str> {
        self.entries.get(placeholder).map(String::as_str)
    }

}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
