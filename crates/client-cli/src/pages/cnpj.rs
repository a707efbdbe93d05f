//! Consulta de CNPJ nos registros públicos e importação do cartão para a
//! carteira de empresas.

use anyhow::{bail, Result};
use clap::Subcommand;

use shared::empresa::{Empresa, EmpresaCnpj, EmpresaSalva};
use shared::texto;

use crate::session::Sessao;
use crate::views;

#[derive(Debug, Subcommand)]
pub enum Acao {
    /// Consulta um CNPJ nos registros públicos
    Buscar { cnpj: String },
    /// Consulta um CNPJ e salva o cartão na carteira
    Salvar { cnpj: String },
}

pub async fn executar(sessao: &Sessao, acao: Acao) -> Result<()> {
    match acao {
        Acao::Buscar { cnpj } => {
            let cartao = buscar(sessao, &cnpj).await?;
            render_cartao(&cartao);
            Ok(())
        }
        Acao::Salvar { cnpj } => salvar(sessao, &cnpj).await,
    }
}

async fn buscar(sessao: &Sessao, bruto: &str) -> Result<EmpresaCnpj> {
    // A validação local barra a consulta antes de qualquer chamada de rede.
    if !texto::cnpj_completo(bruto) {
        bail!("CNPJ inválido. Deve conter 14 dígitos.");
    }
    let digitos = texto::limpar_cnpj(bruto);
    views::info(&format!("Consultando {}...", texto::mascarar_cnpj(&digitos)));

    Ok(sessao.api.get(&format!("/api/cnpj/buscar/{digitos}")).await?)
}

async fn salvar(sessao: &Sessao, bruto: &str) -> Result<()> {
    let cartao = buscar(sessao, bruto).await?;
    let salva: EmpresaSalva = sessao.api.post("/api/cnpj/salvar", &cartao).await?;
    match &salva.message {
        Some(message) => views::sucesso(message),
        None => views::sucesso("Empresa salva na carteira!"),
    }

    // Releitura: o cadastro mostrado é o que ficou gravado na carteira.
    let empresa: Empresa = sessao
        .api
        .get(&format!("/api/empresas/{}", salva.empresa_id))
        .await?;
    super::empresas::render_cadastro(&empresa);
    Ok(())
}

fn render_cartao(cartao: &EmpresaCnpj) {
    views::titulo(&cartao.empresa);
    println!("  CNPJ: {}", texto::mascarar_cnpj(&cartao.cnpj));
    campo("Nome fantasia", cartao.nome_fantasia.as_deref());
    campo("Situação", cartao.situacao.as_deref());
    campo("Abertura", cartao.data_abertura.as_deref());
    campo("Natureza jurídica", cartao.natureza_juridica.as_deref());
    campo("Porte", cartao.porte.as_deref());
    campo("Capital social", cartao.capital_social.as_deref());
    campo("Atividade principal", cartao.atividade_principal.as_deref());
    campo("Endereço", endereco_formatado(cartao).as_deref());
    campo("Bairro", cartao.bairro.as_deref());
    campo("Município", municipio_formatado(cartao).as_deref());
    campo("CEP", cartao.cep.as_deref());
    campo("Telefone", cartao.telefone.as_deref());
    campo("E-mail", cartao.email.as_deref());
    if let Some(fonte) = &cartao.fonte {
        println!();
        views::info(&format!("Fonte: {fonte}"));
    }
}

fn campo(nome: &str, valor: Option<&str>) {
    if let Some(valor) = valor.filter(|v| !v.is_empty()) {
        println!("  {nome}: {valor}");
    }
}

/// Junta logradouro, número e complemento no formato do cadastro
/// (`RUA TAL, 100 - SALA 2`).
fn endereco_formatado(cartao: &EmpresaCnpj) -> Option<String> {
    let mut endereco = cartao.logradouro.clone().unwrap_or_default();
    if let Some(numero) = cartao.numero.as_deref().filter(|n| !n.is_empty()) {
        if endereco.is_empty() {
            endereco = numero.to_string();
        } else {
            endereco = format!("{endereco}, {numero}");
        }
    }
    if let Some(complemento) = cartao.complemento.as_deref().filter(|c| !c.is_empty()) {
        endereco = format!("{endereco} - {complemento}");
    }
    (!endereco.is_empty()).then_some(endereco)
}

fn municipio_formatado(cartao: &EmpresaCnpj) -> Option<String> {
    match (cartao.municipio.as_deref(), cartao.estado.as_deref()) {
        (Some(municipio), Some(estado)) => Some(format!("{municipio}/{estado}")),
        (Some(municipio), None) => Some(municipio.to_string()),
        (None, Some(estado)) => Some(estado.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cartao_de_teste() -> EmpresaCnpj {
        serde_json::from_str(
            r#"{
                "cnpj": "12345678000190",
                "empresa": "AURORA CONSULTORIA LTDA",
                "logradouro": "RUA DAS ACACIAS",
                "numero": "100",
                "complemento": "SALA 2",
                "municipio": "CAMPINAS",
                "estado": "SP",
                "fonte": "ReceitaWS"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_endereco_composto_do_cartao() {
        let cartao = cartao_de_teste();
        assert_eq!(
            endereco_formatado(&cartao).as_deref(),
            Some("RUA DAS ACACIAS, 100 - SALA 2")
        );
        assert_eq!(municipio_formatado(&cartao).as_deref(), Some("CAMPINAS/SP"));
    }

    #[test]
    fn test_cartao_sem_endereco() {
        let cartao: EmpresaCnpj = serde_json::from_str(
            r#"{"cnpj": "12345678000190", "empresa": "AURORA", "fonte": "BrasilAPI"}"#,
        )
        .unwrap();
        assert_eq!(endereco_formatado(&cartao), None);
        assert_eq!(municipio_formatado(&cartao), None);
    }
}
