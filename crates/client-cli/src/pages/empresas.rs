//! Carteira de empresas: lista paginada com filtros, cadastro completo,
//! edição parcial e exclusão confirmada.

use anyhow::Result;
use clap::{Args, Subcommand};

use shared::empresa::{Empresa, EmpresaPayload};
use shared::page::{Paginada, TAMANHO_PAGINA};
use shared::texto;

use crate::session::Sessao;
use crate::views;

#[derive(Debug, Subcommand)]
pub enum Acao {
    /// Lista a carteira com filtros e paginação
    Listar {
        #[command(flatten)]
        filtros: Filtros,
        /// Página a exibir
        #[arg(long, default_value_t = 1)]
        pagina: u32,
    },
    /// Mostra o cadastro completo de uma empresa
    Ver { id: i64 },
    /// Cadastra uma empresa na carteira
    Criar {
        /// Razão social
        #[arg(long)]
        empresa: String,
        #[command(flatten)]
        campos: Campos,
    },
    /// Altera o cadastro; somente os campos informados mudam
    Editar {
        id: i64,
        /// Razão social
        #[arg(long)]
        empresa: Option<String>,
        #[command(flatten)]
        campos: Campos,
    },
    /// Exclui a empresa da carteira
    Excluir { id: i64 },
}

#[derive(Debug, Default, Args)]
pub struct Filtros {
    /// Busca por razão social
    #[arg(long)]
    pub nome: Option<String>,
    /// CNPJ, com ou sem máscara
    #[arg(long)]
    pub cnpj: Option<String>,
    #[arg(long)]
    pub municipio: Option<String>,
    /// Escritório regional
    #[arg(long)]
    pub er: Option<String>,
    #[arg(long)]
    pub carteira: Option<String>,
}

/// Campos opcionais do cadastro, compartilhados entre criar e editar.
#[derive(Debug, Default, Args)]
pub struct Campos {
    /// CNPJ, com ou sem máscara
    #[arg(long)]
    pub cnpj: Option<String>,
    #[arg(long)]
    pub sigla: Option<String>,
    #[arg(long)]
    pub porte: Option<String>,
    /// Escritório regional
    #[arg(long)]
    pub er: Option<String>,
    #[arg(long)]
    pub carteira: Option<String>,
    #[arg(long)]
    pub endereco: Option<String>,
    #[arg(long)]
    pub bairro: Option<String>,
    #[arg(long)]
    pub municipio: Option<String>,
    #[arg(long)]
    pub estado: Option<String>,
    #[arg(long)]
    pub funcionarios: Option<i32>,
    #[arg(long)]
    pub observacao: Option<String>,
    #[arg(long)]
    pub nome_contato: Option<String>,
    #[arg(long)]
    pub cargo_contato: Option<String>,
    #[arg(long)]
    pub telefone_contato: Option<String>,
    #[arg(long)]
    pub email_contato: Option<String>,
}

pub async fn executar(sessao: &Sessao, acao: Acao) -> Result<()> {
    match acao {
        Acao::Listar { filtros, pagina } => listar(sessao, &filtros, pagina).await,
        Acao::Ver { id } => {
            let empresa: Empresa = sessao.api.get(&format!("/api/empresas/{id}")).await?;
            render_cadastro(&empresa);
            Ok(())
        }
        Acao::Criar { empresa, campos } => criar(sessao, empresa, campos).await,
        Acao::Editar {
            id,
            empresa,
            campos,
        } => editar(sessao, id, empresa, campos).await,
        Acao::Excluir { id } => excluir(sessao, id).await,
    }
}

async fn listar(sessao: &Sessao, filtros: &Filtros, pagina: u32) -> Result<()> {
    let mut consulta: Vec<(&str, String)> = vec![
        ("page", pagina.to_string()),
        ("page_size", TAMANHO_PAGINA.to_string()),
    ];
    if let Some(nome) = &filtros.nome {
        consulta.push(("nome", nome.clone()));
    }
    if let Some(cnpj) = &filtros.cnpj {
        consulta.push(("cnpj", texto::limpar_cnpj(cnpj)));
    }
    if let Some(municipio) = &filtros.municipio {
        consulta.push(("municipio", municipio.clone()));
    }
    if let Some(er) = &filtros.er {
        consulta.push(("er", er.clone()));
    }
    if let Some(carteira) = &filtros.carteira {
        consulta.push(("carteira", carteira.clone()));
    }

    let lista: Paginada<Empresa> = sessao.api.get_query("/api/empresas/", &consulta).await?;

    if !lista.is_empty() {
        let linhas: Vec<Vec<String>> = lista.items.iter().map(linha_empresa).collect();
        print!(
            "{}",
            views::tabela(
                &["ID", "Empresa", "CNPJ", "Município", "ER", "Carteira"],
                &linhas
            )
        );
    }
    println!("{}", views::rodape_paginacao(&views::Paginacao::montar(&lista)));
    Ok(())
}

fn linha_empresa(empresa: &Empresa) -> Vec<String> {
    vec![
        empresa.id.to_string(),
        texto::truncar(&empresa.empresa, 40),
        empresa
            .cnpj
            .as_deref()
            .map(texto::mascarar_cnpj)
            .unwrap_or_else(|| "-".to_string()),
        empresa.municipio.clone().unwrap_or_else(|| "-".to_string()),
        empresa.er.clone().unwrap_or_else(|| "-".to_string()),
        empresa.carteira.clone().unwrap_or_else(|| "-".to_string()),
    ]
}

async fn criar(sessao: &Sessao, empresa: String, campos: Campos) -> Result<()> {
    let mut payload = EmpresaPayload {
        empresa,
        ..Default::default()
    };
    aplicar_campos(&mut payload, campos);

    let criada: Empresa = sessao.api.post("/api/empresas/", &payload).await?;
    views::sucesso("Empresa cadastrada!");

    // Releitura: o cartão mostrado é sempre o estado do servidor.
    let cadastro: Empresa = sessao.api.get(&format!("/api/empresas/{}", criada.id)).await?;
    render_cadastro(&cadastro);
    Ok(())
}

async fn editar(sessao: &Sessao, id: i64, empresa: Option<String>, campos: Campos) -> Result<()> {
    let atual: Empresa = sessao.api.get(&format!("/api/empresas/{id}")).await?;
    let mut payload = payload_de(&atual);
    if let Some(empresa) = empresa {
        payload.empresa = empresa;
    }
    aplicar_campos(&mut payload, campos);

    let _: Empresa = sessao.api.put(&format!("/api/empresas/{id}"), &payload).await?;
    views::sucesso("Cadastro atualizado!");

    let cadastro: Empresa = sessao.api.get(&format!("/api/empresas/{id}")).await?;
    render_cadastro(&cadastro);
    Ok(())
}

async fn excluir(sessao: &Sessao, id: i64) -> Result<()> {
    let empresa: Empresa = sessao.api.get(&format!("/api/empresas/{id}")).await?;
    let pergunta = format!(
        "Excluir a empresa \"{}\"? Esta ação não pode ser desfeita.",
        empresa.empresa
    );
    if !views::confirmar(&pergunta) {
        views::info("Exclusão cancelada");
        return Ok(());
    }

    sessao.api.delete(&format!("/api/empresas/{id}")).await?;
    views::sucesso("Empresa excluída!");

    listar(sessao, &Filtros::default(), 1).await
}

/// Projeta o cadastro vigente num payload de edição; a releitura garante que
/// campos não informados não regridem.
fn payload_de(empresa: &Empresa) -> EmpresaPayload {
    EmpresaPayload {
        empresa: empresa.empresa.clone(),
        cnpj: empresa.cnpj.clone(),
        sigla: empresa.sigla.clone(),
        porte: empresa.porte.clone(),
        er: empresa.er.clone(),
        carteira: empresa.carteira.clone(),
        endereco: empresa.endereco.clone(),
        bairro: empresa.bairro.clone(),
        municipio: empresa.municipio.clone(),
        estado: empresa.estado.clone(),
        numero_funcionarios: empresa.numero_funcionarios,
        observacao: empresa.observacao.clone(),
        nome_contato: empresa.nome_contato.clone(),
        cargo_contato: empresa.cargo_contato.clone(),
        telefone_contato: empresa.telefone_contato.clone(),
        email_contato: empresa.email_contato.clone(),
    }
}

fn aplicar_campos(payload: &mut EmpresaPayload, campos: Campos) {
    if let Some(cnpj) = campos.cnpj {
        payload.cnpj = Some(texto::limpar_cnpj(&cnpj));
    }
    if campos.sigla.is_some() {
        payload.sigla = campos.sigla;
    }
    if campos.porte.is_some() {
        payload.porte = campos.porte;
    }
    if campos.er.is_some() {
        payload.er = campos.er;
    }
    if campos.carteira.is_some() {
        payload.carteira = campos.carteira;
    }
    if campos.endereco.is_some() {
        payload.endereco = campos.endereco;
    }
    if campos.bairro.is_some() {
        payload.bairro = campos.bairro;
    }
    if campos.municipio.is_some() {
        payload.municipio = campos.municipio;
    }
    if campos.estado.is_some() {
        payload.estado = campos.estado;
    }
    if campos.funcionarios.is_some() {
        payload.numero_funcionarios = campos.funcionarios;
    }
    if campos.observacao.is_some() {
        payload.observacao = campos.observacao;
    }
    if campos.nome_contato.is_some() {
        payload.nome_contato = campos.nome_contato;
    }
    if campos.cargo_contato.is_some() {
        payload.cargo_contato = campos.cargo_contato;
    }
    if campos.telefone_contato.is_some() {
        payload.telefone_contato = campos.telefone_contato;
    }
    if campos.email_contato.is_some() {
        payload.email_contato = campos.email_contato;
    }
}

pub fn render_cadastro(empresa: &Empresa) {
    views::titulo(&format!("#{} {}", empresa.id, empresa.empresa));
    campo("Sigla", empresa.sigla.as_deref());
    if let Some(cnpj) = &empresa.cnpj {
        println!("  CNPJ: {}", texto::mascarar_cnpj(cnpj));
    }
    campo("Porte", empresa.porte.as_deref());
    campo("ER", empresa.er.as_deref());
    campo("Carteira", empresa.carteira.as_deref());
    campo("Endereço", empresa.endereco.as_deref());
    campo("Bairro", empresa.bairro.as_deref());
    campo("Município", empresa.municipio.as_deref());
    campo("Estado", empresa.estado.as_deref());
    campo("Zona", empresa.zona.as_deref());
    campo("País", empresa.pais.as_deref());
    campo("Área", empresa.area.as_deref());
    campo("CNAE", empresa.cnae_principal.as_deref());
    campo("Descrição CNAE", empresa.descricao_cnae.as_deref());
    campo("Tipo", empresa.tipo_empresa.as_deref());
    if let Some(n) = empresa.numero_funcionarios {
        println!("  Funcionários: {n}");
    }
    campo("Contato", empresa.nome_contato.as_deref());
    campo("Cargo", empresa.cargo_contato.as_deref());
    campo("Telefone", empresa.telefone_contato.as_deref());
    campo("E-mail", empresa.email_contato.as_deref());
    campo("Observação", empresa.observacao.as_deref());
    if let Some(data) = &empresa.data_cadastro {
        views::info(&format!("Cadastrada em {}", texto::data_hora(data)));
    }
}

fn campo(rotulo: &str, valor: Option<&str>) {
    if let Some(valor) = valor {
        if !valor.is_empty() {
            println!("  {rotulo}: {valor}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empresa_base() -> Empresa {
        serde_json::from_str(
            r#"{
                "id": 3,
                "empresa": "Metalúrgica Aurora LTDA",
                "cnpj": "12345678000190",
                "sigla": "AUR",
                "municipio": "Campinas",
                "er": "ER-2",
                "carteira": "Indústria"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_linha_da_tabela_mascara_o_cnpj() {
        let linha = linha_empresa(&empresa_base());
        assert_eq!(linha[0], "3");
        assert_eq!(linha[2], "12.345.678/0001-90");
        assert_eq!(linha[3], "Campinas");
    }

    #[test]
    fn test_edicao_preserva_campos_nao_informados() {
        let mut payload = payload_de(&empresa_base());
        aplicar_campos(
            &mut payload,
            Campos {
                municipio: Some("Sorocaba".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(payload.municipio.as_deref(), Some("Sorocaba"));
        assert_eq!(payload.sigla.as_deref(), Some("AUR"));
        assert_eq!(payload.cnpj.as_deref(), Some("12345678000190"));
    }

    #[test]
    fn test_cnpj_informado_entra_limpo() {
        let mut payload = EmpresaPayload::default();
        aplicar_campos(
            &mut payload,
            Campos {
                cnpj: Some("12.345.678/0001-90".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(payload.cnpj.as_deref(), Some("12345678000190"));
    }
}
