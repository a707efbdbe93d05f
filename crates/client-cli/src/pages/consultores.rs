//! Consultores: listagem paginada, perfil com estatísticas e prospecções
//! recentes, edição do próprio perfil e a carteira de atribuições.

use anyhow::Result;
use clap::{Args, Subcommand};
use chrono::NaiveDate;

use shared::page::{Paginada, TAMANHO_PAGINA};
use shared::prospeccao::{Atribuicao, NovaAtribuicao};
use shared::texto;
use shared::usuario::{ConsultorDetalhe, PerfilPayload, Usuario};

use crate::api::ApiError;
use crate::config::Config;
use crate::session::Sessao;
use crate::views;

#[derive(Debug, Subcommand)]
pub enum Acao {
    /// Lista os consultores
    Listar {
        /// Página a exibir
        #[arg(long, default_value_t = 1)]
        pagina: u32,
    },
    /// Perfil de um consultor: estatísticas, atribuições e prospecções
    Ver {
        id: i64,
        /// Página das empresas atribuídas
        #[arg(long, default_value_t = 1)]
        pagina: u32,
    },
    /// Mostra o próprio perfil, como ficou salvo na sessão
    Perfil,
    /// Atualiza o próprio perfil; somente os campos informados mudam
    AtualizarPerfil {
        #[command(flatten)]
        campos: CamposPerfil,
    },
    /// Atribui uma empresa à carteira de um consultor (admin)
    Atribuir { consultor_id: i64, empresa_id: i64 },
    /// Desativa uma atribuição (admin)
    Desatribuir { atribuicao_id: i64 },
}

#[derive(Debug, Default, Args)]
pub struct CamposPerfil {
    #[arg(long)]
    pub nome: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Nova senha de acesso
    #[arg(long)]
    pub senha: Option<String>,
    #[arg(long)]
    pub telefone: Option<String>,
    /// Data de nascimento (AAAA-MM-DD)
    #[arg(long)]
    pub nascimento: Option<NaiveDate>,
    #[arg(long)]
    pub carro: Option<String>,
    #[arg(long)]
    pub placa: Option<String>,
    /// URL da foto de perfil
    #[arg(long)]
    pub foto: Option<String>,
    /// Informações básicas exibidas no perfil
    #[arg(long)]
    pub info: Option<String>,
}

impl CamposPerfil {
    fn em_payload(self) -> PerfilPayload {
        PerfilPayload {
            nome: self.nome,
            email: self.email,
            senha: self.senha,
            telefone: self.telefone,
            data_nascimento: self.nascimento,
            modelo_carro: self.carro,
            placa_carro: self.placa,
            foto_url: self.foto,
            informacoes_basicas: self.info,
        }
    }

    fn vazio(&self) -> bool {
        self.nome.is_none()
            && self.email.is_none()
            && self.senha.is_none()
            && self.telefone.is_none()
            && self.nascimento.is_none()
            && self.carro.is_none()
            && self.placa.is_none()
            && self.foto.is_none()
            && self.info.is_none()
    }
}

pub async fn executar(sessao: &Sessao, config: &mut Config, acao: Acao) -> Result<()> {
    match acao {
        Acao::Listar { pagina } => listar(sessao, pagina).await,
        Acao::Ver { id, pagina } => ver(sessao, id, pagina).await,
        Acao::Perfil => {
            render_proprio_perfil(&sessao.usuario);
            Ok(())
        }
        Acao::AtualizarPerfil { campos } => atualizar_perfil(sessao, config, campos).await,
        Acao::Atribuir {
            consultor_id,
            empresa_id,
        } => atribuir(sessao, consultor_id, empresa_id).await,
        Acao::Desatribuir { atribuicao_id } => desatribuir(sessao, atribuicao_id).await,
    }
}

async fn listar(sessao: &Sessao, pagina: u32) -> Result<()> {
    let lista: Paginada<Usuario> = sessao
        .api
        .get_query(
            "/api/consultores/",
            &[
                ("page", pagina.to_string()),
                ("page_size", TAMANHO_PAGINA.to_string()),
            ],
        )
        .await?;

    if !lista.is_empty() {
        let linhas: Vec<Vec<String>> = lista
            .items
            .iter()
            .map(|consultor| {
                vec![
                    consultor.id.to_string(),
                    consultor.nome.clone(),
                    consultor.email.clone(),
                    consultor
                        .telefone
                        .clone()
                        .unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();
        print!(
            "{}",
            views::tabela(&["ID", "Nome", "E-mail", "Telefone"], &linhas)
        );
    }
    println!("{}", views::rodape_paginacao(&views::Paginacao::montar(&lista)));
    Ok(())
}

async fn ver(sessao: &Sessao, id: i64, pagina: u32) -> Result<()> {
    let detalhe: ConsultorDetalhe = sessao.api.get(&format!("/api/consultores/{id}")).await?;

    views::titulo(&format!("#{} {}", detalhe.perfil.id, detalhe.perfil.nome));
    println!("  E-mail: {}", detalhe.perfil.email);
    if let Some(telefone) = &detalhe.perfil.telefone {
        println!("  Telefone: {telefone}");
    }
    if let Some(nascimento) = detalhe.perfil.data_nascimento {
        println!("  Nascimento: {}", texto::data_curta(nascimento));
    }
    if let Some(carro) = &detalhe.perfil.modelo_carro {
        let placa = detalhe.perfil.placa_carro.as_deref().unwrap_or("sem placa");
        println!("  Carro: {carro} ({placa})");
    }
    if let Some(info) = &detalhe.perfil.informacoes_basicas {
        println!("  {info}");
    }
    println!(
        "  {} prospecções · {} empresas atribuídas",
        detalhe.estatisticas.total_prospeccoes, detalhe.estatisticas.empresas_atribuidas
    );

    if !detalhe.prospeccoes.is_empty() {
        println!();
        views::titulo("Prospecções recentes");
        for prospeccao in detalhe.prospeccoes.iter().take(5) {
            let data = prospeccao
                .data_ligacao
                .map(texto::data_curta)
                .unwrap_or_else(|| "-".to_string());
            let empresa = prospeccao
                .empresa
                .as_ref()
                .map(|e| e.empresa.as_str())
                .unwrap_or("-");
            let resultado = prospeccao.resultado.as_deref().unwrap_or("-");
            println!("  #{} {data} · {empresa} · {resultado}", prospeccao.id);
        }
    }

    println!();
    views::titulo("Empresas atribuídas");
    match atribuicoes(sessao, id, pagina).await {
        Ok(()) => {}
        // Consultores só enxergam a própria carteira; o detalhe do servidor
        // explica, sem derrubar o resto do perfil.
        Err(erro) => match erro.downcast_ref::<ApiError>() {
            Some(ApiError::Api { detail, .. }) => views::aviso(detail),
            _ => return Err(erro),
        },
    }
    Ok(())
}

async fn atribuicoes(sessao: &Sessao, consultor_id: i64, pagina: u32) -> Result<()> {
    let lista: Paginada<Atribuicao> = sessao
        .api
        .get_query(
            &format!("/api/atribuicoes/consultor/{consultor_id}"),
            &[
                ("page", pagina.to_string()),
                ("page_size", TAMANHO_PAGINA.to_string()),
            ],
        )
        .await?;

    if !lista.is_empty() {
        let linhas: Vec<Vec<String>> = lista.items.iter().map(linha_atribuicao).collect();
        print!(
            "{}",
            views::tabela(&["ID", "Empresa", "Município", "Desde"], &linhas)
        );
    }
    println!("{}", views::rodape_paginacao(&views::Paginacao::montar(&lista)));
    Ok(())
}

fn linha_atribuicao(atribuicao: &Atribuicao) -> Vec<String> {
    let (empresa, municipio) = match &atribuicao.empresa {
        Some(empresa) => (
            empresa.empresa.clone(),
            empresa.municipio.clone().unwrap_or_else(|| "-".to_string()),
        ),
        None => (format!("empresa #{}", atribuicao.empresa_id), "-".to_string()),
    };
    let desde = atribuicao
        .data_atribuicao
        .as_ref()
        .map(texto::data_hora)
        .unwrap_or_else(|| "-".to_string());
    vec![atribuicao.id.to_string(), empresa, municipio, desde]
}

async fn atualizar_perfil(sessao: &Sessao, config: &mut Config, campos: CamposPerfil) -> Result<()> {
    if campos.vazio() {
        views::aviso("Nada para atualizar: informe ao menos um campo");
        return Ok(());
    }

    let atualizado: Usuario = sessao
        .api
        .put("/api/consultores/perfil/atualizar", &campos.em_payload())
        .await?;

    // O perfil em cache alimenta os cabeçalhos das telas; acompanha o servidor.
    config.usuario = Some(atualizado.clone());
    config.save()?;

    views::sucesso("Perfil atualizado!");
    render_proprio_perfil(&atualizado);
    Ok(())
}

fn render_proprio_perfil(usuario: &Usuario) {
    views::titulo(&format!("{} ({})", usuario.nome, usuario.tipo.rotulo()));
    println!("  E-mail: {}", usuario.email);
    if let Some(telefone) = &usuario.telefone {
        println!("  Telefone: {telefone}");
    }
    if let Some(nascimento) = usuario.data_nascimento {
        println!("  Nascimento: {}", texto::data_curta(nascimento));
    }
    if let Some(carro) = &usuario.modelo_carro {
        let placa = usuario.placa_carro.as_deref().unwrap_or("sem placa");
        println!("  Carro: {carro} ({placa})");
    }
    if let Some(info) = &usuario.informacoes_basicas {
        println!("  {info}");
    }
    if let Some(foto) = &usuario.foto_url {
        views::info(&format!("Foto: {foto}"));
    }
}

async fn atribuir(sessao: &Sessao, consultor_id: i64, empresa_id: i64) -> Result<()> {
    sessao.exigir_admin()?;
    let corpo = NovaAtribuicao {
        consultor_id,
        empresa_id,
    };
    let atribuicao: Atribuicao = sessao.api.post("/api/atribuicoes/", &corpo).await?;
    let empresa = atribuicao
        .empresa
        .as_ref()
        .map(|e| e.empresa.as_str())
        .unwrap_or("empresa");
    views::sucesso(&format!("{empresa} atribuída ao consultor #{consultor_id}"));
    atribuicoes(sessao, consultor_id, 1).await
}

async fn desatribuir(sessao: &Sessao, atribuicao_id: i64) -> Result<()> {
    sessao.exigir_admin()?;
    if !views::confirmar("Desativar esta atribuição?") {
        views::info("Operação cancelada");
        return Ok(());
    }
    sessao
        .api
        .delete(&format!("/api/atribuicoes/{atribuicao_id}"))
        .await?;
    views::sucesso("Atribuição desativada");
    Ok(())
}
