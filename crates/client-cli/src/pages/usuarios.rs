//! Usuários (admin): listagem, cadastro, edição, troca de tipo e exclusão.

use anyhow::{bail, Result};
use clap::Subcommand;

use shared::page::{Paginada, TAMANHO_PAGINA};
use shared::usuario::{TipoUsuario, Usuario, UsuarioPayload};

use crate::session::Sessao;
use crate::views;

#[derive(Debug, Subcommand)]
pub enum Acao {
    /// Lista todos os usuários
    Listar {
        /// Página a exibir
        #[arg(long, default_value_t = 1)]
        pagina: u32,
    },
    /// Cadastra um usuário
    Criar {
        #[arg(long)]
        nome: String,
        #[arg(long)]
        email: String,
        /// admin ou consultor
        #[arg(long, default_value = "consultor")]
        tipo: String,
        #[arg(long)]
        senha: String,
        #[arg(long)]
        telefone: Option<String>,
    },
    /// Altera nome, e-mail, tipo ou senha; o resto fica como está
    Editar {
        id: i64,
        #[arg(long)]
        nome: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// admin ou consultor
        #[arg(long)]
        tipo: Option<String>,
        #[arg(long)]
        senha: Option<String>,
    },
    /// Troca o tipo do usuário
    Tipo {
        id: i64,
        /// admin ou consultor
        tipo: String,
    },
    /// Remove o usuário
    Excluir { id: i64 },
}

pub async fn executar(sessao: &Sessao, acao: Acao) -> Result<()> {
    sessao.exigir_admin()?;
    match acao {
        Acao::Listar { pagina } => listar(sessao, pagina).await,
        Acao::Criar {
            nome,
            email,
            tipo,
            senha,
            telefone,
        } => criar(sessao, nome, email, tipo, senha, telefone).await,
        Acao::Editar {
            id,
            nome,
            email,
            tipo,
            senha,
        } => editar(sessao, id, nome, email, tipo, senha).await,
        Acao::Tipo { id, tipo } => trocar_tipo(sessao, id, tipo).await,
        Acao::Excluir { id } => excluir(sessao, id).await,
    }
}

async fn listar(sessao: &Sessao, pagina: u32) -> Result<()> {
    let consulta = [
        ("page", pagina.to_string()),
        ("page_size", TAMANHO_PAGINA.to_string()),
    ];
    let lista: Paginada<Usuario> = sessao
        .api
        .get_query("/api/admin/usuarios", &consulta)
        .await?;

    if !lista.is_empty() {
        let linhas: Vec<Vec<String>> = lista.items.iter().map(linha_usuario).collect();
        print!(
            "{}",
            views::tabela(&["ID", "Nome", "E-mail", "Tipo", "Telefone"], &linhas)
        );
    }
    println!("{}", views::rodape_paginacao(&views::Paginacao::montar(&lista)));
    Ok(())
}

fn linha_usuario(usuario: &Usuario) -> Vec<String> {
    vec![
        usuario.id.to_string(),
        usuario.nome.clone(),
        usuario.email.clone(),
        usuario.tipo.rotulo().to_string(),
        usuario
            .telefone
            .clone()
            .unwrap_or_else(|| "-".to_string()),
    ]
}

async fn criar(
    sessao: &Sessao,
    nome: String,
    email: String,
    tipo: String,
    senha: String,
    telefone: Option<String>,
) -> Result<()> {
    let payload = UsuarioPayload {
        email,
        nome,
        tipo: parse_tipo(&tipo)?,
        senha: Some(senha),
        telefone,
    };

    let criado: Usuario = sessao.api.post("/api/admin/usuarios", &payload).await?;
    views::sucesso("Usuário criado com sucesso!");
    views::info(&format!(
        "#{} {} ({})",
        criado.id,
        criado.nome,
        criado.tipo.rotulo()
    ));

    listar(sessao, 1).await
}

async fn editar(
    sessao: &Sessao,
    id: i64,
    nome: Option<String>,
    email: Option<String>,
    tipo: Option<String>,
    senha: Option<String>,
) -> Result<()> {
    if nome.is_none() && email.is_none() && tipo.is_none() && senha.is_none() {
        views::aviso("Nada para atualizar: informe ao menos um campo");
        return Ok(());
    }

    // O PUT é de corpo completo; o cadastro vigente preenche o que o comando
    // não trouxe.
    let atual = buscar_usuario(sessao, id).await?;
    let payload = UsuarioPayload {
        email: email.unwrap_or(atual.email),
        nome: nome.unwrap_or(atual.nome),
        tipo: match tipo {
            Some(tipo) => parse_tipo(&tipo)?,
            None => atual.tipo,
        },
        senha,
        telefone: None,
    };

    let _: Usuario = sessao
        .api
        .put(&format!("/api/admin/usuarios/{id}"), &payload)
        .await?;
    views::sucesso("Usuário atualizado com sucesso!");

    listar(sessao, 1).await
}

async fn trocar_tipo(sessao: &Sessao, id: i64, tipo: String) -> Result<()> {
    let novo = parse_tipo(&tipo)?;
    let pergunta = format!(
        "Deseja realmente alterar o tipo deste usuário para {}?",
        novo.rotulo()
    );
    if !views::confirmar(&pergunta) {
        views::info("Alteração cancelada");
        return Ok(());
    }

    let _: Usuario = sessao
        .api
        .put(
            &format!("/api/admin/usuarios/{id}/tipo?tipo={}", codigo_tipo(novo)),
            &serde_json::json!({}),
        )
        .await?;
    views::sucesso("Tipo atualizado!");

    listar(sessao, 1).await
}

async fn excluir(sessao: &Sessao, id: i64) -> Result<()> {
    let usuario = buscar_usuario(sessao, id).await?;
    views::info(&format!("Usuário: {} <{}>", usuario.nome, usuario.email));
    if !views::confirmar("Deseja realmente deletar este usuário? Esta ação não pode ser desfeita.")
    {
        views::info("Exclusão cancelada");
        return Ok(());
    }

    sessao
        .api
        .delete(&format!("/api/admin/usuarios/{id}"))
        .await?;
    views::sucesso("Usuário deletado!");

    listar(sessao, 1).await
}

/// Não há leitura unitária no contrato; o cadastro vem da própria listagem,
/// página a página.
async fn buscar_usuario(sessao: &Sessao, id: i64) -> Result<Usuario> {
    let mut pagina = 1u32;
    loop {
        let consulta = [
            ("page", pagina.to_string()),
            ("page_size", TAMANHO_PAGINA.to_string()),
        ];
        let lista: Paginada<Usuario> = sessao
            .api
            .get_query("/api/admin/usuarios", &consulta)
            .await?;
        if let Some(usuario) = lista.items.into_iter().find(|u| u.id == id) {
            return Ok(usuario);
        }
        if pagina >= lista.total_pages {
            bail!("Usuário #{id} não encontrado");
        }
        pagina += 1;
    }
}

fn parse_tipo(tipo: &str) -> Result<TipoUsuario> {
    match tipo.to_ascii_lowercase().as_str() {
        "admin" => Ok(TipoUsuario::Admin),
        "consultor" => Ok(TipoUsuario::Consultor),
        _ => bail!("Tipo \"{tipo}\" inválido (use admin ou consultor)"),
    }
}

fn codigo_tipo(tipo: TipoUsuario) -> &'static str {
    match tipo {
        TipoUsuario::Admin => "admin",
        TipoUsuario::Consultor => "consultor",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tipo_aceita_os_dois_perfis() {
        assert_eq!(parse_tipo("admin").unwrap(), TipoUsuario::Admin);
        assert_eq!(parse_tipo("Consultor").unwrap(), TipoUsuario::Consultor);
        assert!(parse_tipo("gerente").is_err());
    }

    #[test]
    fn test_linha_da_tabela() {
        let usuario: Usuario = serde_json::from_str(
            r#"{"id": 4, "email": "bruno@nucleo.com", "nome": "Bruno Lima", "tipo": "admin"}"#,
        )
        .unwrap();
        let linha = linha_usuario(&usuario);
        assert_eq!(linha, vec!["4", "Bruno Lima", "bruno@nucleo.com", "Administrador", "-"]);
    }

    #[test]
    fn test_codigo_do_tipo_no_query_param() {
        assert_eq!(codigo_tipo(TipoUsuario::Admin), "admin");
        assert_eq!(codigo_tipo(TipoUsuario::Consultor), "consultor");
    }
}
