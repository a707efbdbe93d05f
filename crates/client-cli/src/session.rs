//! Login, logout and the session gate every authenticated command runs
//! through.

use anyhow::{bail, Result};

use shared::usuario::{Token, Usuario, UsuarioLogin};

use crate::api::{ApiClient, ApiResult};
use crate::config::Config;

/// An authenticated session: the API client plus the profile it belongs to.
/// Commands receive this instead of reaching for any global state.
pub struct Sessao {
    pub api: ApiClient,
    pub usuario: Usuario,
}

impl Sessao {
    /// The gate: refuses to start without a stored token and profile.
    pub fn abrir(config: &Config, server: String) -> Result<Sessao> {
        let Some(token) = config.remote.token.clone() else {
            bail!("Sessão não iniciada. Entre com 'nucleo login'.");
        };
        let Some(usuario) = config.usuario.clone() else {
            bail!("Perfil não encontrado. Entre novamente com 'nucleo login'.");
        };
        Ok(Sessao {
            api: ApiClient::new(server, Some(token)),
            usuario,
        })
    }

    /// Role gate for the admin surfaces (usuários, atribuições, eventos).
    pub fn exigir_admin(&self) -> Result<()> {
        if !self.usuario.is_admin() {
            bail!("Acesso negado. Apenas administradores podem usar este comando.");
        }
        Ok(())
    }
}

/// `POST /api/auth/login`. Wrong credentials surface the backend `detail`
/// ("Email ou senha incorretos") and nothing gets persisted by the caller.
pub async fn autenticar(api: &ApiClient, email: &str, senha: &str) -> ApiResult<Token> {
    let corpo = UsuarioLogin {
        email: email.to_string(),
        senha: senha.to_string(),
    };
    api.post_publico("/api/auth/login", &corpo).await
}

/// Runs the login flow and persists token + profile on success.
pub async fn login(config: &mut Config, server: &str, email: &str, senha: &str) -> Result<()> {
    let api = ApiClient::new(server, None);
    match autenticar(&api, email, senha).await {
        Ok(token) => {
            config.aplicar_login(&token);
            config.save()?;
            println!("\x1b[1;32m✅ Login realizado!\x1b[0m");
            println!("\x1b[90mBem-vindo, {} ({})\x1b[0m", token.usuario.nome, token.usuario.tipo.rotulo());
            Ok(())
        }
        Err(erro) => {
            bail!("{erro}");
        }
    }
}

/// Clears the stored session, keeping the configured server.
pub fn logout(config: &mut Config) -> Result<()> {
    config.limpar_sessao();
    config.save()?;
    println!("\x1b[32m✅ Sessão encerrada\x1b[0m");
    Ok(())
}

/// Forced logout after any authenticated call answers 401.
pub fn sessao_expirada(config: &mut Config) -> Result<()> {
    config.limpar_sessao();
    config.save()?;
    eprintln!("\x1b[33m🔐 Sessão expirada. Entre novamente com 'nucleo login'.\x1b[0m");
    Ok(())
}

/// Shows the cached profile and where it points.
pub fn whoami(config: &Config, server: &str) -> Result<()> {
    match (&config.remote.token, &config.usuario) {
        (Some(_), Some(usuario)) => {
            println!("\x1b[32m✓ Logado\x1b[0m");
            println!("Nome:     {}", usuario.nome);
            println!("Email:    {}", usuario.email);
            println!("Perfil:   {}", usuario.tipo.rotulo());
            println!("Servidor: {server}");
        }
        _ => {
            println!("\x1b[33m✗ Não logado\x1b[0m");
            println!("Entre com '\x1b[1mnucleo login\x1b[0m'");
        }
    }
    Ok(())
}
