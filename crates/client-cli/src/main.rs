use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod chat;
mod config;
mod pages;
mod session;
mod tui;
mod views;

use api::ApiError;
use config::Config;
use session::Sessao;

const DEFAULT_SERVER: &str = "http://localhost:8000";

#[derive(Parser)]
#[command(name = "nucleo")]
#[command(about = "Cliente de terminal do Núcleo: carteira, agenda e mensagens da consultoria")]
#[command(version = env!("NUCLEO_VERSION"))]
struct Cli {
    /// URL do servidor (sobrepõe a configuração)
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Entra com e-mail e senha
    Login {
        email: String,
        /// Senha (pedida no terminal quando omitida)
        #[arg(long)]
        senha: Option<String>,
    },
    /// Encerra a sessão neste terminal
    Logout,
    /// Mostra quem está logado e para onde o cliente aponta
    Whoami,
    /// Abre a tela de mensagens
    Chat,
    /// Painel de abertura: totais e alertas de ligação
    Dashboard,
    /// Carteira de empresas
    Empresas {
        #[command(subcommand)]
        acao: pages::empresas::Acao,
    },
    /// Consultores e suas empresas atribuídas
    Consultores {
        #[command(subcommand)]
        acao: pages::consultores::Acao,
    },
    /// Funil de prospecções
    Prospeccoes {
        #[command(subcommand)]
        acao: pages::prospeccoes::Acao,
    },
    /// Calendário mensal de eventos
    Cronograma {
        #[command(subcommand)]
        acao: pages::cronograma::Acao,
    },
    /// Formulários de avaliação e seus envios
    Formularios {
        #[command(subcommand)]
        acao: pages::formularios::Acao,
    },
    /// Administração de usuários
    Usuarios {
        #[command(subcommand)]
        acao: pages::usuarios::Acao,
    },
    /// Consulta de CNPJ nos registros públicos
    Cnpj {
        #[command(subcommand)]
        acao: pages::cnpj::Acao,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nucleo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load().unwrap_or_default();
    let server = cli
        .server
        .or_else(|| config.remote.server.clone())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());

    if let Err(erro) = rodar(cli.command, &mut config, server).await {
        // um 401 em qualquer comando derruba a sessão local
        if matches!(erro.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)) {
            let _ = session::sessao_expirada(&mut config);
        } else {
            views::erro(&format!("{erro}"));
        }
        std::process::exit(1);
    }
}

async fn rodar(command: Commands, config: &mut Config, server: String) -> Result<()> {
    match command {
        Commands::Login { email, senha } => {
            let senha = match senha.or_else(|| views::perguntar("Senha")) {
                Some(senha) => senha,
                None => anyhow::bail!("Informe a senha para entrar."),
            };
            session::login(config, &server, &email, &senha).await
        }
        Commands::Logout => session::logout(config),
        Commands::Whoami => session::whoami(config, &server),
        Commands::Chat => {
            let sessao = Sessao::abrir(config, server)?;
            let tela = tui::ChatScreen::nova(
                sessao.api.clone(),
                sessao.usuario.id,
                sessao.usuario.nome.clone(),
            );
            tela.executar().await
        }
        Commands::Dashboard => {
            let sessao = Sessao::abrir(config, server)?;
            pages::dashboard::mostrar(&sessao).await
        }
        Commands::Empresas { acao } => {
            let sessao = Sessao::abrir(config, server)?;
            pages::empresas::executar(&sessao, acao).await
        }
        Commands::Consultores { acao } => {
            let sessao = Sessao::abrir(config, server)?;
            pages::consultores::executar(&sessao, config, acao).await
        }
        Commands::Prospeccoes { acao } => {
            let sessao = Sessao::abrir(config, server)?;
            pages::prospeccoes::executar(&sessao, acao).await
        }
        Commands::Cronograma { acao } => {
            let sessao = Sessao::abrir(config, server)?;
            pages::cronograma::executar(&sessao, acao).await
        }
        Commands::Formularios { acao } => {
            let sessao = Sessao::abrir(config, server)?;
            pages::formularios::executar(&sessao, acao).await
        }
        Commands::Usuarios { acao } => {
            let sessao = Sessao::abrir(config, server)?;
            pages::usuarios::executar(&sessao, acao).await
        }
        Commands::Cnpj { acao } => {
            let sessao = Sessao::abrir(config, server)?;
            pages::cnpj::executar(&sessao, acao).await
        }
    }
}
