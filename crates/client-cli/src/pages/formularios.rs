//! Formulários: listagem, detalhe com perguntas, envios, exportação em Excel
//! e o construtor com rascunho persistente entre sessões.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Subcommand;

use shared::formulario::{
    modelo, Envio, EnvioPayload, Formulario, Pergunta, Rascunho, TipoPergunta, MODELOS,
};
use shared::page::{Paginada, TAMANHO_PAGINA};
use shared::texto;

use crate::config::Config;
use crate::session::Sessao;
use crate::views;

#[derive(Debug, Subcommand)]
pub enum Acao {
    /// Lista os formulários com contadores de envios e respostas
    Listar {
        /// Página a exibir
        #[arg(long, default_value_t = 1)]
        pagina: u32,
    },
    /// Mostra um formulário com suas perguntas
    Ver { id: i64 },
    /// Lista os links de resposta já gerados
    Envios {
        /// Restringe a um formulário
        #[arg(long)]
        formulario: Option<i64>,
        /// Somente envios já respondidos
        #[arg(long, conflicts_with = "pendentes")]
        respondidos: bool,
        /// Somente envios aguardando resposta
        #[arg(long)]
        pendentes: bool,
    },
    /// Gera um link de resposta para um destinatário
    Enviar {
        id: i64,
        /// Nome do destinatário
        #[arg(long)]
        nome: Option<String>,
        /// E-mail do destinatário
        #[arg(long)]
        email: Option<String>,
        /// Empresa associada ao envio
        #[arg(long)]
        empresa: Option<i64>,
    },
    /// Baixa as respostas consolidadas em Excel
    Exportar {
        id: i64,
        /// Caminho do arquivo gerado
        #[arg(long)]
        saida: Option<PathBuf>,
    },
    /// Exclui um formulário, seus envios e respostas
    Excluir { id: i64 },
    /// Monta um formulário novo, campo a campo
    #[command(subcommand)]
    Rascunho(AcaoRascunho),
}

#[derive(Debug, Subcommand)]
pub enum AcaoRascunho {
    /// Mostra o rascunho atual e o que falta para publicar
    Mostrar,
    /// Define o título
    Titulo { valor: String },
    /// Define a descrição
    Descricao { valor: String },
    /// Define a categoria
    Categoria { valor: String },
    /// Liga/desliga respostas anônimas
    Anonimo,
    /// Liga/desliga perguntas obrigatórias
    Obrigatorio,
    /// Liga/desliga ordem aleatória das perguntas
    Aleatorio,
    /// Acrescenta uma pergunta ao final
    AddPergunta {
        texto: String,
        /// Tipo: escala, texto, multipla_escolha ou nota
        #[arg(long, default_value = "escala")]
        tipo: String,
        #[arg(long, default_value = "geral")]
        categoria: String,
    },
    /// Remove a pergunta na posição dada (1 em diante)
    RemoverPergunta { posicao: usize },
    /// Substitui o rascunho por um modelo pronto
    Modelo { nome: String },
    /// Descarta o rascunho
    Limpar,
    /// Valida e publica o rascunho no servidor
    Publicar,
}

pub async fn executar(sessao: &Sessao, acao: Acao) -> Result<()> {
    match acao {
        Acao::Listar { pagina } => listar(sessao, pagina).await,
        Acao::Ver { id } => {
            let formulario: Formulario = sessao.api.get(&format!("/api/formularios/{id}")).await?;
            render_formulario(&formulario);
            Ok(())
        }
        Acao::Envios {
            formulario,
            respondidos,
            pendentes,
        } => envios(sessao, formulario, respondidos, pendentes).await,
        Acao::Enviar {
            id,
            nome,
            email,
            empresa,
        } => enviar(sessao, id, nome, email, empresa).await,
        Acao::Exportar { id, saida } => exportar(sessao, id, saida).await,
        Acao::Excluir { id } => excluir(sessao, id).await,
        Acao::Rascunho(acao) => rascunho(sessao, acao).await,
    }
}

async fn listar(sessao: &Sessao, pagina: u32) -> Result<()> {
    let consulta = [
        ("page", pagina.to_string()),
        ("page_size", TAMANHO_PAGINA.to_string()),
    ];
    let lista: Paginada<Formulario> =
        sessao.api.get_query("/api/formularios/", &consulta).await?;

    if !lista.is_empty() {
        let linhas: Vec<Vec<String>> = lista.items.iter().map(linha_formulario).collect();
        print!(
            "{}",
            views::tabela(
                &["ID", "Título", "Categoria", "Perguntas", "Envios", "Respostas"],
                &linhas
            )
        );
    }
    println!("{}", views::rodape_paginacao(&views::Paginacao::montar(&lista)));
    Ok(())
}

fn linha_formulario(formulario: &Formulario) -> Vec<String> {
    vec![
        formulario.id.to_string(),
        texto::truncar(&formulario.titulo, 40),
        formulario
            .categoria
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        formulario.total_perguntas.to_string(),
        formulario.total_envios.to_string(),
        formulario.total_respostas.to_string(),
    ]
}

async fn envios(
    sessao: &Sessao,
    formulario: Option<i64>,
    respondidos: bool,
    pendentes: bool,
) -> Result<()> {
    let mut consulta: Vec<(&str, String)> = Vec::new();
    if let Some(formulario) = formulario {
        consulta.push(("formulario_id", formulario.to_string()));
    }
    if respondidos {
        consulta.push(("respondido", "true".to_string()));
    }
    if pendentes {
        consulta.push(("respondido", "false".to_string()));
    }

    let envios: Vec<Envio> = sessao
        .api
        .get_query("/api/formularios/envios/", &consulta)
        .await?;
    if envios.is_empty() {
        views::info("Nenhum envio registrado");
        return Ok(());
    }

    let linhas: Vec<Vec<String>> = envios.iter().map(linha_envio).collect();
    print!(
        "{}",
        views::tabela(
            &["ID", "Destinatário", "Empresa", "Situação", "Enviado em"],
            &linhas
        )
    );
    println!("  {} envios", envios.len());
    Ok(())
}

fn linha_envio(envio: &Envio) -> Vec<String> {
    vec![
        envio.id.to_string(),
        envio
            .nome_destinatario
            .clone()
            .or_else(|| envio.email_destinatario.clone())
            .unwrap_or_else(|| "-".to_string()),
        envio
            .empresa_nome
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        if envio.respondido {
            "Respondido".to_string()
        } else {
            "Aguardando".to_string()
        },
        envio
            .data_envio
            .as_ref()
            .map(texto::data_hora)
            .unwrap_or_else(|| "-".to_string()),
    ]
}

async fn enviar(
    sessao: &Sessao,
    id: i64,
    nome: Option<String>,
    email: Option<String>,
    empresa: Option<i64>,
) -> Result<()> {
    let payload = EnvioPayload {
        formulario_id: id,
        nome_destinatario: nome,
        email_destinatario: email,
        empresa_id: empresa,
    };
    let envio: Envio = sessao.api.post("/api/formularios/enviar", &payload).await?;

    views::sucesso("Link de resposta gerado!");
    println!(
        "  {}/formulario/responder/{}",
        sessao.api.base_url(),
        envio.codigo_unico
    );
    Ok(())
}

async fn exportar(sessao: &Sessao, id: i64, saida: Option<PathBuf>) -> Result<()> {
    let bytes = sessao
        .api
        .download(&format!("/api/formularios/{id}/exportar-excel"))
        .await?;
    let saida = saida.unwrap_or_else(|| PathBuf::from(format!("formulario_{id}.xlsx")));
    std::fs::write(&saida, bytes)?;
    views::sucesso(&format!("Respostas exportadas em {}", saida.display()));
    Ok(())
}

async fn excluir(sessao: &Sessao, id: i64) -> Result<()> {
    let formulario: Formulario = sessao.api.get(&format!("/api/formularios/{id}")).await?;
    let pergunta = format!(
        "Tem certeza que deseja excluir o formulário \"{}\"? Todos os envios e respostas serão perdidos.",
        formulario.titulo
    );
    if !views::confirmar(&pergunta) {
        views::info("Exclusão cancelada");
        return Ok(());
    }

    sessao.api.delete(&format!("/api/formularios/{id}")).await?;
    views::sucesso("Formulário excluído!");

    listar(sessao, 1).await
}

// ============================================================================
// Rascunho (construtor)
// ============================================================================

async fn rascunho(sessao: &Sessao, acao: AcaoRascunho) -> Result<()> {
    let caminho = Config::rascunho_path()?;
    let mut rascunho = carregar_rascunho(&caminho)?;

    match acao {
        AcaoRascunho::Mostrar => {
            render_rascunho(&rascunho);
            return Ok(());
        }
        AcaoRascunho::Publicar => return publicar(sessao, &caminho, rascunho).await,
        AcaoRascunho::Limpar => {
            if caminho.exists() {
                std::fs::remove_file(&caminho)?;
            }
            views::sucesso("Rascunho descartado");
            return Ok(());
        }
        AcaoRascunho::Titulo { valor } => rascunho.titulo = valor,
        AcaoRascunho::Descricao { valor } => rascunho.descricao = valor,
        AcaoRascunho::Categoria { valor } => rascunho.categoria = valor,
        AcaoRascunho::Anonimo => rascunho.anonimo = !rascunho.anonimo,
        AcaoRascunho::Obrigatorio => rascunho.obrigatorio = !rascunho.obrigatorio,
        AcaoRascunho::Aleatorio => rascunho.aleatorio = !rascunho.aleatorio,
        AcaoRascunho::AddPergunta {
            texto,
            tipo,
            categoria,
        } => {
            let pergunta = Pergunta::nova(texto, parse_tipo(&tipo)?, &categoria);
            rascunho.perguntas.push(pergunta);
        }
        AcaoRascunho::RemoverPergunta { posicao } => {
            if posicao == 0 || posicao > rascunho.perguntas.len() {
                bail!("Não há pergunta na posição {posicao}");
            }
            let removida = rascunho.perguntas.remove(posicao - 1);
            views::info(&format!(
                "Pergunta removida: {}",
                texto::truncar(&removida.texto, 60)
            ));
        }
        AcaoRascunho::Modelo { nome } => match modelo(&nome) {
            Some(pronto) => {
                views::sucesso(&format!("Modelo \"{}\" aplicado!", pronto.titulo));
                rascunho = pronto;
            }
            None => bail!(
                "Modelo \"{nome}\" não existe (disponíveis: {})",
                MODELOS.join(", ")
            ),
        },
    }

    salvar_rascunho(&caminho, &rascunho)?;
    views::info("Rascunho salvo");
    render_rascunho(&rascunho);
    Ok(())
}

async fn publicar(sessao: &Sessao, caminho: &Path, mut rascunho: Rascunho) -> Result<()> {
    // A validação local barra a publicação antes de qualquer chamada de rede.
    rascunho.validar()?;
    rascunho.preparar_envio();

    let criado: Formulario = sessao.api.post("/api/formularios/", &rascunho).await?;
    views::sucesso("Formulario criado com sucesso!");

    if caminho.exists() {
        std::fs::remove_file(caminho)?;
    }

    // Releitura: o formulário exibido é o que o servidor registrou.
    let formulario: Formulario = sessao
        .api
        .get(&format!("/api/formularios/{}", criado.id))
        .await?;
    render_formulario(&formulario);
    Ok(())
}

fn carregar_rascunho(caminho: &Path) -> Result<Rascunho> {
    if !caminho.exists() {
        return Ok(Rascunho::default());
    }
    let conteudo = std::fs::read_to_string(caminho)?;
    Ok(serde_json::from_str(&conteudo)?)
}

fn salvar_rascunho(caminho: &Path, rascunho: &Rascunho) -> Result<()> {
    std::fs::write(caminho, serde_json::to_string_pretty(rascunho)?)?;
    Ok(())
}

fn parse_tipo(tipo: &str) -> Result<TipoPergunta> {
    match tipo {
        "escala" => Ok(TipoPergunta::Escala),
        "texto" => Ok(TipoPergunta::Texto),
        "multipla_escolha" => Ok(TipoPergunta::MultiplaEscolha),
        "nota" => Ok(TipoPergunta::Nota),
        _ => bail!("Tipo \"{tipo}\" desconhecido (use escala, texto, multipla_escolha ou nota)"),
    }
}

fn rotulo_tipo(tipo: TipoPergunta) -> &'static str {
    match tipo {
        TipoPergunta::Escala => "escala",
        TipoPergunta::Texto => "texto",
        TipoPergunta::MultiplaEscolha => "múltipla escolha",
        TipoPergunta::Nota => "nota",
    }
}

fn render_formulario(formulario: &Formulario) {
    views::titulo(&format!("#{} {}", formulario.id, formulario.titulo));
    if let Some(descricao) = &formulario.descricao {
        if !descricao.is_empty() {
            println!("  {descricao}");
        }
    }
    if let Some(categoria) = &formulario.categoria {
        println!("  Categoria: {categoria}");
    }
    if formulario.anonimo {
        println!("  Respostas anônimas");
    }
    if let Some(data) = &formulario.data_criacao {
        println!("  Criado em {}", texto::data_hora(data));
    }

    if !formulario.perguntas.is_empty() {
        println!();
        for (indice, pergunta) in formulario.perguntas.iter().enumerate() {
            println!(
                "  {}. [{}] {}",
                indice + 1,
                rotulo_tipo(pergunta.tipo),
                pergunta.texto
            );
            for opcao in &pergunta.opcoes {
                println!("       - {}", opcao.texto);
            }
        }
    }

    println!();
    println!(
        "  {} perguntas · {} envios · {} respostas",
        formulario.total_perguntas, formulario.total_envios, formulario.total_respostas
    );
}

fn render_rascunho(rascunho: &Rascunho) {
    if rascunho.titulo.is_empty() && rascunho.perguntas.is_empty() {
        views::info("Rascunho vazio. Defina um título ou aplique um modelo.");
        return;
    }

    let titulo = if rascunho.titulo.is_empty() {
        "(sem título)"
    } else {
        &rascunho.titulo
    };
    views::titulo(titulo);
    if !rascunho.descricao.is_empty() {
        println!("  {}", rascunho.descricao);
    }
    if !rascunho.categoria.is_empty() {
        println!("  Categoria: {}", rascunho.categoria);
    }

    let mut opcoes: Vec<&str> = Vec::new();
    if rascunho.anonimo {
        opcoes.push("respostas anônimas");
    }
    if rascunho.obrigatorio {
        opcoes.push("perguntas obrigatórias");
    }
    if rascunho.aleatorio {
        opcoes.push("ordem aleatória");
    }
    if !opcoes.is_empty() {
        println!("  Opções: {}", opcoes.join(", "));
    }

    println!();
    if rascunho.perguntas.is_empty() {
        println!("  (nenhuma pergunta)");
    }
    for (indice, pergunta) in rascunho.perguntas.iter().enumerate() {
        println!(
            "  {}. [{}] {}",
            indice + 1,
            rotulo_tipo(pergunta.tipo),
            pergunta.texto
        );
    }

    match rascunho.validar() {
        Ok(()) => views::info("Pronto para publicar"),
        Err(problema) => views::aviso(&problema.to_string()),
    }
}
