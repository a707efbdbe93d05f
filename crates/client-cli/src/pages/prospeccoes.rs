//! Prospecções e a agenda de retornos: listagem com filtros, registro de
//! ligações (com agendamento opcional da próxima), edição, exportação em PDF
//! e os alertas vencidos/hoje/futuros.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use shared::empresa::Empresa;
use shared::page::{Paginada, TAMANHO_PAGINA};
use shared::prospeccao::{Alertas, Prospeccao, ProspeccaoCriada, ProspeccaoPayload};
use shared::texto;

use crate::session::Sessao;
use crate::views;

use super::dashboard::linha_agendamento;

/// A busca de empresa do fluxo de criação mostra no máximo dez opções.
const TAMANHO_BUSCA_EMPRESA: u32 = 10;

#[derive(Debug, Subcommand)]
pub enum Acao {
    /// Lista as prospecções
    Listar {
        /// Filtra por empresa
        #[arg(long)]
        empresa: Option<i64>,
        /// Filtra por consultor
        #[arg(long)]
        consultor: Option<i64>,
        /// Filtra por status de follow-up
        #[arg(long)]
        status: Option<String>,
        /// Página a exibir
        #[arg(long, default_value_t = 1)]
        pagina: u32,
    },
    /// Mostra uma prospecção completa
    Ver { id: i64 },
    /// Registra uma ligação de prospecção
    Criar {
        /// Empresa prospectada; na falta, use --busca para escolher
        #[arg(long)]
        empresa: Option<i64>,
        /// Busca a empresa pelo nome e pergunta qual usar
        #[arg(long, conflicts_with = "empresa")]
        busca: Option<String>,
        /// Agenda a próxima ligação para a data informada (AAAA-MM-DD)
        #[arg(long)]
        agendar: Option<NaiveDate>,
        #[command(flatten)]
        campos: Campos,
    },
    /// Altera uma prospecção; somente os campos informados mudam
    Editar {
        id: i64,
        #[command(flatten)]
        campos: Campos,
    },
    /// Gera o PDF de uma prospecção
    ExportarPdf {
        id: i64,
        /// Arquivo de saída (padrão: prospeccao_{id}.pdf)
        #[arg(long)]
        saida: Option<PathBuf>,
    },
    /// Mostra os alertas de ligação (vencidos, hoje, futuros)
    Alertas,
    /// Marca um agendamento como realizado
    Realizado { agendamento_id: i64 },
}

#[derive(Debug, Default, Args)]
pub struct Campos {
    /// Consultor responsável (padrão: o próprio)
    #[arg(long)]
    pub consultor: Option<i64>,
    /// Data da ligação (AAAA-MM-DD)
    #[arg(long)]
    pub data: Option<NaiveDate>,
    /// Hora da ligação (HH:MM)
    #[arg(long)]
    pub hora: Option<String>,
    #[arg(long)]
    pub resultado: Option<String>,
    #[arg(long)]
    pub observacoes: Option<String>,
    #[arg(long)]
    pub contato: Option<String>,
    #[arg(long)]
    pub telefone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub cargo: Option<String>,
    /// Interesses demonstrados na ligação
    #[arg(long)]
    pub treinamento: bool,
    #[arg(long)]
    pub consultoria: bool,
    #[arg(long)]
    pub certificacao: bool,
    #[arg(long)]
    pub eventos: bool,
    #[arg(long)]
    pub produtos: bool,
    #[arg(long)]
    pub seguranca: bool,
    #[arg(long)]
    pub meio_ambiente: bool,
    #[arg(long)]
    pub outros: Option<String>,
    /// Potencial de negócio (baixo, médio, alto)
    #[arg(long)]
    pub potencial: Option<String>,
    /// Status de follow-up
    #[arg(long)]
    pub follow_up: Option<String>,
}

pub async fn executar(sessao: &Sessao, acao: Acao) -> Result<()> {
    match acao {
        Acao::Listar {
            empresa,
            consultor,
            status,
            pagina,
        } => listar(sessao, empresa, consultor, status, pagina).await,
        Acao::Ver { id } => {
            let prospeccao: Prospeccao = sessao.api.get(&format!("/api/prospeccoes/{id}")).await?;
            render_prospeccao(&prospeccao);
            Ok(())
        }
        Acao::Criar {
            empresa,
            busca,
            agendar,
            campos,
        } => criar(sessao, empresa, busca, agendar, campos).await,
        Acao::Editar { id, campos } => editar(sessao, id, campos).await,
        Acao::ExportarPdf { id, saida } => exportar_pdf(sessao, id, saida).await,
        Acao::Alertas => alertas(sessao).await,
        Acao::Realizado { agendamento_id } => realizado(sessao, agendamento_id).await,
    }
}

async fn listar(
    sessao: &Sessao,
    empresa: Option<i64>,
    consultor: Option<i64>,
    status: Option<String>,
    pagina: u32,
) -> Result<()> {
    let mut consulta: Vec<(&str, String)> = vec![
        ("page", pagina.to_string()),
        ("page_size", TAMANHO_PAGINA.to_string()),
    ];
    if let Some(empresa) = empresa {
        consulta.push(("empresa_id", empresa.to_string()));
    }
    if let Some(consultor) = consultor {
        consulta.push(("consultor_id", consultor.to_string()));
    }
    if let Some(status) = status {
        consulta.push(("status", status));
    }

    let lista: Paginada<Prospeccao> = sessao.api.get_query("/api/prospeccoes/", &consulta).await?;

    if !lista.is_empty() {
        let linhas: Vec<Vec<String>> = lista.items.iter().map(linha_prospeccao).collect();
        print!(
            "{}",
            views::tabela(
                &["ID", "Data", "Empresa", "Contato", "Resultado", "Follow-up"],
                &linhas
            )
        );
    }
    println!("{}", views::rodape_paginacao(&views::Paginacao::montar(&lista)));
    Ok(())
}

fn linha_prospeccao(prospeccao: &Prospeccao) -> Vec<String> {
    vec![
        prospeccao.id.to_string(),
        prospeccao
            .data_ligacao
            .map(texto::data_curta)
            .unwrap_or_else(|| "-".to_string()),
        prospeccao
            .empresa
            .as_ref()
            .map(|e| texto::truncar(&e.empresa, 32))
            .unwrap_or_else(|| format!("empresa #{}", prospeccao.empresa_id)),
        prospeccao
            .nome_contato
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        prospeccao
            .resultado
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        prospeccao
            .status_follow_up
            .clone()
            .unwrap_or_else(|| "-".to_string()),
    ]
}

fn render_prospeccao(prospeccao: &Prospeccao) {
    let empresa = prospeccao
        .empresa
        .as_ref()
        .map(|e| e.empresa.as_str())
        .unwrap_or("empresa");
    views::titulo(&format!("#{} {}", prospeccao.id, empresa));
    if let Some(data) = prospeccao.data_ligacao {
        let hora = prospeccao.hora_ligacao.as_deref().unwrap_or("");
        println!("  Ligação: {} {hora}", texto::data_curta(data));
    }
    if let Some(contato) = &prospeccao.nome_contato {
        let cargo = prospeccao.cargo_contato.as_deref().unwrap_or("-");
        println!("  Contato: {contato} ({cargo})");
    }
    if let Some(telefone) = &prospeccao.telefone_contato {
        println!("  Telefone: {telefone}");
    }
    if let Some(email) = &prospeccao.email_contato {
        println!("  E-mail: {email}");
    }
    if let Some(resultado) = &prospeccao.resultado {
        println!("  Resultado: {resultado}");
    }
    let interesses = prospeccao.interesses();
    if !interesses.is_empty() {
        println!("  Interesses: {}", interesses.join(", "));
    }
    if let Some(outros) = &prospeccao.outros_interesses {
        println!("  Outros interesses: {outros}");
    }
    if let Some(potencial) = &prospeccao.potencial_negocio {
        println!("  Potencial: {potencial}");
    }
    if let Some(status) = &prospeccao.status_follow_up {
        println!("  Follow-up: {status}");
    }
    if let Some(observacoes) = &prospeccao.observacoes {
        println!("  Observações: {observacoes}");
    }
    if let Some(criacao) = &prospeccao.data_criacao {
        views::info(&format!("Registrada em {}", texto::data_hora(criacao)));
    }
}

async fn criar(
    sessao: &Sessao,
    empresa: Option<i64>,
    busca: Option<String>,
    agendar: Option<NaiveDate>,
    campos: Campos,
) -> Result<()> {
    let empresa_id = match (empresa, busca) {
        (Some(id), _) => id,
        (None, Some(busca)) => match escolher_empresa(sessao, &busca).await? {
            Some(id) => id,
            None => {
                views::info("Criação cancelada");
                return Ok(());
            }
        },
        (None, None) => bail!("Informe a empresa com --empresa <id> ou --busca <nome>"),
    };

    let payload = montar_payload(sessao, empresa_id, campos);

    let criada = match agendar {
        Some(data) => {
            let caminho = format!(
                "/api/prospeccoes/com-agendamento?agendar_proxima=true&data_proxima_ligacao={}",
                data.format("%Y-%m-%d")
            );
            let resposta: ProspeccaoCriada = sessao.api.post(&caminho, &payload).await?;
            if let Some(mensagem) = &resposta.message {
                views::sucesso(mensagem);
            } else if resposta.agendamento_criado {
                views::sucesso("Prospecção criada e próxima ligação agendada");
            } else {
                views::sucesso("Prospecção criada!");
            }
            resposta.prospeccao
        }
        None => {
            let prospeccao: Prospeccao = sessao.api.post("/api/prospeccoes/", &payload).await?;
            views::sucesso("Prospecção criada!");
            prospeccao
        }
    };

    let releitura: Prospeccao = sessao
        .api
        .get(&format!("/api/prospeccoes/{}", criada.id))
        .await?;
    render_prospeccao(&releitura);
    Ok(())
}

/// Busca paginada por nome e escolha numerada, o mesmo fluxo do campo de
/// autocomplete do cadastro original.
async fn escolher_empresa(sessao: &Sessao, busca: &str) -> Result<Option<i64>> {
    let lista: Paginada<Empresa> = sessao
        .api
        .get_query(
            "/api/empresas/",
            &[
                ("nome", busca.to_string()),
                ("page", "1".to_string()),
                ("page_size", TAMANHO_BUSCA_EMPRESA.to_string()),
            ],
        )
        .await?;

    if lista.items.is_empty() {
        views::aviso(&format!("Nenhuma empresa encontrada para \"{busca}\""));
        return Ok(None);
    }

    for (indice, empresa) in lista.items.iter().enumerate() {
        let municipio = empresa.municipio.as_deref().unwrap_or("-");
        println!("  {}. {} ({municipio})", indice + 1, empresa.empresa);
    }

    let escolha = match views::perguntar(&format!("Empresa (1-{})", lista.items.len())) {
        Some(escolha) => escolha,
        None => return Ok(None),
    };
    match escolha.parse::<usize>() {
        Ok(n) if (1..=lista.items.len()).contains(&n) => Ok(Some(lista.items[n - 1].id)),
        _ => {
            views::erro("Opção inválida");
            Ok(None)
        }
    }
}

fn montar_payload(sessao: &Sessao, empresa_id: i64, campos: Campos) -> ProspeccaoPayload {
    ProspeccaoPayload {
        empresa_id,
        // Consultores registram as próprias ligações; o servidor recusa
        // outro consultor_id para quem não é admin.
        consultor_id: Some(campos.consultor.unwrap_or(sessao.usuario.id)),
        data_ligacao: campos.data,
        hora_ligacao: campos.hora,
        resultado: campos.resultado,
        observacoes: campos.observacoes,
        nome_contato: campos.contato,
        telefone_contato: campos.telefone,
        email_contato: campos.email,
        cargo_contato: campos.cargo,
        interesse_treinamento: campos.treinamento,
        interesse_consultoria: campos.consultoria,
        interesse_certificacao: campos.certificacao,
        interesse_eventos: campos.eventos,
        interesse_produtos: campos.produtos,
        interesse_seguranca: campos.seguranca,
        interesse_meio_ambiente: campos.meio_ambiente,
        outros_interesses: campos.outros,
        potencial_negocio: campos.potencial,
        status_follow_up: campos.follow_up,
    }
}

async fn editar(sessao: &Sessao, id: i64, campos: Campos) -> Result<()> {
    let atual: Prospeccao = sessao.api.get(&format!("/api/prospeccoes/{id}")).await?;
    let payload = mesclar_payload(&atual, campos);

    let _: Prospeccao = sessao
        .api
        .put(&format!("/api/prospeccoes/{id}"), &payload)
        .await?;
    views::sucesso("Prospecção atualizada!");

    let releitura: Prospeccao = sessao.api.get(&format!("/api/prospeccoes/{id}")).await?;
    render_prospeccao(&releitura);
    Ok(())
}

/// Edição parcial sobre o registro vigente. Flags de interesse informadas
/// ligam o interesse; as demais mantêm o valor atual.
fn mesclar_payload(atual: &Prospeccao, campos: Campos) -> ProspeccaoPayload {
    ProspeccaoPayload {
        empresa_id: atual.empresa_id,
        consultor_id: campos.consultor.or(atual.consultor_id),
        data_ligacao: campos.data.or(atual.data_ligacao),
        hora_ligacao: campos.hora.or_else(|| atual.hora_ligacao.clone()),
        resultado: campos.resultado.or_else(|| atual.resultado.clone()),
        observacoes: campos.observacoes.or_else(|| atual.observacoes.clone()),
        nome_contato: campos.contato.or_else(|| atual.nome_contato.clone()),
        telefone_contato: campos.telefone.or_else(|| atual.telefone_contato.clone()),
        email_contato: campos.email.or_else(|| atual.email_contato.clone()),
        cargo_contato: campos.cargo.or_else(|| atual.cargo_contato.clone()),
        interesse_treinamento: campos.treinamento || atual.interesse_treinamento,
        interesse_consultoria: campos.consultoria || atual.interesse_consultoria,
        interesse_certificacao: campos.certificacao || atual.interesse_certificacao,
        interesse_eventos: campos.eventos || atual.interesse_eventos,
        interesse_produtos: campos.produtos || atual.interesse_produtos,
        interesse_seguranca: campos.seguranca || atual.interesse_seguranca,
        interesse_meio_ambiente: campos.meio_ambiente || atual.interesse_meio_ambiente,
        outros_interesses: campos.outros.or_else(|| atual.outros_interesses.clone()),
        potencial_negocio: campos.potencial.or_else(|| atual.potencial_negocio.clone()),
        status_follow_up: campos.follow_up.or_else(|| atual.status_follow_up.clone()),
    }
}

async fn exportar_pdf(sessao: &Sessao, id: i64, saida: Option<PathBuf>) -> Result<()> {
    let bytes = sessao
        .api
        .download(&format!("/api/prospeccoes/export-pdf/{id}"))
        .await?;
    let saida = saida.unwrap_or_else(|| PathBuf::from(format!("prospeccao_{id}.pdf")));
    std::fs::write(&saida, bytes)?;
    views::sucesso(&format!("PDF exportado em {}", saida.display()));
    Ok(())
}

async fn alertas(sessao: &Sessao) -> Result<()> {
    let alertas: Alertas = sessao.api.get("/api/agendamentos/alertas").await?;
    if alertas.total() == 0 {
        views::info("Nenhum alerta no momento");
        return Ok(());
    }

    if !alertas.vencidos.is_empty() {
        println!("\x1b[1;31mVencidos\x1b[0m");
        for agendamento in &alertas.vencidos {
            println!("  {}", linha_agendamento(agendamento));
        }
    }
    if !alertas.hoje.is_empty() {
        println!("\x1b[1;33mHoje\x1b[0m");
        for agendamento in &alertas.hoje {
            println!("  {}", linha_agendamento(agendamento));
        }
    }
    if !alertas.futuros.is_empty() {
        println!("\x1b[1;36mPróximos\x1b[0m");
        for agendamento in &alertas.futuros {
            println!("  {}", linha_agendamento(agendamento));
        }
    }
    Ok(())
}

async fn realizado(sessao: &Sessao, agendamento_id: i64) -> Result<()> {
    if !views::confirmar("Marcar este agendamento como realizado?") {
        views::info("Operação cancelada");
        return Ok(());
    }
    let _: serde_json::Value = sessao
        .api
        .put(
            &format!("/api/agendamentos/{agendamento_id}"),
            &serde_json::json!({ "status": "realizado" }),
        )
        .await?;
    views::sucesso("Agendamento marcado como realizado!");
    alertas(sessao).await
}
