//! Cronograma mensal: grade Dom..Sáb com chips coloridos por categoria,
//! legenda vinda do servidor e manutenção de eventos (admin).

use anyhow::{anyhow, bail, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Args, Subcommand};
use serde::Deserialize;

use shared::cronograma::{
    self, montar_calendario, CalendarioMes, Categoria, CategoriaEvento, DiaCalendario,
    EventoAtualizacao, EventoCronograma, EventoPayload, Periodo, DIAS_SEMANA,
};
use shared::texto;

use crate::session::Sessao;
use crate::views;

/// Largura visível de cada célula da grade, em colunas.
const LARGURA_CELULA: usize = 12;

#[derive(Debug, Subcommand)]
pub enum Acao {
    /// Mostra a grade do mês, com filtros e legenda
    Mes {
        #[arg(long)]
        ano: Option<i32>,
        /// Mês de 1 a 12; sem --ano/--mes vale o mês corrente
        #[arg(long)]
        mes: Option<u32>,
        /// Exibe o mês anterior ao escolhido
        #[arg(long, conflicts_with = "proximo")]
        anterior: bool,
        /// Exibe o mês seguinte ao escolhido
        #[arg(long)]
        proximo: bool,
        #[command(flatten)]
        filtros: Filtros,
    },
    /// Marca um evento no cronograma
    Criar {
        /// Data do evento (AAAA-MM-DD)
        #[arg(long)]
        data: NaiveDate,
        /// Código da categoria: C, K, F, M, T, P ou O
        #[arg(long)]
        categoria: String,
        /// Período: M (manhã), T (tarde) ou D (dia todo)
        #[arg(long, default_value = "D")]
        periodo: String,
        /// Sigla da empresa atendida
        #[arg(long)]
        sigla: Option<String>,
        /// Consultor responsável
        #[arg(long)]
        consultor: i64,
        /// Título exibido na grade no lugar de "{categoria}-{sigla}"
        #[arg(long)]
        titulo: Option<String>,
    },
    /// Altera um evento; somente os campos informados mudam
    Editar {
        id: i64,
        #[command(flatten)]
        campos: CamposEvento,
    },
    /// Remove um evento do cronograma
    Excluir { id: i64 },
}

#[derive(Debug, Default, Args)]
pub struct Filtros {
    /// Restringe a grade a um consultor
    #[arg(long)]
    pub consultor: Option<i64>,
    /// Restringe a grade a uma categoria (código)
    #[arg(long)]
    pub categoria: Option<String>,
}

/// Campos opcionais da edição; o servidor mantém o que não for informado.
#[derive(Debug, Default, Args)]
pub struct CamposEvento {
    /// Nova data (AAAA-MM-DD)
    #[arg(long)]
    pub data: Option<NaiveDate>,
    /// Código da categoria: C, K, F, M, T, P ou O
    #[arg(long)]
    pub categoria: Option<String>,
    /// Período: M (manhã), T (tarde) ou D (dia todo)
    #[arg(long)]
    pub periodo: Option<String>,
    /// Sigla da empresa atendida
    #[arg(long)]
    pub sigla: Option<String>,
    /// Consultor responsável
    #[arg(long)]
    pub consultor: Option<i64>,
    /// Título exibido na grade
    #[arg(long)]
    pub titulo: Option<String>,
}

impl CamposEvento {
    fn em_payload(&self) -> Result<EventoAtualizacao> {
        Ok(EventoAtualizacao {
            data: self.data,
            categoria: self.categoria.as_deref().map(parse_categoria).transpose()?,
            periodo: self.periodo.as_deref().map(parse_periodo).transpose()?,
            sigla_empresa: self.sigla.clone(),
            consultor_id: self.consultor,
            titulo: self.titulo.clone(),
        })
    }

    fn vazio(&self) -> bool {
        self.data.is_none()
            && self.categoria.is_none()
            && self.periodo.is_none()
            && self.sigla.is_none()
            && self.consultor.is_none()
            && self.titulo.is_none()
    }
}

/// Evento como o servidor o guarda. `GET /eventos/{id}` e as mutações
/// devolvem este formato, não o achatado da grade.
#[derive(Debug, Deserialize)]
struct EventoGuardado {
    id: i64,
    data: NaiveDate,
    categoria: Categoria,
    sigla_empresa: Option<String>,
    titulo: Option<String>,
}

impl EventoGuardado {
    fn rotulo(&self) -> String {
        match &self.titulo {
            Some(titulo) if !titulo.is_empty() => titulo.clone(),
            _ => format!(
                "{}-{}",
                self.categoria.codigo(),
                self.sigla_empresa.as_deref().unwrap_or("")
            ),
        }
    }
}

pub async fn executar(sessao: &Sessao, acao: Acao) -> Result<()> {
    match acao {
        Acao::Mes {
            ano,
            mes,
            anterior,
            proximo,
            filtros,
        } => {
            let hoje = chrono::Local::now().date_naive();
            let ano = ano.unwrap_or_else(|| hoje.year());
            let mes = mes.unwrap_or_else(|| hoje.month());
            if !(1..=12).contains(&mes) {
                bail!("Mês inválido: {mes} (use 1 a 12)");
            }
            let (ano, mes) = if anterior {
                cronograma::mes_anterior(ano, mes)
            } else if proximo {
                cronograma::proximo_mes(ano, mes)
            } else {
                (ano, mes)
            };
            mostrar_mes(sessao, ano, mes, &filtros).await
        }
        Acao::Criar {
            data,
            categoria,
            periodo,
            sigla,
            consultor,
            titulo,
        } => criar(sessao, data, categoria, periodo, sigla, consultor, titulo).await,
        Acao::Editar { id, campos } => editar(sessao, id, campos).await,
        Acao::Excluir { id } => excluir(sessao, id).await,
    }
}

async fn mostrar_mes(sessao: &Sessao, ano: i32, mes: u32, filtros: &Filtros) -> Result<()> {
    let eventos = buscar_eventos(sessao, ano, mes, filtros).await?;
    let calendario = montar_calendario(ano, mes, &eventos);
    let legenda = buscar_legenda(sessao).await;

    views::titulo(&calendario.titulo());
    print!("{}", render_mes(&calendario));
    println!();
    println!("{}", render_resumo(&calendario));
    println!("{}", render_legenda(&legenda));
    Ok(())
}

/// Busca os eventos do mês visível; os limites são o primeiro e o último dia,
/// ambos inclusivos.
async fn buscar_eventos(
    sessao: &Sessao,
    ano: i32,
    mes: u32,
    filtros: &Filtros,
) -> Result<Vec<EventoCronograma>> {
    let inicio = NaiveDate::from_ymd_opt(ano, mes, 1)
        .ok_or_else(|| anyhow!("Mês inválido: {mes:02}/{ano}"))?;
    let fim = NaiveDate::from_ymd_opt(ano, mes, cronograma::dias_no_mes(ano, mes))
        .ok_or_else(|| anyhow!("Mês inválido: {mes:02}/{ano}"))?;

    let mut consulta: Vec<(&str, String)> = vec![
        ("data_inicio", inicio.to_string()),
        ("data_fim", fim.to_string()),
    ];
    if let Some(consultor) = filtros.consultor {
        consulta.push(("consultor_id", consultor.to_string()));
    }
    if let Some(categoria) = &filtros.categoria {
        consulta.push(("categoria", parse_categoria(categoria)?.codigo().to_string()));
    }

    Ok(sessao
        .api
        .get_query("/api/cronograma/eventos", &consulta)
        .await?)
}

/// Legenda oficial do servidor; se a chamada falhar, as categorias locais
/// cobrem a tela sem derrubar o mês.
async fn buscar_legenda(sessao: &Sessao) -> Vec<CategoriaEvento> {
    let resposta: Result<Vec<CategoriaEvento>, _> =
        sessao.api.get("/api/cronograma/categorias").await;
    match resposta {
        Ok(legenda) => legenda,
        Err(erro) => {
            tracing::warn!(%erro, "legenda do servidor indisponível, usando a local");
            Categoria::TODAS
                .into_iter()
                .map(|cat| CategoriaEvento {
                    codigo: cat.codigo().to_string(),
                    nome: cat.nome().to_string(),
                    cor: cat.cor().to_string(),
                })
                .collect()
        }
    }
}

async fn criar(
    sessao: &Sessao,
    data: NaiveDate,
    categoria: String,
    periodo: String,
    sigla: Option<String>,
    consultor: i64,
    titulo: Option<String>,
) -> Result<()> {
    sessao.exigir_admin()?;
    let payload = EventoPayload {
        data,
        categoria: parse_categoria(&categoria)?,
        periodo: parse_periodo(&periodo)?,
        sigla_empresa: sigla,
        consultor_id: Some(consultor),
        titulo,
    };

    let criado: EventoGuardado = sessao.api.post("/api/cronograma/eventos", &payload).await?;
    views::sucesso(&format!("Evento #{} marcado!", criado.id));

    // Releitura: a grade mostrada é sempre o estado do servidor.
    mostrar_mes(sessao, criado.data.year(), criado.data.month(), &Filtros::default()).await
}

async fn editar(sessao: &Sessao, id: i64, campos: CamposEvento) -> Result<()> {
    sessao.exigir_admin()?;
    if campos.vazio() {
        views::aviso("Nada para alterar: informe ao menos um campo");
        return Ok(());
    }
    let payload = campos.em_payload()?;

    let alterado: EventoGuardado = sessao
        .api
        .put(&format!("/api/cronograma/eventos/{id}"), &payload)
        .await?;
    views::sucesso("Evento atualizado!");

    mostrar_mes(
        sessao,
        alterado.data.year(),
        alterado.data.month(),
        &Filtros::default(),
    )
    .await
}

async fn excluir(sessao: &Sessao, id: i64) -> Result<()> {
    sessao.exigir_admin()?;
    let evento: EventoGuardado = sessao
        .api
        .get(&format!("/api/cronograma/eventos/{id}"))
        .await?;
    let pergunta = format!(
        "Remover o evento \"{}\" de {}?",
        evento.rotulo(),
        texto::data_curta(evento.data)
    );
    if !views::confirmar(&pergunta) {
        views::info("Exclusão cancelada");
        return Ok(());
    }

    sessao
        .api
        .delete(&format!("/api/cronograma/eventos/{id}"))
        .await?;
    views::sucesso("Evento removido!");

    mostrar_mes(
        sessao,
        evento.data.year(),
        evento.data.month(),
        &Filtros::default(),
    )
    .await
}

fn parse_categoria(codigo: &str) -> Result<Categoria> {
    Categoria::do_codigo(codigo)
        .ok_or_else(|| anyhow!("Categoria \"{codigo}\" desconhecida (use C, K, F, M, T, P ou O)"))
}

fn parse_periodo(codigo: &str) -> Result<Periodo> {
    Periodo::do_codigo(codigo)
        .ok_or_else(|| anyhow!("Período \"{codigo}\" desconhecido (use M, T ou D)"))
}

// ============================================================================
// Render
// ============================================================================

/// Cor ANSI que aproxima o hex da legenda.
fn cor_ansi(categoria: Categoria) -> &'static str {
    match categoria {
        Categoria::Consultoria => "32",
        Categoria::KickOff => "33",
        Categoria::ReuniaoFinal => "34",
        Categoria::Mentoria => "31",
        Categoria::Diagnostico => "91",
        Categoria::Programado => "36",
        Categoria::Outros => "90",
    }
}

/// Preenche até a largura da célula contando caracteres, não bytes.
fn alinhar(texto: &str, largura: usize) -> String {
    let falta = largura.saturating_sub(texto.chars().count());
    format!("{texto}{}", " ".repeat(falta))
}

/// Grade do mês como texto. As cores entram depois do preenchimento para não
/// desalinhar as colunas.
fn render_mes(calendario: &CalendarioMes) -> String {
    let mut saida = String::new();

    let cabecalho: Vec<String> = DIAS_SEMANA
        .iter()
        .map(|dia| alinhar(dia, LARGURA_CELULA))
        .collect();
    saida.push_str(&format!(
        "\x1b[1m{}\x1b[0m\n",
        cabecalho.join(" ").trim_end()
    ));

    let mut slots: Vec<Option<&DiaCalendario>> = vec![None; calendario.celulas_vazias];
    slots.extend(calendario.dias.iter().map(Some));
    while slots.len() % 7 != 0 {
        slots.push(None);
    }

    for semana in slots.chunks(7) {
        saida.push_str(&render_semana(semana));
    }
    saida
}

fn render_semana(semana: &[Option<&DiaCalendario>]) -> String {
    let celulas: Vec<Vec<String>> = semana.iter().map(|slot| linhas_da_celula(*slot)).collect();
    let altura = celulas.iter().map(Vec::len).max().unwrap_or(1);

    let mut saida = String::new();
    for indice in 0..altura {
        let fatia: Vec<String> = celulas
            .iter()
            .map(|linhas| {
                linhas
                    .get(indice)
                    .cloned()
                    .unwrap_or_else(|| " ".repeat(LARGURA_CELULA))
            })
            .collect();
        saida.push_str(fatia.join(" ").trim_end());
        saida.push('\n');
    }
    saida
}

/// Linhas de uma célula: número do dia, até [`cronograma::MAX_EVENTOS_DIA`]
/// chips e o marcador "+N mais" quando o dia transborda.
fn linhas_da_celula(slot: Option<&DiaCalendario>) -> Vec<String> {
    let Some(dia) = slot else {
        return vec![" ".repeat(LARGURA_CELULA)];
    };

    let mut linhas = vec![alinhar(&dia.dia.to_string(), LARGURA_CELULA)];
    for evento in dia.visiveis() {
        let chip = alinhar(
            &texto::truncar(&evento.rotulo(), LARGURA_CELULA),
            LARGURA_CELULA,
        );
        linhas.push(format!("\x1b[{}m{chip}\x1b[0m", cor_ansi(evento.categoria)));
    }
    if dia.excedente() > 0 {
        linhas.push(alinhar(
            &format!("+{} mais", dia.excedente()),
            LARGURA_CELULA,
        ));
    }
    linhas
}

fn render_resumo(calendario: &CalendarioMes) -> String {
    let total = calendario.total_eventos();
    if total == 0 {
        return "Nenhum evento no mês".to_string();
    }

    let categorias: Vec<String> = calendario
        .resumo_categorias()
        .iter()
        .map(|(categoria, n)| format!("{}: {n}", categoria.nome()))
        .collect();
    let periodos: Vec<String> = calendario
        .resumo_periodos()
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(periodo, n)| format!("{}: {n}", periodo.nome()))
        .collect();

    let rotulo = if total == 1 { "evento" } else { "eventos" };
    format!(
        "{total} {rotulo} no mês\n  {}\n  {}",
        categorias.join(" · "),
        periodos.join(" · ")
    )
}

fn render_legenda(legenda: &[CategoriaEvento]) -> String {
    let entradas: Vec<String> = legenda
        .iter()
        .map(|categoria| {
            let ansi = Categoria::do_codigo(&categoria.codigo)
                .map(cor_ansi)
                .unwrap_or("39");
            format!("\x1b[{ansi}m●\x1b[0m {} ({})", categoria.nome, categoria.codigo)
        })
        .collect();
    format!("Legenda: {}", entradas.join("  "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evento(id: i64, data: &str, categoria: Categoria, titulo: Option<&str>) -> EventoCronograma {
        EventoCronograma {
            id,
            data: data.parse().unwrap(),
            categoria,
            categoria_nome: Some(categoria.nome().to_string()),
            periodo: Periodo::DiaTodo,
            sigla_empresa: Some("AUR".to_string()),
            consultor_id: Some(7),
            consultor_nome: Some("Ana".to_string()),
            titulo: titulo.map(str::to_string),
            cor: None,
        }
    }

    #[test]
    fn test_grade_tem_cabecalho_e_dias() {
        // Junho de 2025 começa num domingo: dia 1 abre a primeira semana.
        let calendario = montar_calendario(2025, 6, &[]);
        let grade = render_mes(&calendario);
        let linhas: Vec<&str> = grade.lines().collect();

        assert!(linhas[0].contains("Dom"));
        assert!(linhas[0].contains("Sáb"));
        assert!(linhas[1].starts_with('1'));
        assert!(grade.contains("30"));
        assert!(!grade.contains("31"));
    }

    #[test]
    fn test_celulas_vazias_deslocam_o_primeiro_dia() {
        // Agosto de 2025 começa numa sexta: cinco células em branco antes do 1.
        let calendario = montar_calendario(2025, 8, &[]);
        let grade = render_mes(&calendario);
        let primeira_semana = grade.lines().nth(1).unwrap();

        let coluna_sexta = 5 * (LARGURA_CELULA + 1);
        let prefixo: String = primeira_semana.chars().take(coluna_sexta).collect();
        assert_eq!(prefixo.trim(), "");
        assert!(primeira_semana.trim_start().starts_with('1'));
    }

    #[test]
    fn test_chips_coloridos_e_excedente() {
        let eventos = vec![
            evento(1, "2025-06-05", Categoria::Consultoria, None),
            evento(2, "2025-06-05", Categoria::Mentoria, Some("Mentoria mensal")),
            evento(3, "2025-06-05", Categoria::KickOff, None),
            evento(4, "2025-06-05", Categoria::Outros, None),
        ];
        let grade = render_mes(&montar_calendario(2025, 6, &eventos));

        // Chip verde de consultoria com o rótulo de fallback.
        assert!(grade.contains("\x1b[32mC-AUR"));
        // Título explícito vence o fallback, truncado à célula.
        assert!(grade.contains("Mentoria me…"));
        // O quarto evento vira excedente.
        assert!(grade.contains("+1 mais"));
    }

    #[test]
    fn test_resumo_conta_categorias_e_periodos() {
        let eventos = vec![
            evento(1, "2025-06-02", Categoria::Consultoria, None),
            evento(2, "2025-06-03", Categoria::Consultoria, None),
            evento(3, "2025-06-04", Categoria::Mentoria, None),
        ];
        let resumo = render_resumo(&montar_calendario(2025, 6, &eventos));
        assert!(resumo.starts_with("3 eventos no mês"));
        assert!(resumo.contains("Consultoria: 2"));
        assert!(resumo.contains("Mentoria: 1"));
        assert!(resumo.contains("Dia todo: 3"));

        let vazio = render_resumo(&montar_calendario(2025, 6, &[]));
        assert_eq!(vazio, "Nenhum evento no mês");
    }

    #[test]
    fn test_legenda_com_codigo_e_cor() {
        let legenda = vec![CategoriaEvento {
            codigo: "C".to_string(),
            nome: "Consultoria".to_string(),
            cor: "#22c55e".to_string(),
        }];
        let linha = render_legenda(&legenda);
        assert!(linha.contains("\x1b[32m●\x1b[0m Consultoria (C)"));
    }

    #[test]
    fn test_edicao_parcial_so_leva_o_que_mudou() {
        let campos = CamposEvento {
            categoria: Some("k".to_string()),
            ..Default::default()
        };
        let payload = campos.em_payload().unwrap();
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"categoria":"K"}"#
        );

        assert!(CamposEvento::default().vazio());
        assert!(!campos.vazio());
    }

    #[test]
    fn test_codigo_desconhecido_e_recusado() {
        assert!(parse_categoria("x").is_err());
        assert!(parse_periodo("Z").is_err());
        assert_eq!(parse_categoria("t").unwrap(), Categoria::Diagnostico);
        assert_eq!(parse_periodo("m").unwrap(), Periodo::Manha);
    }
}
