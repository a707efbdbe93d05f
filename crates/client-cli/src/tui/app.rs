//! Main loop and rendering of the chat screen.
//!
//! Each frame copies what it needs out of the controller state into a
//! [`Tela`] and hands it to the draw functions. The timers keep mutating the
//! shared state in the background; the copy keeps the lock short and the
//! rendering free of surprises mid-frame.

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use shared::mensagem::Conversa;
use shared::texto;

use crate::api::ApiClient;
use crate::chat::ChatSession;
use crate::views::{self, LinhaMensagem};

const AJUDA: &str =
    "/anexar <caminho> · /responder <id> · /reagir <id> <emoji> · /editar <id> <texto> · /apagar <id> · /cancelar";

/// Command typed in the composer. Anything that does not start with `/` is a
/// plain message.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Comando {
    Anexar(PathBuf),
    Responder(i64),
    Reagir(i64, String),
    Editar(i64, String),
    Apagar(i64),
    /// Drops the reply mark and the pending attachment.
    Cancelar,
    Ajuda,
}

/// `None` when the text is a plain message; `Some(Err)` carries the usage
/// hint of a malformed command.
fn interpretar(entrada: &str) -> Option<Result<Comando, String>> {
    let resto = entrada.trim().strip_prefix('/')?;
    let (nome, args) = match resto.split_once(' ') {
        Some((nome, args)) => (nome, args.trim()),
        None => (resto, ""),
    };
    let comando = match nome {
        "anexar" => {
            if args.is_empty() {
                Err("uso: /anexar <caminho>".to_string())
            } else {
                Ok(Comando::Anexar(PathBuf::from(args)))
            }
        }
        "responder" => args
            .parse()
            .map(Comando::Responder)
            .map_err(|_| "uso: /responder <id>".to_string()),
        "reagir" => match args.split_once(' ') {
            Some((id, emoji)) if !emoji.trim().is_empty() => id
                .parse()
                .map(|id| Comando::Reagir(id, emoji.trim().to_string()))
                .map_err(|_| "uso: /reagir <id> <emoji>".to_string()),
            _ => Err("uso: /reagir <id> <emoji>".to_string()),
        },
        "editar" => match args.split_once(' ') {
            Some((id, texto)) if !texto.trim().is_empty() => id
                .parse()
                .map(|id| Comando::Editar(id, texto.trim().to_string()))
                .map_err(|_| "uso: /editar <id> <novo texto>".to_string()),
            _ => Err("uso: /editar <id> <novo texto>".to_string()),
        },
        "apagar" => args
            .parse()
            .map(Comando::Apagar)
            .map_err(|_| "uso: /apagar <id>".to_string()),
        "cancelar" => Ok(Comando::Cancelar),
        "ajuda" => Ok(Comando::Ajuda),
        outro => Err(format!("Comando /{outro} desconhecido (tente /ajuda)")),
    };
    Some(comando)
}

// ============================================================================
// Frame view-models
// ============================================================================

/// One sidebar row.
#[derive(Debug, Clone)]
struct LinhaConversa {
    nome: String,
    online: bool,
    nao_lidas: u32,
    previa: String,
}

fn linha_conversa(conversa: &Conversa) -> LinhaConversa {
    LinhaConversa {
        nome: conversa.usuario.nome.clone(),
        online: conversa.usuario.online,
        nao_lidas: conversa.mensagens_nao_lidas,
        previa: conversa
            .ultima_mensagem
            .as_deref()
            .map(|ultima| texto::truncar(ultima, 26))
            .unwrap_or_else(|| "Sem mensagens".to_string()),
    }
}

fn presenca(online: bool, digitando: bool) -> &'static str {
    if digitando {
        "digitando..."
    } else if online {
        "online"
    } else {
        "offline"
    }
}

/// Right-hand side of the screen while a conversation is open.
#[derive(Debug)]
struct Painel {
    titulo: String,
    presenca: &'static str,
    linhas: Vec<LinhaMensagem>,
    respondendo: Option<String>,
    anexo: Option<String>,
    enviando_anexo: bool,
}

/// Everything one frame renders from.
#[derive(Debug)]
struct Tela {
    conversas: Vec<LinhaConversa>,
    selecionada: usize,
    aberta: Option<Painel>,
    nao_lidas_total: u64,
    entrada: String,
    rolagem: u16,
    status: Option<String>,
}

// ============================================================================
// Screen
// ============================================================================

pub struct ChatScreen {
    sessao: ChatSession<ApiClient>,
    nome_proprio: String,
    /// Composer buffer.
    entrada: String,
    /// Sidebar row under the cursor.
    selecionada: usize,
    /// Lines scrolled up from the transcript bottom.
    rolagem: u16,
    /// One-frame feedback shown in the status bar.
    status: Option<String>,
    sair: bool,
}

impl ChatScreen {
    pub fn nova(api: ApiClient, usuario_id: i64, nome_proprio: String) -> Self {
        Self {
            sessao: ChatSession::nova(api, usuario_id),
            nome_proprio,
            entrada: String::new(),
            selecionada: 0,
            rolagem: 0,
            status: None,
            sair: false,
        }
    }

    /// Takes over the terminal until the user leaves the screen. The raw mode
    /// is undone and every timer stopped before returning, error or not.
    pub async fn executar(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let resultado = self.rodar(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        self.sessao.encerrar().await;
        resultado
    }

    async fn rodar(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        self.sessao.iniciar().await?;

        while !self.sair {
            let tela = self.montar_tela().await;
            terminal.draw(|frame| desenhar(frame, &tela))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(tecla) = event::read()? {
                    self.tratar_tecla(tecla.code, tecla.modifiers).await;
                }
            }
        }
        Ok(())
    }

    async fn montar_tela(&self) -> Tela {
        let estado = self.sessao.estado();
        let estado = estado.lock().await;

        let conversas: Vec<LinhaConversa> = estado.conversas.iter().map(linha_conversa).collect();
        let aberta = estado.aberta.as_ref().map(|aberta| Painel {
            titulo: aberta.peer.nome.clone(),
            presenca: presenca(aberta.online, aberta.digitando),
            linhas: aberta
                .transcricao
                .mensagens()
                .iter()
                .map(|mensagem| {
                    views::linha_mensagem(
                        mensagem,
                        self.sessao.usuario_id(),
                        &self.nome_proprio,
                        &aberta.peer.nome,
                        &aberta.transcricao,
                    )
                })
                .collect(),
            respondendo: aberta
                .respondendo_a
                .and_then(|id| aberta.transcricao.buscar(id))
                .map(|alvo| texto::truncar(alvo.texto_exibicao(), 30)),
            anexo: aberta
                .anexo_pendente
                .as_ref()
                .map(|pendente| format!("📎 {}", pendente.anexo.nome)),
            enviando_anexo: aberta.enviando_anexo,
        });

        Tela {
            selecionada: self.selecionada.min(conversas.len().saturating_sub(1)),
            conversas,
            aberta,
            nao_lidas_total: estado.nao_lidas_total,
            entrada: self.entrada.clone(),
            rolagem: self.rolagem,
            status: self.status.clone(),
        }
    }

    async fn tratar_tecla(&mut self, codigo: KeyCode, modificadores: KeyModifiers) {
        self.status = None;
        if modificadores.contains(KeyModifiers::CONTROL) {
            if codigo == KeyCode::Char('c') {
                self.sair = true;
            }
            return;
        }

        let conversa_aberta = self.sessao.estado().lock().await.aberta.is_some();
        if conversa_aberta {
            self.tecla_na_conversa(codigo).await;
        } else {
            self.tecla_na_lista(codigo).await;
        }
    }

    async fn tecla_na_lista(&mut self, codigo: KeyCode) {
        match codigo {
            KeyCode::Up => self.selecionada = self.selecionada.saturating_sub(1),
            KeyCode::Down => {
                let total = self.sessao.estado().lock().await.conversas.len();
                if self.selecionada + 1 < total {
                    self.selecionada += 1;
                }
            }
            KeyCode::Enter => self.abrir_selecionada().await,
            KeyCode::Esc | KeyCode::Char('q') => self.sair = true,
            _ => {}
        }
    }

    async fn abrir_selecionada(&mut self) {
        let peer = {
            let estado = self.sessao.estado();
            let escolhida = estado.lock().await;
            escolhida
                .conversas
                .get(self.selecionada)
                .map(|conversa| conversa.usuario.clone())
        };
        let Some(peer) = peer else { return };

        self.entrada.clear();
        self.rolagem = 0;
        if let Err(erro) = self.sessao.abrir(peer).await {
            self.status = Some(format!("Erro ao abrir a conversa: {erro}"));
        }
    }

    async fn tecla_na_conversa(&mut self, codigo: KeyCode) {
        match codigo {
            KeyCode::Char(c) => {
                self.entrada.push(c);
                self.sessao.tecla_digitada().await;
            }
            KeyCode::Backspace => {
                self.entrada.pop();
            }
            KeyCode::Enter => self.confirmar_entrada().await,
            KeyCode::Esc => {
                self.entrada.clear();
                self.rolagem = 0;
                self.sessao.fechar_conversa().await;
            }
            KeyCode::Up => self.rolagem = self.rolagem.saturating_add(1),
            KeyCode::Down => self.rolagem = self.rolagem.saturating_sub(1),
            KeyCode::PageUp => self.rolagem = self.rolagem.saturating_add(10),
            KeyCode::PageDown => self.rolagem = self.rolagem.saturating_sub(10),
            _ => {}
        }
    }

    async fn confirmar_entrada(&mut self) {
        let entrada = std::mem::take(&mut self.entrada);
        match interpretar(&entrada) {
            Some(Ok(comando)) => self.executar_comando(comando).await,
            Some(Err(uso)) => self.status = Some(uso),
            None => {
                self.rolagem = 0;
                if let Err(erro) = self.sessao.enviar(&entrada).await {
                    self.status = Some(erro.to_string());
                    // o texto volta para o composer em vez de se perder
                    self.entrada = entrada;
                }
            }
        }
    }

    async fn executar_comando(&mut self, comando: Comando) {
        let resultado = match comando {
            Comando::Anexar(caminho) => self
                .sessao
                .anexar(&caminho)
                .await
                .map(|anexo| format!("Anexo \"{}\" pronto para envio", anexo.nome)),
            Comando::Responder(id) => self
                .sessao
                .responder(id)
                .await
                .map(|()| format!("Respondendo à mensagem #{id}")),
            Comando::Reagir(id, emoji) => {
                self.sessao.reagir(id, &emoji).await.map(|()| String::new())
            }
            Comando::Editar(id, texto) => {
                self.sessao.editar(id, &texto).await.map(|()| String::new())
            }
            Comando::Apagar(id) => self.sessao.apagar(id).await.map(|()| String::new()),
            Comando::Cancelar => {
                self.sessao.cancelar_resposta().await;
                self.sessao.descartar_anexo().await;
                Ok(String::new())
            }
            Comando::Ajuda => Ok(AJUDA.to_string()),
        };
        match resultado {
            Ok(aviso) if aviso.is_empty() => {}
            Ok(aviso) => self.status = Some(aviso),
            Err(erro) => self.status = Some(erro.to_string()),
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn desenhar(frame: &mut Frame, tela: &Tela) {
    let area = frame.area();

    let geral = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let colunas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(0)])
        .split(geral[0]);

    desenhar_conversas(frame, colunas[0], tela);
    match &tela.aberta {
        Some(painel) => desenhar_conversa(frame, colunas[1], painel, tela),
        None => desenhar_vazio(frame, colunas[1]),
    }
    desenhar_status(frame, geral[1], tela);
}

fn desenhar_conversas(frame: &mut Frame, area: Rect, tela: &Tela) {
    let foco = tela.aberta.is_none();
    let borda = if foco {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let titulo = if tela.nao_lidas_total > 0 {
        format!(" Conversas ({} não lidas) ", tela.nao_lidas_total)
    } else {
        " Conversas ".to_string()
    };
    let bloco = Block::default()
        .title(titulo)
        .borders(Borders::ALL)
        .border_style(borda);
    let interno = bloco.inner(area);
    frame.render_widget(bloco, area);

    let paragrafo = Paragraph::new(linhas_conversas(tela)).wrap(Wrap { trim: false });
    frame.render_widget(paragrafo, interno);
}

fn linhas_conversas(tela: &Tela) -> Vec<Line<'static>> {
    if tela.conversas.is_empty() {
        return vec![Line::from(Span::styled(
            "Nenhuma conversa ainda",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let mut linhas = Vec::new();
    for (i, conversa) in tela.conversas.iter().enumerate() {
        let marcada = i == tela.selecionada && tela.aberta.is_none();
        let ponto = Span::styled(
            "● ",
            Style::default().fg(if conversa.online {
                Color::Green
            } else {
                Color::DarkGray
            }),
        );
        let nome = Span::styled(
            conversa.nome.clone(),
            if marcada {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            },
        );
        let mut spans = vec![ponto, nome];
        if conversa.nao_lidas > 0 {
            spans.push(Span::styled(
                format!(" ({})", conversa.nao_lidas),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ));
        }
        linhas.push(Line::from(spans));
        linhas.push(Line::from(Span::styled(
            format!("  {}", conversa.previa),
            Style::default().fg(Color::DarkGray),
        )));
    }
    linhas
}

fn desenhar_conversa(frame: &mut Frame, area: Rect, painel: &Painel, tela: &Tela) {
    let bloco = Block::default()
        .title(format!(" {} ({}) ", painel.titulo, painel.presenca))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let interno = bloco.inner(area);
    frame.render_widget(bloco, area);

    let partes = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(interno);

    let linhas = linhas_transcricao(painel);
    let total = linhas.len() as u16;
    // preso ao fim do histórico; a rolagem sobe a partir dele
    let deslocamento = total
        .saturating_sub(partes[0].height)
        .saturating_sub(tela.rolagem);
    let transcricao = Paragraph::new(linhas)
        .wrap(Wrap { trim: false })
        .scroll((deslocamento, 0));
    frame.render_widget(transcricao, partes[0]);

    let composer = Block::default()
        .title(titulo_composer(painel))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let dentro = composer.inner(partes[1]);
    frame.render_widget(composer, partes[1]);
    frame.render_widget(Paragraph::new(format!("{}_", tela.entrada)), dentro);
}

fn linhas_transcricao(painel: &Painel) -> Vec<Line<'static>> {
    let mut linhas = Vec::new();
    for linha in &painel.linhas {
        let cor = if linha.propria { Color::Cyan } else { Color::White };
        let mut cabecalho = vec![
            Span::styled(format!("#{} ", linha.id), Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{} ", linha.autor),
                Style::default().fg(cor).add_modifier(Modifier::BOLD),
            ),
            Span::styled(linha.hora.clone(), Style::default().fg(Color::DarkGray)),
        ];
        if linha.editada {
            cabecalho.push(Span::styled(
                " (editada)",
                Style::default().fg(Color::DarkGray),
            ));
        }
        if let Some(marcador) = linha.marcador {
            cabecalho.push(Span::styled(
                format!(" {marcador}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        linhas.push(Line::from(cabecalho));

        if let Some(citacao) = &linha.citacao {
            linhas.push(Line::from(Span::styled(
                format!("  ┃ {citacao}"),
                Style::default().fg(Color::DarkGray),
            )));
        }
        linhas.push(Line::from(format!("  {}", linha.texto)));
        if let Some(anexo) = &linha.anexo {
            linhas.push(Line::from(Span::styled(
                format!("  {anexo}"),
                Style::default().fg(Color::Blue),
            )));
        }
        if let Some(reacoes) = &linha.reacoes {
            linhas.push(Line::from(Span::styled(
                format!("  {reacoes}"),
                Style::default().fg(Color::Yellow),
            )));
        }
    }
    linhas
}

fn titulo_composer(painel: &Painel) -> String {
    let mut titulo = String::from(" Mensagem ");
    if let Some(respondendo) = &painel.respondendo {
        titulo.push_str(&format!("· respondendo: {respondendo} "));
    }
    if painel.enviando_anexo {
        titulo.push_str("· enviando anexo... ");
    } else if let Some(anexo) = &painel.anexo {
        titulo.push_str(&format!("· {anexo} "));
    }
    titulo
}

fn desenhar_vazio(frame: &mut Frame, area: Rect) {
    let bloco = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let interno = bloco.inner(area);
    frame.render_widget(bloco, area);
    let aviso = Paragraph::new("Selecione uma conversa e pressione Enter")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(aviso, interno);
}

fn desenhar_status(frame: &mut Frame, area: Rect, tela: &Tela) {
    let texto = match &tela.status {
        Some(status) => format!(" {status} "),
        None if tela.aberta.is_some() => {
            " Enter envia · /ajuda comandos · Esc volta para a lista ".to_string()
        }
        None => " ↑/↓ seleciona · Enter abre · q sai ".to_string(),
    };
    let barra = Paragraph::new(texto).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(barra, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    use shared::usuario::UsuarioSimples;

    fn conteudo(linha: &Line) -> String {
        linha.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_comandos_do_composer() {
        assert_eq!(interpretar("oi, tudo bem?"), None);
        assert_eq!(
            interpretar("/responder 12"),
            Some(Ok(Comando::Responder(12)))
        );
        assert_eq!(
            interpretar("/reagir 3 👍"),
            Some(Ok(Comando::Reagir(3, "👍".to_string())))
        );
        assert_eq!(
            interpretar("/editar 4 novo texto da mensagem"),
            Some(Ok(Comando::Editar(4, "novo texto da mensagem".to_string())))
        );
        assert_eq!(interpretar("/apagar 9"), Some(Ok(Comando::Apagar(9))));
        assert_eq!(
            interpretar("/anexar relatorios/proposta.pdf"),
            Some(Ok(Comando::Anexar(PathBuf::from("relatorios/proposta.pdf"))))
        );
        assert_eq!(interpretar("/cancelar"), Some(Ok(Comando::Cancelar)));
    }

    #[test]
    fn test_comando_malformado_mostra_o_uso() {
        assert_eq!(
            interpretar("/responder abc"),
            Some(Err("uso: /responder <id>".to_string()))
        );
        assert_eq!(
            interpretar("/reagir 3"),
            Some(Err("uso: /reagir <id> <emoji>".to_string()))
        );
        assert_eq!(
            interpretar("/editar 4"),
            Some(Err("uso: /editar <id> <novo texto>".to_string()))
        );
        let erro = interpretar("/sumir 1").unwrap().unwrap_err();
        assert!(erro.contains("/sumir"));
        assert!(erro.contains("/ajuda"));
    }

    #[test]
    fn test_presenca_digitando_vence_online() {
        assert_eq!(presenca(true, true), "digitando...");
        assert_eq!(presenca(true, false), "online");
        assert_eq!(presenca(false, false), "offline");
    }

    #[test]
    fn test_linha_da_conversa() {
        let conversa = Conversa {
            usuario: UsuarioSimples {
                id: 2,
                nome: "Ana Lima".to_string(),
                email: None,
                foto_url: None,
                online: true,
            },
            ultima_mensagem: Some(
                "Podemos marcar a visita na quinta-feira pela manhã?".to_string(),
            ),
            data_ultima_mensagem: None,
            mensagens_nao_lidas: 3,
        };
        let linha = linha_conversa(&conversa);
        assert_eq!(linha.nome, "Ana Lima");
        assert!(linha.online);
        assert_eq!(linha.nao_lidas, 3);
        assert!(linha.previa.ends_with('…'));

        let vazia = Conversa {
            ultima_mensagem: None,
            ..conversa
        };
        assert_eq!(linha_conversa(&vazia).previa, "Sem mensagens");
    }

    #[test]
    fn test_transcricao_renderizada() {
        let painel = Painel {
            titulo: "Ana".to_string(),
            presenca: "online",
            linhas: vec![LinhaMensagem {
                id: 7,
                propria: true,
                autor: "Eu".to_string(),
                hora: "14:02".to_string(),
                texto: "segue o contrato".to_string(),
                editada: true,
                marcador: Some("✓✓ lida"),
                reacoes: Some("👍 2".to_string()),
                citacao: Some("Pode enviar o contrato?".to_string()),
                anexo: Some("📎 contrato.pdf (3,2 KB)".to_string()),
                acoes: Vec::new(),
            }],
            respondendo: None,
            anexo: None,
            enviando_anexo: false,
        };
        let linhas = linhas_transcricao(&painel);
        let textos: Vec<String> = linhas.iter().map(conteudo).collect();

        assert_eq!(textos.len(), 5);
        assert!(textos[0].contains("#7"));
        assert!(textos[0].contains("Eu"));
        assert!(textos[0].contains("(editada)"));
        assert!(textos[0].contains("✓✓ lida"));
        assert!(textos[1].contains("Pode enviar o contrato?"));
        assert_eq!(textos[2], "  segue o contrato");
        assert!(textos[3].contains("contrato.pdf"));
        assert!(textos[4].contains("👍 2"));
    }

    #[test]
    fn test_titulo_do_composer_mostra_pendencias() {
        let mut painel = Painel {
            titulo: "Ana".to_string(),
            presenca: "online",
            linhas: Vec::new(),
            respondendo: Some("Pode enviar?".to_string()),
            anexo: Some("📎 contrato.pdf".to_string()),
            enviando_anexo: false,
        };
        let titulo = titulo_composer(&painel);
        assert!(titulo.contains("respondendo: Pode enviar?"));
        assert!(titulo.contains("contrato.pdf"));

        painel.enviando_anexo = true;
        assert!(titulo_composer(&painel).contains("enviando anexo..."));
    }
}
