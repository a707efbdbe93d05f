//! Terminal output helpers and the view-models the screens render from.
//!
//! Screens never format straight out of the wire types: they build a
//! view-model here and print it. That keeps what-is-shown testable without a
//! terminal.

use std::io::{self, Write};

use shared::mensagem::{Mensagem, Transcricao};
use shared::page::{janela_paginas, Paginada};
use shared::texto;

pub fn sucesso(texto: &str) {
    println!("\x1b[1;32m✅ {texto}\x1b[0m");
}

pub fn erro(texto: &str) {
    eprintln!("\x1b[1;31m❌ {texto}\x1b[0m");
}

pub fn aviso(texto: &str) {
    eprintln!("\x1b[33m⚠️  {texto}\x1b[0m");
}

pub fn info(texto: &str) {
    println!("\x1b[90m{texto}\x1b[0m");
}

pub fn titulo(texto: &str) {
    println!("\x1b[1;36m{texto}\x1b[0m");
}

/// Asks before a destructive action. Anything but "s"/"sim" declines.
pub fn confirmar(pergunta: &str) -> bool {
    print!("\x1b[33m{pergunta}\x1b[0m (s/N): ");
    let _ = io::stdout().flush();
    let mut resposta = String::new();
    if io::stdin().read_line(&mut resposta).is_err() {
        return false;
    }
    matches!(resposta.trim().to_lowercase().as_str(), "s" | "sim")
}

/// Reads one line under a label; an empty answer becomes `None`.
pub fn perguntar(rotulo: &str) -> Option<String> {
    print!("{rotulo}: ");
    let _ = io::stdout().flush();
    let mut resposta = String::new();
    if io::stdin().read_line(&mut resposta).is_err() {
        return None;
    }
    let resposta = resposta.trim();
    (!resposta.is_empty()).then(|| resposta.to_string())
}

/// Plain-text table with columns sized to the widest cell. Widths count
/// characters, not bytes, so accented text lines up.
pub fn tabela(colunas: &[&str], linhas: &[Vec<String>]) -> String {
    let mut larguras: Vec<usize> = colunas.iter().map(|c| c.chars().count()).collect();
    for linha in linhas {
        for (i, celula) in linha.iter().enumerate() {
            if i < larguras.len() {
                larguras[i] = larguras[i].max(celula.chars().count());
            }
        }
    }

    let mut saida = String::new();
    let cabecalho: Vec<String> = colunas
        .iter()
        .enumerate()
        .map(|(i, coluna)| format!("{:<largura$}", coluna, largura = larguras[i]))
        .collect();
    saida.push_str(&format!("\x1b[1m{}\x1b[0m\n", cabecalho.join("  ")));

    let total: usize = larguras.iter().sum::<usize>() + 2 * (larguras.len().saturating_sub(1));
    saida.push_str(&"─".repeat(total));
    saida.push('\n');

    for linha in linhas {
        let celulas: Vec<String> = linha
            .iter()
            .enumerate()
            .map(|(i, celula)| {
                let largura = larguras.get(i).copied().unwrap_or(0);
                format!("{:<largura$}", celula, largura = largura)
            })
            .collect();
        saida.push_str(celulas.join("  ").trim_end());
        saida.push('\n');
    }
    saida
}

// ============================================================================
// Pagination footer
// ============================================================================

/// What the pager shows for one page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginacao {
    pub pagina: u32,
    pub total_paginas: u32,
    /// Numbered buttons, at most five, always containing `pagina`.
    pub botoes: Vec<u32>,
    pub de: u64,
    pub ate: u64,
    pub total: u64,
    pub tem_anterior: bool,
    pub tem_proxima: bool,
}

impl Paginacao {
    pub fn montar<T>(pagina: &Paginada<T>) -> Self {
        let (de, ate) = pagina.intervalo();
        Self {
            pagina: pagina.page,
            total_paginas: pagina.total_pages,
            botoes: janela_paginas(pagina.page, pagina.total_pages),
            de,
            ate,
            total: pagina.total_count,
            tem_anterior: pagina.tem_anterior(),
            tem_proxima: pagina.tem_proxima(),
        }
    }
}

/// "Mostrando X a Y de Z" plus the numbered window when there is more than
/// one page.
pub fn rodape_paginacao(paginacao: &Paginacao) -> String {
    if paginacao.total == 0 {
        return "Nenhum resultado encontrado".to_string();
    }
    let mut linha = format!(
        "Mostrando {} a {} de {}",
        paginacao.de, paginacao.ate, paginacao.total
    );
    if paginacao.total_paginas > 1 {
        let botoes: Vec<String> = paginacao
            .botoes
            .iter()
            .map(|n| {
                if *n == paginacao.pagina {
                    format!("[{n}]")
                } else {
                    n.to_string()
                }
            })
            .collect();
        let anterior = if paginacao.tem_anterior { "‹" } else { " " };
        let proxima = if paginacao.tem_proxima { "›" } else { " " };
        linha.push_str(&format!(
            "  ·  {anterior} {} {proxima}  (--pagina N)",
            botoes.join(" ")
        ));
    }
    linha
}

// ============================================================================
// Chat transcript lines
// ============================================================================

/// Actions the transcript offers on a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acao {
    Responder,
    Reagir,
    Editar,
    Apagar,
}

impl Acao {
    pub fn rotulo(&self) -> &'static str {
        match self {
            Acao::Responder => "Responder",
            Acao::Reagir => "Reagir",
            Acao::Editar => "Editar",
            Acao::Apagar => "Apagar",
        }
    }
}

/// One rendered transcript line.
#[derive(Debug, Clone)]
pub struct LinhaMensagem {
    pub id: i64,
    pub propria: bool,
    pub autor: String,
    pub hora: String,
    pub texto: String,
    pub editada: bool,
    /// Delivery ticks, only on own live messages.
    pub marcador: Option<&'static str>,
    /// "👍 2 · ❤️ 1", absent when nobody reacted.
    pub reacoes: Option<String>,
    /// Excerpt of the replied-to message.
    pub citacao: Option<String>,
    /// "📎 nome (3,2 KB)".
    pub anexo: Option<String>,
    pub acoes: Vec<Acao>,
}

/// Builds the view-model of one message as the transcript shows it. Deleted
/// messages keep their place with the fixed placeholder and lose everything
/// else: attachment, reactions and actions.
pub fn linha_mensagem(
    mensagem: &Mensagem,
    usuario_id: i64,
    nome_proprio: &str,
    nome_peer: &str,
    transcricao: &Transcricao,
) -> LinhaMensagem {
    let propria = mensagem.remetente_id == usuario_id;
    let autor = if propria { nome_proprio } else { nome_peer };

    let citacao = mensagem
        .resposta_a_id
        .and_then(|id| transcricao.buscar(id))
        .map(|alvo| texto::truncar(alvo.texto_exibicao(), 40));

    let anexo = if mensagem.apagada {
        None
    } else {
        mensagem.anexo.as_ref().map(|anexo| {
            format!(
                "📎 {} ({})",
                anexo.nome,
                texto::tamanho_arquivo(anexo.tamanho)
            )
        })
    };

    let reacoes = if mensagem.apagada || mensagem.reacoes.is_empty() {
        None
    } else {
        let resumo: Vec<String> = mensagem
            .reacoes
            .iter()
            .filter(|(_, quem)| !quem.is_empty())
            .map(|(emoji, quem)| format!("{emoji} {}", quem.len()))
            .collect();
        if resumo.is_empty() {
            None
        } else {
            Some(resumo.join(" · "))
        }
    };

    let acoes = if mensagem.apagada {
        Vec::new()
    } else if mensagem.pode_alterar(usuario_id) {
        vec![Acao::Responder, Acao::Reagir, Acao::Editar, Acao::Apagar]
    } else {
        vec![Acao::Responder, Acao::Reagir]
    };

    LinhaMensagem {
        id: mensagem.id,
        propria,
        autor: autor.to_string(),
        hora: texto::hora_curta(&mensagem.data_envio),
        texto: mensagem.texto_exibicao().to_string(),
        editada: mensagem.editada && !mensagem.apagada,
        marcador: (propria && !mensagem.apagada).then(|| mensagem.status.marcador()),
        reacoes,
        citacao,
        anexo,
        acoes,
    }
}
