use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::usuario::UsuarioSimples;

// ============================================================================
// Mensagens e conversas
// ============================================================================

/// Placeholder shown in place of deleted messages. Deleted messages stay in
/// the transcript; only their content is replaced.
pub const MENSAGEM_APAGADA: &str = "Mensagem apagada";

/// Kind of message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TipoMensagem {
    #[default]
    #[serde(rename = "texto")]
    Texto,
    #[serde(rename = "imagem")]
    Imagem,
    #[serde(rename = "arquivo")]
    Arquivo,
    #[serde(rename = "audio")]
    Audio,
}

/// Delivery state as the server reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusMensagem {
    #[default]
    #[serde(rename = "enviada")]
    Enviada,
    #[serde(rename = "entregue")]
    Entregue,
    #[serde(rename = "lida")]
    Lida,
}

impl StatusMensagem {
    /// Tick marks rendered next to own messages.
    pub fn marcador(&self) -> &'static str {
        match self {
            StatusMensagem::Enviada => "✓",
            StatusMensagem::Entregue => "✓✓",
            StatusMensagem::Lida => "✓✓ lida",
        }
    }
}

/// Uploaded file referenced by a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anexo {
    pub url: String,
    pub nome: String,
    /// Size in bytes.
    pub tamanho: u64,
}

/// One message of a direct conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mensagem {
    pub id: i64,
    pub remetente_id: i64,
    pub destinatario_id: i64,
    pub conteudo: String,
    #[serde(default)]
    pub tipo: TipoMensagem,
    pub anexo: Option<Anexo>,
    pub resposta_a_id: Option<i64>,
    /// Emoji mapped to the ids of the users who reacted with it.
    #[serde(default)]
    pub reacoes: BTreeMap<String, Vec<i64>>,
    #[serde(default)]
    pub editada: bool,
    #[serde(default)]
    pub apagada: bool,
    #[serde(default)]
    pub status: StatusMensagem,
    pub data_envio: DateTime<Utc>,
}

impl Mensagem {
    /// Edit and delete are offered only on the user's own live messages.
    pub fn pode_alterar(&self, usuario_id: i64) -> bool {
        self.remetente_id == usuario_id && !self.apagada
    }

    /// Transcript text, with the fixed placeholder for deleted messages.
    pub fn texto_exibicao(&self) -> &str {
        if self.apagada {
            MENSAGEM_APAGADA
        } else {
            &self.conteudo
        }
    }

    /// Whether `usuario_id` already reacted with `emoji`.
    pub fn reagiu(&self, emoji: &str, usuario_id: i64) -> bool {
        self.reacoes
            .get(emoji)
            .is_some_and(|ids| ids.contains(&usuario_id))
    }
}

/// One row of the conversation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversa {
    pub usuario: UsuarioSimples,
    pub ultima_mensagem: Option<String>,
    pub data_ultima_mensagem: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mensagens_nao_lidas: u32,
}

/// Poll answer: messages after the caller's cursor plus peer presence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversaSync {
    #[serde(default)]
    pub mensagens: Vec<Mensagem>,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub digitando: bool,
}

/// Body of `POST /api/mensagens/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovaMensagem {
    pub destinatario_id: i64,
    pub conteudo: String,
    pub tipo: TipoMensagem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resposta_a_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anexo: Option<Anexo>,
}

impl NovaMensagem {
    pub fn texto(destinatario_id: i64, conteudo: impl Into<String>) -> Self {
        Self {
            destinatario_id,
            conteudo: conteudo.into(),
            tipo: TipoMensagem::Texto,
            resposta_a_id: None,
            anexo: None,
        }
    }
}

/// Body of `POST /api/mensagens/digitando`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvisoDigitando {
    pub destinatario_id: i64,
    pub digitando: bool,
}

/// Body of `POST /api/mensagens/{id}/reagir`. Reacting twice with the same
/// emoji removes the reaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReacaoMensagem {
    pub emoji: String,
}

/// Body of `PUT /api/mensagens/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdicaoMensagem {
    pub conteudo: String,
}

/// Body of `GET /api/mensagens/nao-lidas/contagem`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContagemNaoLidas {
    pub count: u64,
}

// ============================================================================
// Transcript cache
// ============================================================================

/// Messages of the open conversation, kept in ascending-id order.
///
/// Polling overlaps with what is already on screen, so merging must be
/// idempotent: a message whose id is cached is ignored. `ultima_vista` is the
/// poll cursor and only ever moves forward.
#[derive(Debug, Clone, Default)]
pub struct Transcricao {
    mensagens: Vec<Mensagem>,
    ultima_vista: i64,
}

impl Transcricao {
    pub fn nova(historico: Vec<Mensagem>) -> Self {
        let mut transcricao = Self::default();
        transcricao.mesclar(historico);
        transcricao
    }

    /// Inserts the messages that are not yet cached, preserving id order.
    /// Returns how many were actually new.
    pub fn mesclar(&mut self, novas: Vec<Mensagem>) -> usize {
        let mut inseridas = 0;
        for mensagem in novas {
            match self
                .mensagens
                .binary_search_by_key(&mensagem.id, |m| m.id)
            {
                Ok(_) => {}
                Err(pos) => {
                    self.ultima_vista = self.ultima_vista.max(mensagem.id);
                    self.mensagens.insert(pos, mensagem);
                    inseridas += 1;
                }
            }
        }
        inseridas
    }

    /// Replaces the cache with a fresh full fetch (after edit, delete or
    /// reaction the server copy wins). The cursor never moves backwards.
    pub fn substituir(&mut self, mut historico: Vec<Mensagem>) {
        historico.sort_by_key(|m| m.id);
        historico.dedup_by_key(|m| m.id);
        if let Some(max) = historico.last().map(|m| m.id) {
            self.ultima_vista = self.ultima_vista.max(max);
        }
        self.mensagens = historico;
    }

    pub fn mensagens(&self) -> &[Mensagem] {
        &self.mensagens
    }

    pub fn buscar(&self, id: i64) -> Option<&Mensagem> {
        self.mensagens
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|pos| &self.mensagens[pos])
    }

    /// Poll cursor: the largest id ever seen in this conversation.
    pub fn ultima_vista(&self) -> i64 {
        self.ultima_vista
    }

    pub fn len(&self) -> usize {
        self.mensagens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mensagens.is_empty()
    }
}
