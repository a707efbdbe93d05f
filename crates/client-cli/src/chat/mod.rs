//! Conversation controller: timers, transcript state and the message
//! endpoints behind the chat screen.
//!
//! The server has no push channel, so presence and new messages arrive by
//! polling. Each concern owns exactly one timer; switching conversations bumps
//! a generation counter so an answer that was already in flight for the
//! previous conversation is discarded instead of applied.

pub mod anexo;

use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use shared::mensagem::{
    Anexo, AvisoDigitando, ContagemNaoLidas, Conversa, ConversaSync, EdicaoMensagem, Mensagem,
    NovaMensagem, ReacaoMensagem, TipoMensagem, Transcricao,
};
use shared::usuario::UsuarioSimples;

use crate::api::{ApiClient, ApiResult};
use anexo::AnexoInvalido;

/// Poll cadence of the open conversation.
const POLL_CONVERSA: Duration = Duration::from_secs(2);
/// Presence heartbeat cadence.
const INTERVALO_HEARTBEAT: Duration = Duration::from_secs(30);
/// Conversation list refresh cadence.
const INTERVALO_LISTA: Duration = Duration::from_secs(10);
/// Idle time in the composer before the peer is told typing stopped.
const DEBOUNCE_DIGITANDO: Duration = Duration::from_millis(3000);

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Api(#[from] crate::api::ApiError),

    #[error(transparent)]
    Anexo(#[from] AnexoInvalido),

    #[error("Erro ao ler o arquivo: {0}")]
    Io(#[from] std::io::Error),

    #[error("Aguarde o envio do anexo atual")]
    UploadEmAndamento,

    #[error("Nenhuma conversa aberta")]
    SemConversa,

    #[error("Mensagem não encontrada")]
    MensagemDesconhecida,

    #[error("Apenas suas mensagens podem ser alteradas")]
    SomenteProprias,
}

/// Message endpoints the controller talks to.
pub trait ChatApi: Send + Sync + 'static {
    fn conversas(&self) -> impl Future<Output = ApiResult<Vec<Conversa>>> + Send;

    fn historico(&self, usuario_id: i64) -> impl Future<Output = ApiResult<Vec<Mensagem>>> + Send;

    fn sincronizar(
        &self,
        usuario_id: i64,
        depois_de: i64,
    ) -> impl Future<Output = ApiResult<ConversaSync>> + Send;

    fn enviar_mensagem(
        &self,
        corpo: &NovaMensagem,
    ) -> impl Future<Output = ApiResult<Mensagem>> + Send;

    fn avisar_digitando(&self, aviso: AvisoDigitando)
        -> impl Future<Output = ApiResult<()>> + Send;

    fn heartbeat(&self) -> impl Future<Output = ApiResult<()>> + Send;

    fn enviar_anexo(
        &self,
        nome: &str,
        mime: &str,
        dados: Vec<u8>,
    ) -> impl Future<Output = ApiResult<Anexo>> + Send;

    fn reagir(&self, mensagem_id: i64, emoji: &str)
        -> impl Future<Output = ApiResult<()>> + Send;

    fn editar(
        &self,
        mensagem_id: i64,
        conteudo: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn apagar(&self, mensagem_id: i64) -> impl Future<Output = ApiResult<()>> + Send;

    fn nao_lidas(&self) -> impl Future<Output = ApiResult<u64>> + Send;
}

impl ChatApi for ApiClient {
    async fn conversas(&self) -> ApiResult<Vec<Conversa>> {
        self.get("/api/mensagens/conversas").await
    }

    async fn historico(&self, usuario_id: i64) -> ApiResult<Vec<Mensagem>> {
        self.get(&format!("/api/mensagens/conversa/{usuario_id}")).await
    }

    async fn sincronizar(&self, usuario_id: i64, depois_de: i64) -> ApiResult<ConversaSync> {
        self.get(&format!(
            "/api/mensagens/conversa/{usuario_id}/sync?depois_de={depois_de}"
        ))
        .await
    }

    async fn enviar_mensagem(&self, corpo: &NovaMensagem) -> ApiResult<Mensagem> {
        self.post("/api/mensagens/", corpo).await
    }

    async fn avisar_digitando(&self, aviso: AvisoDigitando) -> ApiResult<()> {
        let _: serde_json::Value = self.post("/api/mensagens/digitando", &aviso).await?;
        Ok(())
    }

    async fn heartbeat(&self) -> ApiResult<()> {
        self.post_vazio("/api/mensagens/heartbeat").await
    }

    async fn enviar_anexo(&self, nome: &str, mime: &str, dados: Vec<u8>) -> ApiResult<Anexo> {
        self.upload("/api/mensagens/upload", nome, mime, dados).await
    }

    async fn reagir(&self, mensagem_id: i64, emoji: &str) -> ApiResult<()> {
        let corpo = ReacaoMensagem {
            emoji: emoji.to_string(),
        };
        let _: serde_json::Value = self
            .post(&format!("/api/mensagens/{mensagem_id}/reagir"), &corpo)
            .await?;
        Ok(())
    }

    async fn editar(&self, mensagem_id: i64, conteudo: &str) -> ApiResult<()> {
        let corpo = EdicaoMensagem {
            conteudo: conteudo.to_string(),
        };
        let _: serde_json::Value = self
            .put(&format!("/api/mensagens/{mensagem_id}"), &corpo)
            .await?;
        Ok(())
    }

    async fn apagar(&self, mensagem_id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/mensagens/{mensagem_id}")).await
    }

    async fn nao_lidas(&self) -> ApiResult<u64> {
        let contagem: ContagemNaoLidas = self.get("/api/mensagens/nao-lidas/contagem").await?;
        Ok(contagem.count)
    }
}

/// Owns at most one background task. Starting again replaces the previous
/// task; dropping the holder stops it.
struct Temporizador {
    tarefa: Option<JoinHandle<()>>,
}

impl Temporizador {
    const fn novo() -> Self {
        Self { tarefa: None }
    }

    fn iniciar(&mut self, tarefa: JoinHandle<()>) {
        self.parar();
        self.tarefa = Some(tarefa);
    }

    fn parar(&mut self) {
        if let Some(tarefa) = self.tarefa.take() {
            tarefa.abort();
        }
    }
}

impl Drop for Temporizador {
    fn drop(&mut self) {
        self.parar();
    }
}

/// Upload already accepted by the server, waiting for the next send.
#[derive(Debug, Clone)]
pub struct AnexoPendente {
    pub anexo: Anexo,
    pub tipo: TipoMensagem,
}

/// Conversation currently on screen.
#[derive(Debug)]
pub struct ConversaAberta {
    pub peer: UsuarioSimples,
    pub transcricao: Transcricao,
    pub online: bool,
    pub digitando: bool,
    /// Id of the message the next send replies to.
    pub respondendo_a: Option<i64>,
    pub anexo_pendente: Option<AnexoPendente>,
    /// True while an upload is in flight; sending is blocked meanwhile.
    pub enviando_anexo: bool,
}

impl ConversaAberta {
    fn nova(peer: UsuarioSimples, historico: Vec<Mensagem>) -> Self {
        Self {
            online: peer.online,
            peer,
            transcricao: Transcricao::nova(historico),
            digitando: false,
            respondendo_a: None,
            anexo_pendente: None,
            enviando_anexo: false,
        }
    }
}

/// Everything the chat screen renders from.
#[derive(Debug, Default)]
pub struct EstadoChat {
    pub conversas: Vec<Conversa>,
    pub aberta: Option<ConversaAberta>,
    pub nao_lidas_total: u64,
}

/// Chat controller: owns the timers and the shared state.
///
/// Timers: one poll scoped to the open conversation, one list refresh, one
/// heartbeat and one typing debounce. `geracao` is bumped on every
/// open/close; poll answers carry the generation they were born under and
/// [`aplicar_sync`] drops the stale ones.
pub struct ChatSession<A: ChatApi> {
    api: Arc<A>,
    usuario_id: i64,
    estado: Arc<Mutex<EstadoChat>>,
    geracao: Arc<AtomicU64>,
    poll: Temporizador,
    lista: Temporizador,
    heartbeat: Temporizador,
    debounce: Temporizador,
    /// True between the first keystroke of a burst and its trailing
    /// `digitando: false`.
    em_burst: Arc<AtomicBool>,
}

impl<A: ChatApi> ChatSession<A> {
    pub fn nova(api: A, usuario_id: i64) -> Self {
        Self {
            api: Arc::new(api),
            usuario_id,
            estado: Arc::new(Mutex::new(EstadoChat::default())),
            geracao: Arc::new(AtomicU64::new(0)),
            poll: Temporizador::novo(),
            lista: Temporizador::novo(),
            heartbeat: Temporizador::novo(),
            debounce: Temporizador::novo(),
            em_burst: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn usuario_id(&self) -> i64 {
        self.usuario_id
    }

    /// Shared handle the screen reads from.
    pub fn estado(&self) -> Arc<Mutex<EstadoChat>> {
        self.estado.clone()
    }

    /// First load plus the conversation-independent timers (list refresh and
    /// heartbeat). The poll timer only exists while a conversation is open.
    pub async fn iniciar(&mut self) -> ApiResult<()> {
        self.carregar_conversas().await?;

        let api = self.api.clone();
        let estado = self.estado.clone();
        self.lista.iniciar(tokio::spawn(async move {
            let mut intervalo = tokio::time::interval(INTERVALO_LISTA);
            // a primeira batida é imediata e a lista acabou de ser carregada
            intervalo.tick().await;
            loop {
                intervalo.tick().await;
                match api.conversas().await {
                    Ok(conversas) => estado.lock().await.conversas = conversas,
                    Err(erro) => tracing::warn!("falha ao atualizar conversas: {erro}"),
                }
                match api.nao_lidas().await {
                    Ok(total) => estado.lock().await.nao_lidas_total = total,
                    Err(erro) => tracing::warn!("falha ao contar não lidas: {erro}"),
                }
            }
        }));

        let api = self.api.clone();
        self.heartbeat.iniciar(tokio::spawn(async move {
            let mut intervalo = tokio::time::interval(INTERVALO_HEARTBEAT);
            loop {
                intervalo.tick().await;
                if let Err(erro) = api.heartbeat().await {
                    tracing::warn!("heartbeat falhou: {erro}");
                }
            }
        }));

        Ok(())
    }

    pub async fn carregar_conversas(&self) -> ApiResult<()> {
        let conversas = self.api.conversas().await?;
        let total = self.api.nao_lidas().await?;
        let mut estado = self.estado.lock().await;
        estado.conversas = conversas;
        estado.nao_lidas_total = total;
        Ok(())
    }

    /// Opens the conversation with `peer` and rescopes the poll timer to it.
    ///
    /// The history fetch happens first: if it fails, whatever conversation
    /// was open stays untouched and still polling.
    pub async fn abrir(&mut self, peer: UsuarioSimples) -> ApiResult<()> {
        let historico = self.api.historico(peer.id).await?;

        if let Some(antigo) = self.peer_aberto().await {
            self.encerrar_burst(antigo).await;
        }
        let geracao = self.geracao.fetch_add(1, Ordering::SeqCst) + 1;
        self.poll.parar();

        let peer_id = peer.id;
        {
            let mut estado = self.estado.lock().await;
            estado.aberta = Some(ConversaAberta::nova(peer, historico));
            // o servidor marca como lidas ao entregar o histórico
            if let Some(conversa) = estado
                .conversas
                .iter_mut()
                .find(|c| c.usuario.id == peer_id)
            {
                conversa.mensagens_nao_lidas = 0;
            }
        }

        let api = self.api.clone();
        let estado = self.estado.clone();
        let contador = self.geracao.clone();
        self.poll.iniciar(tokio::spawn(async move {
            let mut intervalo = tokio::time::interval(POLL_CONVERSA);
            // pula a batida imediata: o histórico acabou de chegar
            intervalo.tick().await;
            loop {
                intervalo.tick().await;
                let depois_de = {
                    let estado = estado.lock().await;
                    match &estado.aberta {
                        Some(aberta) if aberta.peer.id == peer_id => {
                            aberta.transcricao.ultima_vista()
                        }
                        _ => break,
                    }
                };
                match api.sincronizar(peer_id, depois_de).await {
                    Ok(sync) => {
                        let mut estado = estado.lock().await;
                        aplicar_sync(&mut estado, &contador, geracao, peer_id, sync);
                    }
                    Err(erro) => tracing::warn!("poll da conversa falhou: {erro}"),
                }
            }
        }));

        Ok(())
    }

    /// Leaves the open conversation: stops its poll and closes any typing
    /// burst so the peer does not stay "digitando..." forever.
    pub async fn fechar_conversa(&mut self) {
        self.poll.parar();
        self.geracao.fetch_add(1, Ordering::SeqCst);
        let peer_id = {
            let mut estado = self.estado.lock().await;
            estado.aberta.take().map(|aberta| aberta.peer.id)
        };
        if let Some(peer_id) = peer_id {
            self.encerrar_burst(peer_id).await;
        }
    }

    /// Sends the composer content. The reply mark and the pending attachment
    /// are consumed only after the server accepts the message. An empty
    /// composer without attachment sends nothing.
    pub async fn enviar(&mut self, texto: &str) -> Result<(), ChatError> {
        let texto = texto.trim();
        let (peer_id, corpo) = {
            let estado = self.estado.lock().await;
            let aberta = estado.aberta.as_ref().ok_or(ChatError::SemConversa)?;
            if aberta.enviando_anexo {
                return Err(ChatError::UploadEmAndamento);
            }
            if texto.is_empty() && aberta.anexo_pendente.is_none() {
                return Ok(());
            }
            let corpo = match &aberta.anexo_pendente {
                Some(pendente) => NovaMensagem {
                    destinatario_id: aberta.peer.id,
                    conteudo: texto.to_string(),
                    tipo: pendente.tipo,
                    resposta_a_id: aberta.respondendo_a,
                    anexo: Some(pendente.anexo.clone()),
                },
                None => NovaMensagem {
                    resposta_a_id: aberta.respondendo_a,
                    ..NovaMensagem::texto(aberta.peer.id, texto)
                },
            };
            (aberta.peer.id, corpo)
        };

        let mensagem = self.api.enviar_mensagem(&corpo).await?;
        self.encerrar_burst(peer_id).await;

        let mut estado = self.estado.lock().await;
        if let Some(aberta) = estado.aberta.as_mut() {
            if aberta.peer.id == peer_id {
                aberta.respondendo_a = None;
                aberta.anexo_pendente = None;
                aberta.transcricao.mesclar(vec![mensagem]);
            }
        }
        Ok(())
    }

    /// Validates and uploads a file. The upload stays pending in the composer
    /// until the next send. A file that fails validation never leaves the
    /// machine.
    pub async fn anexar(&mut self, caminho: &Path) -> Result<Anexo, ChatError> {
        let nome = caminho
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tamanho = tokio::fs::metadata(caminho).await?.len();
        anexo::validar(&nome, tamanho)?;
        let dados = tokio::fs::read(caminho).await?;
        self.anexar_dados(&nome, dados).await
    }

    async fn anexar_dados(&mut self, nome: &str, dados: Vec<u8>) -> Result<Anexo, ChatError> {
        let mime = anexo::validar(nome, dados.len() as u64)?;
        let peer_id = {
            let mut estado = self.estado.lock().await;
            let aberta = estado.aberta.as_mut().ok_or(ChatError::SemConversa)?;
            if aberta.enviando_anexo {
                return Err(ChatError::UploadEmAndamento);
            }
            aberta.enviando_anexo = true;
            aberta.peer.id
        };

        let enviado = self.api.enviar_anexo(nome, mime, dados).await;

        let mut estado = self.estado.lock().await;
        let aberta = estado
            .aberta
            .as_mut()
            .filter(|aberta| aberta.peer.id == peer_id)
            .ok_or(ChatError::SemConversa)?;
        aberta.enviando_anexo = false;
        match enviado {
            Ok(anexo) => {
                aberta.anexo_pendente = Some(AnexoPendente {
                    tipo: anexo::tipo_para_mime(mime),
                    anexo: anexo.clone(),
                });
                Ok(anexo)
            }
            Err(erro) => {
                aberta.anexo_pendente = None;
                Err(erro.into())
            }
        }
    }

    pub async fn descartar_anexo(&mut self) {
        if let Some(aberta) = self.estado.lock().await.aberta.as_mut() {
            aberta.anexo_pendente = None;
        }
    }

    /// Marks a transcript message as the reply target of the next send.
    pub async fn responder(&mut self, mensagem_id: i64) -> Result<(), ChatError> {
        let mut estado = self.estado.lock().await;
        let aberta = estado.aberta.as_mut().ok_or(ChatError::SemConversa)?;
        if aberta.transcricao.buscar(mensagem_id).is_none() {
            return Err(ChatError::MensagemDesconhecida);
        }
        aberta.respondendo_a = Some(mensagem_id);
        Ok(())
    }

    pub async fn cancelar_resposta(&mut self) {
        if let Some(aberta) = self.estado.lock().await.aberta.as_mut() {
            aberta.respondendo_a = None;
        }
    }

    /// Toggles `emoji` on a message, then refreshes the transcript with the
    /// server copy.
    pub async fn reagir(&mut self, mensagem_id: i64, emoji: &str) -> Result<(), ChatError> {
        let peer_id = self.peer_aberto().await.ok_or(ChatError::SemConversa)?;
        self.api.reagir(mensagem_id, emoji).await?;
        self.recarregar(peer_id).await?;
        Ok(())
    }

    pub async fn editar(&mut self, mensagem_id: i64, conteudo: &str) -> Result<(), ChatError> {
        let peer_id = self.conferir_propria(mensagem_id).await?;
        self.api.editar(mensagem_id, conteudo).await?;
        self.recarregar(peer_id).await?;
        Ok(())
    }

    pub async fn apagar(&mut self, mensagem_id: i64) -> Result<(), ChatError> {
        let peer_id = self.conferir_propria(mensagem_id).await?;
        self.api.apagar(mensagem_id).await?;
        self.recarregar(peer_id).await?;
        Ok(())
    }

    /// Called on every composer keystroke. The first keystroke of a burst
    /// sends `digitando: true`; every keystroke rearms the trailing `false`,
    /// which fires once the composer stays idle for [`DEBOUNCE_DIGITANDO`].
    pub async fn tecla_digitada(&mut self) {
        let Some(peer_id) = self.peer_aberto().await else {
            return;
        };
        if !self.em_burst.swap(true, Ordering::SeqCst) {
            let aviso = AvisoDigitando {
                destinatario_id: peer_id,
                digitando: true,
            };
            if let Err(erro) = self.api.avisar_digitando(aviso).await {
                tracing::warn!("aviso de digitação falhou: {erro}");
            }
        }
        let api = self.api.clone();
        let em_burst = self.em_burst.clone();
        self.debounce.iniciar(tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE_DIGITANDO).await;
            em_burst.store(false, Ordering::SeqCst);
            let aviso = AvisoDigitando {
                destinatario_id: peer_id,
                digitando: false,
            };
            if let Err(erro) = api.avisar_digitando(aviso).await {
                tracing::warn!("aviso de digitação falhou: {erro}");
            }
        }));
    }

    /// Tears the screen down: every timer stops and an open burst is closed.
    pub async fn encerrar(&mut self) {
        self.poll.parar();
        self.lista.parar();
        self.heartbeat.parar();
        self.geracao.fetch_add(1, Ordering::SeqCst);
        if let Some(peer_id) = self.peer_aberto().await {
            self.encerrar_burst(peer_id).await;
        }
        self.estado.lock().await.aberta = None;
    }

    /// Full re-fetch of the open conversation. Edits, deletions and reactions
    /// change rows the incremental poll never re-sends.
    async fn recarregar(&self, peer_id: i64) -> ApiResult<()> {
        let historico = self.api.historico(peer_id).await?;
        let mut estado = self.estado.lock().await;
        if let Some(aberta) = estado.aberta.as_mut() {
            if aberta.peer.id == peer_id {
                aberta.transcricao.substituir(historico);
            }
        }
        Ok(())
    }

    async fn conferir_propria(&self, mensagem_id: i64) -> Result<i64, ChatError> {
        let estado = self.estado.lock().await;
        let aberta = estado.aberta.as_ref().ok_or(ChatError::SemConversa)?;
        let mensagem = aberta
            .transcricao
            .buscar(mensagem_id)
            .ok_or(ChatError::MensagemDesconhecida)?;
        if !mensagem.pode_alterar(self.usuario_id) {
            return Err(ChatError::SomenteProprias);
        }
        Ok(aberta.peer.id)
    }

    async fn encerrar_burst(&mut self, peer_id: i64) {
        self.debounce.parar();
        if self.em_burst.swap(false, Ordering::SeqCst) {
            let aviso = AvisoDigitando {
                destinatario_id: peer_id,
                digitando: false,
            };
            if let Err(erro) = self.api.avisar_digitando(aviso).await {
                tracing::warn!("aviso de digitação falhou: {erro}");
            }
        }
    }

    async fn peer_aberto(&self) -> Option<i64> {
        self.estado
            .lock()
            .await
            .aberta
            .as_ref()
            .map(|aberta| aberta.peer.id)
    }
}

/// Applies one poll answer to the state. Answers born under an older
/// generation, or aimed at a conversation no longer open, are discarded.
fn aplicar_sync(
    estado: &mut EstadoChat,
    contador: &AtomicU64,
    geracao: u64,
    peer_id: i64,
    sync: ConversaSync,
) -> bool {
    if contador.load(Ordering::SeqCst) != geracao {
        return false;
    }
    let Some(aberta) = estado.aberta.as_mut() else {
        return false;
    };
    if aberta.peer.id != peer_id {
        return false;
    }
    aberta.online = sync.online;
    aberta.digitando = sync.digitando;
    aberta.transcricao.mesclar(sync.mensagens);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;

    use chrono::Utc;
    use shared::mensagem::StatusMensagem;

    #[derive(Clone, Default)]
    struct FakeApi {
        mensagens: Arc<StdMutex<BTreeMap<i64, Vec<Mensagem>>>>,
        syncs: Arc<StdMutex<Vec<i64>>>,
        avisos: Arc<StdMutex<Vec<AvisoDigitando>>>,
        envios: Arc<StdMutex<Vec<NovaMensagem>>>,
        uploads: Arc<AtomicUsize>,
        reacoes: Arc<AtomicUsize>,
        edicoes: Arc<AtomicUsize>,
        exclusoes: Arc<AtomicUsize>,
        heartbeats: Arc<AtomicUsize>,
    }

    impl FakeApi {
        fn com_historico(self, peer_id: i64, mensagens: Vec<Mensagem>) -> Self {
            self.mensagens.lock().unwrap().insert(peer_id, mensagens);
            self
        }

        fn definir_historico(&self, peer_id: i64, mensagens: Vec<Mensagem>) {
            self.mensagens.lock().unwrap().insert(peer_id, mensagens);
        }

        fn avisos(&self) -> Vec<(i64, bool)> {
            self.avisos
                .lock()
                .unwrap()
                .iter()
                .map(|aviso| (aviso.destinatario_id, aviso.digitando))
                .collect()
        }
    }

    impl ChatApi for FakeApi {
        async fn conversas(&self) -> ApiResult<Vec<Conversa>> {
            Ok(Vec::new())
        }

        async fn historico(&self, usuario_id: i64) -> ApiResult<Vec<Mensagem>> {
            Ok(self
                .mensagens
                .lock()
                .unwrap()
                .get(&usuario_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn sincronizar(&self, usuario_id: i64, _depois_de: i64) -> ApiResult<ConversaSync> {
            self.syncs.lock().unwrap().push(usuario_id);
            Ok(ConversaSync::default())
        }

        async fn enviar_mensagem(&self, corpo: &NovaMensagem) -> ApiResult<Mensagem> {
            let mut envios = self.envios.lock().unwrap();
            envios.push(corpo.clone());
            Ok(Mensagem {
                id: 1000 + envios.len() as i64,
                remetente_id: 1,
                destinatario_id: corpo.destinatario_id,
                conteudo: corpo.conteudo.clone(),
                tipo: corpo.tipo,
                anexo: corpo.anexo.clone(),
                resposta_a_id: corpo.resposta_a_id,
                reacoes: BTreeMap::new(),
                editada: false,
                apagada: false,
                status: StatusMensagem::Enviada,
                data_envio: Utc::now(),
            })
        }

        async fn avisar_digitando(&self, aviso: AvisoDigitando) -> ApiResult<()> {
            self.avisos.lock().unwrap().push(aviso);
            Ok(())
        }

        async fn heartbeat(&self) -> ApiResult<()> {
            self.heartbeats.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn enviar_anexo(&self, nome: &str, _mime: &str, dados: Vec<u8>) -> ApiResult<Anexo> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(Anexo {
                url: format!("/uploads/{nome}"),
                nome: nome.to_string(),
                tamanho: dados.len() as u64,
            })
        }

        async fn reagir(&self, _mensagem_id: i64, _emoji: &str) -> ApiResult<()> {
            self.reacoes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn editar(&self, _mensagem_id: i64, _conteudo: &str) -> ApiResult<()> {
            self.edicoes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn apagar(&self, _mensagem_id: i64) -> ApiResult<()> {
            self.exclusoes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn nao_lidas(&self) -> ApiResult<u64> {
            Ok(0)
        }
    }

    fn peer(id: i64) -> UsuarioSimples {
        UsuarioSimples {
            id,
            nome: format!("Usuário {id}"),
            email: None,
            foto_url: None,
            online: false,
        }
    }

    fn mensagem_de(id: i64, remetente_id: i64, conteudo: &str) -> Mensagem {
        Mensagem {
            id,
            remetente_id,
            destinatario_id: 1,
            conteudo: conteudo.to_string(),
            tipo: TipoMensagem::Texto,
            anexo: None,
            resposta_a_id: None,
            reacoes: BTreeMap::new(),
            editada: false,
            apagada: false,
            status: StatusMensagem::Enviada,
            data_envio: "2025-06-01T12:00:00Z".parse().unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_digitando_uma_vez_por_rajada() {
        let fake = FakeApi::default().com_historico(2, Vec::new());
        let mut sessao = ChatSession::nova(fake.clone(), 1);
        sessao.abrir(peer(2)).await.unwrap();

        // três teclas, sempre antes de o debounce vencer
        sessao.tecla_digitada().await;
        tokio::time::sleep(Duration::from_millis(2000)).await;
        sessao.tecla_digitada().await;
        tokio::time::sleep(Duration::from_millis(2000)).await;
        sessao.tecla_digitada().await;

        assert_eq!(fake.avisos(), vec![(2, true)]);

        tokio::time::sleep(DEBOUNCE_DIGITANDO + Duration::from_millis(100)).await;
        assert_eq!(fake.avisos(), vec![(2, true), (2, false)]);

        // nova rajada depois do silêncio abre outro ciclo
        sessao.tecla_digitada().await;
        tokio::time::sleep(DEBOUNCE_DIGITANDO + Duration::from_millis(100)).await;
        assert_eq!(
            fake.avisos(),
            vec![(2, true), (2, false), (2, true), (2, false)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_troca_de_conversa_reescopa_o_poll() {
        let fake = FakeApi::default()
            .com_historico(2, vec![mensagem_de(1, 2, "a")])
            .com_historico(3, vec![mensagem_de(2, 3, "b")]);
        let mut sessao = ChatSession::nova(fake.clone(), 1);

        sessao.abrir(peer(2)).await.unwrap();
        sessao.abrir(peer(3)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(7)).await;

        let sincronizados = fake.syncs.lock().unwrap().clone();
        assert!(!sincronizados.is_empty());
        assert!(sincronizados.iter().all(|peer_id| *peer_id == 3));

        let estado = sessao.estado();
        let estado = estado.lock().await;
        let aberta = estado.aberta.as_ref().unwrap();
        assert_eq!(aberta.peer.id, 3);
        assert_eq!(aberta.transcricao.len(), 1);
    }

    #[tokio::test]
    async fn test_resposta_de_geracao_antiga_e_descartada() {
        let contador = AtomicU64::new(5);
        let mut estado = EstadoChat {
            aberta: Some(ConversaAberta::nova(peer(2), Vec::new())),
            ..EstadoChat::default()
        };
        let sync = ConversaSync {
            mensagens: vec![mensagem_de(9, 2, "atrasada")],
            online: true,
            digitando: false,
        };

        // nasceu na geração 4, chegou depois da troca
        assert!(!aplicar_sync(&mut estado, &contador, 4, 2, sync.clone()));
        assert!(estado.aberta.as_ref().unwrap().transcricao.is_empty());

        // geração certa mas conversa errada
        assert!(!aplicar_sync(&mut estado, &contador, 5, 3, sync.clone()));

        assert!(aplicar_sync(&mut estado, &contador, 5, 2, sync));
        let aberta = estado.aberta.as_ref().unwrap();
        assert_eq!(aberta.transcricao.len(), 1);
        assert!(aberta.online);
    }

    #[tokio::test]
    async fn test_anexo_invalido_nao_sobe() {
        let fake = FakeApi::default().com_historico(2, Vec::new());
        let mut sessao = ChatSession::nova(fake.clone(), 1);
        sessao.abrir(peer(2)).await.unwrap();

        let grande = vec![0u8; (anexo::TAMANHO_MAXIMO + 1) as usize];
        let erro = sessao.anexar_dados("foto.png", grande).await.unwrap_err();
        assert!(matches!(erro, ChatError::Anexo(AnexoInvalido::MuitoGrande)));

        let erro = sessao
            .anexar_dados("script.exe", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(
            erro,
            ChatError::Anexo(AnexoInvalido::TipoNaoPermitido)
        ));

        assert_eq!(fake.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_anexo_fica_pendente_ate_o_envio() {
        let fake = FakeApi::default().com_historico(2, Vec::new());
        let mut sessao = ChatSession::nova(fake.clone(), 1);
        sessao.abrir(peer(2)).await.unwrap();

        sessao
            .anexar_dados("contrato.pdf", vec![1; 64])
            .await
            .unwrap();
        assert_eq!(fake.uploads.load(Ordering::SeqCst), 1);

        sessao.enviar("segue o contrato").await.unwrap();
        let envios = fake.envios.lock().unwrap();
        assert_eq!(envios.len(), 1);
        assert_eq!(envios[0].tipo, TipoMensagem::Arquivo);
        assert_eq!(
            envios[0].anexo.as_ref().unwrap().nome,
            "contrato.pdf"
        );
        drop(envios);

        let estado = sessao.estado();
        let estado = estado.lock().await;
        let aberta = estado.aberta.as_ref().unwrap();
        assert!(aberta.anexo_pendente.is_none());
        assert_eq!(aberta.transcricao.len(), 1);
    }

    #[tokio::test]
    async fn test_envio_bloqueado_durante_upload() {
        let fake = FakeApi::default().com_historico(2, Vec::new());
        let mut sessao = ChatSession::nova(fake.clone(), 1);
        sessao.abrir(peer(2)).await.unwrap();

        {
            let estado = sessao.estado();
            let mut estado = estado.lock().await;
            estado.aberta.as_mut().unwrap().enviando_anexo = true;
        }
        let erro = sessao.enviar("oi").await.unwrap_err();
        assert!(matches!(erro, ChatError::UploadEmAndamento));
        assert!(fake.envios.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_composer_vazio_nao_envia() {
        let fake = FakeApi::default().com_historico(2, Vec::new());
        let mut sessao = ChatSession::nova(fake.clone(), 1);
        sessao.abrir(peer(2)).await.unwrap();

        sessao.enviar("   ").await.unwrap();
        assert!(fake.envios.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reacao_recarrega_a_conversa() {
        let original = mensagem_de(1, 2, "oi");
        let mut reagida = original.clone();
        reagida.reacoes.insert("👍".to_string(), vec![1]);

        let fake = FakeApi::default().com_historico(2, vec![original]);
        let mut sessao = ChatSession::nova(fake.clone(), 1);
        sessao.abrir(peer(2)).await.unwrap();

        fake.definir_historico(2, vec![reagida]);
        sessao.reagir(1, "👍").await.unwrap();

        assert_eq!(fake.reacoes.load(Ordering::SeqCst), 1);
        let estado = sessao.estado();
        let estado = estado.lock().await;
        let aberta = estado.aberta.as_ref().unwrap();
        assert!(aberta.transcricao.buscar(1).unwrap().reagiu("👍", 1));
    }

    #[tokio::test]
    async fn test_alteracao_somente_das_proprias() {
        let alheia = mensagem_de(1, 2, "do outro");
        let fake = FakeApi::default().com_historico(2, vec![alheia]);
        let mut sessao = ChatSession::nova(fake.clone(), 1);
        sessao.abrir(peer(2)).await.unwrap();

        let erro = sessao.editar(1, "hack").await.unwrap_err();
        assert!(matches!(erro, ChatError::SomenteProprias));
        let erro = sessao.apagar(1).await.unwrap_err();
        assert!(matches!(erro, ChatError::SomenteProprias));

        assert_eq!(fake.edicoes.load(Ordering::SeqCst), 0);
        assert_eq!(fake.exclusoes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_encerrar_fecha_rajada_e_timers() {
        let fake = FakeApi::default().com_historico(2, Vec::new());
        let mut sessao = ChatSession::nova(fake.clone(), 1);
        sessao.iniciar().await.unwrap();
        sessao.abrir(peer(2)).await.unwrap();

        sessao.tecla_digitada().await;
        sessao.encerrar().await;
        assert_eq!(fake.avisos(), vec![(2, true), (2, false)]);

        let syncs_antes = fake.syncs.lock().unwrap().len();
        let batidas_antes = fake.heartbeats.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fake.syncs.lock().unwrap().len(), syncs_antes);
        assert_eq!(fake.heartbeats.load(Ordering::SeqCst), batidas_antes);
        // o debounce também morreu: nenhum `false` em dobro
        assert_eq!(fake.avisos().len(), 2);
    }
}
