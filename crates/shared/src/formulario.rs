use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Formulários
// ============================================================================

/// Question kinds the builder offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TipoPergunta {
    #[default]
    #[serde(rename = "escala")]
    Escala,
    #[serde(rename = "texto")]
    Texto,
    #[serde(rename = "multipla_escolha")]
    MultiplaEscolha,
    #[serde(rename = "nota")]
    Nota,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opcao {
    pub texto: String,
    pub valor: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pergunta {
    pub texto: String,
    #[serde(default)]
    pub tipo: TipoPergunta,
    pub categoria: Option<String>,
    pub ordem: Option<i32>,
    #[serde(default)]
    pub obrigatoria: bool,
    #[serde(default)]
    pub opcoes: Vec<Opcao>,
}

impl Pergunta {
    pub fn nova(texto: impl Into<String>, tipo: TipoPergunta, categoria: &str) -> Self {
        Self {
            texto: texto.into(),
            tipo,
            categoria: Some(categoria.to_string()),
            ordem: None,
            obrigatoria: false,
            opcoes: Vec::new(),
        }
    }
}

/// Summary row of the formulários listing; `perguntas` comes filled only on
/// the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formulario {
    pub id: i64,
    pub titulo: String,
    pub descricao: Option<String>,
    pub categoria: Option<String>,
    #[serde(default)]
    pub anonimo: bool,
    #[serde(default)]
    pub total_perguntas: u32,
    #[serde(default)]
    pub total_envios: u32,
    #[serde(default)]
    pub total_respostas: u32,
    pub data_criacao: Option<DateTime<Utc>>,
    #[serde(default)]
    pub perguntas: Vec<Pergunta>,
}

/// One generated answer link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envio {
    pub id: i64,
    pub codigo_unico: String,
    #[serde(default)]
    pub respondido: bool,
    pub data_envio: Option<DateTime<Utc>>,
    pub data_resposta: Option<DateTime<Utc>>,
    pub nome_destinatario: Option<String>,
    pub email_destinatario: Option<String>,
    pub empresa_nome: Option<String>,
}

/// Body of `POST /api/formularios/enviar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvioPayload {
    pub formulario_id: i64,
    pub nome_destinatario: Option<String>,
    pub email_destinatario: Option<String>,
    pub empresa_id: Option<i64>,
}

// ============================================================================
// Builder draft
// ============================================================================

/// Builder state persisted locally between sessions and replayed on reopen.
/// Doubles as the `POST /api/formularios/` payload once it validates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rascunho {
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub categoria: String,
    #[serde(default)]
    pub perguntas: Vec<Pergunta>,
    #[serde(default)]
    pub anonimo: bool,
    #[serde(default)]
    pub obrigatorio: bool,
    #[serde(default)]
    pub aleatorio: bool,
}

/// Local gate failures; publishing is blocked before any request is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RascunhoInvalido {
    #[error("Digite um titulo para o formulario")]
    TituloVazio,
    #[error("Adicione pelo menos uma pergunta")]
    SemPerguntas,
    #[error("Preencha o texto de todas as perguntas")]
    PerguntaSemTexto,
}

impl Rascunho {
    /// Mirrors the publish gate: title, at least one question, no blank
    /// question text.
    pub fn validar(&self) -> Result<(), RascunhoInvalido> {
        if self.titulo.trim().is_empty() {
            return Err(RascunhoInvalido::TituloVazio);
        }
        if self.perguntas.is_empty() {
            return Err(RascunhoInvalido::SemPerguntas);
        }
        if self.perguntas.iter().any(|p| p.texto.trim().is_empty()) {
            return Err(RascunhoInvalido::PerguntaSemTexto);
        }
        Ok(())
    }

    /// Renumbers `ordem` 1.. and applies the single "obrigatorio" switch to
    /// every question, the shape the create endpoint expects.
    pub fn preparar_envio(&mut self) {
        for (indice, pergunta) in self.perguntas.iter_mut().enumerate() {
            pergunta.ordem = Some(indice as i32 + 1);
            pergunta.obrigatoria = self.obrigatorio;
        }
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Ready-made questionnaires the builder can start from.
pub const MODELOS: [&str; 6] = [
    "lideranca",
    "satisfacao",
    "clima",
    "nps",
    "feedback",
    "onboarding",
];

/// Pre-fills a draft from a named template. Unknown names yield `None`.
pub fn modelo(nome: &str) -> Option<Rascunho> {
    let (titulo, descricao, categoria, perguntas): (&str, &str, &str, Vec<Pergunta>) = match nome {
        "lideranca" => (
            "Avaliacao de Lideranca 360",
            "Questionario completo para avaliacao de competencias de lideranca em diferentes dimensoes.",
            "lideranca",
            vec![
                Pergunta::nova("O lider comunica de forma clara os objetivos e expectativas da equipe?", TipoPergunta::Escala, "comunicacao"),
                Pergunta::nova("O lider escuta ativamente as ideias e sugestoes dos membros da equipe?", TipoPergunta::Escala, "comunicacao"),
                Pergunta::nova("O lider fornece feedback construtivo regularmente?", TipoPergunta::Escala, "comunicacao"),
                Pergunta::nova("O lider demonstra visao estrategica para o futuro da area?", TipoPergunta::Escala, "estrategia"),
                Pergunta::nova("O lider toma decisoes de forma assertiva e no momento adequado?", TipoPergunta::Escala, "estrategia"),
                Pergunta::nova("O lider incentiva o desenvolvimento profissional da equipe?", TipoPergunta::Escala, "equipe"),
                Pergunta::nova("O lider reconhece e celebra as conquistas da equipe?", TipoPergunta::Escala, "equipe"),
                Pergunta::nova("O lider promove um ambiente de trabalho colaborativo?", TipoPergunta::Escala, "equipe"),
                Pergunta::nova("O lider demonstra integridade e etica em suas acoes?", TipoPergunta::Escala, "lideranca"),
                Pergunta::nova("O lider inspira confianca e respeito nos colaboradores?", TipoPergunta::Escala, "lideranca"),
                Pergunta::nova("Qual o principal ponto forte deste lider?", TipoPergunta::Texto, "geral"),
                Pergunta::nova("O que este lider poderia melhorar?", TipoPergunta::Texto, "geral"),
            ],
        ),
        "satisfacao" => (
            "Pesquisa de Satisfacao",
            "Avalie sua experiencia e satisfacao com nossos servicos.",
            "satisfacao",
            vec![
                Pergunta::nova("Qual seu nivel de satisfacao geral com nossos servicos?", TipoPergunta::Escala, "geral"),
                Pergunta::nova("A qualidade do atendimento atendeu suas expectativas?", TipoPergunta::Escala, "geral"),
                Pergunta::nova("O tempo de resposta foi satisfatorio?", TipoPergunta::Escala, "geral"),
                Pergunta::nova("Voce recomendaria nossos servicos para outras pessoas?", TipoPergunta::Escala, "geral"),
                Pergunta::nova("O que podemos fazer para melhorar sua experiencia?", TipoPergunta::Texto, "geral"),
            ],
        ),
        "clima" => (
            "Pesquisa de Clima Organizacional",
            "Ajude-nos a entender e melhorar o ambiente de trabalho.",
            "clima",
            vec![
                Pergunta::nova("Voce se sente valorizado pela organizacao?", TipoPergunta::Escala, "geral"),
                Pergunta::nova("A comunicacao interna e eficiente?", TipoPergunta::Escala, "comunicacao"),
                Pergunta::nova("Voce tem as ferramentas necessarias para realizar seu trabalho?", TipoPergunta::Escala, "geral"),
                Pergunta::nova("O ambiente de trabalho e colaborativo e respeitoso?", TipoPergunta::Escala, "equipe"),
                Pergunta::nova("Voce ve oportunidades de crescimento na empresa?", TipoPergunta::Escala, "geral"),
                Pergunta::nova("Seu gestor direto apoia seu desenvolvimento?", TipoPergunta::Escala, "lideranca"),
                Pergunta::nova("O que mais te motiva a trabalhar aqui?", TipoPergunta::Texto, "geral"),
                Pergunta::nova("O que poderia ser melhorado no ambiente de trabalho?", TipoPergunta::Texto, "geral"),
            ],
        ),
        "nps" => (
            "Net Promoter Score (NPS)",
            "Avaliacao rapida de lealdade e satisfacao.",
            "nps",
            vec![
                Pergunta::nova("Em uma escala de 0 a 10, qual a probabilidade de voce recomendar nossa empresa para um amigo ou colega?", TipoPergunta::Nota, "geral"),
                Pergunta::nova("Qual o principal motivo da sua nota?", TipoPergunta::Texto, "geral"),
            ],
        ),
        "feedback" => (
            "Feedback 360",
            "Colete feedback abrangente de diferentes perspectivas.",
            "feedback",
            vec![
                Pergunta::nova("Esta pessoa demonstra comprometimento com suas responsabilidades?", TipoPergunta::Escala, "resultados"),
                Pergunta::nova("Esta pessoa colabora bem com os colegas de equipe?", TipoPergunta::Escala, "equipe"),
                Pergunta::nova("Esta pessoa comunica suas ideias de forma clara?", TipoPergunta::Escala, "comunicacao"),
                Pergunta::nova("Esta pessoa busca melhorar continuamente seu desempenho?", TipoPergunta::Escala, "geral"),
                Pergunta::nova("Cite um exemplo de comportamento positivo desta pessoa:", TipoPergunta::Texto, "geral"),
                Pergunta::nova("O que esta pessoa poderia desenvolver?", TipoPergunta::Texto, "geral"),
            ],
        ),
        "onboarding" => (
            "Avaliacao de Onboarding",
            "Avalie sua experiencia de integracao na empresa.",
            "onboarding",
            vec![
                Pergunta::nova("O processo de integracao foi bem organizado?", TipoPergunta::Escala, "geral"),
                Pergunta::nova("Voce recebeu as informacoes necessarias para iniciar suas atividades?", TipoPergunta::Escala, "comunicacao"),
                Pergunta::nova("Sua equipe foi receptiva e acolhedora?", TipoPergunta::Escala, "equipe"),
                Pergunta::nova("Seu gestor esteve disponivel para orientacoes?", TipoPergunta::Escala, "lideranca"),
                Pergunta::nova("O que foi mais positivo no seu processo de integracao?", TipoPergunta::Texto, "geral"),
                Pergunta::nova("O que poderia ser melhorado no onboarding?", TipoPergunta::Texto, "geral"),
            ],
        ),
        _ => return None,
    };

    Some(Rascunho {
        titulo: titulo.to_string(),
        descricao: descricao.to_string(),
        categoria: categoria.to_string(),
        perguntas,
        anonimo: false,
        obrigatorio: false,
        aleatorio: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validar_titulo_vazio() {
        let mut rascunho = Rascunho::default();
        assert_eq!(rascunho.validar(), Err(RascunhoInvalido::TituloVazio));

        rascunho.titulo = "   ".to_string();
        assert_eq!(rascunho.validar(), Err(RascunhoInvalido::TituloVazio));
    }

    #[test]
    fn test_validar_sem_perguntas() {
        let rascunho = Rascunho {
            titulo: "Pesquisa".to_string(),
            ..Default::default()
        };
        assert_eq!(rascunho.validar(), Err(RascunhoInvalido::SemPerguntas));
    }

    #[test]
    fn test_validar_pergunta_sem_texto() {
        let rascunho = Rascunho {
            titulo: "Pesquisa".to_string(),
            perguntas: vec![
                Pergunta::nova("Como avalia o servico?", TipoPergunta::Escala, "geral"),
                Pergunta::nova("  ", TipoPergunta::Texto, "geral"),
            ],
            ..Default::default()
        };
        assert_eq!(rascunho.validar(), Err(RascunhoInvalido::PerguntaSemTexto));
    }

    #[test]
    fn test_validar_ok_e_mensagens() {
        let rascunho = modelo("nps").unwrap();
        assert_eq!(rascunho.validar(), Ok(()));
        assert_eq!(
            RascunhoInvalido::TituloVazio.to_string(),
            "Digite um titulo para o formulario"
        );
    }

    #[test]
    fn test_preparar_envio_renumera_e_propaga_obrigatorio() {
        let mut rascunho = modelo("satisfacao").unwrap();
        rascunho.obrigatorio = true;
        rascunho.preparar_envio();
        let ordens: Vec<i32> = rascunho
            .perguntas
            .iter()
            .map(|p| p.ordem.unwrap())
            .collect();
        assert_eq!(ordens, vec![1, 2, 3, 4, 5]);
        assert!(rascunho.perguntas.iter().all(|p| p.obrigatoria));
    }

    #[test]
    fn test_modelos_conhecidos() {
        for nome in MODELOS {
            let rascunho = modelo(nome).unwrap();
            assert!(rascunho.validar().is_ok(), "modelo {nome}");
        }
        assert!(modelo("inexistente").is_none());

        let lideranca = modelo("lideranca").unwrap();
        assert_eq!(lideranca.perguntas.len(), 12);
        assert_eq!(lideranca.perguntas[10].tipo, TipoPergunta::Texto);
    }

    #[test]
    fn test_rascunho_round_trip_json() {
        let mut rascunho = modelo("nps").unwrap();
        rascunho.anonimo = true;
        let json = serde_json::to_string(&rascunho).unwrap();
        let de_volta: Rascunho = serde_json::from_str(&json).unwrap();
        assert_eq!(de_volta.titulo, "Net Promoter Score (NPS)");
        assert!(de_volta.anonimo);
        assert_eq!(de_volta.perguntas.len(), 2);
        assert!(json.contains("\"tipo\":\"nota\""));
    }

    #[test]
    fn test_formulario_resumo_deserializa() {
        let json = r#"{
            "id": 9,
            "titulo": "Pesquisa de Clima",
            "descricao": null,
            "categoria": "clima",
            "anonimo": true,
            "total_perguntas": 8,
            "total_envios": 40,
            "total_respostas": 31,
            "data_criacao": "2025-04-01T12:00:00Z"
        }"#;
        let formulario: Formulario = serde_json::from_str(json).unwrap();
        assert_eq!(formulario.total_respostas, 31);
        assert!(formulario.perguntas.is_empty());
    }
}
