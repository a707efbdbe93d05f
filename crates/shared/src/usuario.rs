use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::prospeccao::Prospeccao;

// ============================================================================
// Usuários e autenticação
// ============================================================================

/// Profile role. Gates the admin-only surfaces (usuários, atribuições).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TipoUsuario {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "consultor")]
    Consultor,
}

impl TipoUsuario {
    pub fn rotulo(&self) -> &'static str {
        match self {
            TipoUsuario::Admin => "Administrador",
            TipoUsuario::Consultor => "Consultor",
        }
    }
}

/// Full profile, as returned by `/api/auth/login` and the admin listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usuario {
    pub id: i64,
    pub email: String,
    pub nome: String,
    pub tipo: TipoUsuario,
    pub telefone: Option<String>,
    pub data_nascimento: Option<NaiveDate>,
    pub modelo_carro: Option<String>,
    pub placa_carro: Option<String>,
    pub informacoes_basicas: Option<String>,
    pub foto_url: Option<String>,
}

impl Usuario {
    pub fn is_admin(&self) -> bool {
        self.tipo == TipoUsuario::Admin
    }
}

/// Slim embedding used by conversations and schedule rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsuarioSimples {
    pub id: i64,
    pub nome: String,
    pub email: Option<String>,
    pub foto_url: Option<String>,
    /// Presence flag filled in by the chat endpoints.
    #[serde(default)]
    pub online: bool,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsuarioLogin {
    pub email: String,
    pub senha: String,
}

/// Success body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub usuario: Usuario,
}

/// Error envelope the backend sends on 4xx/5xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detalhe {
    pub detail: String,
}

/// Create/update payload for the admin usuários surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsuarioPayload {
    pub email: String,
    pub nome: String,
    pub tipo: TipoUsuario,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub senha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
}

/// Body of `PUT /api/consultores/perfil/atualizar`. Partial: absent fields
/// keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerfilPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub senha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_nascimento: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modelo_carro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placa_carro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foto_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub informacoes_basicas: Option<String>,
}

/// Composite answer of `GET /api/consultores/{id}`: the profile, its
/// aggregate numbers and the consultant's prospecting history.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsultorDetalhe {
    pub perfil: PerfilConsultor,
    #[serde(default)]
    pub estatisticas: EstatisticasConsultor,
    #[serde(default)]
    pub prospeccoes: Vec<Prospeccao>,
}

/// Profile block of the consultor detail; unlike [`Usuario`] it carries no
/// `tipo` (the endpoint only answers for consultores).
#[derive(Debug, Clone, Deserialize)]
pub struct PerfilConsultor {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
    pub data_nascimento: Option<NaiveDate>,
    pub modelo_carro: Option<String>,
    pub placa_carro: Option<String>,
    pub informacoes_basicas: Option<String>,
    pub foto_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EstatisticasConsultor {
    #[serde(default)]
    pub total_prospeccoes: u64,
    #[serde(default)]
    pub empresas_atribuidas: u64,
}
