use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::empresa::EmpresaSimples;

// ============================================================================
// Prospecções, agendamentos e atribuições
// ============================================================================

/// A prospecting call logged against a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prospeccao {
    pub id: i64,
    pub empresa_id: i64,
    pub consultor_id: Option<i64>,
    pub data_ligacao: Option<NaiveDate>,
    pub hora_ligacao: Option<String>,
    pub resultado: Option<String>,
    pub observacoes: Option<String>,
    pub nome_contato: Option<String>,
    pub telefone_contato: Option<String>,
    pub email_contato: Option<String>,
    pub cargo_contato: Option<String>,
    #[serde(default)]
    pub interesse_treinamento: bool,
    #[serde(default)]
    pub interesse_consultoria: bool,
    #[serde(default)]
    pub interesse_certificacao: bool,
    #[serde(default)]
    pub interesse_eventos: bool,
    #[serde(default)]
    pub interesse_produtos: bool,
    #[serde(default)]
    pub interesse_seguranca: bool,
    #[serde(default)]
    pub interesse_meio_ambiente: bool,
    pub outros_interesses: Option<String>,
    pub potencial_negocio: Option<String>,
    pub status_follow_up: Option<String>,
    pub empresa: Option<EmpresaSimples>,
    pub data_criacao: Option<DateTime<Utc>>,
}

impl Prospeccao {
    /// Labels of the interest boxes that were ticked, in form order.
    pub fn interesses(&self) -> Vec<&'static str> {
        let pares = [
            (self.interesse_treinamento, "Treinamento"),
            (self.interesse_consultoria, "Consultoria"),
            (self.interesse_certificacao, "Certificação"),
            (self.interesse_eventos, "Eventos"),
            (self.interesse_produtos, "Produtos"),
            (self.interesse_seguranca, "Segurança"),
            (self.interesse_meio_ambiente, "Meio ambiente"),
        ];
        pares
            .into_iter()
            .filter_map(|(marcado, rotulo)| marcado.then_some(rotulo))
            .collect()
    }
}

/// Create/update payload for `/api/prospeccoes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProspeccaoPayload {
    pub empresa_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_ligacao: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hora_ligacao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resultado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_contato: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone_contato: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_contato: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo_contato: Option<String>,
    pub interesse_treinamento: bool,
    pub interesse_consultoria: bool,
    pub interesse_certificacao: bool,
    pub interesse_eventos: bool,
    pub interesse_produtos: bool,
    pub interesse_seguranca: bool,
    pub interesse_meio_ambiente: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outros_interesses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potencial_negocio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_follow_up: Option<String>,
}

/// Answer of `POST /api/prospeccoes/com-agendamento`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProspeccaoCriada {
    pub prospeccao: Prospeccao,
    #[serde(default)]
    pub agendamento_criado: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// A scheduled follow-up call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agendamento {
    pub id: i64,
    pub prospeccao_id: Option<i64>,
    pub empresa_id: Option<i64>,
    pub data_agendada: NaiveDate,
    pub hora_agendada: Option<String>,
    /// "pendente" until marked "realizado".
    #[serde(default)]
    pub status: String,
    pub observacoes: Option<String>,
    pub empresa: Option<EmpresaSimples>,
}

impl Agendamento {
    pub fn realizado(&self) -> bool {
        self.status == "realizado"
    }
}

/// Buckets of `GET /api/agendamentos/alertas`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alertas {
    #[serde(default)]
    pub vencidos: Vec<Agendamento>,
    #[serde(default)]
    pub hoje: Vec<Agendamento>,
    #[serde(default)]
    pub futuros: Vec<Agendamento>,
}

impl Alertas {
    pub fn total(&self) -> usize {
        self.vencidos.len() + self.hoje.len() + self.futuros.len()
    }
}

/// A company assigned to a consultant's portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atribuicao {
    pub id: i64,
    pub consultor_id: i64,
    pub empresa_id: i64,
    #[serde(default)]
    pub ativa: bool,
    pub data_atribuicao: Option<DateTime<Utc>>,
    pub data_desativacao: Option<DateTime<Utc>>,
    pub empresa: Option<EmpresaSimples>,
}

/// Body of `POST /api/atribuicoes/`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NovaAtribuicao {
    pub consultor_id: i64,
    pub empresa_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prospeccao_interesses_marcados() {
        let json = r#"{
            "id": 1,
            "empresa_id": 3,
            "consultor_id": 7,
            "data_ligacao": "2025-06-02",
            "hora_ligacao": "14:30",
            "resultado": "positivo",
            "observacoes": null,
            "nome_contato": "Paulo",
            "telefone_contato": null,
            "email_contato": null,
            "cargo_contato": "Gerente",
            "interesse_treinamento": true,
            "interesse_consultoria": false,
            "interesse_certificacao": true,
            "interesse_eventos": false,
            "interesse_produtos": false,
            "interesse_seguranca": false,
            "interesse_meio_ambiente": false,
            "outros_interesses": null,
            "potencial_negocio": "alto",
            "status_follow_up": "agendado"
        }"#;
        let prospeccao: Prospeccao = serde_json::from_str(json).unwrap();
        assert_eq!(prospeccao.interesses(), vec!["Treinamento", "Certificação"]);
        assert!(prospeccao.empresa.is_none());
    }

    #[test]
    fn test_alertas_em_baldes() {
        let json = r#"{
            "vencidos": [{"id": 1, "data_agendada": "2025-05-20", "status": "pendente"}],
            "hoje": [],
            "futuros": [
                {"id": 2, "data_agendada": "2025-06-10", "status": "pendente"},
                {"id": 3, "data_agendada": "2025-06-12", "status": "realizado"}
            ]
        }"#;
        let alertas: Alertas = serde_json::from_str(json).unwrap();
        assert_eq!(alertas.total(), 3);
        assert!(!alertas.vencidos[0].realizado());
        assert!(alertas.futuros[1].realizado());
    }

    #[test]
    fn test_atribuicao_com_empresa_embutida() {
        let json = r#"{
            "id": 4,
            "consultor_id": 7,
            "empresa_id": 3,
            "ativa": true,
            "data_atribuicao": "2025-02-01T10:00:00Z",
            "data_desativacao": null,
            "empresa": {"id": 3, "empresa": "Aurora", "sigla": "AUR", "cnpj": null, "municipio": "Campinas"}
        }"#;
        let atribuicao: Atribuicao = serde_json::from_str(json).unwrap();
        assert!(atribuicao.ativa);
        assert_eq!(atribuicao.empresa.unwrap().sigla.as_deref(), Some("AUR"));
    }
}
