use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Empresas
// ============================================================================

/// Cadastral record of a company in the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Empresa {
    pub id: i64,
    /// Razão social.
    pub empresa: String,
    pub cnpj: Option<String>,
    pub sigla: Option<String>,
    pub porte: Option<String>,
    pub er: Option<String>,
    pub carteira: Option<String>,
    pub endereco: Option<String>,
    pub bairro: Option<String>,
    pub zona: Option<String>,
    pub municipio: Option<String>,
    pub estado: Option<String>,
    pub pais: Option<String>,
    pub area: Option<String>,
    pub cnae_principal: Option<String>,
    pub descricao_cnae: Option<String>,
    pub tipo_empresa: Option<String>,
    pub numero_funcionarios: Option<i32>,
    pub observacao: Option<String>,
    pub nome_contato: Option<String>,
    pub cargo_contato: Option<String>,
    pub telefone_contato: Option<String>,
    pub email_contato: Option<String>,
    pub data_cadastro: Option<DateTime<Utc>>,
    pub data_atualizacao: Option<DateTime<Utc>>,
}

/// Slim embedding used by prospecções, agendamentos and atribuições.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmpresaSimples {
    pub id: i64,
    pub empresa: String,
    pub sigla: Option<String>,
    pub cnpj: Option<String>,
    pub municipio: Option<String>,
}

/// Create/update payload for `/api/empresas`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmpresaPayload {
    pub empresa: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigla: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub porte: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub er: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carteira: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endereco: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bairro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_funcionarios: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observacao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_contato: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo_contato: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone_contato: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_contato: Option<String>,
}

/// Public-registry card returned by `GET /api/cnpj/buscar/{cnpj}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmpresaCnpj {
    pub cnpj: String,
    pub empresa: String,
    pub nome_fantasia: Option<String>,
    pub municipio: Option<String>,
    pub estado: Option<String>,
    pub logradouro: Option<String>,
    pub numero: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub cep: Option<String>,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub atividade_principal: Option<String>,
    pub natureza_juridica: Option<String>,
    pub porte: Option<String>,
    pub capital_social: Option<String>,
    pub data_abertura: Option<String>,
    pub situacao: Option<String>,
    /// Which upstream registry answered the lookup.
    pub fonte: Option<String>,
}

/// Answer of `POST /api/cnpj/salvar`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmpresaSalva {
    pub empresa_id: i64,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empresa_deserializa_com_campos_nulos() {
        let json = r#"{
            "id": 3,
            "empresa": "Metalurgica Aurora LTDA",
            "cnpj": "12345678000190",
            "sigla": "AUR",
            "municipio": "Campinas",
            "estado": "SP",
            "data_cadastro": "2025-01-10T14:00:00Z"
        }"#;
        let empresa: Empresa = serde_json::from_str(json).unwrap();
        assert_eq!(empresa.empresa, "Metalurgica Aurora LTDA");
        assert_eq!(empresa.porte, None);
        assert!(empresa.data_atualizacao.is_none());
    }

    #[test]
    fn test_payload_omite_opcionais_vazios() {
        let payload = EmpresaPayload {
            empresa: "Nova Empresa".to_string(),
            municipio: Some("Sorocaba".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"empresa\":\"Nova Empresa\""));
        assert!(json.contains("\"municipio\":\"Sorocaba\""));
        assert!(!json.contains("cnpj"));
        assert!(!json.contains("observacao"));
    }

    #[test]
    fn test_empresa_cnpj_deserializa_resposta_do_registro() {
        let json = r#"{
            "cnpj": "12345678000190",
            "empresa": "AURORA METAIS",
            "nome_fantasia": "Aurora",
            "municipio": "CAMPINAS",
            "estado": "SP",
            "logradouro": "RUA DAS LARANJEIRAS",
            "numero": "100",
            "complemento": null,
            "bairro": "CENTRO",
            "cep": "13010-000",
            "telefone": null,
            "email": null,
            "atividade_principal": "Metalurgia do aluminio",
            "natureza_juridica": "Sociedade Empresaria Limitada",
            "porte": "MEDIO",
            "data_abertura": "2001-05-20",
            "situacao": "ATIVA",
            "fonte": "brasilapi"
        }"#;
        let card: EmpresaCnpj = serde_json::from_str(json).unwrap();
        assert_eq!(card.situacao.as_deref(), Some("ATIVA"));
        assert_eq!(card.fonte.as_deref(), Some("brasilapi"));
    }
}
