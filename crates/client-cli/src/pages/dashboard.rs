//! Opening screen: totals of the main collections plus the agendamento
//! alert buckets, fetched in parallel. Running the command again is the
//! refresh.

use anyhow::Result;

use shared::page::Paginada;
use shared::prospeccao::{Agendamento, Alertas};
use shared::texto;

use crate::api::{ApiClient, ApiError, ApiResult};
use crate::chat::ChatApi;
use crate::session::Sessao;
use crate::views;

/// Total of a paginated collection without pulling its rows: page one with a
/// single item carries `total_count` like any other page.
async fn contar(api: &ApiClient, caminho: &str) -> ApiResult<u64> {
    let pagina: Paginada<serde_json::Value> = api
        .get_query(caminho, &[("page", "1"), ("page_size", "1")])
        .await?;
    Ok(pagina.total_count)
}

/// A failed count renders as "—" instead of taking the screen down, except
/// for an expired session, which must end the command.
fn celula(total: ApiResult<u64>) -> Result<String> {
    match total {
        Ok(n) => Ok(n.to_string()),
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(erro) => {
            tracing::warn!("falha ao carregar contagem do painel: {erro}");
            Ok("—".to_string())
        }
    }
}

pub async fn mostrar(sessao: &Sessao) -> Result<()> {
    let api = &sessao.api;

    let (empresas, prospeccoes, consultores, alertas, nao_lidas) = tokio::join!(
        contar(api, "/api/empresas/"),
        contar(api, "/api/prospeccoes/"),
        contar(api, "/api/consultores/"),
        api.get::<Alertas>("/api/agendamentos/alertas"),
        api.nao_lidas(),
    );

    // Só administradores enxergam o total de usuários.
    let usuarios = if sessao.usuario.is_admin() {
        Some(celula(contar(api, "/api/admin/usuarios").await)?)
    } else {
        None
    };

    views::titulo(&format!(
        "Olá, {} ({})",
        sessao.usuario.nome,
        sessao.usuario.tipo.rotulo()
    ));
    println!();

    let alertas = match alertas {
        Ok(alertas) => alertas,
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(erro) => {
            tracing::warn!("falha ao carregar alertas do painel: {erro}");
            Alertas::default()
        }
    };

    println!("  Empresas       {}", celula(empresas)?);
    println!("  Prospecções    {}", celula(prospeccoes)?);
    println!("  Consultores    {}", celula(consultores)?);
    if let Some(usuarios) = usuarios {
        println!("  Usuários       {usuarios}");
    }
    println!("  Agendamentos   {}", alertas.total());
    match nao_lidas {
        Ok(0) => {}
        Ok(n) => println!("  Não lidas      {n} 💬"),
        Err(erro) => tracing::warn!("falha ao carregar mensagens não lidas: {erro}"),
    }
    println!();

    render_alertas(&alertas);
    Ok(())
}

fn render_alertas(alertas: &Alertas) {
    views::titulo("Alertas de ligação");
    if alertas.total() == 0 {
        views::info("Nenhum alerta no momento");
        return;
    }
    balde("\x1b[1;31mVencidos\x1b[0m", &alertas.vencidos);
    balde("\x1b[1;33mHoje\x1b[0m", &alertas.hoje);
    balde("\x1b[1;36mPróximos\x1b[0m", &alertas.futuros);
}

fn balde(cabecalho: &str, agendamentos: &[Agendamento]) {
    if agendamentos.is_empty() {
        return;
    }
    println!("{cabecalho}");
    for agendamento in agendamentos {
        println!("  {}", linha_agendamento(agendamento));
    }
}

/// "#12 02/06/2025 14:00 · Metalúrgica Aurora · retornar sobre proposta"
pub fn linha_agendamento(agendamento: &Agendamento) -> String {
    let mut linha = format!(
        "#{} {}",
        agendamento.id,
        texto::data_curta(agendamento.data_agendada)
    );
    if let Some(hora) = &agendamento.hora_agendada {
        linha.push_str(&format!(" {hora}"));
    }
    if let Some(empresa) = &agendamento.empresa {
        linha.push_str(&format!(" · {}", empresa.empresa));
    }
    match &agendamento.observacoes {
        Some(obs) if !obs.is_empty() => linha.push_str(&format!(" · {}", texto::truncar(obs, 60))),
        _ => linha.push_str(" · Sem observações"),
    }
    if agendamento.realizado() {
        linha.push_str(" ✓");
    }
    linha
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linha_agendamento_completa() {
        let agendamento: Agendamento = serde_json::from_str(
            r#"{
                "id": 12,
                "prospeccao_id": 4,
                "empresa_id": 3,
                "data_agendada": "2025-06-02",
                "hora_agendada": "14:00",
                "status": "pendente",
                "observacoes": "retornar sobre proposta",
                "empresa": {"id": 3, "empresa": "Metalúrgica Aurora", "sigla": "AUR", "cnpj": null, "municipio": null}
            }"#,
        )
        .unwrap();
        assert_eq!(
            linha_agendamento(&agendamento),
            "#12 02/06/2025 14:00 · Metalúrgica Aurora · retornar sobre proposta"
        );
    }

    #[test]
    fn test_linha_agendamento_sem_observacoes() {
        let agendamento: Agendamento = serde_json::from_str(
            r#"{"id": 5, "data_agendada": "2025-06-03", "status": "realizado"}"#,
        )
        .unwrap();
        let linha = linha_agendamento(&agendamento);
        assert!(linha.contains("Sem observações"));
        assert!(linha.ends_with('✓'));
    }
}
