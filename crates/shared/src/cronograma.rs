use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// Cronograma
// ============================================================================

/// Weekday headers of the month grid, Sunday first.
pub const DIAS_SEMANA: [&str; 7] = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"];

/// Month names, 1-based lookup via [`nome_mes`].
pub const MESES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Most events a day cell shows before collapsing into "+N mais".
pub const MAX_EVENTOS_DIA: usize = 3;

pub fn nome_mes(mes: u32) -> &'static str {
    MESES[(mes as usize - 1).min(11)]
}

/// Event category letter used across the schedule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Categoria {
    #[serde(rename = "C")]
    Consultoria,
    #[serde(rename = "K")]
    KickOff,
    #[serde(rename = "F")]
    ReuniaoFinal,
    #[serde(rename = "M")]
    Mentoria,
    #[serde(rename = "T")]
    Diagnostico,
    #[serde(rename = "P")]
    Programado,
    #[serde(rename = "O")]
    Outros,
}

impl Categoria {
    pub const TODAS: [Categoria; 7] = [
        Categoria::Consultoria,
        Categoria::KickOff,
        Categoria::ReuniaoFinal,
        Categoria::Mentoria,
        Categoria::Diagnostico,
        Categoria::Programado,
        Categoria::Outros,
    ];

    pub fn codigo(&self) -> &'static str {
        match self {
            Categoria::Consultoria => "C",
            Categoria::KickOff => "K",
            Categoria::ReuniaoFinal => "F",
            Categoria::Mentoria => "M",
            Categoria::Diagnostico => "T",
            Categoria::Programado => "P",
            Categoria::Outros => "O",
        }
    }

    pub fn nome(&self) -> &'static str {
        match self {
            Categoria::Consultoria => "Consultoria",
            Categoria::KickOff => "Kick-off",
            Categoria::ReuniaoFinal => "Reuniao Final",
            Categoria::Mentoria => "Mentoria",
            Categoria::Diagnostico => "T0 - Diagnostico",
            Categoria::Programado => "Programado",
            Categoria::Outros => "Outros",
        }
    }

    /// Hex color the legend and the chips use.
    pub fn cor(&self) -> &'static str {
        match self {
            Categoria::Consultoria => "#22c55e",
            Categoria::KickOff => "#eab308",
            Categoria::ReuniaoFinal => "#3b82f6",
            Categoria::Mentoria => "#ef4444",
            Categoria::Diagnostico => "#f97316",
            Categoria::Programado => "#06b6d4",
            Categoria::Outros => "#6b7280",
        }
    }

    /// Inverse of [`Categoria::codigo`], case-insensitive.
    pub fn do_codigo(codigo: &str) -> Option<Categoria> {
        Categoria::TODAS
            .into_iter()
            .find(|c| c.codigo().eq_ignore_ascii_case(codigo))
    }
}

/// Slot of the day an event occupies.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Periodo {
    #[serde(rename = "M")]
    Manha,
    #[serde(rename = "T")]
    Tarde,
    #[default]
    #[serde(rename = "D")]
    DiaTodo,
}

impl Periodo {
    pub fn nome(&self) -> &'static str {
        match self {
            Periodo::Manha => "Manhã",
            Periodo::Tarde => "Tarde",
            Periodo::DiaTodo => "Dia todo",
        }
    }

    /// Parses the wire letter (M, T or D), case-insensitive.
    pub fn do_codigo(codigo: &str) -> Option<Periodo> {
        match codigo.to_ascii_uppercase().as_str() {
            "M" => Some(Periodo::Manha),
            "T" => Some(Periodo::Tarde),
            "D" => Some(Periodo::DiaTodo),
            _ => None,
        }
    }
}

/// Calendar event as `GET /api/cronograma/eventos` returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventoCronograma {
    pub id: i64,
    pub data: NaiveDate,
    pub categoria: Categoria,
    pub categoria_nome: Option<String>,
    #[serde(default)]
    pub periodo: Periodo,
    pub sigla_empresa: Option<String>,
    pub consultor_id: Option<i64>,
    pub consultor_nome: Option<String>,
    pub titulo: Option<String>,
    pub cor: Option<String>,
}

impl EventoCronograma {
    /// Chip label; the server falls back to "{categoria}-{sigla}" when the
    /// event has no explicit title.
    pub fn rotulo(&self) -> String {
        match &self.titulo {
            Some(titulo) if !titulo.is_empty() => titulo.clone(),
            _ => format!(
                "{}-{}",
                self.categoria.codigo(),
                self.sigla_empresa.as_deref().unwrap_or("")
            ),
        }
    }

    pub fn cor(&self) -> &str {
        self.cor.as_deref().unwrap_or_else(|| self.categoria.cor())
    }
}

/// Legend entry of `GET /api/cronograma/categorias`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriaEvento {
    pub codigo: String,
    pub nome: String,
    pub cor: String,
}

/// Create payload for calendar events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventoPayload {
    pub data: NaiveDate,
    pub categoria: Categoria,
    pub periodo: Periodo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigla_empresa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
}

/// Body of `PUT /api/cronograma/eventos/{id}`. Partial: absent fields keep
/// their stored value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventoAtualizacao {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria: Option<Categoria>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periodo: Option<Periodo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigla_empresa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
}

// ============================================================================
// Month grid
// ============================================================================

/// One day cell of the grid. Holds every event of the day; rendering shows
/// [`DiaCalendario::visiveis`] and collapses the rest into "+N mais".
#[derive(Debug, Clone)]
pub struct DiaCalendario {
    pub dia: u32,
    pub eventos: Vec<EventoCronograma>,
}

impl DiaCalendario {
    pub fn visiveis(&self) -> &[EventoCronograma] {
        &self.eventos[..self.eventos.len().min(MAX_EVENTOS_DIA)]
    }

    /// How many events the "+N mais" marker stands for.
    pub fn excedente(&self) -> usize {
        self.eventos.len().saturating_sub(MAX_EVENTOS_DIA)
    }
}

/// View-model of one rendered month.
#[derive(Debug, Clone)]
pub struct CalendarioMes {
    pub ano: i32,
    pub mes: u32,
    /// Blank cells before day 1, one per weekday since Sunday.
    pub celulas_vazias: usize,
    pub dias: Vec<DiaCalendario>,
}

impl CalendarioMes {
    pub fn titulo(&self) -> String {
        format!("{} {}", nome_mes(self.mes), self.ano)
    }

    /// Events per category, in legend order, skipping empty categories.
    pub fn resumo_categorias(&self) -> Vec<(Categoria, usize)> {
        let mut contagem: BTreeMap<Categoria, usize> = BTreeMap::new();
        for dia in &self.dias {
            for evento in &dia.eventos {
                *contagem.entry(evento.categoria).or_default() += 1;
            }
        }
        Categoria::TODAS
            .into_iter()
            .filter_map(|cat| contagem.get(&cat).map(|n| (cat, *n)))
            .collect()
    }

    /// Events per day slot (manhã/tarde/dia todo).
    pub fn resumo_periodos(&self) -> [(Periodo, usize); 3] {
        let mut manha = 0;
        let mut tarde = 0;
        let mut dia_todo = 0;
        for dia in &self.dias {
            for evento in &dia.eventos {
                match evento.periodo {
                    Periodo::Manha => manha += 1,
                    Periodo::Tarde => tarde += 1,
                    Periodo::DiaTodo => dia_todo += 1,
                }
            }
        }
        [
            (Periodo::Manha, manha),
            (Periodo::Tarde, tarde),
            (Periodo::DiaTodo, dia_todo),
        ]
    }

    pub fn total_eventos(&self) -> usize {
        self.dias.iter().map(|d| d.eventos.len()).sum()
    }
}

pub fn dias_no_mes(ano: i32, mes: u32) -> u32 {
    let (ano_seguinte, mes_seguinte) = proximo_mes(ano, mes);
    NaiveDate::from_ymd_opt(ano_seguinte, mes_seguinte, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// Previous month with year wrap.
pub fn mes_anterior(ano: i32, mes: u32) -> (i32, u32) {
    if mes <= 1 {
        (ano - 1, 12)
    } else {
        (ano, mes - 1)
    }
}

/// Next month with year wrap.
pub fn proximo_mes(ano: i32, mes: u32) -> (i32, u32) {
    if mes >= 12 {
        (ano + 1, 1)
    } else {
        (ano, mes + 1)
    }
}

/// Builds the month view-model: leading blanks from the weekday of day 1,
/// then one cell per day with its events sorted by período and id. Events
/// outside the month are ignored.
pub fn montar_calendario(
    ano: i32,
    mes: u32,
    eventos: &[EventoCronograma],
) -> CalendarioMes {
    let primeiro = NaiveDate::from_ymd_opt(ano, mes, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    let celulas_vazias = primeiro.weekday().num_days_from_sunday() as usize;

    let mut dias: Vec<DiaCalendario> = (1..=dias_no_mes(ano, mes))
        .map(|dia| DiaCalendario {
            dia,
            eventos: Vec::new(),
        })
        .collect();

    for evento in eventos {
        if evento.data.year() == ano && evento.data.month() == mes {
            let indice = evento.data.day() as usize - 1;
            if let Some(celula) = dias.get_mut(indice) {
                celula.eventos.push(evento.clone());
            }
        }
    }
    for celula in &mut dias {
        celula.eventos.sort_by_key(|e| (e.periodo, e.id));
    }

    CalendarioMes {
        ano,
        mes,
        celulas_vazias,
        dias,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evento(id: i64, data: &str, categoria: Categoria, periodo: Periodo) -> EventoCronograma {
        EventoCronograma {
            id,
            data: data.parse().unwrap(),
            categoria,
            categoria_nome: Some(categoria.nome().to_string()),
            periodo,
            sigla_empresa: Some("AUR".to_string()),
            consultor_id: Some(7),
            consultor_nome: Some("Ana".to_string()),
            titulo: None,
            cor: None,
        }
    }

    #[test]
    fn test_categoria_wire_e_cores() {
        assert_eq!(serde_json::to_string(&Categoria::Diagnostico).unwrap(), "\"T\"");
        let categoria: Categoria = serde_json::from_str("\"K\"").unwrap();
        assert_eq!(categoria, Categoria::KickOff);
        assert_eq!(categoria.nome(), "Kick-off");
        assert_eq!(categoria.cor(), "#eab308");
        assert_eq!(Categoria::ReuniaoFinal.nome(), "Reuniao Final");
    }

    #[test]
    fn test_codigos_de_entrada() {
        assert_eq!(Categoria::do_codigo("k"), Some(Categoria::KickOff));
        assert_eq!(Categoria::do_codigo("T"), Some(Categoria::Diagnostico));
        assert_eq!(Categoria::do_codigo("x"), None);
        assert_eq!(Periodo::do_codigo("m"), Some(Periodo::Manha));
        assert_eq!(Periodo::do_codigo("D"), Some(Periodo::DiaTodo));
        assert_eq!(Periodo::do_codigo(""), None);
    }

    #[test]
    fn test_periodo_padrao_dia_todo() {
        let json = r##"{
            "id": 1,
            "data": "2025-06-05",
            "categoria": "C",
            "categoria_nome": "Consultoria",
            "sigla_empresa": "AUR",
            "consultor_id": 7,
            "consultor_nome": "Ana",
            "titulo": null,
            "cor": "#22c55e"
        }"##;
        let evento: EventoCronograma = serde_json::from_str(json).unwrap();
        assert_eq!(evento.periodo, Periodo::DiaTodo);
        assert_eq!(evento.cor(), "#22c55e");
    }

    #[test]
    fn test_rotulo_usa_fallback_categoria_sigla() {
        let mut ev = evento(1, "2025-06-05", Categoria::Mentoria, Periodo::Manha);
        assert_eq!(ev.rotulo(), "M-AUR");
        ev.titulo = Some("Mentoria mensal".to_string());
        assert_eq!(ev.rotulo(), "Mentoria mensal");
    }

    #[test]
    fn test_celulas_vazias_junho_2025() {
        // 2025-06-01 is a Sunday, so the grid starts flush.
        let calendario = montar_calendario(2025, 6, &[]);
        assert_eq!(calendario.celulas_vazias, 0);
        assert_eq!(calendario.dias.len(), 30);

        // 2025-08-01 is a Friday.
        let agosto = montar_calendario(2025, 8, &[]);
        assert_eq!(agosto.celulas_vazias, 5);
        assert_eq!(agosto.dias.len(), 31);
    }

    #[test]
    fn test_fevereiro_bissexto() {
        assert_eq!(dias_no_mes(2024, 2), 29);
        assert_eq!(dias_no_mes(2025, 2), 28);
    }

    #[test]
    fn test_navegacao_com_virada_de_ano() {
        assert_eq!(mes_anterior(2025, 1), (2024, 12));
        assert_eq!(proximo_mes(2025, 12), (2026, 1));
        assert_eq!(mes_anterior(2025, 7), (2025, 6));
        assert_eq!(proximo_mes(2025, 7), (2025, 8));
    }

    #[test]
    fn test_dia_com_excedente() {
        let eventos = vec![
            evento(1, "2025-06-05", Categoria::Consultoria, Periodo::Manha),
            evento(2, "2025-06-05", Categoria::Mentoria, Periodo::Tarde),
            evento(3, "2025-06-05", Categoria::KickOff, Periodo::DiaTodo),
            evento(4, "2025-06-05", Categoria::Outros, Periodo::DiaTodo),
            evento(5, "2025-06-12", Categoria::Programado, Periodo::Manha),
        ];
        let calendario = montar_calendario(2025, 6, &eventos);

        let dia5 = &calendario.dias[4];
        assert_eq!(dia5.eventos.len(), 4);
        assert_eq!(dia5.visiveis().len(), MAX_EVENTOS_DIA);
        assert_eq!(dia5.excedente(), 1);

        let dia12 = &calendario.dias[11];
        assert_eq!(dia12.visiveis().len(), 1);
        assert_eq!(dia12.excedente(), 0);
    }

    #[test]
    fn test_eventos_de_outro_mes_sao_ignorados() {
        let eventos = vec![
            evento(1, "2025-05-31", Categoria::Consultoria, Periodo::Manha),
            evento(2, "2025-06-01", Categoria::Consultoria, Periodo::Manha),
            evento(3, "2025-07-01", Categoria::Consultoria, Periodo::Manha),
        ];
        let calendario = montar_calendario(2025, 6, &eventos);
        assert_eq!(calendario.total_eventos(), 1);
        assert_eq!(calendario.dias[0].eventos[0].id, 2);
    }

    #[test]
    fn test_ordenacao_por_periodo_dentro_do_dia() {
        let eventos = vec![
            evento(9, "2025-06-05", Categoria::Outros, Periodo::DiaTodo),
            evento(3, "2025-06-05", Categoria::Consultoria, Periodo::Tarde),
            evento(5, "2025-06-05", Categoria::Mentoria, Periodo::Manha),
        ];
        let calendario = montar_calendario(2025, 6, &eventos);
        let ids: Vec<i64> = calendario.dias[4].eventos.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![5, 3, 9]);
    }

    #[test]
    fn test_resumo_do_mes() {
        let eventos = vec![
            evento(1, "2025-06-02", Categoria::Consultoria, Periodo::Manha),
            evento(2, "2025-06-03", Categoria::Consultoria, Periodo::Tarde),
            evento(3, "2025-06-04", Categoria::Mentoria, Periodo::DiaTodo),
        ];
        let calendario = montar_calendario(2025, 6, &eventos);
        assert_eq!(
            calendario.resumo_categorias(),
            vec![(Categoria::Consultoria, 2), (Categoria::Mentoria, 1)]
        );
        let periodos = calendario.resumo_periodos();
        assert_eq!(periodos[0], (Periodo::Manha, 1));
        assert_eq!(periodos[2], (Periodo::DiaTodo, 1));
        assert_eq!(calendario.titulo(), "Junho 2025");
    }
}
