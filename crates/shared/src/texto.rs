use chrono::{DateTime, Local, NaiveDate, Utc};

// ============================================================================
// Formatting helpers
// ============================================================================

/// Digits a full CNPJ has.
pub const CNPJ_DIGITOS: usize = 14;

/// Keeps only digits, capped at the CNPJ length.
pub fn limpar_cnpj(bruto: &str) -> String {
    bruto
        .chars()
        .filter(char::is_ascii_digit)
        .take(CNPJ_DIGITOS)
        .collect()
}

/// Progressive CNPJ mask: punctuates however many digits were typed so far,
/// so "123456" renders as "12.345.6" and a full number as
/// "12.345.678/0001-90". Non-digits are stripped first.
pub fn mascarar_cnpj(bruto: &str) -> String {
    let digitos = limpar_cnpj(bruto);
    let mut saida = String::with_capacity(18);
    for (i, c) in digitos.chars().enumerate() {
        match i {
            2 | 5 => saida.push('.'),
            8 => saida.push('/'),
            12 => saida.push('-'),
            _ => {}
        }
        saida.push(c);
    }
    saida
}

/// Whether the input already carries the 14 digits a lookup needs.
pub fn cnpj_completo(bruto: &str) -> bool {
    limpar_cnpj(bruto).len() == CNPJ_DIGITOS
}

/// dd/mm/aaaa.
pub fn data_curta(data: NaiveDate) -> String {
    data.format("%d/%m/%Y").to_string()
}

/// dd/mm/aaaa HH:MM in the local timezone.
pub fn data_hora(instante: &DateTime<Utc>) -> String {
    instante
        .with_timezone(&Local)
        .format("%d/%m/%Y %H:%M")
        .to_string()
}

/// HH:MM in the local timezone, for chat bubbles.
pub fn hora_curta(instante: &DateTime<Utc>) -> String {
    instante.with_timezone(&Local).format("%H:%M").to_string()
}

/// File size with pt-BR decimal comma: "850 B", "3,2 KB", "1,5 MB".
pub fn tamanho_arquivo(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f >= MB {
        format!("{:.1} MB", bytes_f / MB).replace('.', ",")
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB).replace('.', ",")
    } else {
        format!("{bytes} B")
    }
}

/// Cuts long cell text at `limite` characters, appending "…". Counts chars,
/// not bytes, so accented text stays valid.
pub fn truncar(texto: &str, limite: usize) -> String {
    if texto.chars().count() <= limite {
        return texto.to_string();
    }
    let corte: String = texto.chars().take(limite.saturating_sub(1)).collect();
    format!("{corte}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mascara_progressiva() {
        assert_eq!(mascarar_cnpj(""), "");
        assert_eq!(mascarar_cnpj("1"), "1");
        assert_eq!(mascarar_cnpj("12"), "12");
        assert_eq!(mascarar_cnpj("123"), "12.3");
        assert_eq!(mascarar_cnpj("123456"), "12.345.6");
        assert_eq!(mascarar_cnpj("123456789"), "12.345.678/9");
        assert_eq!(mascarar_cnpj("1234567800019"), "12.345.678/0001-9");
        assert_eq!(mascarar_cnpj("12345678000190"), "12.345.678/0001-90");
    }

    #[test]
    fn test_mascara_ignora_nao_digitos_e_excesso() {
        assert_eq!(mascarar_cnpj("12.345.678/0001-90"), "12.345.678/0001-90");
        assert_eq!(mascarar_cnpj("abc12x3"), "12.3");
        assert_eq!(mascarar_cnpj("123456780001909999"), "12.345.678/0001-90");
    }

    #[test]
    fn test_cnpj_completo() {
        assert!(cnpj_completo("12.345.678/0001-90"));
        assert!(cnpj_completo("12345678000190"));
        assert!(!cnpj_completo("12345678"));
        assert!(!cnpj_completo(""));
    }

    #[test]
    fn test_data_curta() {
        let data = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        assert_eq!(data_curta(data), "03/06/2025");
    }

    #[test]
    fn test_tamanho_arquivo() {
        assert_eq!(tamanho_arquivo(850), "850 B");
        assert_eq!(tamanho_arquivo(3 * 1024 + 200), "3,2 KB");
        assert_eq!(tamanho_arquivo(1024 * 1024 + 512 * 1024), "1,5 MB");
    }

    #[test]
    fn test_truncar_conta_caracteres() {
        assert_eq!(truncar("curto", 10), "curto");
        assert_eq!(truncar("Metalurgica Aurora", 12), "Metalurgica…");
        assert_eq!(truncar("ação", 4), "ação");
    }
}
