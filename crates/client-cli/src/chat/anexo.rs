//! Attachment gate: size and type are checked before anything touches the
//! network.

use shared::mensagem::TipoMensagem;
use thiserror::Error;

/// Upload ceiling in bytes.
pub const TAMANHO_MAXIMO: u64 = 10 * 1024 * 1024;

/// Extension to MIME type allow-list the backend accepts.
const TIPOS_PERMITIDOS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnexoInvalido {
    #[error("Arquivo muito grande (máximo 10MB)")]
    MuitoGrande,
    #[error("Tipo de arquivo não permitido")]
    TipoNaoPermitido,
}

/// Validates name and size against the allow-list; returns the MIME type the
/// upload should declare.
pub fn validar(nome: &str, tamanho: u64) -> Result<&'static str, AnexoInvalido> {
    if tamanho > TAMANHO_MAXIMO {
        return Err(AnexoInvalido::MuitoGrande);
    }
    let extensao = nome
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    TIPOS_PERMITIDOS
        .iter()
        .find(|(ext, _)| *ext == extensao)
        .map(|(_, mime)| *mime)
        .ok_or(AnexoInvalido::TipoNaoPermitido)
}

/// Message kind a file of this MIME type produces.
pub fn tipo_para_mime(mime: &str) -> TipoMensagem {
    if mime.starts_with("image/") {
        TipoMensagem::Imagem
    } else if mime.starts_with("audio/") {
        TipoMensagem::Audio
    } else {
        TipoMensagem::Arquivo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aceita_tipos_da_lista() {
        assert_eq!(validar("foto.png", 1024), Ok("image/png"));
        assert_eq!(validar("RELATORIO.PDF", 1024), Ok("application/pdf"));
        assert_eq!(
            validar("planilha.xlsx", 1024),
            Ok("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        );
        assert_eq!(validar("dados.csv", 1024), Ok("text/csv"));
    }

    #[test]
    fn test_rejeita_acima_de_10mb() {
        assert_eq!(validar("foto.png", TAMANHO_MAXIMO), Ok("image/png"));
        assert_eq!(
            validar("foto.png", TAMANHO_MAXIMO + 1),
            Err(AnexoInvalido::MuitoGrande)
        );
    }

    #[test]
    fn test_rejeita_tipo_fora_da_lista() {
        assert_eq!(validar("script.exe", 10), Err(AnexoInvalido::TipoNaoPermitido));
        assert_eq!(validar("video.mp4", 10), Err(AnexoInvalido::TipoNaoPermitido));
        assert_eq!(validar("sem_extensao", 10), Err(AnexoInvalido::TipoNaoPermitido));
    }

    #[test]
    fn test_tipo_de_mensagem_por_mime() {
        assert_eq!(tipo_para_mime("image/png"), TipoMensagem::Imagem);
        assert_eq!(tipo_para_mime("application/pdf"), TipoMensagem::Arquivo);
        assert_eq!(tipo_para_mime("text/csv"), TipoMensagem::Arquivo);
    }
}
