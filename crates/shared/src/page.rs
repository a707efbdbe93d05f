use serde::{Deserialize, Serialize};

/// Default page size for every list surface.
pub const TAMANHO_PAGINA: u32 = 20;

/// How many numbered buttons the pager shows at most.
pub const JANELA_MAXIMA: u32 = 5;

/// Envelope returned by every paginated list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginada<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
}

impl<T> Paginada<T> {
    /// 1-based bounds of the rows on screen, for "Mostrando X a Y de Z".
    pub fn intervalo(&self) -> (u64, u64) {
        if self.total_count == 0 || self.items.is_empty() {
            return (0, 0);
        }
        let de = u64::from(self.page.max(1) - 1) * u64::from(self.page_size) + 1;
        let ate = (de + self.items.len() as u64 - 1).min(self.total_count);
        (de, ate)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn tem_anterior(&self) -> bool {
        self.page > 1
    }

    pub fn tem_proxima(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Numbered-button window for the pager: at most [`JANELA_MAXIMA`] pages,
/// always containing `page`, clamped to `[1, total_pages]`. The window is
/// centered on the current page and re-anchored at both ends so early and
/// late pages still get a full-width window when one exists.
pub fn janela_paginas(page: u32, total_pages: u32) -> Vec<u32> {
    if total_pages == 0 {
        return Vec::new();
    }
    let page = page.clamp(1, total_pages);
    let inicio = page.saturating_sub(2).max(1);
    let fim = (inicio + JANELA_MAXIMA - 1).min(total_pages);
    let inicio = fim.saturating_sub(JANELA_MAXIMA - 1).max(1);
    (inicio..=fim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_janela_no_inicio() {
        assert_eq!(janela_paginas(1, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(janela_paginas(2, 10), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_janela_no_meio() {
        assert_eq!(janela_paginas(6, 10), vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_janela_no_fim() {
        assert_eq!(janela_paginas(9, 10), vec![6, 7, 8, 9, 10]);
        assert_eq!(janela_paginas(10, 10), vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_janela_menor_que_cinco_paginas() {
        assert_eq!(janela_paginas(2, 3), vec![1, 2, 3]);
        assert_eq!(janela_paginas(1, 1), vec![1]);
        assert_eq!(janela_paginas(5, 0), Vec::<u32>::new());
    }

    #[test]
    fn test_janela_sempre_contem_pagina_atual() {
        for total in 1..=30u32 {
            for page in 1..=total {
                let janela = janela_paginas(page, total);
                assert!(janela.len() <= JANELA_MAXIMA as usize);
                assert!(janela.contains(&page), "page {page} de {total}");
                assert!(*janela.first().unwrap() >= 1);
                assert!(*janela.last().unwrap() <= total);
            }
        }
    }

    #[test]
    fn test_intervalo_mostrando() {
        let pagina = Paginada {
            items: vec![(); 20],
            page: 2,
            page_size: 20,
            total_count: 45,
            total_pages: 3,
        };
        assert_eq!(pagina.intervalo(), (21, 40));

        let ultima = Paginada {
            items: vec![(); 5],
            page: 3,
            page_size: 20,
            total_count: 45,
            total_pages: 3,
        };
        assert_eq!(ultima.intervalo(), (41, 45));
    }

    #[test]
    fn test_intervalo_vazio() {
        let pagina: Paginada<()> = Paginada {
            items: Vec::new(),
            page: 1,
            page_size: 20,
            total_count: 0,
            total_pages: 0,
        };
        assert_eq!(pagina.intervalo(), (0, 0));
        assert!(pagina.is_empty());
        assert!(!pagina.tem_anterior());
        assert!(!pagina.tem_proxima());
    }

    #[test]
    fn test_envelope_deserializa() {
        let json = r#"{
            "items": [{"id": 1}, {"id": 2}],
            "page": 1,
            "page_size": 20,
            "total_count": 2,
            "total_pages": 1
        }"#;
        let pagina: Paginada<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(pagina.items.len(), 2);
        assert_eq!(pagina.total_pages, 1);
    }
}
